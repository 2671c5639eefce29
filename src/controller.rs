//! The surprise-box controller: owns the render surface, the scene state,
//! the timer chain and the event hooks, and exposes the mount/dispose
//! contract to the host page.
//!
//! Everything shares one `Rc<RefCell<Controller>>`; each callback (click,
//! timers, RAF tick, async resolutions) takes the borrow for its whole body,
//! and execution is single-threaded, so ordering is the only concurrency
//! concern. Disposal drops the timer handles before anything else is torn
//! down, and async work re-checks the liveness flag it captured at request
//! time.

use crate::assets::{self, FontSlot};
use crate::config::{self, SceneConfig};
use crate::core::scene::SceneCore;
use crate::dom;
use crate::events::ListenerHandle;
use crate::frame;
use crate::render::GpuState;
use crate::timers::{IntervalHandle, TimeoutHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

pub(crate) struct Controller {
    pub(crate) cfg: &'static SceneConfig,
    pub(crate) scene: SceneCore,
    pub(crate) gpu: Option<GpuState>,
    pub(crate) font: FontSlot,
    pub(crate) container: web::HtmlElement,
    pub(crate) canvas: web::HtmlCanvasElement,
    /// Liveness token shared with async callbacks.
    pub(crate) alive: Rc<Cell<bool>>,
    pub(crate) click_hook: Option<ListenerHandle>,
    pub(crate) resize_hook: Option<ListenerHandle>,
    /// One-shot delay between the click and the first spawn tick.
    pub(crate) open_delay: Option<TimeoutHandle>,
    /// Recurring spawn tick; at most one exists per controller lifetime.
    pub(crate) spawn_timer: Option<IntervalHandle>,
    pub(crate) raf_id: Option<i32>,
    pub(crate) raf_closure: Option<Closure<dyn FnMut()>>,
}

impl Controller {
    fn handle_click(inner: &Rc<RefCell<Controller>>) {
        let mut c = inner.borrow_mut();
        // Synchronous guard: only Closed -> Opening exists, so re-clicks are
        // no-ops and the timer chain below is created at most once.
        if !c.alive.get() || !c.scene.begin_open() {
            return;
        }
        log::info!("[box] opening; spawn burst scheduled");
        let interval_ms = c.cfg.particles.spawn_interval_ms;
        let rc = inner.clone();
        c.open_delay = TimeoutHandle::new(c.cfg.particles.open_delay_ms, move || {
            let rc_tick = rc.clone();
            let timer =
                IntervalHandle::new(interval_ms, move || Controller::spawn_tick(&rc_tick));
            rc.borrow_mut().spawn_timer = timer;
        });
    }

    fn spawn_tick(inner: &Rc<RefCell<Controller>>) {
        let mut c = inner.borrow_mut();
        if !c.alive.get() {
            return;
        }
        let Some(seed) = c.scene.spawn_tick() else {
            // Late tick after the burst finished: quiet the timer. The
            // handle itself is reaped from the frame loop so the closure is
            // never dropped from its own call frame.
            if let Some(t) = c.spawn_timer.as_ref() {
                t.cancel();
            }
            return;
        };
        if c.scene.burst_complete() {
            if let Some(t) = c.spawn_timer.as_ref() {
                t.cancel();
            }
            log::info!("[box] burst complete; box open");
        }

        let size = c.cfg.particles.text_size;
        let depth = c.cfg.particles.text_depth;
        match &mut c.font {
            FontSlot::Ready(face) => {
                let face = face.clone();
                let segments = face.outline_segments(seed.snippet, size, depth);
                c.scene.insert_particle(seed, segments);
            }
            FontSlot::Loading(pending) => pending.push(seed),
            // Resolution failed earlier; this tick spawns nothing, the burst
            // keeps counting.
            FontSlot::Failed => {}
            FontSlot::Idle => {
                c.font = FontSlot::Loading(vec![seed]);
                let rc = inner.clone();
                let alive = c.alive.clone();
                spawn_local(async move {
                    let fetched = assets::fetch_typeface(config::TYPEFACE_URL).await;
                    if !alive.get() {
                        // Disposed while the fetch was in flight; discard.
                        return;
                    }
                    let mut c = rc.borrow_mut();
                    match fetched {
                        Ok(face) => {
                            let face = Rc::new(face);
                            let pending = c.font.take_pending();
                            c.font = FontSlot::Ready(face.clone());
                            for seed in pending {
                                let segments =
                                    face.outline_segments(seed.snippet, size, depth);
                                c.scene.insert_particle(seed, segments);
                            }
                        }
                        Err(e) => {
                            log::warn!("[box] typeface unavailable: {e:?}");
                            c.font = FontSlot::Failed;
                        }
                    }
                });
            }
        }
    }

    fn wire_click(inner: &Rc<RefCell<Controller>>) {
        let rc = inner.clone();
        let hook = {
            let c = inner.borrow();
            ListenerHandle::attach(&c.container, "click", move || {
                Controller::handle_click(&rc);
            })
        };
        inner.borrow_mut().click_hook = Some(hook);
    }

    fn wire_resize(inner: &Rc<RefCell<Controller>>) {
        let Some(window) = web::window() else { return };
        let rc = inner.clone();
        let hook = ListenerHandle::attach(&window, "resize", move || {
            let mut c = rc.borrow_mut();
            if !c.alive.get() {
                return;
            }
            dom::sync_canvas_backing_size(&c.canvas, &c.container);
            let (w, h) = (c.canvas.width(), c.canvas.height());
            c.scene.set_viewport(w, h);
        });
        inner.borrow_mut().resize_hook = Some(hook);
    }

    fn start_gpu(inner: &Rc<RefCell<Controller>>) {
        let (canvas, alive) = {
            let c = inner.borrow();
            (c.canvas.clone(), c.alive.clone())
        };
        let rc = inner.clone();
        spawn_local(async move {
            match GpuState::new(canvas, &config::SCENE).await {
                Ok(gpu) => {
                    if alive.get() {
                        rc.borrow_mut().gpu = Some(gpu);
                    } else {
                        // Disposed before the device came up.
                        gpu.destroy();
                    }
                }
                // The page degrades to a static card; nothing to rethrow.
                Err(e) => log::error!("WebGPU init error: {e:?}"),
            }
        });
    }
}

/// The host-facing handle. Mount by constructing with a sized container;
/// unmount by calling `dispose()` exactly once (extra calls are tolerated).
#[wasm_bindgen]
pub struct SurpriseBox {
    inner: Rc<RefCell<Controller>>,
}

#[wasm_bindgen]
impl SurpriseBox {
    #[wasm_bindgen(constructor)]
    pub fn new(container: web::HtmlElement) -> Result<SurpriseBox, JsValue> {
        let canvas = dom::create_surface_canvas(&container)
            .map_err(|e| JsValue::from_str(&format!("{e:?}")))?;
        let mut scene = SceneCore::new(&config::SCENE, js_sys::Date::now() as u64);
        scene.set_viewport(canvas.width(), canvas.height());
        log::info!("[box] mounted {}x{}", canvas.width(), canvas.height());

        let inner = Rc::new(RefCell::new(Controller {
            cfg: &config::SCENE,
            scene,
            gpu: None,
            font: FontSlot::Idle,
            container,
            canvas,
            alive: Rc::new(Cell::new(true)),
            click_hook: None,
            resize_hook: None,
            open_delay: None,
            spawn_timer: None,
            raf_id: None,
            raf_closure: None,
        }));
        Controller::wire_click(&inner);
        Controller::wire_resize(&inner);
        Controller::start_gpu(&inner);
        frame::start_loop(&inner);
        Ok(SurpriseBox { inner })
    }

    /// Tear down everything this controller owns: timers, listeners, the
    /// render loop, live particles, GPU resources, and the canvas itself.
    /// Safe to call before the first frame and safe to call twice.
    pub fn dispose(&self) {
        let mut c = self.inner.borrow_mut();
        if !c.alive.get() {
            return;
        }
        c.alive.set(false);
        if let Some(id) = c.raf_id.take() {
            if let Some(w) = web::window() {
                _ = w.cancel_animation_frame(id);
            }
        }
        c.raf_closure = None;
        // Timers first: no spawn tick may fire once teardown is underway.
        c.open_delay = None;
        c.spawn_timer = None;
        c.click_hook = None;
        c.resize_hook = None;
        c.scene.clear_particles();
        if let Some(gpu) = c.gpu.take() {
            gpu.destroy();
        }
        c.canvas.remove();
        log::info!("[box] disposed");
    }
}
