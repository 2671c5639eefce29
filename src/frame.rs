//! The per-frame driver: a self-rescheduling `requestAnimationFrame` closure
//! owned by the controller (so disposal can cancel it), plus the frame body.

use crate::controller::Controller;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub fn start_loop(inner: &Rc<RefCell<Controller>>) {
    let rc = inner.clone();
    let closure = Closure::wrap(Box::new(move || {
        let mut c = rc.borrow_mut();
        if !c.alive.get() {
            return;
        }
        c.frame();
        c.schedule_next_frame();
    }) as Box<dyn FnMut()>);
    let mut c = inner.borrow_mut();
    c.raf_closure = Some(closure);
    c.schedule_next_frame();
}

impl Controller {
    pub(crate) fn schedule_next_frame(&mut self) {
        if let (Some(w), Some(cb)) = (web::window(), self.raf_closure.as_ref()) {
            self.raf_id = w.request_animation_frame(cb.as_ref().unchecked_ref()).ok();
        }
    }

    /// One animation frame: advance the scene, mirror the particle set into
    /// GPU residency, render, and reap timer handles whose closures are
    /// guaranteed not to be executing right now.
    pub(crate) fn frame(&mut self) {
        let removed = self.scene.update();
        if let Some(gpu) = self.gpu.as_mut() {
            for id in removed {
                gpu.release_particle(id);
            }
            gpu.sync_particles(self.scene.particles());
            gpu.resize_if_needed(self.canvas.width(), self.canvas.height());
            if let Err(e) = gpu.render(&self.scene) {
                log::error!("render error: {:?}", e);
            }
        }
        if self.spawn_timer.is_some() && self.open_delay.is_some() {
            self.open_delay = None;
        }
        if self.scene.burst_complete() && self.spawn_timer.is_some() {
            self.spawn_timer = None;
        }
    }
}
