//! Cancellable wrappers over `setTimeout`/`setInterval`.
//!
//! The controller owns one of each at most: the one-shot open delay and the
//! recurring spawn tick. Both are disposable handles; dropping a handle
//! clears the underlying JS timer. `cancel` only clears the timer and leaves
//! the closure allocation alone, so a tick may cancel its own interval from
//! inside the callback; the handle itself is reaped later from a frame or
//! from `dispose()`.

use std::cell::Cell;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct TimeoutHandle {
    id: Cell<Option<i32>>,
    _closure: Closure<dyn FnMut()>,
}

impl TimeoutHandle {
    pub fn new(delay_ms: i32, f: impl FnMut() + 'static) -> Option<Self> {
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut()>);
        let id = web::window()?
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                delay_ms,
            )
            .ok()?;
        Some(Self {
            id: Cell::new(Some(id)),
            _closure: closure,
        })
    }

    pub fn cancel(&self) {
        if let (Some(w), Some(id)) = (web::window(), self.id.take()) {
            w.clear_timeout_with_handle(id);
        }
    }
}

impl Drop for TimeoutHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

pub struct IntervalHandle {
    id: Cell<Option<i32>>,
    _closure: Closure<dyn FnMut()>,
}

impl IntervalHandle {
    pub fn new(period_ms: i32, f: impl FnMut() + 'static) -> Option<Self> {
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut()>);
        let id = web::window()?
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                period_ms,
            )
            .ok()?;
        Some(Self {
            id: Cell::new(Some(id)),
            _closure: closure,
        })
    }

    pub fn cancel(&self) {
        if let (Some(w), Some(id)) = (web::window(), self.id.take()) {
            w.clear_interval_with_handle(id);
        }
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
