//! Owned DOM event listeners: attached on construction, removed on drop.
//! Disposal is a first-class operation for this component, so listener
//! closures are held rather than forgotten.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub struct ListenerHandle {
    target: web::EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut()>,
}

impl ListenerHandle {
    pub fn attach(
        target: &web::EventTarget,
        event: &'static str,
        f: impl FnMut() + 'static,
    ) -> Self {
        let closure = Closure::wrap(Box::new(f) as Box<dyn FnMut()>);
        _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        Self {
            target: target.clone(),
            event,
            closure,
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
    }
}
