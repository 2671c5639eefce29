#![cfg(target_arch = "wasm32")]
//! WASM front-end for the PS2-style memory card page.
//!
//! The exported surface is [`SurpriseBox`]: the host mounts it into a sized
//! container, it renders a rotating gift box via WebGPU, a click bursts code
//! snippet particles out of it, and `dispose()` tears everything down when
//! the component unmounts. The pure scene logic lives in `core` and is
//! tested natively from `tests/`.

use wasm_bindgen::prelude::*;

mod assets;
mod config;
mod controller;
mod core;
mod dom;
mod events;
mod frame;
mod render;
mod timers;

pub use controller::SurpriseBox;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("memcard-web loaded");
    Ok(())
}
