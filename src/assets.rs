//! The one external asset: the typeface JSON used for snippet outlines.
//!
//! The resource is fetched once, at the first spawn tick that needs it.
//! Seeds issued while the fetch is in flight queue on the `Loading` slot and
//! materialize when it resolves; a failed fetch parks the slot in `Failed`
//! and every later tick degrades to a silent no-op (no retry).

use crate::core::font::Typeface;
use crate::core::scene::ParticleSeed;
use anyhow::{anyhow, bail, Result};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

pub enum FontSlot {
    Idle,
    Loading(Vec<ParticleSeed>),
    Ready(Rc<Typeface>),
    Failed,
}

impl FontSlot {
    pub fn take_pending(&mut self) -> Vec<ParticleSeed> {
        match self {
            FontSlot::Loading(pending) => std::mem::take(pending),
            _ => Vec::new(),
        }
    }
}

pub async fn fetch_typeface(url: &str) -> Result<Typeface> {
    let window = web::window().ok_or_else(|| anyhow!("no window"))?;
    let resp_value = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| anyhow!("typeface fetch failed: {:?}", e))?;
    let resp: web::Response = resp_value
        .dyn_into()
        .map_err(|e| anyhow!("unexpected fetch result: {:?}", e))?;
    if !resp.ok() {
        bail!("typeface fetch returned status {}", resp.status());
    }
    let text = JsFuture::from(resp.text().map_err(|e| anyhow!("{:?}", e))?)
        .await
        .map_err(|e| anyhow!("typeface body read failed: {:?}", e))?;
    let text = text
        .as_string()
        .ok_or_else(|| anyhow!("typeface body is not text"))?;
    Typeface::parse(&text)
}
