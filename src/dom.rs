use anyhow::{anyhow, Result};
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Create the render-surface canvas and append it to the host container.
/// The canvas fills the container; its backing store tracks the container's
/// CSS size times the device pixel ratio.
pub fn create_surface_canvas(container: &web::HtmlElement) -> Result<web::HtmlCanvasElement> {
    let document = window_document().ok_or_else(|| anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(|e| anyhow!("{:?}", e))?
        .dyn_into()
        .map_err(|e| anyhow!("{:?}", e))?;
    _ = canvas.set_attribute("style", "display:block;width:100%;height:100%");
    sync_canvas_backing_size(&canvas, container);
    container
        .append_child(&canvas)
        .map_err(|e| anyhow!("{:?}", e))?;
    Ok(canvas)
}

/// Keep the canvas internal pixel size in step with the container's CSS size
/// times devicePixelRatio. Collapsed containers clamp to 1x1 so the surface
/// stays configurable.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement, container: &web::HtmlElement) {
    if let Some(w) = web::window() {
        let dpr = w.device_pixel_ratio();
        let w_px = (container.client_width() as f64 * dpr) as u32;
        let h_px = (container.client_height() as f64 * dpr) as u32;
        canvas.set_width(w_px.max(1));
        canvas.set_height(h_px.max(1));
    }
}
