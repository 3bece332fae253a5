use hero_core::{HeroEvent, Viewport};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Container from a CSS selector string or an element reference.
pub fn resolve_container(target: &JsValue) -> Option<web::Element> {
    if let Some(selector) = target.as_string() {
        return window_document()?.query_selector(&selector).ok().flatten();
    }
    target.dyn_ref::<web::Element>().cloned()
}

/// Append a canvas that fills the container.
pub fn mount_canvas(
    document: &web::Document,
    container: &web::Element,
) -> Result<web::HtmlCanvasElement, JsValue> {
    let canvas: web::HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    let style = canvas.style();
    style.set_property("display", "block")?;
    style.set_property("width", "100%")?;
    style.set_property("height", "100%")?;
    style.set_property("pointer-events", "none")?;
    canvas.set_attribute("aria-hidden", "true")?;
    container.append_child(&canvas)?;
    Ok(canvas)
}

/// Device-pixel size of the container's layout box.
pub fn measure(container: &web::Element, pixel_ratio_cap: f64) -> Viewport {
    let dpr = web::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
    let rect = container.get_bounding_client_rect();
    Viewport::from_css(rect.width(), rect.height(), dpr, pixel_ratio_cap)
}

pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement, viewport: Viewport) {
    if viewport.is_empty() {
        return;
    }
    if canvas.width() != viewport.width {
        canvas.set_width(viewport.width);
    }
    if canvas.height() != viewport.height {
        canvas.set_height(viewport.height);
    }
}

pub fn set_opacity(canvas: &web::HtmlCanvasElement, opacity: f32) {
    let value = format!("{:.3}", opacity.clamp(0.0, 1.0));
    let _ = canvas.style().set_property("opacity", &value);
}

pub fn document_hidden() -> bool {
    window_document().map(|d| d.hidden()).unwrap_or(false)
}

pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

pub fn reduced_motion_query() -> Option<web::MediaQueryList> {
    web::window()?.match_media(REDUCED_MOTION_QUERY).ok().flatten()
}

/// Fire `event` on `target` as a bubbling `CustomEvent`. Dispatch is
/// deferred to a microtask so listeners never run inside a renderer call.
pub fn dispatch_hero_event(target: &web::EventTarget, event: &HeroEvent) {
    let target = target.clone();
    let name = event.name();
    let detail = event.detail();
    spawn_local(async move {
        let init = web::CustomEventInit::new();
        init.set_bubbles(true);
        if let Some(detail) = detail {
            init.set_detail(&JsValue::from_str(&detail));
        }
        match web::CustomEvent::new_with_event_init_dict(name, &init) {
            Ok(ev) => {
                let _ = target.dispatch_event(&ev);
            }
            Err(e) => log::warn!("could not create {name} event: {e:?}"),
        }
    });
}
