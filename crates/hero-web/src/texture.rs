use crate::Shared;
use anyhow::{anyhow, Context};
use hero_core::NoiseImage;
use instant::Instant;
use std::rc::Weak;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

pub async fn fetch_noise(path: &str) -> anyhow::Result<NoiseImage> {
    let window = web::window().ok_or_else(|| anyhow!("no window"))?;
    let response: web::Response = JsFuture::from(window.fetch_with_str(path))
        .await
        .map_err(|e| anyhow!("fetch {path}: {e:?}"))?
        .dyn_into()
        .map_err(|e| anyhow!("fetch {path}: not a Response: {e:?}"))?;
    if !response.ok() {
        anyhow::bail!("fetch {path}: HTTP {}", response.status());
    }
    let buffer = response
        .array_buffer()
        .map_err(|e| anyhow!("{e:?}"))?;
    let buffer = JsFuture::from(buffer)
        .await
        .map_err(|e| anyhow!("reading {path}: {e:?}"))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    NoiseImage::decode(&bytes).with_context(|| format!("decoding {path}"))
}

/// Load the noise asset and hot-swap it in. On failure the synthesized
/// fallback stays bound.
pub async fn load_noise_texture(shared: Weak<Shared>, path: String) {
    let started = Instant::now();
    let result = fetch_noise(&path).await;
    let Some(shared) = shared.upgrade() else {
        return;
    };
    match result {
        Ok(image) => {
            log::info!(
                "[texture] {path} {}x{} loaded in {:.1} ms",
                image.width(),
                image.height(),
                started.elapsed().as_secs_f64() * 1000.0
            );
            shared.controller.borrow_mut().install_noise_texture(image);
        }
        Err(e) => log::warn!("[texture] {e:#}; keeping procedural noise"),
    }
}
