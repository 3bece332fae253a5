use crate::Shared;
use hero_core::error::InitError;
use hero_core::{FrameHandle, FrameScheduler, GpuState, Viewport};
use instant::Instant;
use std::rc::Weak;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// `requestAnimationFrame` scheduler. The callback holds a weak handle so
/// a dropped renderer is never kept alive by a pending frame.
pub struct RafScheduler {
    tick: Closure<dyn FnMut(f64)>,
}

impl RafScheduler {
    pub fn new(shared: Weak<Shared>) -> Self {
        let tick = Closure::wrap(Box::new(move |timestamp: f64| {
            if let Some(shared) = shared.upgrade() {
                shared.frame(timestamp);
            }
        }) as Box<dyn FnMut(f64)>);
        Self { tick }
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let window = web::window()?;
        window
            .request_animation_frame(self.tick.as_ref().unchecked_ref())
            .ok()
            .map(FrameHandle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(window) = web::window() {
            let _ = window.cancel_animation_frame(handle.0);
        }
    }
}

pub async fn init_gpu(
    canvas: web::HtmlCanvasElement,
    viewport: Viewport,
    transparent: bool,
) -> Result<GpuState<'static>, InitError> {
    let started = Instant::now();
    // navigator.gpu can exist without a usable adapter; probe first so such
    // browsers fall back to WebGL2
    let instance =
        wgpu::util::new_instance_with_webgpu_detection(&wgpu::InstanceDescriptor::default()).await;
    let surface = instance
        .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
        .map_err(|e| InitError::Unsupported(e.to_string()))?;
    let gpu = GpuState::new(&instance, surface, viewport, transparent).await?;
    log::info!(
        "[gpu] renderer built in {:.1} ms",
        started.elapsed().as_secs_f64() * 1000.0
    );
    Ok(gpu)
}

/// Build the backend for `shared` and hand it to the controller. Used for
/// the first initialization and after a context restore.
pub async fn build_backend(
    shared: Weak<Shared>,
    canvas: web::HtmlCanvasElement,
    viewport: Viewport,
    transparent: bool,
) {
    let result = init_gpu(canvas, viewport, transparent).await;
    let Some(shared) = shared.upgrade() else {
        return;
    };
    if let Ok(gpu) = &result {
        shared.rebuild_on_loss.set(gpu.rebuilds_on_loss());
    }
    shared.controller.borrow_mut().complete_initialize(result);
    shared.after_update();
}
