#![cfg(target_arch = "wasm32")]
//! Browser front-end: mounts the cloud hero into a page container and wires
//! host signals (frames, resize, visibility, reduced motion, WebGL context
//! loss) into the lifecycle controller.

mod dom;
mod frame;
mod subscriptions;
mod texture;

use frame::RafScheduler;
use hero_core::error::InitError;
use hero_core::{
    Controller, GpuState, HeroEvent, HeroOptions, LifecycleState, ScrollDirection, Viewport,
};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use subscriptions::Subscriptions;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

type HeroController = Controller<GpuState<'static>, RafScheduler>;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("hero-web loaded");
    Ok(())
}

/// State shared between the JS handle and the host callbacks.
pub(crate) struct Shared {
    this: Weak<Shared>,
    pub(crate) controller: RefCell<HeroController>,
    container: RefCell<Option<web::Element>>,
    canvas: RefCell<Option<web::HtmlCanvasElement>>,
    subscriptions: RefCell<Subscriptions>,
    /// Set for WebGPU backends, which get no `webglcontextrestored` event.
    pub(crate) rebuild_on_loss: Cell<bool>,
    applied_opacity: Cell<f32>,
}

impl Shared {
    fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Shared>| Self {
            this: weak.clone(),
            controller: RefCell::new(Controller::new(RafScheduler::new(weak.clone()))),
            container: RefCell::new(None),
            canvas: RefCell::new(None),
            subscriptions: RefCell::new(Subscriptions::default()),
            rebuild_on_loss: Cell::new(false),
            applied_opacity: Cell::new(1.0),
        })
    }

    fn initialize(self: &Rc<Self>, target: &JsValue, options: &JsValue) -> Result<(), InitError> {
        match self.controller.borrow().state() {
            LifecycleState::Uninitialized => {}
            LifecycleState::Disposed => return Err(InitError::Disposed),
            _ => return Err(InitError::AlreadyInitialized),
        }
        let options = parse_options(options);
        let Some(container) = dom::resolve_container(target) else {
            return Err(self.fail(InitError::MissingContainer));
        };
        *self.container.borrow_mut() = Some(container.clone());

        let viewport = dom::measure(&container, options.pixel_ratio_cap);
        let transparent = options.transparent;
        let texture_path = options.texture_path.clone();
        // a zero-size container fails here, before the DOM is touched
        let begun = self.controller.borrow_mut().begin_initialize(options, viewport);
        if let Err(e) = begun {
            self.after_update();
            return Err(e);
        }

        let Some(document) = dom::window_document() else {
            return Err(self.fail(InitError::Unsupported("no document".into())));
        };
        let canvas = match dom::mount_canvas(&document, &container) {
            Ok(canvas) => canvas,
            Err(e) => return Err(self.fail(InitError::Unsupported(format!("{e:?}")))),
        };
        dom::sync_canvas_backing_size(&canvas, viewport);
        *self.canvas.borrow_mut() = Some(canvas.clone());

        let weak = Rc::downgrade(self);
        let subs = Subscriptions::attach(&weak, &canvas);
        log::debug!("[hero] {} host listeners attached", subs.count());
        *self.subscriptions.borrow_mut() = subs;

        {
            let mut controller = self.controller.borrow_mut();
            let reduced = dom::reduced_motion_query().map(|q| q.matches());
            controller.set_reduced_motion(reduced.unwrap_or(false));
            controller.set_hidden(dom::document_hidden());
        }
        log::info!(
            "[hero] mounting {}x{} (texture {texture_path})",
            viewport.width,
            viewport.height
        );
        spawn_local(frame::build_backend(
            weak.clone(),
            canvas,
            viewport,
            transparent,
        ));
        spawn_local(texture::load_noise_texture(weak, texture_path));
        self.after_update();
        Ok(())
    }

    fn fail(&self, reason: InitError) -> InitError {
        self.controller.borrow_mut().fail_initialize(reason.clone());
        self.after_update();
        reason
    }

    pub(crate) fn frame(&self, timestamp: f64) {
        {
            let mut controller = self.controller.borrow_mut();
            let cap = controller.options().pixel_ratio_cap;
            controller.flush_resize(|| self.measure(cap));
            controller.on_frame(timestamp);
        }
        self.after_update();
    }

    pub(crate) fn with_controller(&self, f: impl FnOnce(&mut HeroController)) {
        f(&mut self.controller.borrow_mut());
        self.after_update();
    }

    /// Resize events only mark the size dirty; the next frame measures once.
    pub(crate) fn request_resize(&self) {
        self.controller.borrow_mut().request_resize();
    }

    /// Measure the container and size the canvas backing store to match.
    fn measure(&self, pixel_ratio_cap: f64) -> Viewport {
        let Some(container) = self.container.borrow().clone() else {
            return Viewport::new(0, 0);
        };
        let viewport = dom::measure(&container, pixel_ratio_cap);
        if let Some(canvas) = self.canvas.borrow().as_ref() {
            dom::sync_canvas_backing_size(canvas, viewport);
        }
        viewport
    }

    fn apply_resize(&self) {
        let cap = self.controller.borrow().options().pixel_ratio_cap;
        let viewport = self.measure(cap);
        self.controller.borrow_mut().resize(viewport);
    }

    pub(crate) fn rebuild_after_restore(self: &Rc<Self>) {
        if !self.controller.borrow_mut().context_restored() {
            return;
        }
        let Some(canvas) = self.canvas.borrow().clone() else {
            return;
        };
        let (cap, transparent) = {
            let controller = self.controller.borrow();
            (
                controller.options().pixel_ratio_cap,
                controller.options().transparent,
            )
        };
        let viewport = self.measure(cap);
        log::info!("[hero] context restored; rebuilding resources");
        spawn_local(frame::build_backend(
            Rc::downgrade(self),
            canvas,
            viewport,
            transparent,
        ));
        self.after_update();
    }

    /// Publish queued events and keep the host-side fade in step.
    pub(crate) fn after_update(&self) {
        let (events, opacity) = {
            let mut controller = self.controller.borrow_mut();
            (controller.drain_events(), controller.host_opacity())
        };
        let container = self.container.borrow();
        for event in &events {
            log::info!("[hero] {event}");
            match container.as_ref() {
                Some(el) => dom::dispatch_hero_event(el, event),
                None => {
                    if let Some(document) = dom::window_document() {
                        dom::dispatch_hero_event(&document, event);
                    }
                }
            }
        }
        drop(container);
        let lost = events.iter().any(|e| matches!(e, HeroEvent::ContextLost));
        if lost && self.rebuild_on_loss.get() {
            // WebGPU device loss: no restore event will come, rebuild now
            let weak = self.this.clone();
            spawn_local(async move {
                if let Some(shared) = weak.upgrade() {
                    shared.rebuild_after_restore();
                }
            });
        }
        if let Some(canvas) = self.canvas.borrow().as_ref() {
            if (self.applied_opacity.get() - opacity).abs() > 1e-3 {
                dom::set_opacity(canvas, opacity);
                self.applied_opacity.set(opacity);
            }
        }
        // a failed build or restore leaves the container empty
        if self.controller.borrow().state() == LifecycleState::Disposed {
            self.teardown();
        }
    }

    fn teardown(&self) {
        self.subscriptions.borrow_mut().detach_all();
        if let Some(canvas) = self.canvas.borrow_mut().take() {
            canvas.remove();
        }
    }

    fn dispose(&self) {
        let live = self.controller.borrow().state() != LifecycleState::Disposed;
        self.controller.borrow_mut().dispose();
        self.teardown();
        if live {
            log::info!("[hero] disposed");
        }
    }
}

fn parse_options(value: &JsValue) -> HeroOptions {
    if value.is_undefined() || value.is_null() {
        return HeroOptions::default();
    }
    let json = match js_sys::JSON::stringify(value) {
        Ok(json) => String::from(json),
        Err(e) => {
            log::warn!("[hero] options not serializable ({e:?}); using defaults");
            return HeroOptions::default();
        }
    };
    HeroOptions::from_json(&json).unwrap_or_else(|e| {
        log::warn!("[hero] {e}; using defaults");
        HeroOptions::default()
    })
}

/// JS handle for one cloud hero instance.
#[wasm_bindgen]
pub struct CloudHero {
    shared: Rc<Shared>,
}

impl Default for CloudHero {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl CloudHero {
    #[wasm_bindgen(constructor)]
    pub fn new() -> CloudHero {
        CloudHero {
            shared: Shared::new(),
        }
    }

    /// Mount into `container` (CSS selector or element). Returns false when
    /// mounting is impossible; GPU setup completes asynchronously and is
    /// reported through `initialized` / `initializationFailed` events.
    pub fn initialize(&self, container: JsValue, options: JsValue) -> bool {
        match self.shared.initialize(&container, &options) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[hero] initialize: {e}");
                false
            }
        }
    }

    pub fn pause(&self) {
        self.shared.with_controller(|c| c.pause());
    }

    pub fn resume(&self) {
        self.shared.with_controller(|c| c.resume());
    }

    #[wasm_bindgen(js_name = handleResize)]
    pub fn handle_resize(&self) {
        self.shared.apply_resize();
        self.shared.after_update();
    }

    /// `direction` is `"forward"`/`"down"` or `"backward"`/`"up"`.
    #[wasm_bindgen(js_name = setScrollProgress)]
    pub fn set_scroll_progress(&self, value: f64, direction: &str) {
        let direction = direction.parse().unwrap_or_else(|_| {
            log::warn!("[hero] unknown scroll direction {direction:?}; assuming forward");
            ScrollDirection::Forward
        });
        self.shared
            .with_controller(|c| c.set_scroll_progress(value as f32, direction));
    }

    pub fn dispose(&self) {
        self.shared.dispose();
    }

    pub fn state(&self) -> String {
        self.shared.controller.borrow().state().as_str().to_string()
    }

    /// Animation time in seconds, excluding paused intervals.
    pub fn elapsed(&self) -> f64 {
        self.shared.controller.borrow().elapsed_sec()
    }
}

impl Drop for CloudHero {
    fn drop(&mut self) {
        self.shared.dispose();
    }
}
