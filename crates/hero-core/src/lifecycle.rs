//! Renderer lifecycle: initialization, the frame loop, pause/resume,
//! context loss and disposal.
//!
//! The controller is platform-free. Front-ends supply a [`RenderBackend`]
//! (the GPU resources) and a [`FrameScheduler`] (the host's frame callback
//! mechanism) and forward host signals to it: frame callbacks, resizes,
//! visibility, context loss/restore and scroll progress.
//!
//! ```text
//! uninitialized -> initializing -> running <-> paused
//!                        \             \        /
//!                         +-----------> disposed
//! ```

use crate::camera::CameraPose;
use crate::clock::AnimationClock;
use crate::config::HeroOptions;
use crate::constants::REDUCED_MOTION_TIME_SCALE;
use crate::error::{InitError, RenderError};
use crate::events::HeroEvent;
use crate::noise::NoiseImage;
use crate::scroll::{ScrollDirection, ScrollMapper, TransitionSignal};
use crate::uniforms::{CloudUniforms, FrameInputs};
use crate::viewport::Viewport;
use glam::Vec2;
use smallvec::SmallVec;

/// GPU-side resources for one renderer instance.
pub trait RenderBackend {
    /// Reconfigure the drawing surface. Never recompiles the program.
    fn resize(&mut self, viewport: Viewport);
    /// Replace the noise texture, keeping filtering and wrap modes.
    fn upload_noise(&mut self, image: &NoiseImage);
    fn set_uniforms(&mut self, uniforms: &CloudUniforms);
    fn draw(&mut self) -> Result<(), RenderError>;
    /// Whether the surface composites partial alpha over the page.
    fn supports_alpha(&self) -> bool {
        true
    }
    /// Release every resource. Called at most once by the controller.
    fn dispose(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

/// Host frame callbacks (`requestAnimationFrame`, redraw requests).
pub trait FrameScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle>;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Running,
    Paused,
    Disposed,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Disposed => "disposed",
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct PauseReasons {
    explicit: bool,
    hidden: bool,
    context_lost: bool,
}

impl PauseReasons {
    fn any(&self) -> bool {
        self.explicit || self.hidden || self.context_lost
    }
}

pub struct Controller<B, S> {
    state: LifecycleState,
    options: HeroOptions,
    scheduler: S,
    backend: Option<B>,
    pending_frame: Option<FrameHandle>,
    clock: AnimationClock,
    pause: PauseReasons,
    reduced_motion_pref: bool,
    viewport: Option<Viewport>,
    resize_pending: bool,
    scroll: ScrollMapper,
    noise: Option<NoiseImage>,
    initialized_once: bool,
    frames_drawn: u64,
    events: SmallVec<[HeroEvent; 4]>,
}

impl<B: RenderBackend, S: FrameScheduler> Controller<B, S> {
    pub fn new(scheduler: S) -> Self {
        let options = HeroOptions::default();
        Self {
            state: LifecycleState::Uninitialized,
            scroll: ScrollMapper::new(options.scroll),
            options,
            scheduler,
            backend: None,
            pending_frame: None,
            clock: AnimationClock::default(),
            pause: PauseReasons::default(),
            reduced_motion_pref: false,
            viewport: None,
            resize_pending: false,
            noise: None,
            initialized_once: false,
            frames_drawn: 0,
            events: SmallVec::new(),
        }
    }

    /// Enter `initializing`. The caller builds the backend (possibly
    /// asynchronously) and hands it to [`Self::complete_initialize`].
    pub fn begin_initialize(
        &mut self,
        options: HeroOptions,
        viewport: Viewport,
    ) -> Result<(), InitError> {
        match self.state {
            LifecycleState::Uninitialized => {}
            LifecycleState::Disposed => return Err(InitError::Disposed),
            _ => return Err(InitError::AlreadyInitialized),
        }
        self.options = options.sanitized();
        self.scroll.set_policy(self.options.scroll);
        if viewport.is_empty() {
            self.fail_initialize(InitError::EmptyContainer);
            return Err(InitError::EmptyContainer);
        }
        self.viewport = Some(viewport);
        self.transition(LifecycleState::Initializing);
        Ok(())
    }

    /// Terminal failure: release everything and report `reason`.
    pub fn fail_initialize(&mut self, reason: InitError) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        log::error!("cloud hero initialization failed: {reason}");
        self.release();
        self.transition(LifecycleState::Disposed);
        self.emit(HeroEvent::InitializationFailed(reason));
    }

    /// Attach a freshly built backend, or fail. A backend that arrives after
    /// the instance moved on (disposed, context lost) is released at once.
    pub fn complete_initialize(&mut self, result: Result<B, InitError>) {
        if self.state != LifecycleState::Initializing {
            if let Ok(mut stale) = result {
                log::debug!("discarding backend built for a {} renderer", self.state.as_str());
                stale.dispose();
            }
            return;
        }
        let mut backend = match result {
            Ok(backend) => backend,
            Err(reason) => {
                self.fail_initialize(reason);
                return;
            }
        };
        if let Some(image) = &self.noise {
            backend.upload_noise(image);
        }
        if let Some(viewport) = self.viewport {
            backend.resize(viewport);
        }
        self.backend = Some(backend);
        if self.initialized_once {
            log::info!("cloud hero resources rebuilt after context restore");
            self.emit(HeroEvent::ContextRestored);
        } else {
            self.initialized_once = true;
            self.emit(HeroEvent::Initialized);
        }
        self.settle();
    }

    pub fn pause(&mut self) {
        self.pause.explicit = true;
        self.settle();
    }

    pub fn resume(&mut self) {
        self.pause.explicit = false;
        self.settle();
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.pause.hidden = hidden;
        self.settle();
    }

    /// Host reduced-motion preference; `reducedMotion` in the options forces it on.
    pub fn set_reduced_motion(&mut self, preferred: bool) {
        self.reduced_motion_pref = preferred;
    }

    pub fn reduced_motion(&self) -> bool {
        self.options.reduced_motion || self.reduced_motion_pref
    }

    /// The graphics context went away: all GPU resources are invalid.
    pub fn context_lost(&mut self) {
        if matches!(
            self.state,
            LifecycleState::Uninitialized | LifecycleState::Disposed
        ) || self.pause.context_lost
        {
            return;
        }
        log::warn!("graphics context lost; rendering suspended");
        self.pause.context_lost = true;
        self.cancel_frame();
        self.clock.stop();
        // handles into a dead context; drop without freeing
        self.backend = None;
        self.transition(LifecycleState::Paused);
        self.emit(HeroEvent::ContextLost);
    }

    /// Returns true when the caller should rebuild the backend and pass it to
    /// [`Self::complete_initialize`].
    pub fn context_restored(&mut self) -> bool {
        if self.state == LifecycleState::Disposed || !self.pause.context_lost {
            return false;
        }
        self.pause.context_lost = false;
        self.transition(LifecycleState::Initializing);
        true
    }

    /// Mark the surface size dirty. Any number of requests before the next
    /// [`Self::flush_resize`] collapse into one measurement.
    pub fn request_resize(&mut self) {
        if self.state != LifecycleState::Disposed {
            self.resize_pending = true;
        }
    }

    pub fn resize_pending(&self) -> bool {
        self.resize_pending
    }

    /// Apply a pending resize, measuring the surface through `measure` only
    /// when one was requested. Returns whether a measurement was taken.
    pub fn flush_resize(&mut self, measure: impl FnOnce() -> Viewport) -> bool {
        if !std::mem::take(&mut self.resize_pending) || self.state == LifecycleState::Disposed {
            return false;
        }
        self.resize(measure());
        true
    }

    /// Apply a new surface size. Zero-area sizes suspend drawing until the
    /// next valid size arrives.
    pub fn resize(&mut self, viewport: Viewport) {
        self.resize_pending = false;
        if self.state == LifecycleState::Disposed {
            return;
        }
        if viewport.is_empty() {
            if self.viewport.take().is_some() {
                log::debug!("zero-size viewport; drawing suspended");
            }
            return;
        }
        if self.viewport == Some(viewport) {
            return;
        }
        self.viewport = Some(viewport);
        if let Some(backend) = self.backend.as_mut() {
            backend.resize(viewport);
        }
    }

    pub fn set_scroll_progress(&mut self, progress: f32, direction: ScrollDirection) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        let signal = self.scroll.set_progress(progress, direction);
        self.emit_transition(signal);
    }

    /// Nudge the raw scroll input by `delta`; positive scrolls forward.
    pub fn step_scroll(&mut self, delta: f32) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        let signal = self.scroll.step(delta);
        self.emit_transition(signal);
    }

    /// Swap in a loaded noise image. Kept for re-upload after a context restore.
    pub fn install_noise_texture(&mut self, image: NoiseImage) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        if let Some(backend) = self.backend.as_mut() {
            backend.upload_noise(&image);
        }
        self.noise = Some(image);
    }

    /// Host frame callback. Stale callbacks (cancelled, or arriving after
    /// pause/dispose) are ignored.
    pub fn on_frame(&mut self, now_ms: f64) {
        if self.pending_frame.take().is_none() || self.state != LifecycleState::Running {
            return;
        }
        let scale = if self.reduced_motion() {
            REDUCED_MOTION_TIME_SCALE
        } else {
            1.0
        };
        self.clock.tick(now_ms, scale);
        self.draw();
        if self.state == LifecycleState::Running {
            self.schedule_frame();
        }
    }

    /// Terminal. Safe to call repeatedly; only the first call frees anything.
    pub fn dispose(&mut self) {
        if self.state == LifecycleState::Disposed {
            return;
        }
        self.release();
        self.transition(LifecycleState::Disposed);
    }

    pub fn drain_events(&mut self) -> SmallVec<[HeroEvent; 4]> {
        std::mem::take(&mut self.events)
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn options(&self) -> &HeroOptions {
        &self.options
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn elapsed_sec(&self) -> f64 {
        self.clock.elapsed_sec()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn scroll_progress(&self) -> f32 {
        self.scroll.progress()
    }

    /// Raw scroll input as last reported, before easing.
    pub fn scroll_input(&self) -> f32 {
        self.scroll.raw_progress()
    }

    pub fn fade(&self) -> f32 {
        self.scroll.fade()
    }

    pub fn camera(&self) -> CameraPose {
        self.scroll.camera()
    }

    /// Opacity the host must apply to the drawing surface itself; 1.0 when
    /// the shader already composites the fade.
    pub fn host_opacity(&self) -> f32 {
        match &self.backend {
            Some(backend) if backend.supports_alpha() => 1.0,
            _ => self.scroll.fade(),
        }
    }

    /// Inputs the next frame would be drawn with.
    pub fn frame_inputs(&self) -> FrameInputs {
        let viewport = self.viewport.unwrap_or(Viewport::new(1, 1));
        FrameInputs {
            time: self.clock.elapsed_sec() as f32,
            resolution: Vec2::new(viewport.width as f32, viewport.height as f32),
            camera: self.scroll.camera(),
            fade: self.scroll.fade(),
            sun_direction: self.options.sun(),
            march: self.options.march(),
            primitive: self.options.primitive(),
        }
    }
}

impl<B: RenderBackend, S: FrameScheduler> Controller<B, S> {
    fn draw(&mut self) {
        if self.viewport.is_none() {
            return;
        }
        let mut inputs = self.frame_inputs();
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        if !backend.supports_alpha() {
            inputs.fade = 1.0;
        }
        let uniforms = match CloudUniforms::pack(&inputs) {
            Ok(uniforms) => uniforms,
            Err(e) => {
                log::debug!("frame skipped: {e}");
                return;
            }
        };
        backend.set_uniforms(&uniforms);
        let mut lost = false;
        match backend.draw() {
            Ok(()) => self.frames_drawn += 1,
            Err(RenderError::Lost) => lost = true,
            Err(RenderError::Outdated) => {
                if let Some(viewport) = self.viewport {
                    backend.resize(viewport);
                }
            }
            Err(e) => log::warn!("frame skipped: {e}"),
        }
        if lost {
            self.context_lost();
        }
    }

    /// Move between running and paused according to the pause reasons.
    fn settle(&mut self) {
        match self.state {
            LifecycleState::Uninitialized | LifecycleState::Disposed => return,
            LifecycleState::Initializing if self.backend.is_none() => return,
            _ => {}
        }
        if self.pause.any() {
            if self.state != LifecycleState::Paused {
                self.cancel_frame();
                self.clock.stop();
                self.transition(LifecycleState::Paused);
            }
        } else if self.state != LifecycleState::Running {
            self.clock.start();
            self.transition(LifecycleState::Running);
            self.schedule_frame();
        }
    }

    fn schedule_frame(&mut self) {
        if self.pending_frame.is_some() {
            return;
        }
        self.pending_frame = self.scheduler.request_frame();
        if self.pending_frame.is_none() {
            log::warn!("frame scheduler unavailable; render loop stalled");
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel_frame(handle);
        }
    }

    fn release(&mut self) {
        self.cancel_frame();
        self.clock.stop();
        if let Some(mut backend) = self.backend.take() {
            backend.dispose();
        }
    }

    fn transition(&mut self, next: LifecycleState) {
        if self.state != next {
            log::debug!("lifecycle {} -> {}", self.state.as_str(), next.as_str());
            self.state = next;
        }
    }

    fn emit(&mut self, event: HeroEvent) {
        self.events.push(event);
    }

    fn emit_transition(&mut self, signal: Option<TransitionSignal>) {
        match signal {
            Some(TransitionSignal::Complete) => self.emit(HeroEvent::TransitionComplete),
            Some(TransitionSignal::Reset) => self.emit(HeroEvent::TransitionReset),
            None => {}
        }
    }
}
