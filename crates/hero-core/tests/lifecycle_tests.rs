// Controller state machine driven by a recording backend and a manual
// frame scheduler, no graphics device needed.

use hero_core::error::{InitError, RenderError};
use hero_core::lifecycle::{Controller, FrameHandle, FrameScheduler, LifecycleState, RenderBackend};
use hero_core::{CloudUniforms, HeroEvent, HeroOptions, NoiseImage, ScrollDirection, Viewport};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct BackendLog {
    builds: u32,
    disposes: u32,
    draws: u32,
    draw_attempts: u32,
    device_lost: bool,
    resizes: Vec<Viewport>,
    uploads: Vec<(u32, u32)>,
    uniforms: Vec<CloudUniforms>,
    next_draw_error: Option<RenderError>,
}

type SharedLog = Rc<RefCell<BackendLog>>;

struct FakeBackend {
    log: SharedLog,
    alpha: bool,
}

impl FakeBackend {
    fn build(log: &SharedLog) -> Self {
        log.borrow_mut().builds += 1;
        Self {
            log: log.clone(),
            alpha: true,
        }
    }
}

impl RenderBackend for FakeBackend {
    fn resize(&mut self, viewport: Viewport) {
        self.log.borrow_mut().resizes.push(viewport);
    }

    fn upload_noise(&mut self, image: &NoiseImage) {
        self.log.borrow_mut().uploads.push((image.width(), image.height()));
    }

    fn set_uniforms(&mut self, uniforms: &CloudUniforms) {
        self.log.borrow_mut().uniforms.push(*uniforms);
    }

    fn draw(&mut self) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        log.draw_attempts += 1;
        if log.device_lost {
            return Err(RenderError::Lost);
        }
        if let Some(err) = log.next_draw_error.take() {
            return Err(err);
        }
        log.draws += 1;
        Ok(())
    }

    fn supports_alpha(&self) -> bool {
        self.alpha
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().disposes += 1;
    }
}

#[derive(Default)]
struct ManualScheduler {
    next_id: i32,
    requested: u32,
    cancelled: Vec<FrameHandle>,
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        self.next_id += 1;
        self.requested += 1;
        Some(FrameHandle(self.next_id))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.cancelled.push(handle);
    }
}

type TestController = Controller<FakeBackend, ManualScheduler>;

fn viewport() -> Viewport {
    Viewport::new(800, 600)
}

fn running(log: &SharedLog) -> TestController {
    let mut ctl = Controller::new(ManualScheduler::default());
    ctl.begin_initialize(HeroOptions::default(), viewport()).expect("begin");
    ctl.complete_initialize(Ok(FakeBackend::build(log)));
    ctl
}

fn events(ctl: &mut TestController) -> Vec<HeroEvent> {
    ctl.drain_events().into_iter().collect()
}

#[test]
fn initialize_reaches_running_and_schedules_a_frame() {
    let log = SharedLog::default();
    let mut ctl = Controller::new(ManualScheduler::default());
    assert_eq!(ctl.state(), LifecycleState::Uninitialized);

    ctl.begin_initialize(HeroOptions::default(), viewport()).unwrap();
    assert_eq!(ctl.state(), LifecycleState::Initializing);
    assert_eq!(ctl.scheduler().requested, 0);

    ctl.complete_initialize(Ok(FakeBackend::build(&log)));
    assert_eq!(ctl.state(), LifecycleState::Running);
    assert_eq!(ctl.scheduler().requested, 1);
    assert_eq!(log.borrow().resizes, vec![viewport()]);
    assert_eq!(events(&mut ctl), vec![HeroEvent::Initialized]);
}

#[test]
fn frames_upload_uniforms_before_each_draw() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.on_frame(1000.0);
    ctl.on_frame(1016.0);
    let log = log.borrow();
    assert_eq!(log.draws, 2);
    assert_eq!(log.uniforms.len(), 2);
    assert_eq!(log.uniforms[0].resolution, [800.0, 600.0]);
    assert!(log.uniforms[1].time > log.uniforms[0].time);
    assert_eq!(ctl.frames_drawn(), 2);
}

#[test]
fn missing_container_reports_failure_without_panicking() {
    let mut ctl: TestController = Controller::new(ManualScheduler::default());
    ctl.fail_initialize(InitError::MissingContainer);
    assert_eq!(ctl.state(), LifecycleState::Disposed);
    assert_eq!(
        events(&mut ctl),
        vec![HeroEvent::InitializationFailed(InitError::MissingContainer)]
    );
    // later calls are inert
    ctl.resume();
    ctl.on_frame(16.0);
    assert_eq!(ctl.state(), LifecycleState::Disposed);
}

#[test]
fn zero_size_container_fails_initialization() {
    let mut ctl: TestController = Controller::new(ManualScheduler::default());
    let err = ctl
        .begin_initialize(HeroOptions::default(), Viewport::new(0, 400))
        .unwrap_err();
    assert_eq!(err, InitError::EmptyContainer);
    assert_eq!(ctl.state(), LifecycleState::Disposed);
    assert_eq!(
        events(&mut ctl),
        vec![HeroEvent::InitializationFailed(InitError::EmptyContainer)]
    );
}

#[test]
fn backend_failure_disposes_the_instance() {
    let mut ctl: TestController = Controller::new(ManualScheduler::default());
    ctl.begin_initialize(HeroOptions::default(), viewport()).unwrap();
    ctl.complete_initialize(Err(InitError::ShaderCompile("bad token".into())));
    assert_eq!(ctl.state(), LifecycleState::Disposed);
    assert_eq!(ctl.scheduler().requested, 0);
    let evs = events(&mut ctl);
    assert!(matches!(
        evs.as_slice(),
        [HeroEvent::InitializationFailed(InitError::ShaderCompile(_))]
    ));
}

#[test]
fn second_initialize_is_rejected() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    assert_eq!(
        ctl.begin_initialize(HeroOptions::default(), viewport()),
        Err(InitError::AlreadyInitialized)
    );
    ctl.dispose();
    assert_eq!(
        ctl.begin_initialize(HeroOptions::default(), viewport()),
        Err(InitError::Disposed)
    );
}

#[test]
fn pause_cancels_pending_frame_and_stops_drawing() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.pause();
    assert_eq!(ctl.state(), LifecycleState::Paused);
    assert_eq!(ctl.scheduler().cancelled, vec![FrameHandle(1)]);

    // a callback that was already in flight must not draw
    ctl.on_frame(1000.0);
    assert_eq!(log.borrow().draws, 0);
}

#[test]
fn resume_does_not_count_paused_wall_time() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.on_frame(0.0);
    for i in 1..=10 {
        ctl.on_frame(i as f64 * 16.0);
    }
    let before = ctl.elapsed_sec();
    assert!((before - 0.16).abs() < 1e-9);

    ctl.pause();
    ctl.resume();
    assert_eq!(ctl.state(), LifecycleState::Running);
    // an hour later
    ctl.on_frame(3_600_000.0);
    ctl.on_frame(3_600_016.0);
    let after = ctl.elapsed_sec();
    assert!((after - before - 0.016).abs() < 1e-9, "{before} -> {after}");
}

#[test]
fn long_frame_gaps_are_clamped() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.on_frame(0.0);
    ctl.on_frame(5000.0);
    assert!((ctl.elapsed_sec() - 0.1).abs() < 1e-9);
}

#[test]
fn hidden_and_explicit_pause_are_independent() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.pause();
    ctl.set_hidden(true);
    ctl.set_hidden(false);
    assert_eq!(ctl.state(), LifecycleState::Paused);
    ctl.set_hidden(true);
    ctl.resume();
    assert_eq!(ctl.state(), LifecycleState::Paused);
    ctl.set_hidden(false);
    assert_eq!(ctl.state(), LifecycleState::Running);
}

#[test]
fn dispose_twice_frees_once_and_blocks_frames() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.dispose();
    ctl.dispose();
    assert_eq!(ctl.state(), LifecycleState::Disposed);
    assert_eq!(log.borrow().disposes, 1);
    assert_eq!(ctl.scheduler().cancelled, vec![FrameHandle(1)]);

    ctl.on_frame(16.0);
    ctl.resume();
    ctl.set_hidden(false);
    ctl.set_scroll_progress(1.0, ScrollDirection::Forward);
    assert_eq!(log.borrow().draws, 0);
    assert_eq!(ctl.scheduler().requested, 1);
    assert!(events(&mut ctl)
        .iter()
        .all(|e| *e != HeroEvent::TransitionComplete));
}

#[test]
fn backend_arriving_after_dispose_is_released() {
    let log = SharedLog::default();
    let mut ctl: TestController = Controller::new(ManualScheduler::default());
    ctl.begin_initialize(HeroOptions::default(), viewport()).unwrap();
    ctl.dispose();
    ctl.complete_initialize(Ok(FakeBackend::build(&log)));
    assert_eq!(ctl.state(), LifecycleState::Disposed);
    assert_eq!(log.borrow().disposes, 1);
    assert!(ctl.backend().is_none());
}

#[test]
fn context_loss_then_restore_rebuilds_resources() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.install_noise_texture(NoiseImage::synthesize(64, 7));
    events(&mut ctl);

    ctl.context_lost();
    assert_eq!(ctl.state(), LifecycleState::Paused);
    assert!(ctl.backend().is_none());
    // dead context: nothing is freed through it
    assert_eq!(log.borrow().disposes, 0);
    ctl.on_frame(100.0);
    assert_eq!(log.borrow().draws, 0);

    assert!(ctl.context_restored());
    assert_eq!(ctl.state(), LifecycleState::Initializing);
    ctl.complete_initialize(Ok(FakeBackend::build(&log)));
    assert_eq!(ctl.state(), LifecycleState::Running);
    assert!(ctl.backend().is_some());
    {
        let log = log.borrow();
        assert_eq!(log.builds, 2);
        // loaded texture is re-uploaded into the new context
        assert_eq!(log.uploads, vec![(64, 64), (64, 64)]);
    }
    assert_eq!(
        events(&mut ctl),
        vec![HeroEvent::ContextLost, HeroEvent::ContextRestored]
    );

    ctl.on_frame(200.0);
    assert_eq!(log.borrow().draws, 1);
}

#[test]
fn restore_without_loss_is_ignored() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    assert!(!ctl.context_restored());
    assert_eq!(ctl.state(), LifecycleState::Running);
}

#[test]
fn lost_draw_enters_context_loss() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    log.borrow_mut().next_draw_error = Some(RenderError::Lost);
    ctl.on_frame(16.0);
    assert_eq!(ctl.state(), LifecycleState::Paused);
    assert_eq!(events(&mut ctl).last(), Some(&HeroEvent::ContextLost));
    // no retry loop
    assert_eq!(ctl.scheduler().requested, 1);
}

#[test]
fn lost_device_is_not_drawn_to_until_rebuilt() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    log.borrow_mut().device_lost = true;
    for i in 1..=10 {
        ctl.on_frame(i as f64 * 16.0);
    }
    assert_eq!(log.borrow().draw_attempts, 1);
    assert_eq!(ctl.state(), LifecycleState::Paused);

    // no restore event on this path; the front-end rebuilds right away
    assert!(ctl.context_restored());
    log.borrow_mut().device_lost = false;
    ctl.complete_initialize(Ok(FakeBackend::build(&log)));
    ctl.on_frame(200.0);
    let log = log.borrow();
    assert_eq!(log.draws, 1);
    assert_eq!(log.draw_attempts, 2);
}

#[test]
fn transient_draw_errors_keep_the_loop_alive() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    log.borrow_mut().next_draw_error = Some(RenderError::Timeout);
    ctl.on_frame(16.0);
    assert_eq!(ctl.state(), LifecycleState::Running);
    assert_eq!(ctl.scheduler().requested, 2);
    ctl.on_frame(32.0);
    assert_eq!(log.borrow().draws, 1);
}

#[test]
fn resize_to_zero_suspends_until_valid_size() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.resize(Viewport::new(0, 0));
    ctl.on_frame(16.0);
    assert_eq!(log.borrow().draws, 0);
    assert_eq!(ctl.state(), LifecycleState::Running);

    ctl.resize(Viewport::new(1024, 768));
    ctl.on_frame(32.0);
    let log = log.borrow();
    assert_eq!(log.draws, 1);
    assert_eq!(log.builds, 1);
    assert_eq!(log.resizes, vec![viewport(), Viewport::new(1024, 768)]);
    assert_eq!(log.uniforms.last().map(|u| u.resolution), Some([1024.0, 768.0]));
}

#[test]
fn resize_requests_coalesce_into_one_measurement() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    for _ in 0..5 {
        ctl.request_resize();
    }
    assert!(ctl.resize_pending());

    let mut measured = 0;
    let flushed = ctl.flush_resize(|| {
        measured += 1;
        Viewport::new(1280, 720)
    });
    assert!(flushed);
    assert_eq!(measured, 1);
    assert!(!ctl.flush_resize(|| unreachable!("nothing pending")));
    assert_eq!(log.borrow().resizes, vec![viewport(), Viewport::new(1280, 720)]);
}

#[test]
fn direct_resize_clears_a_pending_request() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.request_resize();
    ctl.resize(Viewport::new(640, 480));
    assert!(!ctl.resize_pending());
    assert!(!ctl.flush_resize(|| unreachable!("already applied")));
    assert_eq!(log.borrow().resizes.len(), 2);
}

#[test]
fn resize_requests_after_dispose_are_dropped() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.request_resize();
    ctl.dispose();
    ctl.request_resize();
    assert!(!ctl.flush_resize(|| unreachable!("disposed")));
    assert_eq!(log.borrow().resizes.len(), 1);
}

#[test]
fn same_size_resize_is_a_no_op() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.resize(viewport());
    assert_eq!(log.borrow().resizes.len(), 1);
}

#[test]
fn transition_complete_fires_once_per_crossing() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    events(&mut ctl);
    ctl.set_scroll_progress(1.0, ScrollDirection::Forward);
    ctl.set_scroll_progress(1.0, ScrollDirection::Forward);
    assert_eq!(events(&mut ctl), vec![HeroEvent::TransitionComplete]);
    assert_eq!(ctl.fade(), 0.0);

    ctl.set_scroll_progress(0.0, ScrollDirection::Backward);
    assert_eq!(events(&mut ctl), vec![HeroEvent::TransitionReset]);
    assert_eq!(ctl.fade(), 1.0);
    assert_eq!(ctl.camera(), hero_core::CameraPose::default());

    ctl.set_scroll_progress(1.0, ScrollDirection::Forward);
    assert_eq!(events(&mut ctl), vec![HeroEvent::TransitionComplete]);
}

#[test]
fn stepped_scroll_undoes_a_completed_transition() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    events(&mut ctl);
    for _ in 0..40 {
        ctl.step_scroll(0.05);
    }
    assert_eq!(ctl.scroll_input(), 1.0);
    assert_eq!(events(&mut ctl), vec![HeroEvent::TransitionComplete]);

    for _ in 0..25 {
        ctl.step_scroll(-0.05);
    }
    assert_eq!(ctl.scroll_input(), 0.0);
    assert_eq!(ctl.fade(), 1.0);
    assert_eq!(events(&mut ctl), vec![HeroEvent::TransitionReset]);
}

#[test]
fn reduced_motion_freezes_time_but_not_scroll() {
    let log = SharedLog::default();
    let mut ctl = running(&log);
    ctl.set_reduced_motion(true);
    ctl.on_frame(0.0);
    ctl.on_frame(16.0);
    ctl.on_frame(32.0);
    assert_eq!(ctl.elapsed_sec(), 0.0);

    ctl.set_scroll_progress(0.3, ScrollDirection::Forward);
    ctl.on_frame(48.0);
    let log = log.borrow();
    let last = log.uniforms.last().copied().unwrap();
    assert!(last.camera[2] < 0.0);
    assert!(last.fade < 1.0);
}

#[test]
fn reduced_motion_option_overrides_host_preference() {
    let log = SharedLog::default();
    let mut ctl: TestController = Controller::new(ManualScheduler::default());
    let options = HeroOptions {
        reduced_motion: true,
        ..HeroOptions::default()
    };
    ctl.begin_initialize(options, viewport()).unwrap();
    ctl.complete_initialize(Ok(FakeBackend::build(&log)));
    ctl.set_reduced_motion(false);
    assert!(ctl.reduced_motion());
}

#[test]
fn opaque_surface_moves_fade_to_the_host() {
    let log = SharedLog::default();
    let mut ctl: TestController = Controller::new(ManualScheduler::default());
    ctl.begin_initialize(HeroOptions::default(), viewport()).unwrap();
    let mut backend = FakeBackend::build(&log);
    backend.alpha = false;
    ctl.complete_initialize(Ok(backend));

    ctl.set_scroll_progress(0.3, ScrollDirection::Forward);
    ctl.on_frame(16.0);
    assert_eq!(log.borrow().uniforms[0].fade, 1.0);
    assert!((ctl.host_opacity() - 0.5).abs() < 1e-6);
}

#[test]
fn texture_installed_before_backend_is_uploaded_on_attach() {
    let log = SharedLog::default();
    let mut ctl: TestController = Controller::new(ManualScheduler::default());
    ctl.begin_initialize(HeroOptions::default(), viewport()).unwrap();
    ctl.install_noise_texture(NoiseImage::synthesize(32, 1));
    ctl.complete_initialize(Ok(FakeBackend::build(&log)));
    assert_eq!(log.borrow().uploads, vec![(32, 32)]);
}

#[test]
fn options_feed_the_uniform_block() {
    let log = SharedLog::default();
    let mut ctl: TestController = Controller::new(ManualScheduler::default());
    let options = HeroOptions::from_json(r#"{"maxSteps": 48, "marchSize": 0.12, "morph": true}"#)
        .unwrap();
    ctl.begin_initialize(options, viewport()).unwrap();
    ctl.complete_initialize(Ok(FakeBackend::build(&log)));
    ctl.on_frame(0.0);
    let u = log.borrow().uniforms[0];
    assert_eq!(u.march[0], 48.0);
    assert_eq!(u.march[1], 1.0);
    assert!((u.sun[3] - 0.12).abs() < 1e-6);
}
