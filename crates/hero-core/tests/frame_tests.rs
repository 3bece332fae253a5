use glam::{Vec2, Vec3};
use hero_core::camera::CameraPose;
use hero_core::clock::AnimationClock;
use hero_core::error::{InitError, UniformError};
use hero_core::events::HeroEvent;
use hero_core::scene::Primitive;
use hero_core::uniforms::{CloudUniforms, FrameInputs, MarchSettings};
use hero_core::viewport::{clamp_pixel_ratio, Viewport};

#[test]
fn uniform_block_is_sixty_four_bytes() {
    assert_eq!(std::mem::size_of::<CloudUniforms>(), 64);
    assert_eq!(std::mem::offset_of!(CloudUniforms, camera), 16);
    assert_eq!(std::mem::offset_of!(CloudUniforms, sun), 32);
    assert_eq!(std::mem::offset_of!(CloudUniforms, march), 48);
}

#[test]
fn pack_rejects_degenerate_resolution() {
    for res in [
        Vec2::new(0.0, 600.0),
        Vec2::new(800.0, -1.0),
        Vec2::new(f32::NAN, 600.0),
        Vec2::new(f32::INFINITY, 600.0),
    ] {
        let inputs = FrameInputs {
            resolution: res,
            ..FrameInputs::default()
        };
        assert!(matches!(
            CloudUniforms::pack(&inputs),
            Err(UniformError::InvalidResolution(..))
        ));
    }
}

#[test]
fn pack_lays_out_every_field() {
    let inputs = FrameInputs {
        time: 12.5,
        resolution: Vec2::new(1280.0, 720.0),
        camera: CameraPose {
            offset: Vec3::new(0.0, 0.0, -1.0),
            fov_scale: 1.2,
        },
        fade: 1.7,
        sun_direction: Vec3::new(0.0, 3.0, 0.0),
        march: MarchSettings {
            max_steps: 900,
            step_size: 0.05,
        },
        primitive: Primitive::Morph,
    };
    let u = CloudUniforms::pack(&inputs).unwrap();
    assert_eq!(u.resolution, [1280.0, 720.0]);
    assert_eq!(u.time, 12.5);
    assert_eq!(u.fade, 1.0);
    assert_eq!(u.camera, [0.0, 0.0, -1.0, 1.2]);
    assert_eq!(u.sun, [0.0, 1.0, 0.0, 0.05]);
    assert_eq!(u.march, [256.0, 1.0, 0.0, 0.0]);
}

#[test]
fn center_ray_looks_down_the_view_axis() {
    let pose = CameraPose::default();
    let (ro, rd) = pose.ray(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0));
    assert_eq!(ro, Vec3::new(0.0, 0.0, 5.0));
    assert_eq!(rd, Vec3::new(0.0, 0.0, -1.0));
}

#[test]
fn rays_are_aspect_corrected_and_widened() {
    let res = Vec2::new(800.0, 400.0);
    let (_, right) = CameraPose::default().ray(Vec2::new(800.0, 200.0), res);
    let (_, top) = CameraPose::default().ray(Vec2::new(400.0, 400.0), res);
    // half width is one unit at aspect 2, half height half a unit
    assert!((right.x / -right.z - 1.0).abs() < 1e-5);
    assert!((top.y / -top.z - 0.5).abs() < 1e-5);

    let wide = CameraPose {
        fov_scale: 2.0,
        ..CameraPose::default()
    };
    let (_, wide_right) = wide.ray(Vec2::new(800.0, 200.0), res);
    assert!(wide_right.x > right.x);
}

#[test]
fn viewport_caps_device_pixel_ratio() {
    assert_eq!(Viewport::from_css(800.0, 600.0, 3.0, 2.0), Viewport::new(1600, 1200));
    assert_eq!(Viewport::from_css(800.0, 600.0, 1.5, 2.0), Viewport::new(1200, 900));
    assert_eq!(Viewport::from_css(333.3, 10.0, 1.0, 2.0), Viewport::new(333, 10));
    assert!(Viewport::from_css(0.0, 600.0, 2.0, 2.0).is_empty());
    assert!(Viewport::from_css(-5.0, 600.0, 2.0, 2.0).is_empty());
    assert_eq!(clamp_pixel_ratio(f64::NAN, 2.0), 1.0);
    assert_eq!(clamp_pixel_ratio(3.0, 0.5), 1.0);
    assert_eq!(Viewport::new(1920, 1080).aspect(), 1920.0 / 1080.0);
}

#[test]
fn event_names_match_dom_types() {
    assert_eq!(HeroEvent::Initialized.name(), "initialized");
    assert_eq!(HeroEvent::TransitionComplete.name(), "transitionComplete");
    assert_eq!(HeroEvent::TransitionReset.name(), "transitionReset");
    assert_eq!(HeroEvent::ContextLost.name(), "contextLost");
    assert_eq!(HeroEvent::ContextRestored.name(), "contextRestored");
    let failed = HeroEvent::InitializationFailed(InitError::MissingContainer);
    assert_eq!(failed.name(), "initializationFailed");
    assert_eq!(failed.detail().as_deref(), Some("container element not found"));
    assert_eq!(
        failed.to_string(),
        "initializationFailed (container element not found)"
    );
    assert_eq!(HeroEvent::ContextLost.detail(), None);
}

#[test]
fn clock_rebases_after_start() {
    let mut clock = AnimationClock::default();
    assert_eq!(clock.tick(100.0, 1.0), 0.0);
    clock.start();
    assert!(clock.is_running());
    assert_eq!(clock.tick(1000.0, 1.0), 0.0);
    assert!((clock.tick(1020.0, 1.0) - 0.02).abs() < 1e-12);
    clock.stop();
    clock.start();
    assert_eq!(clock.tick(90_000.0, 1.0), 0.0);
    assert!((clock.elapsed_sec() - 0.02).abs() < 1e-12);
}

#[test]
fn clock_scale_and_backwards_timestamps() {
    let mut clock = AnimationClock::default();
    clock.start();
    clock.tick(0.0, 0.5);
    clock.tick(50.0, 0.5);
    assert!((clock.elapsed_sec() - 0.025).abs() < 1e-12);
    clock.tick(10.0, 1.0);
    assert!((clock.elapsed_sec() - 0.025).abs() < 1e-12);
}
