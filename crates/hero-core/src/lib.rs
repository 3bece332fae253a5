pub mod camera;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod lifecycle;
pub mod lighting;
pub mod march;
pub mod noise;
pub mod render;
pub mod scene;
pub mod scroll;
pub mod sky;
pub mod uniforms;
pub mod viewport;

pub static CLOUDS_WGSL: &str = include_str!("../shaders/clouds.wgsl");

pub use camera::CameraPose;
pub use config::HeroOptions;
pub use error::*;
pub use events::HeroEvent;
#[cfg(feature = "gpu")]
pub use gpu::GpuState;
pub use lifecycle::{Controller, FrameHandle, FrameScheduler, LifecycleState, RenderBackend};
pub use noise::NoiseImage;
pub use render::render_rgba8;
pub use scroll::{ScrollDirection, ScrollPolicy};
pub use uniforms::{CloudUniforms, FrameInputs, MarchSettings};
pub use viewport::Viewport;
