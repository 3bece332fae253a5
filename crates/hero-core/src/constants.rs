// Cloud volume and lifecycle tuning constants.
//
// Values mirrored in `shaders/clouds.wgsl` are marked; keep both sides in step.

// Raymarch loop. 100 steps of 0.08 scene units covers the 8 unit slab in
// front of the camera. Fewer steps or a longer stride trades softness for
// speed; more steps cost roughly linearly in fragment time.
pub const DEFAULT_MAX_STEPS: u32 = 100;
pub const DEFAULT_MARCH_SIZE: f32 = 0.08;
pub const MAX_STEPS_LIMIT: u32 = 256; // shader loop hard cap
pub const OPAQUE_ALPHA: f32 = 0.99; // shader: early exit threshold

// FBM (shader)
pub const FBM_OCTAVES: usize = 6;
pub const FBM_INITIAL_SCALE: f32 = 0.5;
pub const FBM_INITIAL_FACTOR: f32 = 2.02;
pub const FBM_FACTOR_STEP: f32 = 0.21;
pub const DRIFT_SPEED: f32 = 0.5;
pub const DRIFT_DIRECTION: [f32; 3] = [1.0, -0.2, -1.0];

// 3D lookup into the 2D noise image: texel offset per depth slice (shader)
pub const NOISE_SLICE_OFFSET: [f32; 2] = [37.0, 239.0];
pub const NOISE_TEXTURE_SIZE: u32 = 256;
pub const NOISE_TEXTURE_SEED: u64 = 0x00C1_0D5E;

// Lighting (shader)
pub const LIGHT_PROBE_DISTANCE: f32 = 0.3;
pub const AMBIENT_TINT: [f32; 3] = [0.60, 0.60, 0.75];
pub const AMBIENT_GAIN: f32 = 1.1;
pub const SUN_TINT: [f32; 3] = [1.0, 0.6, 0.3];
pub const SUN_GAIN: f32 = 0.8;
pub const DEFAULT_SUN_DIRECTION: [f32; 3] = [1.0, 0.0, 0.0];

// Sky (shader)
pub const SKY_BASE: [f32; 3] = [0.7, 0.7, 0.90];
pub const SKY_FALLOFF: [f32; 3] = [0.90, 0.75, 0.90];
pub const SKY_FALLOFF_GAIN: f32 = 0.8;
pub const GLOW_TINT: [f32; 3] = [1.0, 0.5, 0.3];
pub const GLOW_GAIN: f32 = 0.5;
pub const GLOW_EXPONENT: f32 = 10.0;

// Camera (shader)
pub const RAY_ORIGIN: [f32; 3] = [0.0, 0.0, 5.0];

// Primitive morph (shader)
pub const MORPH_PERIOD_SEC: f32 = 24.0;
pub const MORPH_HOLD: f32 = 0.75; // fraction of each slot spent on a single shape
pub const SPHERE_RADIUS: f32 = 1.0;
pub const TORUS_RADII: [f32; 2] = [0.9, 0.35];
pub const CROSS_ARM: [f32; 2] = [1.0, 0.3]; // half length, half thickness
pub const CAPSULE_HALF_LENGTH: f32 = 0.8;
pub const CAPSULE_RADIUS: f32 = 0.5;

// Viewport
pub const DEFAULT_PIXEL_RATIO_CAP: f64 = 2.0;
pub const MAX_PIXEL_RATIO_CAP: f64 = 4.0;

// Animation clock
pub const MAX_FRAME_DELTA_SEC: f64 = 0.1;
pub const REDUCED_MOTION_TIME_SCALE: f64 = 0.0;

// Scroll policy defaults
pub const SCROLL_FORWARD_SPAN: f32 = 0.6;
pub const SCROLL_STAGING_RANGE: f32 = 0.25;
pub const SCROLL_STAGING_OUTPUT: f32 = 0.1;
pub const SCROLL_RESISTANCE_EXPONENT: f32 = 3.0;
pub const CAMERA_TRAVEL: f32 = 2.5;
pub const FOV_GAIN: f32 = 0.35;

pub const DEFAULT_TEXTURE_PATH: &str = "/textures/noise.png";
