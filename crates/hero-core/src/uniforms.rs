//! Per-frame shader inputs and their GPU layout.

use crate::camera::CameraPose;
use crate::constants::*;
use crate::error::UniformError;
use crate::scene::Primitive;
use glam::{Vec2, Vec3};

/// Step budget for the volume march.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarchSettings {
    pub max_steps: u32,
    pub step_size: f32,
}

impl Default for MarchSettings {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            step_size: DEFAULT_MARCH_SIZE,
        }
    }
}

/// Everything one frame of the cloud pass depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInputs {
    pub time: f32,
    pub resolution: Vec2,
    pub camera: CameraPose,
    pub fade: f32,
    pub sun_direction: Vec3,
    pub march: MarchSettings,
    pub primitive: Primitive,
}

impl Default for FrameInputs {
    fn default() -> Self {
        Self {
            time: 0.0,
            resolution: Vec2::ONE,
            camera: CameraPose::default(),
            fade: 1.0,
            sun_direction: Vec3::from(DEFAULT_SUN_DIRECTION),
            march: MarchSettings::default(),
            primitive: Primitive::Sphere,
        }
    }
}

impl FrameInputs {
    pub fn sun(&self) -> Vec3 {
        self.sun_direction.normalize_or_zero()
    }
}

/// Uniform block bound at `@group(0) @binding(0)` of `clouds.wgsl`.
///
/// Field order and sizes match `struct CloudUniforms` in the shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CloudUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub fade: f32,
    /// xyz: eye offset, w: fov scale
    pub camera: [f32; 4],
    /// xyz: sun direction, w: march step size
    pub sun: [f32; 4],
    /// x: max steps, y: morph flag, zw: unused
    pub march: [f32; 4],
}

impl CloudUniforms {
    pub fn pack(inputs: &FrameInputs) -> Result<Self, UniformError> {
        let res = inputs.resolution;
        if !(res.x > 0.0 && res.y > 0.0) || !res.is_finite() {
            return Err(UniformError::InvalidResolution(res.x, res.y));
        }
        let cam = inputs.camera;
        let sun = inputs.sun();
        let morph = match inputs.primitive {
            Primitive::Sphere => 0.0,
            Primitive::Morph => 1.0,
        };
        Ok(Self {
            resolution: res.to_array(),
            time: inputs.time,
            fade: inputs.fade.clamp(0.0, 1.0),
            camera: [cam.offset.x, cam.offset.y, cam.offset.z, cam.fov_scale],
            sun: [sun.x, sun.y, sun.z, inputs.march.step_size],
            march: [
                inputs.march.max_steps.min(MAX_STEPS_LIMIT) as f32,
                morph,
                0.0,
                0.0,
            ],
        })
    }
}
