//! Fixed-stride volume march.
//!
//! Density has no surface to jump to, so the ray advances by a constant
//! stride and accumulates premultiplied color front to back:
//! `acc = sample * (1 - acc.a) + acc`. The loop ends after `max_steps`
//! steps or once the accumulated alpha is effectively opaque.

use crate::constants::*;
use crate::lighting::{diffuse, light_color};
use crate::noise::NoiseImage;
use crate::scene::{density, Primitive};
use crate::uniforms::MarchSettings;
use glam::{Vec3, Vec4};

/// Premultiplied color contributed by one step with the given density.
pub fn step_sample(density: f32, diffuse: f32) -> Vec4 {
    let alpha = density.clamp(0.0, 1.0);
    let albedo = Vec3::ONE.lerp(Vec3::ZERO, alpha);
    let rgb = albedo * light_color(diffuse) * alpha;
    rgb.extend(alpha)
}

/// Front-to-back "over" accumulation.
#[inline]
pub fn accumulate(acc: Vec4, sample: Vec4) -> Vec4 {
    sample * (1.0 - acc.w) + acc
}

pub fn raymarch(
    image: &NoiseImage,
    ro: Vec3,
    rd: Vec3,
    sun: Vec3,
    time: f32,
    primitive: Primitive,
    march: MarchSettings,
) -> Vec4 {
    let steps = march.max_steps.min(MAX_STEPS_LIMIT);
    let mut depth = 0.0;
    let mut acc = Vec4::ZERO;
    for _ in 0..steps {
        if acc.w >= OPAQUE_ALPHA {
            break;
        }
        let p = ro + depth * rd;
        let d = density(image, p, time, primitive);
        if d > 0.0 {
            let dif = diffuse(image, p, d, sun, time, primitive);
            acc = accumulate(acc, step_sample(d, dif));
        }
        depth += march.step_size;
    }
    acc
}
