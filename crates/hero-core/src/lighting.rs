//! Directional-derivative diffuse term.
//!
//! Estimates how much light reaches `p` from the density drop along the sun
//! direction, using one extra density sample instead of a full gradient.
//! Only valid for a single directional light.

use crate::constants::*;
use crate::noise::NoiseImage;
use crate::scene::{density, Primitive};
use glam::Vec3;

/// `(density(p) - density(p + k * sun)) / k`, clamped to [0, 1].
///
/// `density_at_p` must be the value the march loop already computed at `p`.
pub fn diffuse(
    image: &NoiseImage,
    p: Vec3,
    density_at_p: f32,
    sun: Vec3,
    time: f32,
    primitive: Primitive,
) -> f32 {
    let k = LIGHT_PROBE_DISTANCE;
    let probe = density(image, p + k * sun, time, primitive);
    ((density_at_p - probe) / k).clamp(0.0, 1.0)
}

/// Ambient tint blended toward the sun tint by the diffuse amount.
pub fn light_color(diffuse: f32) -> Vec3 {
    Vec3::from(AMBIENT_TINT) * AMBIENT_GAIN + SUN_GAIN * Vec3::from(SUN_TINT) * diffuse
}
