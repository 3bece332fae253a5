//! Signed distance primitives and the volumetric density field.

use crate::constants::*;
use crate::noise::{fbm, NoiseImage};
use glam::{Vec2, Vec3, Vec4};

pub fn sd_sphere(p: Vec3, radius: f32) -> f32 {
    p.length() - radius
}

/// Torus around the view axis, facing the camera.
pub fn sd_torus(p: Vec3, radii: Vec2) -> f32 {
    let q = Vec2::new(Vec2::new(p.x, p.y).length() - radii.x, p.z);
    q.length() - radii.y
}

pub fn sd_box(p: Vec3, half: Vec3) -> f32 {
    let q = p.abs() - half;
    q.max(Vec3::ZERO).length() + q.max_element().min(0.0)
}

/// Three bounded bars through the origin.
pub fn sd_cross(p: Vec3) -> f32 {
    let (long, thin) = (CROSS_ARM[0], CROSS_ARM[1]);
    let a = sd_box(p, Vec3::new(long, thin, thin));
    let b = sd_box(p, Vec3::new(thin, long, thin));
    let c = sd_box(p, Vec3::new(thin, thin, long));
    a.min(b.min(c))
}

pub fn sd_capsule(p: Vec3, a: Vec3, b: Vec3, radius: f32) -> f32 {
    let pa = p - a;
    let ba = b - a;
    let h = (pa.dot(ba) / ba.dot(ba)).clamp(0.0, 1.0);
    (pa - ba * h).length() - radius
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Blend weights for sphere, torus, cross, capsule at `time`.
///
/// The cycle is split into four slots; each slot holds one shape for
/// `MORPH_HOLD` of its length, then eases into the next. Weights sum to 1.
pub fn morph_weights(time: f32) -> Vec4 {
    let cycle = time / MORPH_PERIOD_SEC;
    let phase = (cycle - cycle.floor()) * 4.0;
    let idx = phase.floor().min(3.0);
    let next = (idx + 1.0) % 4.0;
    let blend = smoothstep(MORPH_HOLD, 1.0, phase - idx);
    let mut w = [0.0f32; 4];
    w[idx as usize] += 1.0 - blend;
    w[next as usize] += blend;
    Vec4::from(w)
}

/// Which distance function drives the density field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Primitive {
    #[default]
    Sphere,
    /// Time-keyed blend of sphere, torus, cross and capsule.
    Morph,
}

pub fn base_distance(p: Vec3, primitive: Primitive, time: f32) -> f32 {
    match primitive {
        Primitive::Sphere => sd_sphere(p, SPHERE_RADIUS),
        Primitive::Morph => {
            let w = morph_weights(time);
            let cap = Vec3::new(CAPSULE_HALF_LENGTH, 0.0, 0.0);
            w.x * sd_sphere(p, SPHERE_RADIUS)
                + w.y * sd_torus(p, Vec2::from(TORUS_RADII))
                + w.z * sd_cross(p)
                + w.w * sd_capsule(p, -cap, cap, CAPSULE_RADIUS)
        }
    }
}

/// Density field: positive inside the noise-perturbed primitive.
///
/// Both the march loop and the light probe call this; they must stay the
/// same function or the lighting term picks up seams.
pub fn density(image: &NoiseImage, p: Vec3, time: f32, primitive: Primitive) -> f32 {
    -base_distance(p, primitive, time) + fbm(image, p, time)
}
