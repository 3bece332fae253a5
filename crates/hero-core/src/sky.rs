use crate::constants::*;
use glam::{Vec3, Vec4};

/// Vertical gradient plus a glow around the sun.
pub fn sky_color(rd: Vec3, sun: Vec3) -> Vec3 {
    let mut color = Vec3::from(SKY_BASE);
    color -= SKY_FALLOFF_GAIN * Vec3::from(SKY_FALLOFF) * rd.y;
    let glow = sun.dot(rd).clamp(0.0, 1.0);
    color += GLOW_GAIN * Vec3::from(GLOW_TINT) * glow.powf(GLOW_EXPONENT);
    color
}

/// `sky * (1 - cloud.a) + cloud.rgb` with premultiplied cloud color.
pub fn composite(sky: Vec3, cloud: Vec4) -> Vec3 {
    sky * (1.0 - cloud.w) + cloud.truncate()
}
