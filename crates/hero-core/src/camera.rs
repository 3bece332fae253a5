use crate::constants::RAY_ORIGIN;
use glam::{Vec2, Vec3};

/// Camera parameters driven by scroll progress.
///
/// The eye sits at `RAY_ORIGIN + offset`, looking down -Z. `fov_scale`
/// widens the image plane: 1.0 is the resting field of view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPose {
    pub offset: Vec3,
    pub fov_scale: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            offset: Vec3::ZERO,
            fov_scale: 1.0,
        }
    }
}

impl CameraPose {
    pub fn eye(&self) -> Vec3 {
        Vec3::from(RAY_ORIGIN) + self.offset
    }

    /// World-space ray through a pixel.
    ///
    /// - `frag`: pixel center in surface space, origin bottom-left
    /// - `resolution`: surface size in pixels
    ///
    /// Returns `(ray_origin, ray_direction)`, matching `fs_clouds`.
    #[inline]
    pub fn ray(&self, frag: Vec2, resolution: Vec2) -> (Vec3, Vec3) {
        let res = resolution.max(Vec2::ONE);
        let mut uv = frag / res - Vec2::splat(0.5);
        uv.x *= res.x / res.y;
        let uv = uv * self.fov_scale;
        let rd = Vec3::new(uv.x, uv.y, -1.0).normalize();
        (self.eye(), rd)
    }
}
