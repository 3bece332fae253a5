//! Renderer options as supplied by the hosting page.

use crate::constants::*;
use crate::error::ConfigError;
use crate::scene::Primitive;
use crate::scroll::ScrollPolicy;
use crate::uniforms::MarchSettings;
use glam::Vec3;
use serde::Deserialize;

/// Recognized options. Missing fields take defaults; unknown fields are
/// ignored.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeroOptions {
    pub pixel_ratio_cap: f64,
    pub reduced_motion: bool,
    pub texture_path: String,
    pub sun_direction: [f32; 3],
    pub max_steps: u32,
    pub march_size: f32,
    /// Blend between several primitives over time instead of a sphere.
    pub morph: bool,
    /// Emit partial alpha so the page shows through as the hero fades.
    pub transparent: bool,
    pub scroll: ScrollPolicy,
}

impl Default for HeroOptions {
    fn default() -> Self {
        Self {
            pixel_ratio_cap: DEFAULT_PIXEL_RATIO_CAP,
            reduced_motion: false,
            texture_path: DEFAULT_TEXTURE_PATH.to_string(),
            sun_direction: DEFAULT_SUN_DIRECTION,
            max_steps: DEFAULT_MAX_STEPS,
            march_size: DEFAULT_MARCH_SIZE,
            morph: false,
            transparent: true,
            scroll: ScrollPolicy::default(),
        }
    }
}

impl HeroOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let opts: Self = serde_json::from_str(json)?;
        Ok(opts.sanitized())
    }

    /// Clamp every field into a range the renderer can use.
    pub fn sanitized(mut self) -> Self {
        if !self.pixel_ratio_cap.is_finite() {
            self.pixel_ratio_cap = DEFAULT_PIXEL_RATIO_CAP;
        }
        self.pixel_ratio_cap = self.pixel_ratio_cap.clamp(1.0, MAX_PIXEL_RATIO_CAP);
        self.max_steps = self.max_steps.clamp(1, MAX_STEPS_LIMIT);
        if !(self.march_size.is_finite() && self.march_size > 0.0) {
            self.march_size = DEFAULT_MARCH_SIZE;
        }
        let sun = Vec3::from(self.sun_direction);
        if !sun.is_finite() || sun.length_squared() < 1e-8 {
            self.sun_direction = DEFAULT_SUN_DIRECTION;
        }
        if self.texture_path.trim().is_empty() {
            self.texture_path = DEFAULT_TEXTURE_PATH.to_string();
        }
        self.scroll = self.scroll.sanitized();
        self
    }

    pub fn march(&self) -> MarchSettings {
        MarchSettings {
            max_steps: self.max_steps,
            step_size: self.march_size,
        }
    }

    pub fn primitive(&self) -> Primitive {
        if self.morph {
            Primitive::Morph
        } else {
            Primitive::Sphere
        }
    }

    pub fn sun(&self) -> Vec3 {
        Vec3::from(self.sun_direction)
    }
}
