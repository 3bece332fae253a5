//! Noise image and the FBM field built on it.
//!
//! The shader derives 3D value noise from a 2D RGBA image: each integer depth
//! slice `z` is the image shifted by `NOISE_SLICE_OFFSET * z` texels, and the
//! green/red channels hold slices `z` and `z + 1` at the same texel so one
//! bilinear fetch yields both ends of the depth interpolation.
//!
//! The functions here mirror `noise`/`fbm` in `clouds.wgsl`, sampling with the
//! same linear filter and repeat wrap the GPU sampler uses.

use crate::constants::*;
use crate::error::TextureError;
use glam::{Vec2, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Tightly packed RGBA8 image used as the noise source.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl NoiseImage {
    pub fn from_rgba8(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Dimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(TextureError::Length {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Procedural substitute for the noise asset.
    ///
    /// Green is white noise; red is green read `NOISE_SLICE_OFFSET` texels
    /// further along, which is exactly what the depth lookup expects. Blue and
    /// alpha are independent noise.
    pub fn synthesize(size: u32, seed: u64) -> Self {
        let size = size.max(1);
        let n = size as usize * size as usize;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut green = vec![0u8; n];
        rng.fill_bytes(&mut green);
        let mut extra = vec![0u8; n * 2];
        rng.fill_bytes(&mut extra);

        let ox = NOISE_SLICE_OFFSET[0] as i64;
        let oy = NOISE_SLICE_OFFSET[1] as i64;
        let s = size as i64;
        let mut rgba = vec![0u8; n * 4];
        for y in 0..s {
            for x in 0..s {
                let i = (y * s + x) as usize;
                let sx = (x + ox).rem_euclid(s);
                let sy = (y + oy).rem_euclid(s);
                rgba[i * 4] = green[(sy * s + sx) as usize];
                rgba[i * 4 + 1] = green[i];
                rgba[i * 4 + 2] = extra[i * 2];
                rgba[i * 4 + 3] = extra[i * 2 + 1];
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }

    /// Decode an encoded noise asset (PNG or JPEG) into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| TextureError::Decode(e.to_string()))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba8(width, height, img.into_raw())
    }

    pub fn fallback() -> Self {
        Self::synthesize(NOISE_TEXTURE_SIZE, NOISE_TEXTURE_SEED)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_rgba8(&self) -> &[u8] {
        &self.rgba
    }

    /// Texel at integer coordinates with repeat wrapping, normalized to 0..1.
    pub fn texel(&self, x: i64, y: i64) -> Vec4 {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        let i = (y * self.width as usize + x) * 4;
        let c = &self.rgba[i..i + 4];
        Vec4::new(c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32) / 255.0
    }

    /// Bilinear sample in texel space, where integer coordinates sit on texel
    /// centers. Equivalent to a linear/repeat sampler at `(uv + 0.5) / size`.
    pub fn sample_bilinear(&self, uv: Vec2) -> Vec4 {
        let x0 = uv.x.floor();
        let y0 = uv.y.floor();
        let fx = uv.x - x0;
        let fy = uv.y - y0;
        let (ix, iy) = (x0 as i64, y0 as i64);
        let a = self.texel(ix, iy);
        let b = self.texel(ix + 1, iy);
        let c = self.texel(ix, iy + 1);
        let d = self.texel(ix + 1, iy + 1);
        a.lerp(b, fx).lerp(c.lerp(d, fx), fy)
    }
}

#[inline]
fn fract3(v: Vec3) -> Vec3 {
    v - v.floor()
}

/// Value noise in [-1, 1] at `x`.
pub fn noise(image: &NoiseImage, x: Vec3) -> f32 {
    let p = x.floor();
    let mut f = fract3(x);
    // smoothstep weights hide the texel grid
    f = f * f * (Vec3::splat(3.0) - 2.0 * f);
    let slice = Vec2::from(NOISE_SLICE_OFFSET) * p.z;
    let uv = Vec2::new(p.x, p.y) + slice + Vec2::new(f.x, f.y);
    let tex = image.sample_bilinear(uv);
    let (lo, hi) = (tex.y, tex.x);
    (lo + (hi - lo) * f.z) * 2.0 - 1.0
}

/// Sum of `FBM_OCTAVES` noise octaves, drifting with `time`.
pub fn fbm(image: &NoiseImage, p: Vec3, time: f32) -> f32 {
    let mut q = p + time * DRIFT_SPEED * Vec3::from(DRIFT_DIRECTION);
    let mut f = 0.0;
    let mut scale = FBM_INITIAL_SCALE;
    let mut factor = FBM_INITIAL_FACTOR;
    for _ in 0..FBM_OCTAVES {
        f += scale * noise(image, q);
        q *= factor;
        factor += FBM_FACTOR_STEP;
        scale *= 0.5;
    }
    f
}

/// Upper bound on `|fbm|`.
pub fn fbm_amplitude() -> f32 {
    let mut total = 0.0;
    let mut scale = FBM_INITIAL_SCALE;
    for _ in 0..FBM_OCTAVES {
        total += scale;
        scale *= 0.5;
    }
    total
}
