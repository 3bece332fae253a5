//! CPU evaluation of the full cloud pass.
//!
//! Produces the same image `fs_clouds` does for a given [`FrameInputs`], one
//! pixel at a time. Used for still exports and for checking the pipeline
//! without a graphics device.

use crate::march::raymarch;
use crate::noise::NoiseImage;
use crate::sky::{composite, sky_color};
use crate::uniforms::FrameInputs;
use glam::{Vec2, Vec4};

/// Shade one pixel. `frag` is the pixel center, origin bottom-left.
///
/// Output is premultiplied by the fade factor: `(rgb * fade, fade)`.
pub fn shade_pixel(image: &NoiseImage, inputs: &FrameInputs, frag: Vec2) -> Vec4 {
    let (ro, rd) = inputs.camera.ray(frag, inputs.resolution);
    let sun = inputs.sun();
    let sky = sky_color(rd, sun);
    let clouds = raymarch(
        image,
        ro,
        rd,
        sun,
        inputs.time,
        inputs.primitive,
        inputs.march,
    );
    let fade = inputs.fade.clamp(0.0, 1.0);
    (composite(sky, clouds) * fade).extend(fade)
}

/// Render a `width x height` RGBA8 frame, rows top to bottom.
///
/// `inputs.resolution` is overridden with the requested size.
pub fn render_rgba8(image: &NoiseImage, inputs: &FrameInputs, width: u32, height: u32) -> Vec<u8> {
    let mut frame_inputs = *inputs;
    frame_inputs.resolution = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for row in 0..height {
        let y = (height - 1 - row) as f32 + 0.5;
        for x in 0..width {
            let c = shade_pixel(image, &frame_inputs, Vec2::new(x as f32 + 0.5, y));
            for v in c.to_array() {
                out.push((v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8);
            }
        }
    }
    out
}
