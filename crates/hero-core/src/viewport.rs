/// Drawing surface size in device pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Backing size for a CSS box, with the device pixel ratio capped.
    pub fn from_css(css_width: f64, css_height: f64, device_pixel_ratio: f64, cap: f64) -> Self {
        let dpr = clamp_pixel_ratio(device_pixel_ratio, cap);
        let px = |css: f64| {
            if css.is_finite() && css > 0.0 {
                (css * dpr).round() as u32
            } else {
                0
            }
        };
        Self::new(px(css_width), px(css_height))
    }

    /// Zero-area surfaces are never configured.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

pub fn clamp_pixel_ratio(device_pixel_ratio: f64, cap: f64) -> f64 {
    let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };
    let cap = if cap.is_finite() && cap >= 1.0 { cap } else { 1.0 };
    dpr.min(cap)
}
