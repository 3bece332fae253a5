//! Scroll progress to camera and fade mapping.
//!
//! Forward scrolling reaches the end of the transition after
//! `forward_span` of the scroll range. Scrolling back starts with a
//! resistance curve over the first `staging_range` of recovery (a power
//! curve reaching `staging_output`), then continues linearly to the start.
//!
//! Each curve runs from the point where the direction last changed, so
//! reversing mid-transition continues from the current progress.

use crate::camera::CameraPose;
use crate::constants::*;
use glam::Vec3;
use serde::Deserialize;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollDirection {
    #[default]
    Forward,
    Backward,
}

impl FromStr for ScrollDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" | "down" => Ok(Self::Forward),
            "backward" | "up" => Ok(Self::Backward),
            _ => Err(()),
        }
    }
}

/// Shape of the forward/backward response. Product-tuned, not load-bearing.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrollPolicy {
    pub forward_span: f32,
    pub staging_range: f32,
    pub staging_output: f32,
    pub resistance_exponent: f32,
    pub camera_travel: f32,
    pub fov_gain: f32,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            forward_span: SCROLL_FORWARD_SPAN,
            staging_range: SCROLL_STAGING_RANGE,
            staging_output: SCROLL_STAGING_OUTPUT,
            resistance_exponent: SCROLL_RESISTANCE_EXPONENT,
            camera_travel: CAMERA_TRAVEL,
            fov_gain: FOV_GAIN,
        }
    }
}

fn finite_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        fallback
    }
}

impl ScrollPolicy {
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            forward_span: finite_or(self.forward_span, d.forward_span).clamp(0.05, 1.0),
            staging_range: finite_or(self.staging_range, d.staging_range).clamp(0.01, 0.99),
            staging_output: finite_or(self.staging_output, d.staging_output).clamp(0.0, 0.99),
            resistance_exponent: finite_or(self.resistance_exponent, d.resistance_exponent)
                .clamp(1.0, 8.0),
            camera_travel: finite_or(self.camera_travel, d.camera_travel),
            fov_gain: finite_or(self.fov_gain, d.fov_gain).max(-0.9),
        }
    }

    /// Eased transition progress for raw scroll progress `s`, starting from
    /// the resting ends (0 forward, 1 backward).
    pub fn ease(&self, s: f32, direction: ScrollDirection) -> f32 {
        self.ease_from(Anchor::rest(direction), s, direction)
    }

    fn ease_from(&self, anchor: Anchor, s: f32, direction: ScrollDirection) -> f32 {
        let s = s.clamp(0.0, 1.0);
        let Anchor { raw: a, eased: p } = anchor;
        match direction {
            ScrollDirection::Forward => {
                if s <= a {
                    return p;
                }
                let end = if a < self.forward_span {
                    self.forward_span
                } else {
                    1.0
                };
                if s >= end {
                    return 1.0;
                }
                p + (1.0 - p) * (s - a) / (end - a)
            }
            ScrollDirection::Backward => {
                if s >= a {
                    return p;
                }
                if s <= 0.0 {
                    return 0.0;
                }
                p * (1.0 - self.recovery((a - s) / a))
            }
        }
    }

    /// How much of the transition has been undone after recovering `r`.
    fn recovery(&self, r: f32) -> f32 {
        if r <= 0.0 {
            return 0.0;
        }
        if r >= 1.0 {
            return 1.0;
        }
        if r < self.staging_range {
            self.staging_output * (r / self.staging_range).powf(self.resistance_exponent)
        } else {
            let t = (r - self.staging_range) / (1.0 - self.staging_range);
            self.staging_output + (1.0 - self.staging_output) * t
        }
    }
}

/// Edge signal produced when progress crosses either end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionSignal {
    Complete,
    Reset,
}

/// Raw and eased progress where the current curve starts.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Anchor {
    raw: f32,
    eased: f32,
}

impl Anchor {
    fn rest(direction: ScrollDirection) -> Self {
        match direction {
            ScrollDirection::Forward => Self { raw: 0.0, eased: 0.0 },
            ScrollDirection::Backward => Self { raw: 1.0, eased: 1.0 },
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScrollMapper {
    policy: ScrollPolicy,
    raw: Option<f32>,
    anchor: Anchor,
    progress: f32,
    direction: ScrollDirection,
    complete: bool,
    at_start: bool,
}

impl Default for ScrollMapper {
    fn default() -> Self {
        Self::new(ScrollPolicy::default())
    }
}

impl ScrollMapper {
    pub fn new(policy: ScrollPolicy) -> Self {
        Self {
            policy: policy.sanitized(),
            raw: None,
            anchor: Anchor::rest(ScrollDirection::Forward),
            progress: 0.0,
            direction: ScrollDirection::Forward,
            complete: false,
            at_start: true,
        }
    }

    pub fn set_policy(&mut self, policy: ScrollPolicy) {
        self.policy = policy.sanitized();
    }

    /// Apply raw scroll progress. Non-finite input is ignored.
    pub fn set_progress(&mut self, s: f32, direction: ScrollDirection) -> Option<TransitionSignal> {
        if !s.is_finite() {
            return None;
        }
        let s = s.clamp(0.0, 1.0);
        match self.raw {
            None => self.anchor = Anchor::rest(direction),
            Some(raw) if direction != self.direction => {
                self.anchor = Anchor {
                    raw,
                    eased: self.progress,
                };
            }
            Some(_) => {}
        }
        self.raw = Some(s);
        self.direction = direction;
        self.progress = self.policy.ease_from(self.anchor, s, direction);

        if self.progress >= 1.0 {
            self.at_start = false;
            if !self.complete {
                self.complete = true;
                return Some(TransitionSignal::Complete);
            }
            return None;
        }
        self.complete = false;
        if self.progress <= 0.0 {
            if !self.at_start {
                self.at_start = true;
                return Some(TransitionSignal::Reset);
            }
        } else {
            self.at_start = false;
        }
        None
    }

    /// Move the raw input by `delta` (positive scrolls forward), as a wheel
    /// or arrow key would.
    pub fn step(&mut self, delta: f32) -> Option<TransitionSignal> {
        if !delta.is_finite() || delta == 0.0 {
            return None;
        }
        let direction = if delta > 0.0 {
            ScrollDirection::Forward
        } else {
            ScrollDirection::Backward
        };
        let mut s = (self.raw_progress() + delta).clamp(0.0, 1.0);
        // keep repeated steps from stalling a hair short of either end
        if s < 1e-4 {
            s = 0.0;
        } else if s > 1.0 - 1e-4 {
            s = 1.0;
        }
        self.set_progress(s, direction)
    }

    /// Last raw input, before easing.
    pub fn raw_progress(&self) -> f32 {
        self.raw.unwrap_or(0.0)
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// `1 - progress`: 1 at rest, exactly 0 once the transition completes.
    pub fn fade(&self) -> f32 {
        1.0 - self.progress
    }

    pub fn camera(&self) -> CameraPose {
        if self.progress <= 0.0 {
            return CameraPose::default();
        }
        CameraPose {
            offset: Vec3::new(0.0, 0.0, -self.policy.camera_travel * self.progress),
            fov_scale: 1.0 + self.policy.fov_gain * self.progress,
        }
    }
}
