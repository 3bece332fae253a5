use crate::constants::MAX_FRAME_DELTA_SEC;

/// Animation time that only advances while running.
///
/// Timestamps are host frame timestamps in milliseconds. After `start` the
/// first tick only records the baseline, so a pause never shows up as a
/// jump in elapsed time.
#[derive(Clone, Debug, Default)]
pub struct AnimationClock {
    running: bool,
    last_timestamp_ms: Option<f64>,
    elapsed_sec: f64,
}

impl AnimationClock {
    pub fn start(&mut self) {
        self.running = true;
        self.last_timestamp_ms = None;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.last_timestamp_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance to `now_ms`, scaling the wall-clock delta by `time_scale`.
    /// Returns the unscaled delta in seconds.
    pub fn tick(&mut self, now_ms: f64, time_scale: f64) -> f64 {
        if !self.running || !now_ms.is_finite() {
            return 0.0;
        }
        let dt = match self.last_timestamp_ms {
            Some(prev) => ((now_ms - prev) / 1000.0).clamp(0.0, MAX_FRAME_DELTA_SEC),
            None => 0.0,
        };
        self.last_timestamp_ms = Some(now_ms);
        self.elapsed_sec += dt * time_scale;
        dt
    }

    pub fn elapsed_sec(&self) -> f64 {
        self.elapsed_sec
    }
}
