//! Step detection over vertical-axis acceleration.
//!
//! A step is a rise above [`RISE_THRESHOLD`] followed by a fall below
//! [`FALL_THRESHOLD`]. The gap between the two thresholds is a hysteresis
//! band: a signal hovering inside it can neither start nor finish a step.
//! A rise is only accepted once [`MIN_STEP_GAP_MS`] has passed since the last
//! confirmed step, which caps cadence at roughly 3.3 steps per second.
//!
//! The detector is pure and synchronous; persistence happens in the caller.

use serde::{Deserialize, Serialize};

pub const RISE_THRESHOLD: f64 = 0.32;
pub const FALL_THRESHOLD: f64 = 0.24;
pub const MIN_STEP_GAP_MS: u64 = 300;

/// One accelerometer reading, as pushed by the sensor collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Milliseconds on a monotonic-ish sensor clock.
    pub timestamp_ms: u64,
    /// Vertical-axis acceleration (g).
    pub y: f64,
}

impl MotionSample {
    pub fn new(timestamp_ms: u64, y: f64) -> Self {
        Self { timestamp_ms, y }
    }
}

/// A confirmed step, stamped with the falling-edge sample time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEvent {
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub rise_threshold: f64,
    pub fall_threshold: f64,
    pub min_step_gap_ms: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            rise_threshold: RISE_THRESHOLD,
            fall_threshold: FALL_THRESHOLD,
            min_step_gap_ms: MIN_STEP_GAP_MS,
        }
    }
}

pub struct StepDetector {
    config: DetectorConfig,
    in_step: bool,
    last_step_ms: Option<u64>,
}

impl StepDetector {
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self {
            config,
            in_step: false,
            last_step_ms: None,
        }
    }

    /// Feed one sample. Returns an event only on the falling edge of a step.
    pub fn process_sample(&mut self, sample: &MotionSample) -> Option<StepEvent> {
        let t = sample.timestamp_ms;

        if sample.y > self.config.rise_threshold && !self.in_step && self.gap_elapsed(t) {
            self.in_step = true;
            None
        } else if sample.y < self.config.fall_threshold && self.in_step {
            self.in_step = false;
            self.last_step_ms = Some(t);
            Some(StepEvent { timestamp_ms: t })
        } else {
            None
        }
    }

    pub fn process_batch(&mut self, samples: &[MotionSample]) -> Vec<StepEvent> {
        samples
            .iter()
            .filter_map(|sample| self.process_sample(sample))
            .collect()
    }

    /// Drop any half-observed step and the debounce anchor.
    pub fn reset(&mut self) {
        self.in_step = false;
        self.last_step_ms = None;
    }

    pub fn is_in_step(&self) -> bool {
        self.in_step
    }

    pub fn last_step_timestamp(&self) -> Option<u64> {
        self.last_step_ms
    }

    // Out-of-order timestamps saturate to zero and never satisfy the gap.
    fn gap_elapsed(&self, t: u64) -> bool {
        match self.last_step_ms {
            None => true,
            Some(last) => t.saturating_sub(last) > self.config.min_step_gap_ms,
        }
    }
}

impl Default for StepDetector {
    fn default() -> Self {
        Self::new()
    }
}
