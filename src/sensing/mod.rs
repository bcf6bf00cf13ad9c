//! Motion sensing: the step detector and the task that feeds it.

mod controller;
pub mod detector;
mod loop_worker;

pub use controller::{SensingController, DEFAULT_SENSOR_CHANNEL_CAPACITY};
pub use detector::{MotionSample, StepDetector, StepEvent};
