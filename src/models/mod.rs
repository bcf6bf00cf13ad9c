//! Persisted activity models.

mod daily_flags;
mod step_record;

pub use daily_flags::{DailyFlags, ReminderSlot};
pub use step_record::StepRecord;

/// Target used until the profile supplies one.
pub const DEFAULT_STEP_TARGET: u64 = 8000;
