pub mod achievement;
pub mod controller;
pub mod state;

pub use achievement::AchievementTransition;
pub use controller::StepTracker;
pub use state::{ActivityState, WeeklyPoint, WEEKDAY_LABELS};
