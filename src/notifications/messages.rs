use crate::models::ReminderSlot;

use super::Notification;

pub const TARGET_ACHIEVED_TITLE: &str = "🎉 Target Achieved!";
pub const JOURNEY_TITLE: &str = "🚀 Start Your Journey!";

pub fn target_achieved() -> Notification {
    Notification::new(
        TARGET_ACHIEVED_TITLE,
        "You've reached your step goal for today! Don't stop now, keep the momentum going!",
    )
}

pub fn start_journey() -> Notification {
    Notification::new(
        JOURNEY_TITLE,
        "Welcome back! Let's make today active and healthy.",
    )
}

/// Reminder text for a slot; the afternoon check carries the live count.
pub fn reminder(slot: ReminderSlot, step_count: u64) -> Notification {
    match slot {
        ReminderSlot::Morning => Notification::new(
            "☀️ Good Morning!",
            "Start your day strong! Every step counts towards a healthier you.",
        ),
        ReminderSlot::Afternoon => Notification::new(
            "🚶 Progress Check!",
            format!("You've taken {step_count} steps so far. Keep up the great work!"),
        ),
        ReminderSlot::Evening => Notification::new(
            "Evening Steps!",
            "Almost there! Make the most of the rest of your day to reach your goal.",
        ),
        ReminderSlot::Night => Notification::new(
            "🌙 One Last Push!",
            "Even a short walk tonight can make a difference for tomorrow. You've got this!",
        ),
    }
}
