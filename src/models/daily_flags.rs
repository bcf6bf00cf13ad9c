use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Fixed local-time reminders sent by the notification task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReminderSlot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl ReminderSlot {
    pub const ALL: [ReminderSlot; 4] = [
        ReminderSlot::Morning,
        ReminderSlot::Afternoon,
        ReminderSlot::Evening,
        ReminderSlot::Night,
    ];

    pub fn hour(&self) -> u32 {
        match self {
            ReminderSlot::Morning => 8,
            ReminderSlot::Afternoon => 13,
            ReminderSlot::Evening => 18,
            ReminderSlot::Night => 21,
        }
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

/// Per-day notification and achievement state, persisted as one slot.
///
/// Flags belonging to an earlier date are never consulted; [`DailyFlags::for_day`]
/// hands back a cleared value instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyFlags {
    pub date: NaiveDate,
    /// Step target reached today.
    pub achieved: bool,
    /// "Start your journey" already sent for today's login.
    pub journey_announced: bool,
    #[serde(default)]
    pub reminders_sent: Vec<ReminderSlot>,
}

impl DailyFlags {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            achieved: false,
            journey_announced: false,
            reminders_sent: Vec::new(),
        }
    }

    /// Stored flags if they describe `today`, cleared flags otherwise.
    pub fn for_day(stored: Option<DailyFlags>, today: NaiveDate) -> Self {
        match stored {
            Some(flags) if flags.date == today => flags,
            _ => Self::new(today),
        }
    }

    pub fn reminder_sent(&self, slot: ReminderSlot) -> bool {
        self.reminders_sent.contains(&slot)
    }

    pub fn mark_reminder(&mut self, slot: ReminderSlot) {
        if !self.reminder_sent(slot) {
            self.reminders_sent.push(slot);
            self.reminders_sent.sort();
        }
    }
}
