use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{StepRecord, DEFAULT_STEP_TARGET};

pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPoint {
    pub label: String,
    pub step_count: u64,
}

impl WeeklyPoint {
    pub fn new(label: impl Into<String>, step_count: u64) -> Self {
        Self {
            label: label.into(),
            step_count,
        }
    }
}

pub fn zero_week() -> Vec<WeeklyPoint> {
    WEEKDAY_LABELS
        .iter()
        .map(|label| WeeklyPoint::new(*label, 0))
        .collect()
}

/// What the dashboard shows. Rebuilt from the store on start and
/// overwritten by remote aggregates whenever a pull lands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityState {
    pub date: NaiveDate,
    pub first_name: Option<String>,
    pub step_count: u64,
    pub step_target: u64,
    pub calories_burned: f64,
    pub distance_km: f64,
    pub time_minutes: f64,
    pub weekly: Vec<WeeklyPoint>,
}

impl ActivityState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            first_name: None,
            step_count: 0,
            step_target: DEFAULT_STEP_TARGET,
            calories_burned: 0.0,
            distance_km: 0.0,
            time_minutes: 0.0,
            weekly: zero_week(),
        }
    }

    pub fn adopt_record(&mut self, record: &StepRecord) {
        self.date = record.date;
        self.step_count = record.step_count;
        self.calories_burned = record.calories_burned;
        self.distance_km = record.distance_km;
    }

    /// Zero the daily counters when `today` moved past the state's date.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.date == today {
            return false;
        }
        self.date = today;
        self.step_count = 0;
        self.calories_burned = 0.0;
        self.distance_km = 0.0;
        self.time_minutes = 0.0;
        true
    }
}
