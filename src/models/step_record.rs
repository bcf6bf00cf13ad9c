use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::{calories_for, distance_km_for};

/// Snapshot of one day's activity, stored under the `stepToday` key and sent
/// verbatim to `POST /user/steps`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub date: NaiveDate,
    pub step_count: u64,
    pub calories_burned: f64,
    pub distance_km: f64,
}

impl StepRecord {
    /// Record for `date` with derived fields computed from `step_count`.
    pub fn for_count(date: NaiveDate, step_count: u64) -> Self {
        Self {
            date,
            step_count,
            calories_burned: calories_for(step_count),
            distance_km: distance_km_for(step_count),
        }
    }

    pub fn empty(date: NaiveDate) -> Self {
        Self::for_count(date, 0)
    }

    /// A record only describes "today" when its date is today.
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.date == today
    }

    /// Next record after one confirmed step. A stale record restarts at zero.
    pub fn incremented(&self, today: NaiveDate) -> Self {
        let base = if self.is_current(today) {
            self.step_count
        } else {
            0
        };
        Self::for_count(today, base.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn serializes_with_backend_field_names() {
        let record = StepRecord::for_count(day(14), 100);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "2024-05-14",
                "stepCount": 100,
                "caloriesBurned": 4.0,
                "distanceKm": 0.08,
            })
        );
    }

    #[test]
    fn increment_restarts_on_new_day() {
        let yesterday = StepRecord::for_count(day(13), 5000);
        let next = yesterday.incremented(day(14));
        assert_eq!(next.date, day(14));
        assert_eq!(next.step_count, 1);
        assert_eq!(next.calories_burned, 0.04);
    }

    #[test]
    fn increment_continues_same_day() {
        let record = StepRecord::for_count(day(14), 99).incremented(day(14));
        assert_eq!(record, StepRecord::for_count(day(14), 100));
    }
}
