use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::api::models::{TodaySummary, UserProfile, WeeklyEntry};
use crate::clock::Clock;
use crate::db::Database;
use crate::models::StepRecord;
use crate::notifications::Notifier;

use super::achievement::{evaluate_achievement, AchievementTransition};
use super::state::{zero_week, ActivityState, WeeklyPoint};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Owns today's in-memory activity and is the only path by which step
/// totals change. Confirmed steps, restored records and corrective resyncs
/// write the store; remote aggregates only change what is shown.
#[derive(Clone)]
pub struct StepTracker {
    state: Arc<Mutex<ActivityState>>,
    db: Database,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl StepTracker {
    pub fn new(db: Database, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        let today = clock.today();
        Self {
            state: Arc::new(Mutex::new(ActivityState::new(today))),
            db,
            clock,
            notifier,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub async fn snapshot(&self) -> ActivityState {
        let mut guard = self.state.lock().await;
        guard.roll_over(self.clock.today());
        guard.clone()
    }

    /// Adopt the stored record if it is today's. A record from an earlier
    /// day is left in the store, since a later push may still deliver it,
    /// and today starts from zero.
    pub async fn restore_on_start(&self) -> Result<ActivityState> {
        let today = self.clock.today();
        let step_target = self.db.step_target().await?;
        let stored = self.db.read_step_record().await?;

        let snapshot = {
            let mut guard = self.state.lock().await;
            guard.roll_over(today);
            guard.step_target = step_target;
            match &stored {
                Some(record) if record.is_current(today) => {
                    log_info!("Restored {} steps for {today}", record.step_count);
                    guard.adopt_record(record);
                }
                Some(record) => {
                    log_info!(
                        "Stored record for {} is stale; starting {today} at zero",
                        record.date
                    );
                    guard.adopt_record(&StepRecord::empty(today));
                }
                None => guard.adopt_record(&StepRecord::empty(today)),
            }
            guard.clone()
        };

        self.evaluate(today, snapshot.step_count, step_target).await?;
        Ok(snapshot)
    }

    /// Apply one confirmed step: persist, refresh state, check the target.
    pub async fn record_step(&self) -> Result<StepRecord> {
        let today = self.clock.today();
        let record = self.db.increment_step_record(today).await?;

        let step_target = {
            let mut guard = self.state.lock().await;
            if guard.roll_over(today) {
                log_info!("Day rolled over to {today}");
            }
            guard.adopt_record(&record);
            guard.step_target
        };
        log_debug!("Step {} recorded for {today}", record.step_count);

        self.evaluate(today, record.step_count, step_target).await?;
        Ok(record)
    }

    /// Remote "today" replaces what the dashboard shows. The stored record
    /// is left alone: it may hold steps the backend has not received yet.
    pub async fn apply_remote_today(&self, summary: &TodaySummary) -> Result<AchievementTransition> {
        let today = self.clock.today();
        let step_target = {
            let mut guard = self.state.lock().await;
            guard.roll_over(today);
            guard.step_count = summary.step_count;
            guard.calories_burned = summary.calories_burned;
            guard.distance_km = summary.distance_km;
            guard.time_minutes = summary.time_minutes;
            guard.step_target
        };
        log_debug!("Showing remote count {} for {today}", summary.step_count);

        self.evaluate(today, summary.step_count, step_target).await
    }

    /// Replace today's stored count with a value known to be correct, even
    /// when it is lower, and re-check the target against it.
    pub async fn corrective_resync(&self, step_count: u64) -> Result<AchievementTransition> {
        let today = self.clock.today();
        let record = self.db.overwrite_step_count(today, step_count).await?;

        let step_target = {
            let mut guard = self.state.lock().await;
            guard.roll_over(today);
            guard.adopt_record(&record);
            guard.step_target
        };
        log_info!("Corrected {today} to {step_count} steps");

        self.evaluate(today, record.step_count, step_target).await
    }

    pub async fn apply_profile(&self, profile: &UserProfile) -> Result<AchievementTransition> {
        self.state.lock().await.first_name = profile.first_name.clone();
        self.set_step_target(profile.effective_step_target()).await
    }

    /// Cache a new target and re-check today's count against it.
    pub async fn set_step_target(&self, step_target: u64) -> Result<AchievementTransition> {
        let today = self.clock.today();
        self.db.set_step_target(step_target).await?;

        let step_count = {
            let mut guard = self.state.lock().await;
            guard.roll_over(today);
            guard.step_target = step_target;
            guard.step_count
        };

        self.evaluate(today, step_count, step_target).await
    }

    /// Remote weekly series laid over a zero-filled Mon..Sun week. Entries
    /// are matched by the first three letters of their day name; unknown
    /// days are dropped.
    pub async fn apply_weekly(&self, entries: &[WeeklyEntry]) -> Vec<WeeklyPoint> {
        let mut weekly = zero_week();
        for entry in entries {
            let label: String = entry.day.chars().take(3).collect();
            match weekly
                .iter_mut()
                .find(|point| point.label.eq_ignore_ascii_case(&label))
            {
                Some(point) => point.step_count = entry.step_count,
                None => log_debug!("Ignoring weekly entry for unknown day {:?}", entry.day),
            }
        }

        self.state.lock().await.weekly = weekly.clone();
        weekly
    }

    /// Re-check the achievement flag, e.g. from the background task where the
    /// foreground state may be stale. Uses the stored count and target.
    pub async fn reevaluate_from_store(&self) -> Result<AchievementTransition> {
        let today = self.clock.today();
        let step_count = self
            .db
            .read_today_record(today)
            .await?
            .map_or(0, |record| record.step_count);
        let step_target = self.db.step_target().await?;
        self.evaluate(today, step_count, step_target).await
    }

    async fn evaluate(
        &self,
        today: NaiveDate,
        step_count: u64,
        step_target: u64,
    ) -> Result<AchievementTransition> {
        evaluate_achievement(
            &self.db,
            self.notifier.as_ref(),
            today,
            step_count,
            step_target,
        )
        .await
    }
}
