use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::api::models::UserProfile;
use crate::api::{ApiClient, ApiError};
use crate::tracker::StepTracker;

use super::error::SyncError;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    AppStart,
    Login,
    Refresh,
    /// Periodic background run; pushes only.
    BackgroundTick,
}

impl SyncTrigger {
    pub fn pulls(self) -> bool {
        !matches!(self, SyncTrigger::BackgroundTick)
    }
}

impl fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncTrigger::AppStart => "app-start",
            SyncTrigger::Login => "login",
            SyncTrigger::Refresh => "refresh",
            SyncTrigger::BackgroundTick => "background-tick",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Sent,
    /// Nothing stored yet.
    NoData,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Applied,
    /// Some fetches failed; the rest were applied.
    Partial,
    Failed,
    /// Cancelled before the results could be applied.
    Discarded,
}

/// What a pull applied. `profile` is the fetched profile when that fetch
/// succeeded and was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PullReport {
    pub outcome: PullOutcome,
    pub profile: Option<UserProfile>,
}

impl PullReport {
    fn discarded() -> Self {
        Self {
            outcome: PullOutcome::Discarded,
            profile: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub push: PushOutcome,
    pub pull: Option<PullReport>,
}

/// Moves step data between the store and the backend. Push and pull are
/// independent; neither waits for the other.
#[derive(Clone)]
pub struct SyncReconciler {
    api: ApiClient,
    tracker: StepTracker,
}

impl SyncReconciler {
    pub fn new(api: ApiClient, tracker: StepTracker) -> Self {
        Self { api, tracker }
    }

    /// Send the stored record as-is. Failures are logged and dropped; the
    /// next trigger sends the then-current record.
    pub async fn push(&self) -> PushOutcome {
        let record = match self.tracker.db().read_step_record().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                log_debug!("push skipped: no local record");
                return PushOutcome::NoData;
            }
            Err(err) => {
                log_warn!("push skipped: failed to read local record: {err:?}");
                return PushOutcome::Failed;
            }
        };

        match self.api.record_steps(&record).await {
            Ok(()) => {
                log_info!("pushed {} steps for {}", record.step_count, record.date);
                PushOutcome::Sent
            }
            Err(err) => {
                log_warn!("push of {} failed: {err}", record.date);
                PushOutcome::Failed
            }
        }
    }

    /// Fetch profile, today's aggregate and the weekly series and apply
    /// them to the dashboard state. Results that arrive after `cancel`
    /// fired are dropped. The stored step record is never written here.
    pub async fn pull(&self, cancel: &CancellationToken) -> Result<PullReport, SyncError> {
        let today = self.tracker.today();
        let mut applied = 0;
        let mut failed = 0;

        let profile = self.api.me().await;
        if cancel.is_cancelled() {
            return Ok(PullReport::discarded());
        }
        let profile = match check(profile)? {
            Some(profile) => {
                self.adopt_profile(&profile).await?;
                applied += 1;
                Some(profile)
            }
            None => {
                failed += 1;
                None
            }
        };

        let summary = self.api.steps_for_date(today).await;
        if cancel.is_cancelled() {
            return Ok(PullReport::discarded());
        }
        match check(summary)? {
            Some(summary) => {
                self.tracker.apply_remote_today(&summary).await?;
                applied += 1;
            }
            None => failed += 1,
        }

        let weekly = self.api.weekly_steps().await;
        if cancel.is_cancelled() {
            return Ok(PullReport::discarded());
        }
        match check(weekly)? {
            Some(entries) => {
                self.tracker.apply_weekly(&entries).await;
                applied += 1;
            }
            None => failed += 1,
        }

        let outcome = match (applied, failed) {
            (_, 0) => PullOutcome::Applied,
            (0, _) => PullOutcome::Failed,
            _ => PullOutcome::Partial,
        };
        Ok(PullReport { outcome, profile })
    }

    /// Push, and pull unless this is a background tick.
    pub async fn reconcile(
        &self,
        trigger: SyncTrigger,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        log_info!("sync triggered by {trigger}");

        if !trigger.pulls() {
            return Ok(SyncReport {
                push: self.push().await,
                pull: None,
            });
        }

        let (push, pull) = tokio::join!(self.push(), self.pull(cancel));
        Ok(SyncReport {
            push,
            pull: Some(pull?),
        })
    }

    async fn adopt_profile(&self, profile: &UserProfile) -> anyhow::Result<()> {
        self.tracker.apply_profile(profile).await?;
        self.roll_login_day().await
    }

    /// A successful profile fetch counts as today's login. On the first one
    /// of a day the journey notice is re-armed.
    async fn roll_login_day(&self) -> anyhow::Result<()> {
        let db = self.tracker.db();
        let today = self.tracker.today();
        if db.last_login().await? == Some(today) {
            return Ok(());
        }

        db.set_last_login(today).await?;
        db.update_daily_flags(today, |flags| flags.journey_announced = false)
            .await?;
        log_info!("first login of {today}");
        Ok(())
    }
}

/// `Ok(None)` for a logged, swallowed failure; `Err` only for auth failures.
fn check<T>(result: Result<T, ApiError>) -> Result<Option<T>, SyncError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) => match SyncError::from_api(err) {
            Some(auth) => Err(auth),
            None => Ok(None),
        },
    }
}
