//! The two tasks registered at startup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::notifications::run_notification_check;
use crate::sync::{PushOutcome, SyncReconciler, SyncTrigger};
use crate::tracker::{AchievementTransition, StepTracker};

use super::registry::{Registration, TaskFuture, TaskHandler, TaskOutcome, TaskRegistry};

pub const STEP_SYNC_TASK: &str = "step-sync-task";
pub const STEP_SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub const NOTIFICATION_TASK: &str = "notification-task";
pub const NOTIFICATION_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Push the stored record; never pulls.
pub fn step_sync_handler(reconciler: SyncReconciler) -> TaskHandler {
    Arc::new(move || -> TaskFuture {
        let reconciler = reconciler.clone();
        Box::pin(async move {
            let report = reconciler
                .reconcile(SyncTrigger::BackgroundTick, &CancellationToken::new())
                .await?;
            Ok::<_, anyhow::Error>(match report.push {
                PushOutcome::Sent => TaskOutcome::NewData,
                PushOutcome::NoData => TaskOutcome::NoData,
                PushOutcome::Failed => TaskOutcome::Failed,
            })
        })
    })
}

/// Reminders, journey notice and achievement check, plus the in-memory
/// day rollover when the app sat idle across midnight.
pub fn notification_handler(tracker: StepTracker) -> TaskHandler {
    Arc::new(move || -> TaskFuture {
        let tracker = tracker.clone();
        Box::pin(async move {
            tracker.snapshot().await;
            let report = run_notification_check(
                tracker.db(),
                tracker.clock().as_ref(),
                tracker.notifier().as_ref(),
            )
            .await?;

            let delivered = !report.reminders.is_empty()
                || report.journey
                || report.achievement == AchievementTransition::Achieved;
            Ok::<_, anyhow::Error>(if delivered {
                TaskOutcome::NewData
            } else {
                TaskOutcome::NoData
            })
        })
    })
}

pub fn register_default_tasks(
    registry: &TaskRegistry,
    reconciler: SyncReconciler,
    tracker: StepTracker,
    step_sync_interval: Duration,
    notification_interval: Duration,
) -> Result<(Registration, Registration)> {
    let sync = registry.register(
        STEP_SYNC_TASK,
        step_sync_interval,
        step_sync_handler(reconciler),
    )?;
    let notify = registry.register(
        NOTIFICATION_TASK,
        notification_interval,
        notification_handler(tracker),
    )?;
    Ok((sync, notify))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::{ApiClient, ApiConfig};
    use crate::clock::ManualClock;
    use crate::db::Database;
    use crate::models::StepRecord;
    use crate::notifications::RecordingNotifier;
    use crate::sensing::{MotionSample, SensingController};

    fn setup(server: &MockServer) -> (SyncReconciler, StepTracker, Arc<RecordingNotifier>) {
        let db = Database::open_in_memory().unwrap();
        let clock = Arc::new(ManualClock::at("2024-05-14", "08:30:00"));
        let notifier = Arc::new(RecordingNotifier::default());
        let tracker = StepTracker::new(db.clone(), clock, notifier.clone());
        let api = ApiClient::new(ApiConfig::new(server.uri()), db).unwrap();
        (SyncReconciler::new(api, tracker.clone()), tracker, notifier)
    }

    #[tokio::test]
    async fn registering_defaults_twice_is_idempotent() {
        let server = MockServer::start().await;
        let (reconciler, tracker, _) = setup(&server);
        let registry = TaskRegistry::default();

        let first = register_default_tasks(
            &registry,
            reconciler.clone(),
            tracker.clone(),
            STEP_SYNC_INTERVAL,
            NOTIFICATION_INTERVAL,
        )
        .unwrap();
        let second = register_default_tasks(
            &registry,
            reconciler,
            tracker,
            STEP_SYNC_INTERVAL,
            NOTIFICATION_INTERVAL,
        )
        .unwrap();

        assert_eq!(first, (Registration::Registered, Registration::Registered));
        assert_eq!(
            second,
            (Registration::AlreadyRegistered, Registration::AlreadyRegistered)
        );
        assert_eq!(
            registry.registered_ids(),
            vec![NOTIFICATION_TASK.to_string(), STEP_SYNC_TASK.to_string()]
        );
        registry.shutdown().await;
    }

    #[tokio::test]
    async fn step_sync_pushes_stored_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/steps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let (reconciler, tracker, _) = setup(&server);
        let today = NaiveDate::from_ymd_opt(2024, 5, 14).unwrap();
        tracker
            .db()
            .write_step_record(&StepRecord::for_count(today, 300))
            .await
            .unwrap();

        let outcome = step_sync_handler(reconciler)().await.unwrap();
        assert_eq!(outcome, TaskOutcome::NewData);
    }

    #[tokio::test]
    async fn hundred_steps_are_pushed_by_the_next_sync() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/user/steps"))
            .and(body_json(json!({
                "date": "2024-05-14",
                "stepCount": 100,
                "caloriesBurned": 4.0,
                "distanceKm": 0.08
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (reconciler, tracker, _) = setup(&server);
        tracker.restore_on_start().await.unwrap();

        let mut sensing = SensingController::default();
        let samples = sensing.start(tracker.clone()).unwrap();
        for i in 0..100u64 {
            let start = 1_000 + i * 500;
            samples.send(MotionSample::new(start, 0.45)).await.unwrap();
            samples.send(MotionSample::new(start + 100, 0.10)).await.unwrap();
        }
        drop(samples);
        assert_eq!(sensing.join().await.unwrap(), 100);

        let outcome = step_sync_handler(reconciler)().await.unwrap();
        assert_eq!(outcome, TaskOutcome::NewData);
    }

    #[tokio::test]
    async fn notification_task_sends_morning_reminder() {
        let server = MockServer::start().await;
        let (_, tracker, notifier) = setup(&server);
        let handler = notification_handler(tracker);

        assert_eq!(handler().await.unwrap(), TaskOutcome::NewData);
        assert_eq!(notifier.titles(), vec!["☀️ Good Morning!".to_string()]);
        assert_eq!(handler().await.unwrap(), TaskOutcome::NoData);
    }
}
