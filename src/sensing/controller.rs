use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::tracker::StepTracker;

use super::detector::MotionSample;
use super::loop_worker::sensing_loop;

pub const DEFAULT_SENSOR_CHANNEL_CAPACITY: usize = 256;

/// Starts and stops the sensing task. Samples are pushed through the sender
/// returned by [`SensingController::start`].
pub struct SensingController {
    handle: Option<JoinHandle<u64>>,
    cancel_token: Option<CancellationToken>,
    channel_capacity: usize,
}

impl SensingController {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            handle: None,
            cancel_token: None,
            channel_capacity: channel_capacity.max(1),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn start(&mut self, tracker: StepTracker) -> Result<mpsc::Sender<MotionSample>> {
        if self.is_running() {
            bail!("sensing already active");
        }

        let (sample_tx, sample_rx) = mpsc::channel(self.channel_capacity);
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sensing_loop(sample_rx, tracker, cancel_token.clone()));

        info!("Sensing started");
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(sample_tx)
    }

    /// Stop the loop and wait for it. Returns the steps it applied.
    pub async fn stop(&mut self) -> Result<u64> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        match self.handle.take() {
            Some(handle) => handle.await.context("sensing loop task failed to join"),
            None => Ok(0),
        }
    }

    /// Wait for the loop to end on its own, i.e. after the sample stream closes.
    pub async fn join(&mut self) -> Result<u64> {
        self.cancel_token = None;
        match self.handle.take() {
            Some(handle) => handle.await.context("sensing loop task failed to join"),
            None => Ok(0),
        }
    }
}

impl Default for SensingController {
    fn default() -> Self {
        Self::new(DEFAULT_SENSOR_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::db::Database;
    use crate::notifications::RecordingNotifier;

    fn tracker() -> (StepTracker, Database) {
        let db = Database::open_in_memory().unwrap();
        let clock = Arc::new(ManualClock::at("2024-05-14", "10:00:00"));
        let tracker = StepTracker::new(db.clone(), clock, Arc::new(RecordingNotifier::default()));
        (tracker, db)
    }

    #[tokio::test]
    async fn hundred_cycles_reach_the_store() {
        let (tracker, db) = tracker();
        tracker.restore_on_start().await.unwrap();

        let mut controller = SensingController::default();
        let tx = controller.start(tracker.clone()).unwrap();
        for i in 0..100u64 {
            let start = 1_000 + i * 500;
            tx.send(MotionSample::new(start, 0.45)).await.unwrap();
            tx.send(MotionSample::new(start + 100, 0.10)).await.unwrap();
        }
        drop(tx);

        assert_eq!(controller.join().await.unwrap(), 100);

        let record = db.read_step_record().await.unwrap().unwrap();
        assert_eq!(record.step_count, 100);
        assert_eq!(record.calories_burned, 4.0);
        assert_eq!(record.distance_km, 0.08);
        assert_eq!(tracker.snapshot().await.step_count, 100);
    }

    #[tokio::test]
    async fn refuses_second_start() {
        let (tracker, _db) = tracker();
        let mut controller = SensingController::default();
        let _tx = controller.start(tracker.clone()).unwrap();
        assert!(controller.start(tracker).is_err());
        controller.stop().await.unwrap();
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn stop_without_start_is_noop() {
        let mut controller = SensingController::default();
        assert_eq!(controller.stop().await.unwrap(), 0);
    }
}
