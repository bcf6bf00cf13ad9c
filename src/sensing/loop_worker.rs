use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::tracker::StepTracker;

use super::detector::{MotionSample, StepDetector};

// Per-step output is debug level; flip this off to silence the module entirely.
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Drain samples into the detector and apply each confirmed step in order.
/// Ends when the token is cancelled or every sender is gone.
pub async fn sensing_loop(
    mut samples: mpsc::Receiver<MotionSample>,
    tracker: StepTracker,
    cancel_token: CancellationToken,
) -> u64 {
    let mut detector = StepDetector::new();
    let mut steps = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("sensing loop shutting down after {steps} steps");
                break;
            }
            sample = samples.recv() => {
                let Some(sample) = sample else {
                    log_info!("sensor stream closed after {steps} steps");
                    break;
                };

                if let Some(event) = detector.process_sample(&sample) {
                    match tracker.record_step().await {
                        Ok(record) => {
                            steps += 1;
                            log_debug!(
                                "step at {}ms, {} today",
                                event.timestamp_ms,
                                record.step_count
                            );
                        }
                        Err(err) => log_error!("failed to record step at {}ms: {err:?}", event.timestamp_ms),
                    }
                }
            }
        }
    }

    steps
}
