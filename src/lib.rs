pub mod api;
pub mod auth;
pub mod background;
pub mod clock;
pub mod db;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod sensing;
pub mod settings;
pub mod sync;
pub mod tracker;
mod utils;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use api::{ApiClient, ApiConfig};
use auth::AuthSession;
use background::{tasks::register_default_tasks, TaskRegistry};
use clock::{Clock, SystemClock};
use db::Database;
use notifications::{LogNotifier, Notifier};
use sensing::{MotionSample, SensingController};
use settings::{SettingsStore, DATA_DIR_ENV};
use sync::{SyncReconciler, SyncTrigger};
use tracker::StepTracker;

pub struct AppState {
    pub settings: SettingsStore,
    pub db: Database,
    pub tracker: StepTracker,
    pub reconciler: SyncReconciler,
    pub auth: AuthSession,
    pub registry: TaskRegistry,
    sensing: Mutex<SensingController>,
    lifecycle: CancellationToken,
}

impl AppState {
    /// Open the store and settings under `data_dir` and wire the services.
    /// Nothing is scheduled until [`AppState::start`].
    pub fn bootstrap(
        data_dir: &Path,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let current = settings.settings();

        let db = Database::new(data_dir.join("stridekeep.sqlite3"))?;
        let api = ApiClient::new(
            ApiConfig::new(current.api_base_url.clone()).with_timeout(current.request_timeout()),
            db.clone(),
        )?;
        let tracker = StepTracker::new(db.clone(), clock, notifier);
        let reconciler = SyncReconciler::new(api.clone(), tracker.clone());

        info!(
            "Backend at {} (timeout {:?})",
            api.base_url(),
            api.timeout()
        );
        let auth = AuthSession::new(api, reconciler.clone(), tracker.clone());

        Ok(Self {
            settings,
            db,
            tracker,
            reconciler,
            auth,
            registry: TaskRegistry::default(),
            sensing: Mutex::new(SensingController::new(current.sensor_channel_capacity)),
            lifecycle: CancellationToken::new(),
        })
    }

    /// Restore today's steps, schedule the periodic tasks, sync if signed
    /// in, and open the sample channel.
    pub async fn start(&self) -> Result<mpsc::Sender<MotionSample>> {
        let restored = self.tracker.restore_on_start().await?;
        info!(
            "Starting with {} / {} steps for {}",
            restored.step_count, restored.step_target, restored.date
        );

        let current = self.settings.settings();
        register_default_tasks(
            &self.registry,
            self.reconciler.clone(),
            self.tracker.clone(),
            current.step_sync_interval(),
            current.notification_interval(),
        )?;

        if self.auth.is_logged_in().await? {
            match self
                .reconciler
                .reconcile(SyncTrigger::AppStart, &self.lifecycle)
                .await
            {
                Ok(report) => info!("Startup sync: {report:?}"),
                Err(err) if err.is_unauthorized() => {
                    warn!("Stored session rejected, sign in again: {err}");
                }
                Err(err) => warn!("Startup sync failed: {err}"),
            }
        } else {
            info!("Not signed in; skipping startup sync");
        }

        self.sensing.lock().await.start(self.tracker.clone())
    }

    /// Stop sensing and every periodic task. In-flight pulls are discarded.
    pub async fn shutdown(&self) -> Result<()> {
        self.lifecycle.cancel();
        let steps = self.sensing.lock().await.stop().await?;
        self.registry.shutdown().await;
        info!("Shut down after {steps} steps this session");
        Ok(())
    }
}

fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".stridekeep"),
        None => PathBuf::from(".stridekeep"),
    }
}

/// One sample per line: `timestamp_ms,y`.
fn parse_sample(line: &str) -> Option<MotionSample> {
    let (timestamp, y) = line.trim().split_once(',')?;
    Some(MotionSample::new(
        timestamp.trim().parse().ok()?,
        y.trim().parse().ok()?,
    ))
}

/// Host entry point: samples arrive on stdin, notifications go to the log.
/// Runs until stdin closes or Ctrl-C.
pub fn run() -> Result<()> {
    utils::logging::init_logging();
    info!("stridekeep starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(async {
        let state = AppState::bootstrap(&data_dir(), Arc::new(SystemClock), Arc::new(LogNotifier))?;
        let samples = state.start().await?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
                line = lines.next_line() => {
                    let Some(line) = line.context("failed to read samples from stdin")? else {
                        info!("Sample stream closed");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_sample(&line) {
                        Some(sample) => {
                            if samples.send(sample).await.is_err() {
                                warn!("Sensing loop is gone; dropping further samples");
                                break;
                            }
                        }
                        None => warn!("Ignoring malformed sample line {line:?}"),
                    }
                }
            }
        }

        drop(samples);
        state.shutdown().await
    })
}
