use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// A single run may not take longer than this.
pub const DEFAULT_TICK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    NewData,
    NoData,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    /// A task with this id is already scheduled; nothing new was started.
    AlreadyRegistered,
}

pub type TaskFuture = Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send>>;
pub type TaskHandler = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

struct RegisteredTask {
    handler: TaskHandler,
    handle: JoinHandle<()>,
}

/// Keyed set of periodic tasks. Registering an id twice is a no-op, so
/// callers may register on every start without stacking schedules.
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, RegisteredTask>>,
    cancel_token: CancellationToken,
    tick_timeout: Duration,
}

impl TaskRegistry {
    pub fn new(tick_timeout: Duration) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            cancel_token: CancellationToken::new(),
            tick_timeout,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, RegisteredTask>>> {
        self.tasks
            .lock()
            .map_err(|_| anyhow!("task registry lock poisoned"))
    }

    /// Schedule `handler` every `min_interval`, first run one interval from
    /// now. Must be called inside a tokio runtime.
    pub fn register(
        &self,
        task_id: &str,
        min_interval: Duration,
        handler: TaskHandler,
    ) -> Result<Registration> {
        if self.cancel_token.is_cancelled() {
            bail!("task registry is shut down");
        }
        if min_interval.is_zero() {
            bail!("task {task_id} needs a non-zero interval");
        }

        let mut tasks = self.lock()?;
        if tasks.contains_key(task_id) {
            log_debug!("task {task_id} already registered");
            return Ok(Registration::AlreadyRegistered);
        }

        let handle = tokio::spawn(run_periodic(
            task_id.to_string(),
            min_interval,
            self.tick_timeout,
            handler.clone(),
            self.cancel_token.child_token(),
        ));
        tasks.insert(task_id.to_string(), RegisteredTask { handler, handle });
        log_info!("registered task {task_id} every {}s", min_interval.as_secs());

        Ok(Registration::Registered)
    }

    pub fn is_registered(&self, task_id: &str) -> bool {
        self.lock()
            .map(|tasks| tasks.contains_key(task_id))
            .unwrap_or(false)
    }

    pub fn registered_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .lock()
            .map(|tasks| tasks.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Run a task once, outside its schedule, under the same timeout.
    pub async fn run_now(&self, task_id: &str) -> Result<TaskOutcome> {
        let handler = {
            let tasks = self.lock()?;
            match tasks.get(task_id) {
                Some(task) => task.handler.clone(),
                None => bail!("unknown task {task_id}"),
            }
        };

        time::timeout(self.tick_timeout, handler())
            .await
            .map_err(|_| anyhow!("task {task_id} timed out after {:?}", self.tick_timeout))?
    }

    /// Cancel every task and wait for the loops to exit.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();

        let drained: Vec<(String, RegisteredTask)> = match self.lock() {
            Ok(mut tasks) => tasks.drain().collect(),
            Err(err) => {
                log_error!("failed to drain task registry: {err:?}");
                return;
            }
        };

        for (task_id, task) in drained {
            if let Err(err) = task.handle.await {
                log_error!("task {task_id} failed to join: {err:?}");
            }
        }
        log_info!("task registry shut down");
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_TIMEOUT)
    }
}

async fn run_periodic(
    task_id: String,
    period: Duration,
    tick_timeout: Duration,
    handler: TaskHandler,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_debug!("task {task_id} stopping");
                break;
            }
            _ = ticker.tick() => {
                match time::timeout(tick_timeout, handler()).await {
                    Ok(Ok(outcome)) => log_debug!("task {task_id} finished: {outcome:?}"),
                    Ok(Err(err)) => log_error!("task {task_id} failed: {err:?}"),
                    Err(_) => log_warn!("task {task_id} timed out (> {}s)", tick_timeout.as_secs()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_handler(counter: Arc<AtomicUsize>) -> TaskHandler {
        Arc::new(move || -> TaskFuture {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(TaskOutcome::NewData)
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_registration_does_not_stack() {
        let registry = TaskRegistry::default();
        let counter = Arc::new(AtomicUsize::new(0));
        let period = Duration::from_secs(60);

        let first = registry
            .register("step-sync-task", period, counting_handler(counter.clone()))
            .unwrap();
        let second = registry
            .register("step-sync-task", period, counting_handler(counter.clone()))
            .unwrap();
        assert_eq!(first, Registration::Registered);
        assert_eq!(second, Registration::AlreadyRegistered);

        time::sleep(Duration::from_secs(3 * 60 + 1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        registry.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_run_waits_one_interval() {
        let registry = TaskRegistry::default();
        let counter = Arc::new(AtomicUsize::new(0));
        registry
            .register("notification-task", Duration::from_secs(300), counting_handler(counter.clone()))
            .unwrap();

        time::sleep(Duration::from_secs(299)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        registry.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_run_times_out() {
        let registry = TaskRegistry::new(Duration::from_secs(1));
        let handler: TaskHandler = Arc::new(|| -> TaskFuture {
            Box::pin(async {
                time::sleep(Duration::from_secs(600)).await;
                Ok::<_, anyhow::Error>(TaskOutcome::NoData)
            })
        });
        registry
            .register("slow", Duration::from_secs(3600), handler)
            .unwrap();

        assert!(registry.run_now("slow").await.is_err());
        registry.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_clears_and_refuses_new_tasks() {
        let registry = TaskRegistry::default();
        let counter = Arc::new(AtomicUsize::new(0));
        registry
            .register("a", Duration::from_secs(60), counting_handler(counter.clone()))
            .unwrap();
        assert_eq!(registry.registered_ids(), vec!["a".to_string()]);
        assert_eq!(registry.run_now("a").await.unwrap(), TaskOutcome::NewData);

        registry.shutdown().await;
        assert!(!registry.is_registered("a"));
        assert!(registry
            .register("a", Duration::from_secs(60), counting_handler(counter))
            .is_err());
        assert!(registry.run_now("missing").await.is_err());
    }
}
