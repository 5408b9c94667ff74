//! Recurring background execution
//!
//! The scheduler hands a named [`ScheduledTask`] to a [`BackgroundExecutor`],
//! which fires it on a fixed interval until cancelled.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::{BackupError, BackupResult};

/// Work fired by the executor on every tick
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    async fn trigger(&self);
}

/// Fires named tasks on a recurring interval
pub trait BackgroundExecutor: Send + Sync {
    /// Register `task` under `name`, replacing any task already using it.
    /// The first invocation happens one `interval` from now.
    fn register_recurring(
        &self,
        name: &str,
        interval: Duration,
        task: Arc<dyn ScheduledTask>,
    ) -> BackupResult<()>;

    /// Stop firing `name`. Unknown names are ignored.
    fn cancel(&self, name: &str) -> BackupResult<()>;
}

/// Executor backed by the ambient tokio runtime
#[derive(Default)]
pub struct TokioExecutor {
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TokioExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a timer is registered under `name`
    pub fn is_registered(&self, name: &str) -> bool {
        self.timers
            .lock()
            .map(|timers| timers.contains_key(name))
            .unwrap_or(false)
    }

    fn lock(&self) -> BackupResult<std::sync::MutexGuard<'_, HashMap<String, JoinHandle<()>>>> {
        self.timers
            .lock()
            .map_err(|e| BackupError::Storage(format!("Failed to acquire lock: {}", e)))
    }
}

impl BackgroundExecutor for TokioExecutor {
    fn register_recurring(
        &self,
        name: &str,
        interval: Duration,
        task: Arc<dyn ScheduledTask>,
    ) -> BackupResult<()> {
        if interval.is_zero() {
            return Err(BackupError::Precondition(
                "Trigger interval must be greater than zero".to_string(),
            ));
        }

        let handle = Handle::try_current().map_err(|e| {
            BackupError::Precondition(format!("No async runtime to schedule on: {}", e))
        })?;

        let trigger_name = name.to_string();
        let timer = handle.spawn(async move {
            let mut ticks = interval_at(Instant::now() + interval, interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;
                debug!(trigger = %trigger_name, "Trigger fired");

                // Run detached so cancelling the timer never aborts a backup mid-write
                let task = Arc::clone(&task);
                tokio::spawn(async move { task.trigger().await });
            }
        });

        if let Some(previous) = self.lock()?.insert(name.to_string(), timer) {
            previous.abort();
        }

        info!(trigger = name, every_secs = interval.as_secs(), "Registered recurring trigger");
        Ok(())
    }

    fn cancel(&self, name: &str) -> BackupResult<()> {
        if let Some(timer) = self.lock()?.remove(name) {
            timer.abort();
            info!(trigger = name, "Cancelled recurring trigger");
        }
        Ok(())
    }
}

impl Drop for TokioExecutor {
    fn drop(&mut self) {
        if let Ok(timers) = self.timers.get_mut() {
            for (_, timer) in timers.drain() {
                timer.abort();
            }
        }
    }
}
