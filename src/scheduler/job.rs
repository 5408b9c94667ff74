//! The scheduled backup job
//!
//! One invocation reloads the persisted records and exports every category,
//! unencrypted, into a timestamped file under the configured destination
//! directory. Destination I/O failures
//! are retried with backoff; anything else ends the invocation at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::backup::{ExportEngine, ExportOptions, ExportReport};
use crate::error::{BackupError, BackupResult};

use super::config::ConfigStore;
use super::executor::ScheduledTask;

/// How failed attempts are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait before the second attempt
    pub initial_backoff: Duration,
    /// Factor applied to the wait after every failed attempt
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(30),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Wait after the given failed attempt (1-based)
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Result of one trigger invocation
#[derive(Debug)]
pub enum TriggerOutcome {
    Succeeded { attempts: u32, report: ExportReport },
    Failed { attempts: u32, error: BackupError },
    /// Another invocation was still running
    Skipped,
}

impl TriggerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Export attempts made by this invocation
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
            Self::Skipped => 0,
        }
    }
}

/// Name of the file a scheduled backup started now is written to
pub fn backup_file_name() -> String {
    format!("backup-{}.json", Utc::now().format("%Y%m%d-%H%M%S-%3f"))
}

/// Scheduled export of all categories
pub struct BackupJob {
    exporter: Arc<ExportEngine>,
    config: Arc<dyn ConfigStore>,
    retry: RetryPolicy,
    running: AtomicBool,
}

impl BackupJob {
    pub fn new(exporter: Arc<ExportEngine>, config: Arc<dyn ConfigStore>) -> Self {
        Self::with_retry(exporter, config, RetryPolicy::default())
    }

    pub fn with_retry(
        exporter: Arc<ExportEngine>,
        config: Arc<dyn ConfigStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            exporter,
            config,
            retry,
            running: AtomicBool::new(false),
        }
    }

    /// Whether an invocation is in progress
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one invocation
    pub async fn run(&self) -> TriggerOutcome {
        let Some(_running) = RunningGuard::try_claim(&self.running) else {
            info!("Previous scheduled backup still running, skipping");
            return TriggerOutcome::Skipped;
        };

        let destination = match self.destination() {
            Ok(destination) => destination,
            Err(error) => {
                error!(error = %error, "Scheduled backup not attempted");
                return TriggerOutcome::Failed { attempts: 0, error };
            }
        };

        let location = self
            .exporter
            .storage()
            .join(&destination, &backup_file_name());
        let options = ExportOptions::current();

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.exporter.export(&location, &options).await {
                Ok(report) => {
                    self.record_success();
                    return TriggerOutcome::Succeeded {
                        attempts: attempt,
                        report,
                    };
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let wait = self.retry.backoff_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        retry_in_secs = wait.as_secs(),
                        error = %e,
                        "Scheduled backup attempt failed"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    error!(attempt, location = %location, error = %e, "Scheduled backup failed");
                    return TriggerOutcome::Failed {
                        attempts: attempt,
                        error: e,
                    };
                }
            }
        }
    }

    fn destination(&self) -> BackupResult<String> {
        match self.config.load()? {
            Some(config) if !config.destination.trim().is_empty() => Ok(config.destination),
            _ => Err(BackupError::Precondition(
                "No backup destination configured".to_string(),
            )),
        }
    }

    fn record_success(&self) {
        let result = self.config.load().and_then(|config| match config {
            Some(mut config) => {
                config.last_success = Some(Utc::now());
                self.config.save(&config)
            }
            None => Ok(()),
        });

        if let Err(e) = result {
            warn!(error = %e, "Could not record last successful backup");
        }
    }
}

#[async_trait]
impl ScheduledTask for BackupJob {
    async fn trigger(&self) {
        if let TriggerOutcome::Succeeded { attempts, report } = self.run().await {
            info!(
                location = %report.location,
                attempts,
                records = report.counts.total(),
                "Scheduled backup completed"
            );
        }
    }
}

/// Clears the running flag when the invocation ends, however it ends
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn try_claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
