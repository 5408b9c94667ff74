//! Automatic backups
//!
//! [`BackupScheduler`] persists where and how often to back up and keeps a
//! single recurring trigger registered with a [`BackgroundExecutor`]. Each
//! trigger invocation runs the [`BackupJob`].

pub mod config;
pub mod executor;
pub mod job;

pub use config::{BackupConfiguration, BackupFrequency, ConfigStore, InMemoryConfigStore};
pub use executor::{BackgroundExecutor, ScheduledTask, TokioExecutor};
pub use job::{BackupJob, RetryPolicy, TriggerOutcome};

use std::sync::Arc;

use tracing::info;

use crate::backup::ExportEngine;
use crate::error::{BackupError, BackupResult};

/// Name the recurring trigger is registered under
pub const TRIGGER_NAME: &str = "mybrain-auto-backup";

/// Keeps the automatic backup trigger in line with the stored configuration
pub struct BackupScheduler {
    executor: Arc<dyn BackgroundExecutor>,
    config: Arc<dyn ConfigStore>,
    job: Arc<BackupJob>,
}

impl BackupScheduler {
    /// Create a scheduler whose job exports through `exporter`
    pub fn new(
        exporter: Arc<ExportEngine>,
        config: Arc<dyn ConfigStore>,
        executor: Arc<dyn BackgroundExecutor>,
    ) -> Self {
        let job = Arc::new(BackupJob::new(exporter, Arc::clone(&config)));
        Self::with_job(job, config, executor)
    }

    /// Create a scheduler around an existing job
    pub fn with_job(
        job: Arc<BackupJob>,
        config: Arc<dyn ConfigStore>,
        executor: Arc<dyn BackgroundExecutor>,
    ) -> Self {
        Self {
            executor,
            config,
            job,
        }
    }

    /// Back up to `destination` every `amount` x `frequency`.
    ///
    /// Replaces any previous schedule.
    pub fn schedule(
        &self,
        destination: &str,
        frequency: BackupFrequency,
        amount: u32,
    ) -> BackupResult<BackupConfiguration> {
        if destination.trim().is_empty() {
            return Err(BackupError::Precondition(
                "Backup destination must not be blank".to_string(),
            ));
        }
        if amount < 1 {
            return Err(BackupError::Precondition(
                "Backup interval amount must be at least 1".to_string(),
            ));
        }

        let mut config = BackupConfiguration::new(destination, frequency, amount);
        if let Some(previous) = self.config.load()? {
            if previous.destination == config.destination {
                config.last_success = previous.last_success;
            }
        }

        self.config.save(&config)?;
        self.register(&config)?;

        info!(destination, %frequency, amount, "Automatic backups scheduled");
        Ok(config)
    }

    /// Stop automatic backups and forget the configuration.
    ///
    /// An invocation already running is left to finish.
    pub fn cancel(&self) -> BackupResult<()> {
        self.executor.cancel(TRIGGER_NAME)?;
        self.config.clear()?;
        info!("Automatic backups cancelled");
        Ok(())
    }

    /// Register the trigger again from the stored configuration, if any
    pub fn resume(&self) -> BackupResult<Option<BackupConfiguration>> {
        let config = self.config.load()?;
        if let Some(config) = &config {
            self.register(config)?;
            info!(schedule = %config.describe(), "Automatic backups resumed");
        }
        Ok(config)
    }

    /// The stored configuration
    pub fn configuration(&self) -> BackupResult<Option<BackupConfiguration>> {
        self.config.load()
    }

    /// The job fired by the trigger
    pub fn job(&self) -> &Arc<BackupJob> {
        &self.job
    }

    fn register(&self, config: &BackupConfiguration) -> BackupResult<()> {
        let task: Arc<dyn ScheduledTask> = self.job.clone();
        self.executor
            .register_recurring(TRIGGER_NAME, config.interval(), task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::storage::{FileSystemStorage, Repositories};
    use chrono::Utc;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingExecutor {
        registered: Mutex<Vec<(String, Duration)>>,
        cancelled: Mutex<Vec<String>>,
    }

    impl BackgroundExecutor for RecordingExecutor {
        fn register_recurring(
            &self,
            name: &str,
            interval: Duration,
            _task: Arc<dyn ScheduledTask>,
        ) -> BackupResult<()> {
            self.registered
                .lock()
                .unwrap()
                .push((name.to_string(), interval));
            Ok(())
        }

        fn cancel(&self, name: &str) -> BackupResult<()> {
            self.cancelled.lock().unwrap().push(name.to_string());
            Ok(())
        }
    }

    fn create_test_scheduler() -> (BackupScheduler, Arc<RecordingExecutor>, Arc<InMemoryConfigStore>) {
        let executor = Arc::new(RecordingExecutor::default());
        let config = Arc::new(InMemoryConfigStore::new());
        let exporter = Arc::new(ExportEngine::new(
            Repositories::in_memory(),
            Arc::new(FileSystemStorage::new()),
        ));
        let scheduler = BackupScheduler::new(exporter, config.clone(), executor.clone());
        (scheduler, executor, config)
    }

    #[test]
    fn test_schedule_persists_and_registers() {
        let (scheduler, executor, config) = create_test_scheduler();

        scheduler
            .schedule("/backups", BackupFrequency::Weekly, 2)
            .unwrap();

        let stored = config.load().unwrap().unwrap();
        assert_eq!(stored.destination, "/backups");
        assert_eq!(stored.amount, 2);

        let registered = executor.registered.lock().unwrap();
        assert_eq!(
            registered.as_slice(),
            &[(TRIGGER_NAME.to_string(), Duration::from_secs(2 * 168 * 3600))]
        );
    }

    #[test]
    fn test_schedule_rejects_bad_input() {
        let (scheduler, executor, config) = create_test_scheduler();

        let err = scheduler
            .schedule("/backups", BackupFrequency::Daily, 0)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);

        let err = scheduler.schedule("", BackupFrequency::Daily, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);

        assert!(config.load().unwrap().is_none());
        assert!(executor.registered.lock().unwrap().is_empty());
    }

    #[test]
    fn test_reschedule_same_destination_keeps_last_success() {
        let (scheduler, _executor, config) = create_test_scheduler();
        let mut existing = BackupConfiguration::new("/backups", BackupFrequency::Daily, 1);
        existing.last_success = Some(Utc::now());
        config.save(&existing).unwrap();

        let updated = scheduler
            .schedule("/backups", BackupFrequency::Hourly, 6)
            .unwrap();
        assert_eq!(updated.last_success, existing.last_success);

        let moved = scheduler
            .schedule("/elsewhere", BackupFrequency::Hourly, 6)
            .unwrap();
        assert!(moved.last_success.is_none());
    }

    #[test]
    fn test_cancel_clears_and_unregisters() {
        let (scheduler, executor, config) = create_test_scheduler();
        scheduler.schedule("/b", BackupFrequency::Daily, 1).unwrap();

        scheduler.cancel().unwrap();

        assert!(config.load().unwrap().is_none());
        assert_eq!(executor.cancelled.lock().unwrap().as_slice(), &[TRIGGER_NAME.to_string()]);
    }

    #[test]
    fn test_resume() {
        let (scheduler, executor, config) = create_test_scheduler();
        assert!(scheduler.resume().unwrap().is_none());
        assert!(executor.registered.lock().unwrap().is_empty());

        config
            .save(&BackupConfiguration::new("/b", BackupFrequency::Hourly, 1))
            .unwrap();
        let resumed = scheduler.resume().unwrap().unwrap();

        assert_eq!(resumed.frequency, BackupFrequency::Hourly);
        assert_eq!(executor.registered.lock().unwrap().len(), 1);
        assert_eq!(scheduler.configuration().unwrap(), Some(resumed));
    }

    #[tokio::test]
    async fn test_tokio_executor_end_to_end_registration() {
        let executor = Arc::new(TokioExecutor::new());
        let config = Arc::new(InMemoryConfigStore::new());
        let exporter = Arc::new(ExportEngine::new(
            Repositories::in_memory(),
            Arc::new(FileSystemStorage::new()),
        ));
        let scheduler = BackupScheduler::new(exporter, config, executor.clone());

        scheduler.schedule("/b", BackupFrequency::Daily, 1).unwrap();
        assert!(executor.is_registered(TRIGGER_NAME));

        scheduler.cancel().unwrap();
        assert!(!executor.is_registered(TRIGGER_NAME));
    }
}
