//! Scheduled backup configuration and where it is kept

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BackupError, BackupResult};

/// Base unit of the backup interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupFrequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl BackupFrequency {
    /// Length of one unit in hours
    pub fn hours(&self) -> u64 {
        match self {
            Self::Hourly => 1,
            Self::Daily => 24,
            Self::Weekly => 24 * 7,
            Self::Monthly => 24 * 30,
        }
    }
}

impl fmt::Display for BackupFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for BackupFrequency {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(BackupError::Precondition(format!(
                "Unknown backup frequency '{}'. Use hourly, daily, weekly or monthly",
                other
            ))),
        }
    }
}

/// Where and how often scheduled backups run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfiguration {
    /// Directory the timestamped backup files are written to
    pub destination: String,
    pub frequency: BackupFrequency,
    /// Number of frequency units between backups, at least 1
    pub amount: u32,
    /// When the last scheduled backup completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
}

impl BackupConfiguration {
    pub fn new(destination: impl Into<String>, frequency: BackupFrequency, amount: u32) -> Self {
        Self {
            destination: destination.into(),
            frequency,
            amount,
            last_success: None,
        }
    }

    /// Time between two trigger invocations
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.frequency.hours() * u64::from(self.amount) * 3600)
    }

    /// Human readable summary, e.g. `every 2 x weekly to /backups`
    pub fn describe(&self) -> String {
        if self.amount == 1 {
            format!("{} to {}", self.frequency, self.destination)
        } else {
            format!(
                "every {} x {} to {}",
                self.amount, self.frequency, self.destination
            )
        }
    }
}

/// Persistence for the scheduled backup configuration
pub trait ConfigStore: Send + Sync {
    /// The stored configuration, if any
    fn load(&self) -> BackupResult<Option<BackupConfiguration>>;

    /// Replace the stored configuration
    fn save(&self, config: &BackupConfiguration) -> BackupResult<()>;

    /// Forget the stored configuration
    fn clear(&self) -> BackupResult<()>;
}

/// Config store that lives only as long as the process
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    config: Mutex<Option<BackupConfiguration>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BackupConfiguration) -> Self {
        Self {
            config: Mutex::new(Some(config)),
        }
    }

    fn lock(&self) -> BackupResult<std::sync::MutexGuard<'_, Option<BackupConfiguration>>> {
        self.config
            .lock()
            .map_err(|e| BackupError::Config(format!("Failed to acquire lock: {}", e)))
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load(&self) -> BackupResult<Option<BackupConfiguration>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, config: &BackupConfiguration) -> BackupResult<()> {
        *self.lock()? = Some(config.clone());
        Ok(())
    }

    fn clear(&self) -> BackupResult<()> {
        *self.lock()? = None;
        Ok(())
    }
}
