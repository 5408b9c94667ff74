//! Mutual exclusion for backup operations
//!
//! - [`DestinationLocks`]: at most one export writes a given destination.
//! - [`RepositoryGate`]: imports exclude every other import and export on
//!   the same repositories; exports only exclude imports.
//!
//! Contention is reported as [`BackupError::Busy`]; nothing is queued.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use crate::error::{BackupError, BackupResult};

/// Registry of destinations with an export in flight
#[derive(Debug, Clone, Default)]
pub struct DestinationLocks {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl DestinationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `destination`, or fail with `Busy` if it is already claimed
    pub fn try_acquire(&self, destination: &str) -> BackupResult<DestinationGuard> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|e| BackupError::Storage(format!("Failed to acquire lock: {}", e)))?;

        if !in_flight.insert(destination.to_string()) {
            return Err(BackupError::Busy(format!(
                "An export to {} is already running",
                destination
            )));
        }

        Ok(DestinationGuard {
            in_flight: Arc::clone(&self.in_flight),
            destination: destination.to_string(),
        })
    }

    /// Whether an export to `destination` is running
    pub fn is_held(&self, destination: &str) -> bool {
        self.in_flight
            .lock()
            .map(|set| set.contains(destination))
            .unwrap_or(false)
    }
}

/// Releases its destination when dropped
#[derive(Debug)]
pub struct DestinationGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    destination: String,
}

impl Drop for DestinationGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.destination);
        }
    }
}

/// Reader/writer gate over one set of domain repositories
#[derive(Debug, Clone, Default)]
pub struct RepositoryGate {
    lock: Arc<RwLock<()>>,
}

impl RepositoryGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared access for reading the repositories
    pub fn try_shared(&self) -> BackupResult<OwnedRwLockReadGuard<()>> {
        Arc::clone(&self.lock)
            .try_read_owned()
            .map_err(|_| BackupError::Busy("An import is running".to_string()))
    }

    /// Exclusive access for writing the repositories
    pub fn try_exclusive(&self) -> BackupResult<OwnedRwLockWriteGuard<()>> {
        Arc::clone(&self.lock)
            .try_write_owned()
            .map_err(|_| BackupError::Busy("Another import or export is running".to_string()))
    }
}
