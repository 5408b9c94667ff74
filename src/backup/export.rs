//! Export engine
//!
//! Pulls the current records of every selected domain, assembles a
//! [`BackupDocument`], encodes it, optionally seals it with a password and
//! writes it to the destination in one atomic replace.

use std::sync::Arc;

use tracing::{debug, info};

use crate::crypto::{self, Password};
use crate::error::{BackupError, BackupResult};
use crate::storage::{BackupStorage, Repositories};

use super::codec;
use super::document::{BackupDocument, CategorySelection, RecordCounts, CURRENT_FORMAT_VERSION};

/// What to export and how
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Categories to pull from the repositories
    pub include: CategorySelection,
    /// Seal the output with `password`
    pub encrypted: bool,
    /// Required and non-empty when `encrypted` is set
    pub password: Option<Password>,
    /// Reload persisted records before taking the snapshot
    pub refresh: bool,
}

impl ExportOptions {
    /// Plaintext export of every category as persisted right now
    pub fn current() -> Self {
        Self {
            refresh: true,
            ..Self::default()
        }
    }

    /// Plaintext export of the given categories
    pub fn plain(include: CategorySelection) -> Self {
        Self {
            include,
            encrypted: false,
            password: None,
            refresh: false,
        }
    }

    /// Password-sealed export of the given categories
    pub fn encrypted(include: CategorySelection, password: Password) -> Self {
        Self {
            include,
            encrypted: true,
            password: Some(password),
            refresh: false,
        }
    }
}

/// Outcome of a successful export
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Where the backup was written
    pub location: String,
    pub format_version: u32,
    pub encrypted: bool,
    pub bytes_written: usize,
    pub counts: RecordCounts,
}

/// Builds and writes backups.
///
/// Engines built over clones of one [`Repositories`] share its destination
/// locks, so only one of them writes a given destination at a time.
pub struct ExportEngine {
    repos: Repositories,
    storage: Arc<dyn BackupStorage>,
}

impl ExportEngine {
    /// Create a new ExportEngine
    pub fn new(repos: Repositories, storage: Arc<dyn BackupStorage>) -> Self {
        Self { repos, storage }
    }

    /// The destination collaborator this engine writes through
    pub fn storage(&self) -> &Arc<dyn BackupStorage> {
        &self.storage
    }

    /// Export a snapshot to `destination`
    pub async fn export(
        &self,
        destination: &str,
        options: &ExportOptions,
    ) -> BackupResult<ExportReport> {
        if destination.trim().is_empty() {
            return Err(BackupError::Precondition(
                "Backup destination must not be blank".to_string(),
            ));
        }

        let password = if options.encrypted {
            match &options.password {
                Some(password) if !password.is_empty() => Some(password.clone()),
                _ => {
                    return Err(BackupError::Precondition(
                        "An encrypted export requires a non-empty password".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        let _flight = self.repos.destinations().try_acquire(destination)?;
        let _shared = if options.refresh {
            let exclusive = self.repos.gate().try_exclusive()?;
            self.repos.refresh().await?;
            exclusive.downgrade()
        } else {
            self.repos.gate().try_shared()?
        };

        let document = self.build_document(&options.include).await?;
        let counts = document.counts();

        let mut bytes = codec::encode(&document)?;
        if let Some(password) = password {
            // Key derivation is deliberately slow; keep it off the async workers
            bytes = tokio::task::spawn_blocking(move || crypto::seal(&bytes, &password)).await??;
        }

        let bytes_written = bytes.len();
        self.storage.write_atomic(destination, bytes).await?;

        info!(
            destination,
            records = counts.total(),
            bytes = bytes_written,
            encrypted = options.encrypted,
            "Backup exported"
        );

        Ok(ExportReport {
            location: destination.to_string(),
            format_version: CURRENT_FORMAT_VERSION,
            encrypted: options.encrypted,
            bytes_written,
            counts,
        })
    }

    /// Assemble a document from the repositories without writing it.
    ///
    /// Excluded categories stay empty. Note folders travel with notes.
    pub async fn build_document(&self, include: &CategorySelection) -> BackupResult<BackupDocument> {
        let mut document = BackupDocument::new();

        if include.notes {
            document.notes = self.repos.notes.list_all().await?;
            document.note_folders = self.repos.folders.list_all().await?;
        }
        if include.tasks {
            document.tasks = self.repos.tasks.list_all().await?;
        }
        if include.diary {
            document.diary_entries = self.repos.diary.list_all().await?;
        }
        if include.bookmarks {
            document.bookmarks = self.repos.bookmarks.list_all().await?;
        }

        debug!(?include, counts = ?document.counts(), "Built backup document");
        Ok(document)
    }
}
