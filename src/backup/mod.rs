//! Backup and restore for MyBrain
//!
//! Snapshots notes, note folders, tasks, diary entries and bookmarks into a
//! single versioned document and restores such documents back into the
//! domain repositories.
//!
//! # Architecture
//!
//! - [`ExportEngine`]: builds a document from the repositories, encodes it,
//!   optionally seals it, and writes it atomically
//! - [`ImportEngine`]: reads, opens, decodes and validates a document before
//!   upserting anything
//!
//! # Backup Format
//!
//! Backups are JSON objects with the following keys:
//! - `formatVersion`: version of the document layout
//! - `notes`, `noteFolders`, `tasks`, `diary`, `bookmarks`: one array per
//!   category, always present, possibly empty
//!
//! Sealed backups wrap that JSON in the envelope described in [`crate::crypto`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mybrain::backup::{ExportEngine, ExportOptions, ImportEngine};
//! use mybrain::storage::{FileSystemStorage, Repositories};
//!
//! let repos = Repositories::in_memory();
//! let storage = Arc::new(FileSystemStorage::new());
//!
//! let exporter = ExportEngine::new(repos.clone(), storage.clone());
//! exporter.export("/tmp/mybrain.json", &ExportOptions::default()).await?;
//!
//! let importer = ImportEngine::new(repos, storage);
//! let report = importer.import("/tmp/mybrain.json", None).await?;
//! println!("{}", report.summary());
//! ```

pub mod codec;
pub mod document;
mod export;
mod import;
pub mod lock;

pub use document::{BackupDocument, CategorySelection, RecordCounts, CURRENT_FORMAT_VERSION};
pub use export::{ExportEngine, ExportOptions, ExportReport};
pub use import::{ImportEngine, ImportReport, ImportTally, LoadedBackup};
pub use lock::{DestinationLocks, RepositoryGate};
