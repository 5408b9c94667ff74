//! MyBrain backup - snapshots and restores for MyBrain personal data
//!
//! This library exports notes, note folders, tasks, diary entries and
//! bookmarks into a single versioned backup document, optionally sealed with
//! a password, and restores such documents back without losing local data.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and settings persistence
//! - `error`: Custom error types
//! - `models`: Domain records and the identifier compatibility layer
//! - `storage`: Repository and destination contracts, JSON file storage
//! - `crypto`: Password-based sealing of backups
//! - `backup`: Backup document, codec, export and import engines
//! - `scheduler`: Recurring automatic backups
//! - `cli`: Command handlers for the `mybrain` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use mybrain::config::MyBrainPaths;
//! use mybrain::storage::Storage;
//!
//! let paths = MyBrainPaths::new()?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod storage;

pub use error::{BackupError, BackupResult};
