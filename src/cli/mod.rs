//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup engines.

pub mod export;
pub mod import;
pub mod prompt;
pub mod schedule;

pub use export::{handle_export_command, ExportArgs};
pub use import::{handle_import_command, ImportArgs};
pub use schedule::{build_scheduler, handle_schedule_command, ScheduleCommands};
