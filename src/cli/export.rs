//! CLI command handler for exporting backups

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::backup::{CategorySelection, ExportEngine, ExportOptions};
use crate::error::BackupResult;
use crate::scheduler::job::backup_file_name;
use crate::storage::{FileSystemStorage, Storage};

use super::prompt::read_password;

/// Arguments for `mybrain export`
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file (defaults to a timestamped file in the backup directory)
    #[arg(long)]
    pub to: Option<PathBuf>,

    /// Leave notes and note folders out
    #[arg(long)]
    pub no_notes: bool,

    /// Leave tasks out
    #[arg(long)]
    pub no_tasks: bool,

    /// Leave diary entries out
    #[arg(long)]
    pub no_diary: bool,

    /// Leave bookmarks out
    #[arg(long)]
    pub no_bookmarks: bool,

    /// Seal the backup with a password
    #[arg(long)]
    pub encrypt: bool,
}

impl ExportArgs {
    fn selection(&self) -> CategorySelection {
        CategorySelection {
            notes: !self.no_notes,
            tasks: !self.no_tasks,
            diary: !self.no_diary,
            bookmarks: !self.no_bookmarks,
        }
    }
}

/// Handle the export command
pub async fn handle_export_command(storage: &Storage, args: ExportArgs) -> BackupResult<()> {
    let destination = match &args.to {
        Some(path) => path.clone(),
        None => {
            let mut name = backup_file_name();
            if args.encrypt {
                name = name.replace(".json", ".mbbk");
            }
            storage.paths().backup_dir().join(name)
        }
    };

    let options = if args.encrypt {
        ExportOptions::encrypted(args.selection(), read_password(true)?)
    } else {
        ExportOptions::plain(args.selection())
    };

    let engine = ExportEngine::new(storage.repositories(), Arc::new(FileSystemStorage::new()));
    let report = engine
        .export(&destination.to_string_lossy(), &options)
        .await?;

    println!("Backup created: {}", report.location);
    println!(
        "Size: {}{}",
        format_size(report.bytes_written as u64),
        if report.encrypted { " (encrypted)" } else { "" }
    );
    println!(
        "Contents: {} notes, {} folders, {} tasks, {} diary entries, {} bookmarks",
        report.counts.notes,
        report.counts.note_folders,
        report.counts.tasks,
        report.counts.diary,
        report.counts.bookmarks
    );

    Ok(())
}

/// Format a file size in human-readable form
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_selection_flags() {
        let args = ExportArgs {
            to: None,
            no_notes: false,
            no_tasks: true,
            no_diary: false,
            no_bookmarks: true,
            encrypt: false,
        };
        let selection = args.selection();
        assert!(selection.notes && selection.diary);
        assert!(!selection.tasks && !selection.bookmarks);
    }
}
