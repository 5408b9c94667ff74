//! CLI command handler for restoring backups
//!
//! Imports upsert: records in the backup overwrite local records with the
//! same id, and nothing local is ever deleted. If the imported state cannot
//! be saved, memory and disk both stay as they were before the import.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::backup::{ImportEngine, ImportReport, ImportTally, LoadedBackup};
use crate::crypto::Password;
use crate::error::BackupResult;
use crate::storage::{FileSystemStorage, Storage};

use super::prompt::read_password;

/// Arguments for `mybrain import`
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Backup file to restore
    pub path: PathBuf,

    /// Show what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Tabled)]
struct TallyRow {
    #[tabled(rename = "Category")]
    category: &'static str,
    #[tabled(rename = "New")]
    inserted: usize,
    #[tabled(rename = "Updated")]
    updated: usize,
}

impl TallyRow {
    fn new(category: &'static str, tally: ImportTally) -> Self {
        Self {
            category,
            inserted: tally.inserted,
            updated: tally.updated,
        }
    }
}

/// Handle the import command
pub async fn handle_import_command(storage: &Storage, args: ImportArgs) -> BackupResult<()> {
    let source = args.path.to_string_lossy().to_string();
    let engine = ImportEngine::new(storage.repositories(), Arc::new(FileSystemStorage::new()));

    let backup = engine.read(&source).await?;
    let password = password_for(&backup).await?;

    let report = if args.dry_run {
        engine.inspect_loaded(backup, password.as_ref()).await?
    } else {
        commit_import(storage, &engine, backup, password.as_ref()).await?
    };

    println!("Backup: {} (format version {})", report.source, report.format_version);
    println!("{}", summary_table(&report));
    println!("{}", report.summary());
    if report.dry_run {
        println!("Dry run: nothing was written. Run again without --dry-run to import.");
    }

    Ok(())
}

/// Import into memory and save, or roll memory back if either step fails
async fn commit_import(
    storage: &Storage,
    engine: &ImportEngine,
    backup: LoadedBackup,
    password: Option<&Password>,
) -> BackupResult<ImportReport> {
    let before = storage.snapshot()?;

    let result = match engine.import_loaded(backup, password).await {
        Ok(report) => storage.save_all().map(|()| report),
        Err(e) => Err(e),
    };

    if result.is_err() {
        storage.restore(before)?;
    }
    result
}

/// Only sealed backups need a password
async fn password_for(backup: &LoadedBackup) -> BackupResult<Option<Password>> {
    if !backup.is_sealed() {
        return Ok(None);
    }
    let password = tokio::task::spawn_blocking(|| read_password(false)).await??;
    Ok(Some(password))
}

fn summary_table(report: &ImportReport) -> String {
    let rows = vec![
        TallyRow::new("Notes", report.notes),
        TallyRow::new("Folders", report.note_folders),
        TallyRow::new("Tasks", report.tasks),
        TallyRow::new("Diary", report.diary),
        TallyRow::new("Bookmarks", report.bookmarks),
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}
