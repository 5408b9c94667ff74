//! Automatic backup CLI commands

use std::sync::Arc;

use clap::Subcommand;

use crate::backup::ExportEngine;
use crate::config::SettingsStore;
use crate::error::BackupResult;
use crate::scheduler::{BackgroundExecutor, BackupFrequency, BackupScheduler, TokioExecutor};
use crate::storage::{FileSystemStorage, Storage};

/// Schedule subcommands
#[derive(Subcommand, Debug)]
pub enum ScheduleCommands {
    /// Back up automatically into a directory
    Set {
        /// Directory the backups are written to
        destination: String,

        /// hourly, daily, weekly or monthly
        #[arg(long)]
        every: BackupFrequency,

        /// Number of periods between backups
        #[arg(long, default_value = "1")]
        amount: u32,
    },

    /// Stop automatic backups
    Cancel,

    /// Show the current schedule
    Show,
}

/// Build the scheduler used by the CLI
pub fn build_scheduler(storage: &Storage, executor: Arc<dyn BackgroundExecutor>) -> BackupScheduler {
    let exporter = Arc::new(ExportEngine::new(
        storage.repositories(),
        Arc::new(FileSystemStorage::new()),
    ));
    let config = Arc::new(SettingsStore::new(storage.paths().clone()));
    BackupScheduler::new(exporter, config, executor)
}

/// Handle a schedule command
pub fn handle_schedule_command(storage: &Storage, cmd: ScheduleCommands) -> BackupResult<()> {
    let scheduler = build_scheduler(storage, Arc::new(TokioExecutor::new()));

    match cmd {
        ScheduleCommands::Set {
            destination,
            every,
            amount,
        } => {
            let config = scheduler.schedule(&destination, every, amount)?;
            println!("Automatic backups: {}", config.describe());
            println!("Run 'mybrain run' to keep them going in the background.");
        }

        ScheduleCommands::Cancel => {
            scheduler.cancel()?;
            println!("Automatic backups cancelled.");
        }

        ScheduleCommands::Show => match scheduler.configuration()? {
            Some(config) => {
                println!("Automatic Backups");
                println!("=================");
                println!("Destination: {}", config.destination);
                println!("Every:       {} x {}", config.amount, config.frequency);
                match config.last_success {
                    Some(at) => println!("Last backup: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
                    None => println!("Last backup: never"),
                }
            }
            None => {
                println!("No automatic backups scheduled.");
                println!("Set one with: mybrain schedule set <DIR> --every daily");
            }
        },
    }

    Ok(())
}
