use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use mybrain::cli::{
    build_scheduler, handle_export_command, handle_import_command, handle_schedule_command,
    ExportArgs, ImportArgs, ScheduleCommands,
};
use mybrain::config::MyBrainPaths;
use mybrain::scheduler::TokioExecutor;
use mybrain::storage::Storage;

#[derive(Parser)]
#[command(
    name = "mybrain",
    version,
    about = "Backup and restore for MyBrain notes, tasks, diary and bookmarks",
    long_about = "Export MyBrain data into a single versioned backup file, optionally \
                  sealed with a password, restore it without losing local records, \
                  and keep automatic backups running on a schedule."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a backup file
    Export(ExportArgs),

    /// Restore a backup file
    Import(ImportArgs),

    /// Manage automatic backups
    #[command(subcommand)]
    Schedule(ScheduleCommands),

    /// Run automatic backups until interrupted
    Run,

    /// Show where MyBrain keeps its files
    Paths,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mybrain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let paths = MyBrainPaths::new()?;
    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Export(args)) => handle_export_command(&storage, args).await?,
        Some(Commands::Import(args)) => handle_import_command(&storage, args).await?,
        Some(Commands::Schedule(cmd)) => handle_schedule_command(&storage, cmd)?,
        Some(Commands::Run) => {
            let scheduler = build_scheduler(&storage, Arc::new(TokioExecutor::new()));
            match scheduler.resume()? {
                Some(config) => {
                    println!("Automatic backups running: {}", config.describe());
                    println!("Press Ctrl-C to stop.");
                    tokio::signal::ctrl_c().await?;
                    println!("Stopped.");
                }
                None => {
                    println!("No automatic backups scheduled.");
                    println!("Set one with: mybrain schedule set <DIR> --every daily");
                }
            }
        }
        Some(Commands::Paths) => {
            println!("MyBrain Paths");
            println!("=============");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
        }
        None => {
            println!("MyBrain backup - snapshots for notes, tasks, diary and bookmarks");
            println!();
            println!("Run 'mybrain --help' for usage information.");
        }
    }

    Ok(())
}
