use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;

use envnode_etl::bluetooth::run_monitor;
use envnode_etl::config::{ExportConfig, MonitorConfig};
use envnode_etl::export::export_history;
use envnode_etl::utils::load_history_files;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow live readings from the configured devices
    Monitor,
    /// Decode retrieved history logs into one CSV table
    Export {
        /// Directory for the exported table (overrides ENVNODE_EXPORT_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// History log files, in the order their records should appear
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

async fn monitor() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = match MonitorConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        let _ = tx.send(());
    });

    // Run monitor or wait for shutdown signal
    tokio::select! {
        result = run_monitor(&config) => {
            match result {
                Ok(_) => info!("Monitor completed"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}

fn export(output_dir: Option<PathBuf>, files: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let config = ExportConfig::new(output_dir);

    let measurements = load_history_files(files)?;
    if measurements.is_empty() {
        info!("No complete records found in {} files", files.len());
    }

    let path = export_history(&config.export_dir, &measurements)?;
    println!("{}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Monitor => monitor().await,
        Command::Export { output_dir, files } => export(output_dir, &files),
    }
}
