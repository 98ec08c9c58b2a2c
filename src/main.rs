//! Piano Samples CLI
//!
//! Command-line entry point for downloading and rendering piano samples.

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use piano_samples::cli::{commands, Cli, Commands};
use piano_samples::SampleError;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Piano Samples v{}", env!("CARGO_PKG_VERSION"));

    handle_command(&cli).map_err(|err| {
        if let Some(sample_err) = err.downcast_ref::<SampleError>() {
            for suggestion in sample_err.recovery_suggestions() {
                eprintln!("hint: {}", suggestion);
            }
        }
        err
    })
}

fn handle_command(cli: &Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();

    let (batch, download, convert) = match &cli.command {
        Commands::Notes => {
            commands::list_notes()?;
            return Ok(());
        }
        Commands::Status { batch } => {
            let config = commands::load_config(config_path, batch)?;
            commands::show_status(&config)?;
            return Ok(());
        }
        Commands::Run {
            download,
            no_convert,
            batch,
        } => (batch, *download, !*no_convert),
        Commands::Download { batch } => (batch, true, false),
        Commands::Convert { batch } => (batch, false, true),
    };

    let mut config = commands::load_config(config_path, batch).context("loading configuration")?;
    config.download = download;
    config.convert = convert;

    let notes = commands::selected_notes(batch).context("parsing --notes")?;
    let report = commands::run_batch(config, &notes)?;

    if report.failed() > 0 {
        bail!("{} of {} notes failed", report.failed(), report.notes.len());
    }
    Ok(())
}
