//! CLI Module
//!
//! Command-line interface for the piano sample builder.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, OutputFormat};

/// Piano Samples - fetch piano note recordings and render sampler files
#[derive(Parser, Debug)]
#[command(name = "piano-samples")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON config file (fields not given keep their defaults)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download (with --download) and convert the sample set
    #[command(name = "run")]
    Run {
        /// Fetch source recordings before converting
        #[arg(long)]
        download: bool,

        /// Only download, skip conversion
        #[arg(long)]
        no_convert: bool,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Download source recordings only
    #[command(name = "download")]
    Download {
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Convert already-downloaded recordings
    #[command(name = "convert")]
    Convert {
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Show which notes are downloaded and converted
    #[command(name = "status")]
    Status {
        #[command(flatten)]
        batch: BatchArgs,
    },

    /// List the 88 note names
    #[command(name = "notes")]
    Notes,
}

/// Overrides shared by the batch commands
#[derive(Args, Debug, Default, Clone)]
pub struct BatchArgs {
    /// Comma-separated subset of notes, e.g. "A0,C4,Bb5"
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Directory for source AIFF files
    #[arg(long)]
    pub aiff_dir: Option<PathBuf>,

    /// Directory for rendered samples
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// MP3 bitrate in kbit/s
    #[arg(long)]
    pub bitrate: Option<u32>,

    /// Silence threshold in dBFS
    #[arg(long, allow_hyphen_values = true)]
    pub threshold_db: Option<f64>,

    /// Silence scan step in milliseconds
    #[arg(long)]
    pub chunk_ms: Option<u64>,

    /// Rendered sample length in milliseconds
    #[arg(long)]
    pub length_ms: Option<u64>,

    /// Fade-out length in milliseconds (default: half the sample length)
    #[arg(long)]
    pub fade_ms: Option<u64>,

    /// Base URL of the remote recordings
    #[arg(long)]
    pub base_url: Option<String>,

    /// Replace existing files
    #[arg(long)]
    pub overwrite: bool,

    /// Stop at the first failing note
    #[arg(long)]
    pub fail_fast: bool,

    /// Don't write manifest.json
    #[arg(long)]
    pub no_manifest: bool,
}

impl BatchArgs {
    /// Layer these flags over a loaded config
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.aiff_dir {
            config.aiff_dir = dir.clone();
        }
        if let Some(dir) = &self.out_dir {
            config.output_dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(bitrate) = self.bitrate {
            config.bitrate_kbps = bitrate;
        }
        if let Some(db) = self.threshold_db {
            config.silence_threshold_db = db;
        }
        if let Some(ms) = self.chunk_ms {
            config.chunk_ms = ms;
        }
        if let Some(ms) = self.length_ms {
            config.length_ms = ms;
        }
        if self.fade_ms.is_some() {
            config.fade_ms = self.fade_ms;
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        config.overwrite |= self.overwrite;
        config.fail_fast |= self.fail_fast;
        if self.no_manifest {
            config.write_manifest = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "piano-samples",
            "run",
            "--download",
            "--notes",
            "A0,C8",
            "--threshold-db",
            "-40",
            "--format",
            "wav",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                download,
                no_convert,
                batch,
            } => {
                assert!(download);
                assert!(!no_convert);
                let mut config = Config::default();
                batch.apply(&mut config);
                assert_eq!(config.silence_threshold_db, -40.0);
                assert_eq!(config.format, OutputFormat::Wav);
                assert_eq!(batch.notes.as_deref(), Some("A0,C8"));
            }
            other => panic!("Expected run command, got {:?}", other),
        }
    }

    #[test]
    fn test_flags_leave_unset_fields_alone() {
        let mut config = Config {
            length_ms: 1500,
            ..Config::default()
        };
        BatchArgs::default().apply(&mut config);
        assert_eq!(config.length_ms, 1500);
        assert!(config.write_manifest);
    }
}
