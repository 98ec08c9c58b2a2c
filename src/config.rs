//! Batch configuration
//!
//! Defaults reproduce the original sample set: Iowa MIS fortissimo piano,
//! -30 dBFS / 10 ms silence scan, 2 s window, 1 s fade, 64 kbps MP3.
//! Values are layered: defaults, then an optional JSON file, then
//! environment variables, then CLI flags (applied by the caller).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::ExportFormat;
use crate::error::{Result, SampleError};

/// Default location of the Iowa MIS piano recordings
pub const DEFAULT_BASE_URL: &str =
    "https://theremin.music.uiowa.edu/sound%20files/MIS/Piano_Other/piano";

const ENV_BASE_URL: &str = "PIANO_SAMPLES_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "PIANO_SAMPLES_TIMEOUT_SECS";

/// Output container for converted samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp3,
    Wav,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
        }
    }
}

/// Full configuration for a download/convert run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// URL directory holding `Piano.<dynamic>.<Note>.aiff`
    pub base_url: String,
    /// Dynamic marking in the remote file name (pp, mf, ff)
    pub dynamic: String,
    /// Where source AIFF files are stored
    pub aiff_dir: PathBuf,
    /// Where converted samples are written
    pub output_dir: PathBuf,
    /// Chunks quieter than this (dBFS) count as leading silence
    pub silence_threshold_db: f64,
    /// Silence scan step in milliseconds
    pub chunk_ms: u64,
    /// Length of each rendered sample in milliseconds
    pub length_ms: u64,
    /// Fade-out length; half the sample length when unset
    pub fade_ms: Option<u64>,
    /// MP3 bitrate in kbit/s
    pub bitrate_kbps: u32,
    /// Bit depth used when `format` is wav
    pub wav_bit_depth: u16,
    pub format: OutputFormat,
    /// Fetch the source recordings before converting
    pub download: bool,
    /// Render sampler files from the source recordings
    pub convert: bool,
    /// Replace files that already exist
    pub overwrite: bool,
    /// Stop at the first failing note
    pub fail_fast: bool,
    /// Write `manifest.json` next to the outputs
    pub write_manifest: bool,
    /// HTTP timeout per request
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            dynamic: "ff".to_string(),
            aiff_dir: PathBuf::from("./static/samples/aiff"),
            output_dir: PathBuf::from("./static/samples/mp3"),
            silence_threshold_db: -30.0,
            chunk_ms: 10,
            length_ms: 2000,
            fade_ms: None,
            bitrate_kbps: 64,
            wav_bit_depth: 16,
            format: OutputFormat::Mp3,
            download: false,
            convert: true,
            overwrite: false,
            fail_fast: false,
            write_manifest: true,
            timeout_secs: 60,
        }
    }
}

impl Config {
    /// Load a config from a JSON file; missing fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SampleError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Apply overrides from `PIANO_SAMPLES_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Ok(raw) = env::var(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.parse().map_err(|_| SampleError::InvalidConfig {
                reason: format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECS, raw),
            })?;
        }
        Ok(())
    }

    /// Effective fade-out length in milliseconds
    pub fn fade_duration_ms(&self) -> u64 {
        self.fade_ms.unwrap_or(self.length_ms / 2)
    }

    /// Encoder settings for the configured output format
    pub fn export_format(&self) -> ExportFormat {
        match self.format {
            OutputFormat::Mp3 => ExportFormat::Mp3 {
                bitrate_kbps: self.bitrate_kbps,
            },
            OutputFormat::Wav => ExportFormat::Wav {
                bit_depth: self.wav_bit_depth,
            },
        }
    }

    /// Check that the settings describe a runnable batch
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| -> Result<()> { Err(SampleError::InvalidConfig { reason }) };

        if self.chunk_ms == 0 {
            return invalid("chunk_ms must be greater than zero".to_string());
        }
        if self.length_ms == 0 {
            return invalid("length_ms must be greater than zero".to_string());
        }
        if self.fade_duration_ms() > self.length_ms {
            return invalid(format!(
                "fade of {} ms is longer than the {} ms sample",
                self.fade_duration_ms(),
                self.length_ms
            ));
        }
        if !self.silence_threshold_db.is_finite() || self.silence_threshold_db > 0.0 {
            return invalid(format!(
                "silence threshold must be a finite dBFS value <= 0, got {}",
                self.silence_threshold_db
            ));
        }
        if self.base_url.is_empty() {
            return invalid("base_url must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return invalid("timeout_secs must be greater than zero".to_string());
        }
        self.export_format().validate()
    }
}

/// Serializes tests that touch `PIANO_SAMPLES_*` variables
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
