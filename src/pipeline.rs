//! Batch pipeline
//!
//! For each note: optionally download the source recording, then decode it,
//! skip leading silence, cut a fixed-length window, fade out the tail, and
//! export. Notes are processed one after another; a failing note is recorded
//! and the batch moves on unless `fail_fast` is set or the error is not
//! recoverable.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::download::{DownloadOutcome, Downloader};
use crate::dsp::{detect_leading_silence, FadeOut};
use crate::engine::{export_audio, import_audio};
use crate::error::{Result, SampleError};
use crate::notes::PianoNote;

/// File name of the JSON run report written to the output directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Result of rendering one note
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertOutcome {
    pub output: PathBuf,
    /// Leading silence that was skipped, in milliseconds
    pub start_ms: u64,
    /// Length of the rendered sample in milliseconds
    pub length_ms: u64,
    pub sample_rate: u32,
    pub channels: usize,
    /// Level of the rendered sample
    pub peak_dbfs: f64,
}

/// Everything that happened to one note during a run
#[derive(Debug, Clone, Serialize)]
pub struct NoteOutcome {
    pub note: PianoNote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<DownloadOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convert: Option<ConvertOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    /// Set when the error leaves nothing for later notes to succeed on
    #[serde(skip)]
    pub fatal: bool,
}

impl NoteOutcome {
    fn new(note: PianoNote) -> Self {
        Self {
            note,
            download: None,
            convert: None,
            error: None,
            error_code: None,
            fatal: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub notes: Vec<NoteOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.notes.iter().filter(|n| n.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.notes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &NoteOutcome> {
        self.notes.iter().filter(|n| !n.is_success())
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Path of a note's source recording
pub fn source_path(config: &Config, note: PianoNote) -> PathBuf {
    config.aiff_dir.join(format!("{}.aiff", note))
}

/// Path of a note's rendered sample
pub fn output_path(config: &Config, note: PianoNote) -> PathBuf {
    config
        .output_dir
        .join(format!("{}.{}", note, config.format.extension()))
}

/// Render one note from its source recording
///
/// # Errors
/// * `FileNotFound` - If the source recording is missing
/// * `SilentAudio` - If nothing in the recording reaches the threshold
/// * Any decode or encode error from the engine
pub fn convert_note(config: &Config, note: PianoNote) -> Result<ConvertOutcome> {
    let source = source_path(config, note);
    let audio = import_audio(&source)?;

    let start_ms = detect_leading_silence(&audio, config.silence_threshold_db, config.chunk_ms)?;
    if start_ms >= audio.duration_ms() {
        return Err(SampleError::SilentAudio { path: source });
    }
    tracing::debug!(
        "{}: {} ms leading silence in {} ms recording",
        note,
        start_ms,
        audio.duration_ms()
    );

    let mut sample = audio.slice_ms(start_ms, start_ms + config.length_ms);
    FadeOut::new(config.fade_duration_ms()).process(&mut sample);

    let output = output_path(config, note);
    export_audio(&sample, &output, &config.export_format())?;

    Ok(ConvertOutcome {
        output,
        start_ms,
        length_ms: sample.duration_ms(),
        sample_rate: sample.sample_rate,
        channels: sample.channels(),
        peak_dbfs: sample.peak_dbfs(),
    })
}

/// Sequential download/convert driver
pub struct Pipeline {
    config: Config,
    downloader: Option<Downloader>,
}

impl Pipeline {
    /// Validate the config and prepare the HTTP client when downloads are on
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let downloader = if config.download {
            Some(Downloader::new(&config)?)
        } else {
            None
        };
        Ok(Self { config, downloader })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process one note through the enabled stages
    pub fn process_note(&self, note: PianoNote) -> NoteOutcome {
        let mut outcome = NoteOutcome::new(note);

        if let Some(downloader) = &self.downloader {
            match downloader.fetch(note, &source_path(&self.config, note)) {
                Ok(result) => outcome.download = Some(result),
                Err(e) => {
                    record_error(&mut outcome, &e);
                    return outcome;
                }
            }
        }

        if self.config.convert {
            match convert_note(&self.config, note) {
                Ok(result) => {
                    tracing::info!(
                        "{} -> {} (start {} ms)",
                        note,
                        result.output.display(),
                        result.start_ms
                    );
                    outcome.convert = Some(result);
                }
                Err(e) => record_error(&mut outcome, &e),
            }
        }

        outcome
    }

    /// Run the batch over `notes` in order
    pub fn run(&self, notes: &[PianoNote]) -> Result<RunReport> {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(notes.len());

        for (i, &note) in notes.iter().enumerate() {
            tracing::info!("[{}/{}] {}", i + 1, notes.len(), note);
            let outcome = self.process_note(note);
            let stop = self.stops_batch(&outcome);
            outcomes.push(outcome);

            if stop {
                tracing::warn!("Stopping after failure on {}", note);
                break;
            }
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            notes: outcomes,
        };

        if self.config.write_manifest && self.config.convert {
            report.write_json(&self.config.output_dir.join(MANIFEST_FILE))?;
        }

        Ok(report)
    }

    /// Whether the batch ends after `outcome`
    fn stops_batch(&self, outcome: &NoteOutcome) -> bool {
        outcome.fatal || (!outcome.is_success() && self.config.fail_fast)
    }
}

fn record_error(outcome: &mut NoteOutcome, err: &SampleError) {
    tracing::warn!("{} failed: {}", outcome.note, err);
    outcome.error = Some(err.to_string());
    outcome.error_code = Some(err.error_code());
    outcome.fatal = !err.is_recoverable();
}
