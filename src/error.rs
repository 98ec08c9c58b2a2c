//! Error handling for piano-samples
//!
//! Every error carries a stable code and, where it helps, recovery suggestions
//! that the CLI prints next to the failure.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for piano-samples operations
pub type Result<T> = std::result::Result<T, SampleError>;

/// Main error type for piano-samples operations
#[derive(Error, Debug)]
pub enum SampleError {
    // Note Errors
    #[error("Invalid note name: {name}")]
    InvalidNote { name: String },

    #[error("MIDI number {midi} is outside the piano range (21-108)")]
    NoteOutOfRange { midi: u8 },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    // Processing Errors
    #[error("No sound found: {path} is silent above the detection threshold")]
    SilentAudio { path: PathBuf },

    #[error("Processing error: {reason}")]
    ProcessingError { reason: String },

    #[error("Encoding error: {reason}")]
    EncodingError { reason: String },

    // Download Errors
    #[error("Download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Server returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SampleError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SampleError::InvalidNote { .. } => "INVALID_NOTE",
            SampleError::NoteOutOfRange { .. } => "NOTE_OUT_OF_RANGE",
            SampleError::FileNotFound { .. } => "FILE_NOT_FOUND",
            SampleError::InvalidAudio { .. } => "INVALID_AUDIO",
            SampleError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            SampleError::EmptyAudio => "EMPTY_AUDIO",
            SampleError::SilentAudio { .. } => "SILENT_AUDIO",
            SampleError::ProcessingError { .. } => "PROCESSING_ERROR",
            SampleError::EncodingError { .. } => "ENCODING_ERROR",
            SampleError::DownloadFailed { .. } => "DOWNLOAD_FAILED",
            SampleError::HttpStatus { .. } => "HTTP_STATUS",
            SampleError::InvalidConfig { .. } => "INVALID_CONFIG",
            SampleError::Io(_) => "IO_ERROR",
            SampleError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the batch can move on to the next note after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SampleError::InvalidConfig { .. } | SampleError::Serialization(_)
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            SampleError::InvalidNote { .. } | SampleError::NoteOutOfRange { .. } => vec![
                "Use names like A0, Bb3, C#4 or C8",
                "Run 'piano-samples notes' to list every key",
            ],
            SampleError::FileNotFound { .. } => vec![
                "Run 'piano-samples download' to fetch the source recordings",
                "Check --aiff-dir points at the downloaded files",
            ],
            SampleError::InvalidAudio { .. } => vec![
                "The file may be a truncated download - re-run with --overwrite",
                "Check if the file plays in another application",
            ],
            SampleError::UnsupportedFormat { .. } => vec![
                "Only mono and stereo AIFF/WAV sources are supported",
            ],
            SampleError::SilentAudio { .. } => vec![
                "Lower the silence threshold with --threshold-db",
                "The recording may be corrupt - re-download it",
            ],
            SampleError::DownloadFailed { .. } => vec![
                "Check your network connection",
                "Increase the timeout with PIANO_SAMPLES_TIMEOUT_SECS",
            ],
            SampleError::HttpStatus { .. } => vec![
                "Verify the base URL and dynamic marking in the config",
            ],
            SampleError::InvalidConfig { .. } => vec!["Fix the configuration and try again"],
            _ => vec![],
        }
    }
}
