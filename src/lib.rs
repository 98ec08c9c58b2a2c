//! Piano Samples - sampler-ready piano notes
//!
//! Downloads the 88 fortissimo piano recordings from the University of Iowa
//! MIS collection and renders each into a short sample:
//! 1. Skip leading silence (chunked RMS scan against a dBFS threshold)
//! 2. Cut a fixed-length window from the note onset
//! 3. Fade out the second half
//! 4. Export as MP3 (or WAV)
//!
//! The whole batch runs sequentially; see [`pipeline::Pipeline`].

pub mod cli;
pub mod config;
pub mod download;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod notes;
pub mod pipeline;

pub use config::{Config, OutputFormat};
pub use error::{Result, SampleError};
pub use notes::PianoNote;
