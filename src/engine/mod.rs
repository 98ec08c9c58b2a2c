//! Audio Engine Module
//!
//! In-memory audio buffers plus file decode/encode.

pub mod buffer;
pub mod io;

pub use buffer::{AudioBuffer, ChannelLayout};
pub use io::{encode_mp3, export_audio, import_audio, ExportFormat};
