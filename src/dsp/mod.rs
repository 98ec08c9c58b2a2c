//! Sample shaping
//!
//! The two operations applied between decode and export: finding where the
//! note starts and fading out the truncated tail.

mod fade;
mod silence;

pub use fade::{fade_out, FadeOut, DEFAULT_FADE_FLOOR_DB};
pub use silence::{detect_leading_silence, DEFAULT_CHUNK_MS, DEFAULT_SILENCE_THRESHOLD_DB};
