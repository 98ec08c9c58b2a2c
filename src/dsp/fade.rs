//! Fade-out
//!
//! Ramps the tail of a buffer down to a floor gain so the truncated note
//! ends without a click.

use crate::engine::buffer::db_to_linear;
use crate::engine::AudioBuffer;

/// Gain reached at the last frame of a fade (-120 dB, effectively silent)
pub const DEFAULT_FADE_FLOOR_DB: f32 = -120.0;

/// Linear fade applied to the end of a buffer
///
/// The gain moves linearly in amplitude from unity at the start of the
/// faded region to `floor_db` at the final frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeOut {
    duration_ms: u64,
    floor_db: f32,
}

impl FadeOut {
    /// Create a fade covering the last `duration_ms` of the audio
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            floor_db: DEFAULT_FADE_FLOOR_DB,
        }
    }

    /// Override the gain reached at the end of the fade
    pub fn with_floor_db(mut self, floor_db: f32) -> Self {
        self.floor_db = floor_db;
        self
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn floor_db(&self) -> f32 {
        self.floor_db
    }

    /// Apply the fade in place
    ///
    /// A fade longer than the buffer covers the whole buffer.
    pub fn process(&self, buffer: &mut AudioBuffer) {
        let len = buffer.len();
        let fade_frames = buffer.frames_for_ms(self.duration_ms).min(len);
        if fade_frames == 0 {
            return;
        }

        let start = len - fade_frames;
        let floor = db_to_linear(self.floor_db);
        let step = if fade_frames > 1 {
            (floor - 1.0) / (fade_frames - 1) as f32
        } else {
            floor - 1.0
        };

        for ch in 0..buffer.channels() {
            let tail = &mut buffer.channel_mut(ch)[start..];
            for (i, sample) in tail.iter_mut().enumerate() {
                *sample *= 1.0 + step * i as f32;
            }
        }
    }
}

/// Fade out the last `duration_ms` of `buffer` to -120 dB
pub fn fade_out(buffer: &mut AudioBuffer, duration_ms: u64) {
    FadeOut::new(duration_ms).process(buffer);
}
