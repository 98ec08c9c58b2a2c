//! Leading silence detection
//!
//! Walks the audio in fixed-size chunks and stops at the first chunk whose
//! RMS level reaches the threshold. The returned offset is always a whole
//! number of chunks, so a note onset is rounded down to the chunk it falls in.

use crate::engine::AudioBuffer;
use crate::error::{Result, SampleError};

/// Default threshold below which a chunk counts as silence (dBFS)
pub const DEFAULT_SILENCE_THRESHOLD_DB: f64 = -30.0;

/// Default scan step in milliseconds
pub const DEFAULT_CHUNK_MS: u64 = 10;

/// Find how many milliseconds of leading silence `buffer` starts with
///
/// Returns a value at or past `buffer.duration_ms()` when no chunk reaches
/// the threshold.
///
/// # Errors
/// * `ProcessingError` - If `chunk_ms` is zero
pub fn detect_leading_silence(buffer: &AudioBuffer, threshold_db: f64, chunk_ms: u64) -> Result<u64> {
    if chunk_ms == 0 {
        return Err(SampleError::ProcessingError {
            reason: "silence scan chunk size must be greater than zero".to_string(),
        });
    }

    let duration_ms = buffer.duration_ms();
    let mut trim_ms = 0;

    while trim_ms < duration_ms && buffer.slice_ms(trim_ms, trim_ms + chunk_ms).dbfs() < threshold_db {
        trim_ms += chunk_ms;
    }

    Ok(trim_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChannelLayout;
    use test_case::test_case;

    /// `silence_ms` of zeros followed by a full-scale sine
    fn delayed_tone(silence_ms: u64, tone_ms: u64, sample_rate: u32) -> AudioBuffer {
        let silent = (silence_ms * sample_rate as u64 / 1000) as usize;
        let total = ((silence_ms + tone_ms) * sample_rate as u64 / 1000) as usize;
        let mut buffer = AudioBuffer::new(total, ChannelLayout::Stereo, sample_rate);
        let angular = 2.0 * std::f32::consts::PI * 440.0 / sample_rate as f32;
        for ch in 0..2 {
            for (i, s) in buffer.channel_mut(ch).iter_mut().enumerate().skip(silent) {
                *s = (angular * i as f32).sin();
            }
        }
        buffer
    }

    #[test_case(0, 0)]
    #[test_case(50, 50)]
    #[test_case(123, 120)]
    #[test_case(300, 300)]
    fn test_detects_onset(silence_ms: u64, expected: u64) {
        // 123 ms of silence leaves 7 ms of tone in the [120, 130) chunk, well above -30 dB
        let buffer = delayed_tone(silence_ms, 500, 44100);
        let trim = detect_leading_silence(&buffer, DEFAULT_SILENCE_THRESHOLD_DB, DEFAULT_CHUNK_MS).unwrap();
        assert_eq!(trim, expected);
    }

    #[test]
    fn test_all_silent_reaches_end() {
        let buffer = AudioBuffer::new(44100, ChannelLayout::Mono, 44100);
        let trim = detect_leading_silence(&buffer, -30.0, 10).unwrap();
        assert!(trim >= buffer.duration_ms());
    }

    #[test]
    fn test_quiet_noise_floor_counts_as_silence() {
        let mut buffer = delayed_tone(200, 300, 8000);
        // -40 dBFS hiss on the left channel before the onset
        for s in buffer.channel_mut(0).iter_mut().take(1600) {
            *s = 0.01;
        }
        let trim = detect_leading_silence(&buffer, -30.0, 10).unwrap();
        assert_eq!(trim, 200);

        let strict = detect_leading_silence(&buffer, -50.0, 10).unwrap();
        assert_eq!(strict, 0);
    }

    #[test]
    fn test_zero_chunk_is_rejected() {
        let buffer = delayed_tone(10, 10, 8000);
        assert!(detect_leading_silence(&buffer, -30.0, 0).is_err());
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = AudioBuffer::new(0, ChannelLayout::Mono, 44100);
        assert_eq!(detect_leading_silence(&buffer, -30.0, 10).unwrap(), 0);
    }
}
