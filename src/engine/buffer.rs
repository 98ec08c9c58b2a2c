//! Audio Buffer Management
//!
//! Provides the in-memory audio type used between decoding and export.
//! Samples are planar 32-bit float normalized to [-1.0, 1.0]; the sample
//! rate is whatever the source file used (no resampling happens).
//!
//! Time positions are expressed in milliseconds, matching how sample
//! lengths, fades, and silence chunks are configured.

use crate::error::{Result, SampleError};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// Returns `-inf` for zero or negative input.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    Mono,
    /// Two channels (stereo: left, right)
    #[default]
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Decoded audio held in memory
///
/// # Example
/// ```
/// use piano_samples::engine::{AudioBuffer, ChannelLayout};
///
/// // One second of stereo silence at 44.1kHz
/// let buffer = AudioBuffer::new(44100, ChannelLayout::Stereo, 44100);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.duration_ms(), 1000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zeroed buffer with `num_samples` frames per channel
    pub fn new(num_samples: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        let num_channels = layout.num_channels();
        Self {
            samples: vec![vec![0.0_f32; num_samples]; num_channels],
            sample_rate,
        }
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// Fails if the data length doesn't divide evenly into frames.
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(SampleError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
                source: None,
            });
        }

        let num_samples = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_samples); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Convert the buffer to interleaved format (L, R, L, R, ...)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let num_samples = self.len();
        let mut interleaved = Vec::with_capacity(self.channels() * num_samples);

        for sample_idx in 0..num_samples {
            for channel in &self.samples {
                interleaved.push(channel[sample_idx]);
            }
        }

        interleaved
    }

    /// Get the number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty (no samples)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the channel layout
    pub fn channel_layout(&self) -> Option<ChannelLayout> {
        ChannelLayout::from_count(self.channels())
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Duration in milliseconds, rounded to the nearest millisecond
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        ((self.len() as f64 * 1000.0) / self.sample_rate as f64).round() as u64
    }

    /// Number of frames covered by `ms` milliseconds (rounded down)
    #[inline]
    pub fn frames_for_ms(&self, ms: u64) -> usize {
        (ms as u128 * self.sample_rate as u128 / 1000) as usize
    }

    /// Copy out the `[start_ms, end_ms)` window
    ///
    /// Both ends are clamped to the buffer, so slicing past the end returns
    /// whatever audio is left (possibly nothing).
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> AudioBuffer {
        let len = self.len();
        let start = self.frames_for_ms(start_ms).min(len);
        let end = self.frames_for_ms(end_ms).clamp(start, len);

        AudioBuffer {
            samples: self
                .samples
                .iter()
                .map(|ch| ch[start..end].to_vec())
                .collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// RMS level relative to full scale, over every sample of every channel
    ///
    /// Empty or all-zero audio reports `-inf`.
    pub fn dbfs(&self) -> f64 {
        let total = self.channels() * self.len();
        if total == 0 {
            return f64::NEG_INFINITY;
        }

        let sum_squares: f64 = self
            .samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| (s as f64) * (s as f64))
            .sum();

        linear_to_db((sum_squares / total as f64).sqrt())
    }

    /// Peak level relative to full scale
    pub fn peak_dbfs(&self) -> f64 {
        let peak = self
            .samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max);

        linear_to_db(peak as f64)
    }

    /// Duplicate a mono buffer into two identical channels
    ///
    /// Stereo input is returned unchanged.
    pub fn to_stereo(&self) -> AudioBuffer {
        match self.channel_layout() {
            Some(ChannelLayout::Mono) => AudioBuffer {
                samples: vec![self.samples[0].clone(), self.samples[0].clone()],
                sample_rate: self.sample_rate,
            },
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(frames: usize, sample_rate: u32) -> AudioBuffer {
        let mut buffer = AudioBuffer::new(frames, ChannelLayout::Mono, sample_rate);
        for (i, s) in buffer.channel_mut(0).iter_mut().enumerate() {
            *s = i as f32;
        }
        buffer
    }

    #[test]
    fn test_duration_rounds_to_nearest_ms() {
        let buffer = AudioBuffer::new(44100, ChannelLayout::Stereo, 44100);
        assert_eq!(buffer.duration_ms(), 1000);

        // 66 frames at 44.1kHz = 1.4966 ms
        let buffer = AudioBuffer::new(66, ChannelLayout::Mono, 44100);
        assert_eq!(buffer.duration_ms(), 1);
    }

    #[test]
    fn test_slice_ms_frames() {
        let buffer = ramp(1000, 1000);
        let slice = buffer.slice_ms(100, 250);
        assert_eq!(slice.len(), 150);
        assert_eq!(slice.channel(0)[0], 100.0);
        assert_eq!(slice.sample_rate, 1000);
    }

    #[test]
    fn test_slice_ms_clamps_to_end() {
        let buffer = ramp(1000, 1000);
        assert_eq!(buffer.slice_ms(900, 5000).len(), 100);
        assert!(buffer.slice_ms(2000, 3000).is_empty());
        assert!(buffer.slice_ms(500, 100).is_empty());
    }

    #[test]
    fn test_dbfs_of_full_scale_square() {
        let buffer =
            AudioBuffer::from_interleaved(&[1.0, -1.0, 1.0, -1.0], ChannelLayout::Stereo, 8000)
                .unwrap();
        assert_relative_eq!(buffer.dbfs(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dbfs_of_sine() {
        let mut buffer = AudioBuffer::new(48000, ChannelLayout::Mono, 48000);
        for (i, s) in buffer.channel_mut(0).iter_mut().enumerate() {
            *s = (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin();
        }
        // RMS of a unit sine is 1/sqrt(2) = -3.01 dB
        assert_relative_eq!(buffer.dbfs(), -3.01, epsilon = 0.01);
        assert_relative_eq!(buffer.peak_dbfs(), 0.0, epsilon = 0.01);
    }

    #[test]
    fn test_dbfs_of_silence_is_negative_infinity() {
        let buffer = AudioBuffer::new(100, ChannelLayout::Mono, 8000);
        assert_eq!(buffer.dbfs(), f64::NEG_INFINITY);
        let empty = AudioBuffer::new(0, ChannelLayout::Stereo, 8000);
        assert_eq!(empty.dbfs(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_interleave_roundtrip() {
        let data = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let buffer = AudioBuffer::from_interleaved(&data, ChannelLayout::Stereo, 44100).unwrap();
        assert_eq!(buffer.channel(0), &[0.1, 0.3, 0.5]);
        assert_eq!(buffer.channel(1), &[0.2, 0.4, 0.6]);
        assert_eq!(buffer.to_interleaved(), data.to_vec());
    }

    #[test]
    fn test_from_interleaved_rejects_partial_frame() {
        let result = AudioBuffer::from_interleaved(&[0.0, 0.1, 0.2], ChannelLayout::Stereo, 44100);
        assert!(result.is_err());
    }

    #[test]
    fn test_to_stereo_duplicates_mono() {
        let buffer = ramp(4, 1000);
        let stereo = buffer.to_stereo();
        assert_eq!(stereo.channels(), 2);
        assert_eq!(stereo.channel(0), stereo.channel(1));
    }

    #[test]
    fn test_db_conversions() {
        assert_relative_eq!(db_to_linear(-6.0206), 0.5, epsilon = 1e-4);
        assert_relative_eq!(linear_to_db(0.5), -6.0206, epsilon = 1e-4);
        assert_eq!(linear_to_db(0.0), f64::NEG_INFINITY);
    }
}
