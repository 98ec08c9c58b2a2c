//! Audio file I/O
//!
//! Decoding goes through symphonia so AIFF (the source format), WAV and MP3
//! all load into the same [`AudioBuffer`]. Export writes MP3 through LAME or
//! WAV through hound. The sample rate is carried through unchanged.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, Quality};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::engine::buffer::{AudioBuffer, ChannelLayout};
use crate::error::{Result, SampleError};

/// Export format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Constant-bitrate MP3
    Mp3 { bitrate_kbps: u32 },
    /// PCM WAV; 16/24-bit integer or 32-bit float
    Wav { bit_depth: u16 },
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat::Mp3 { bitrate_kbps: 64 }
    }
}

impl ExportFormat {
    /// Reject settings the encoders can't honour
    pub fn validate(&self) -> Result<()> {
        match *self {
            ExportFormat::Mp3 { bitrate_kbps } => lame_bitrate(bitrate_kbps).map(|_| ()),
            ExportFormat::Wav { bit_depth: 16 | 24 | 32 } => Ok(()),
            ExportFormat::Wav { bit_depth } => Err(SampleError::UnsupportedFormat {
                format: format!("{}-bit WAV (only 16, 24, 32 supported)", bit_depth),
            }),
        }
    }
}

/// Import an audio file into memory
///
/// The container is detected from the file contents, using the extension
/// as a hint.
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file cannot be probed or decoded
/// * `UnsupportedFormat` - If the audio has more than 2 channels
/// * `EmptyAudio` - If decoding produced no samples
pub fn import_audio(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(SampleError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| invalid_audio("Failed to probe audio container", e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SampleError::InvalidAudio {
            reason: "no decodable audio track".to_string(),
            source: None,
        })?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| invalid_audio("Unsupported codec", e))?;

    let mut interleaved: Vec<f32> = Vec::new();
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(invalid_audio("Failed to read packet", e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count();
                sample_rate = spec.rate;

                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(sample_buf.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!("Skipping undecodable packet in {}: {}", path.display(), e);
            }
            Err(e) => return Err(invalid_audio("Failed to decode packet", e)),
        }
    }

    let layout = ChannelLayout::from_count(channels).ok_or_else(|| {
        SampleError::UnsupportedFormat {
            format: format!("{}-channel audio (only mono/stereo supported)", channels),
        }
    })?;

    if interleaved.is_empty() || sample_rate == 0 {
        return Err(SampleError::EmptyAudio);
    }

    AudioBuffer::from_interleaved(&interleaved, layout, sample_rate)
}

/// Export an AudioBuffer to disk
///
/// Parent directories are created as needed. MP3 data is encoded in memory
/// before the file is created.
pub fn export_audio(buffer: &AudioBuffer, path: &Path, format: &ExportFormat) -> Result<()> {
    format.validate()?;

    if buffer.is_empty() {
        return Err(SampleError::EmptyAudio);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    match *format {
        ExportFormat::Mp3 { bitrate_kbps } => {
            let bytes = encode_mp3(buffer, bitrate_kbps)?;
            let mut file = File::create(path)?;
            file.write_all(&bytes)?;
            Ok(())
        }
        ExportFormat::Wav { bit_depth } => write_wav(buffer, path, bit_depth),
    }
}

/// Encode a buffer as a constant-bitrate MP3 stream
///
/// LAME is always fed two channels; mono sources are duplicated.
pub fn encode_mp3(buffer: &AudioBuffer, bitrate_kbps: u32) -> Result<Vec<u8>> {
    let bitrate = lame_bitrate(bitrate_kbps)?;

    let mut builder = Builder::new().ok_or_else(|| SampleError::EncodingError {
        reason: "failed to allocate LAME encoder".to_string(),
    })?;
    builder
        .set_num_channels(2)
        .map_err(|e| encoding_error("set channel count", e))?;
    builder
        .set_sample_rate(buffer.sample_rate)
        .map_err(|e| encoding_error("set sample rate", e))?;
    builder
        .set_brate(bitrate)
        .map_err(|e| encoding_error("set bitrate", e))?;
    builder
        .set_quality(Quality::Best)
        .map_err(|e| encoding_error("set quality", e))?;
    let mut lame = builder
        .build()
        .map_err(|e| encoding_error("build encoder", e))?;

    let pcm = buffer.to_stereo().to_interleaved();
    let frames = pcm.len() / 2;

    // LAME recommendation: 1.25 * num_samples + 7200 bytes.
    let estimated_size = ((frames as f64) * 1.25 + 7200.0) as usize;
    let mut mp3_out: Vec<u8> = Vec::with_capacity(estimated_size);

    let written = lame
        .encode(InterleavedPcm(pcm.as_slice()), mp3_out.spare_capacity_mut())
        .map_err(|e| encoding_error("encode", e))?;
    // SAFETY: LAME initialised exactly `written` bytes of spare capacity.
    unsafe {
        mp3_out.set_len(mp3_out.len() + written);
    }

    mp3_out.reserve(7200);
    let flushed = lame
        .flush::<FlushNoGap>(mp3_out.spare_capacity_mut())
        .map_err(|e| encoding_error("flush", e))?;
    // SAFETY: as above, for the flushed tail.
    unsafe {
        mp3_out.set_len(mp3_out.len() + flushed);
    }

    Ok(mp3_out)
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn write_wav(buffer: &AudioBuffer, path: &Path, bit_depth: u16) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let mut writer = WavWriter::create(path, spec).map_err(hound_error)?;

    for sample in buffer.to_interleaved() {
        match bit_depth {
            16 => {
                let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
                writer.write_sample(scaled).map_err(hound_error)?;
            }
            24 => {
                // 24-bit stored as i32 in hound
                let scaled = (sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32;
                writer.write_sample(scaled).map_err(hound_error)?;
            }
            _ => writer.write_sample(sample).map_err(hound_error)?,
        }
    }

    writer.finalize().map_err(hound_error)?;
    Ok(())
}

fn lame_bitrate(kbps: u32) -> Result<Bitrate> {
    let bitrate = match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        other => {
            return Err(SampleError::UnsupportedFormat {
                format: format!("{} kbps MP3 (not a LAME bitrate)", other),
            })
        }
    };
    Ok(bitrate)
}

fn invalid_audio<E>(context: &str, err: E) -> SampleError
where
    E: std::error::Error + Send + Sync + 'static,
{
    SampleError::InvalidAudio {
        reason: format!("{}: {}", context, err),
        source: Some(Box::new(err)),
    }
}

fn encoding_error<E: std::fmt::Debug>(step: &str, err: E) -> SampleError {
    SampleError::EncodingError {
        reason: format!("LAME failed to {}: {:?}", step, err),
    }
}

fn hound_error(err: hound::Error) -> SampleError {
    match err {
        hound::Error::IoError(io) => SampleError::Io(io),
        other => SampleError::EncodingError {
            reason: format!("WAV write failed: {}", other),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
