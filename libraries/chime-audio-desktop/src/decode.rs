//! Whole-file decoding with Symphonia
//!
//! Reminder clips are short, so files are decoded completely up front into
//! interleaved stereo f32. Every Symphonia sample type goes through the same
//! interleaving routine; only the normalization differs per type. Mono is
//! duplicated to both channels, extra channels beyond the first two are
//! dropped.

use crate::error::{AudioError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Fully decoded clip, interleaved stereo f32
#[derive(Debug, Clone)]
pub struct DecodedClip {
    samples: Arc<Vec<f32>>,
    sample_rate: u32,
}

impl DecodedClip {
    /// Wrap interleaved stereo samples
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            sample_rate,
        }
    }

    /// Interleaved stereo samples
    pub fn samples(&self) -> &Arc<Vec<f32>> {
        &self.samples
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    /// Play length
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate))
    }
}

/// Decode an audio file (mp3, wav, flac, ogg, ...) to stereo f32
pub fn decode_file(path: &Path) -> Result<DecodedClip> {
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
        .map_err(|e| AudioError::UnsupportedFormat(format!("{}: {}", path.display(), e)))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| AudioError::UnsupportedFormat(format!("{}: no audio track", path.display())))?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
        AudioError::UnsupportedFormat(format!("{}: unknown sample rate", path.display()))
    })?;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => samples.extend(convert_to_f32_interleaved(decoded)),
            // Corrupt packet, skip it
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!(path = %path.display(), error = e, "Skipping undecodable packet");
            }
            Err(e) => return Err(e.into()),
        }
    }

    if samples.is_empty() {
        return Err(AudioError::DecodeError(format!(
            "{}: no audio decoded",
            path.display()
        )));
    }

    tracing::debug!(
        path = %path.display(),
        sample_rate,
        frames = samples.len() / 2,
        "Decoded clip"
    );
    Ok(DecodedClip::new(samples, sample_rate))
}

/// Interleave planar audio of any sample type into stereo f32
fn interleave_to_stereo_f32<T, F>(buf: &AudioBuffer<T>, normalize: F) -> Vec<f32>
where
    T: Sample,
    F: Fn(T) -> f32,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    let mut output = Vec::with_capacity(frames * 2);

    let left = buf.chan(0);
    let right = if channels > 1 { buf.chan(1) } else { left };
    for (l, r) in left.iter().zip(right) {
        output.push(normalize(*l));
        output.push(normalize(*r));
    }

    output
}

/// Convert a decoded Symphonia buffer to stereo f32 in `[-1.0, 1.0]`
fn convert_to_f32_interleaved(decoded: AudioBufferRef<'_>) -> Vec<f32> {
    match decoded {
        AudioBufferRef::F32(buf) => interleave_to_stereo_f32(&buf, |s| s),
        AudioBufferRef::F64(buf) => interleave_to_stereo_f32(&buf, |s| s as f32),

        AudioBufferRef::S8(buf) => interleave_to_stereo_f32(&buf, |s| f32::from(s) / f32::from(i8::MAX)),
        AudioBufferRef::S16(buf) => {
            interleave_to_stereo_f32(&buf, |s| f32::from(s) / f32::from(i16::MAX))
        }
        AudioBufferRef::S24(buf) => interleave_to_stereo_f32(&buf, |s| s.inner() as f32 / 8388607.0),
        AudioBufferRef::S32(buf) => interleave_to_stereo_f32(&buf, |s| s as f32 / i32::MAX as f32),

        AudioBufferRef::U8(buf) => {
            interleave_to_stereo_f32(&buf, |s| (f32::from(s) / f32::from(u8::MAX)) * 2.0 - 1.0)
        }
        AudioBufferRef::U16(buf) => {
            interleave_to_stereo_f32(&buf, |s| (f32::from(s) / f32::from(u16::MAX)) * 2.0 - 1.0)
        }
        AudioBufferRef::U24(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s.inner() as f32 / 16777215.0) * 2.0 - 1.0)
        }
        AudioBufferRef::U32(buf) => {
            interleave_to_stereo_f32(&buf, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0)
        }
    }
}
