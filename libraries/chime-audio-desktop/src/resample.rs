/// Sample rate conversion for decoded clips
use crate::error::{AudioError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

const CHANNELS: usize = 2;

/// Resample interleaved stereo from `source_rate` to `target_rate`
///
/// Returns the input unchanged when the rates match.
pub fn resample_stereo(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if source_rate == 0 || target_rate == 0 {
        return Err(AudioError::ResampleError(format!(
            "invalid rates {source_rate} -> {target_rate}"
        )));
    }

    let frames = samples.len() / CHANNELS;
    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(target_rate) / f64::from(source_rate),
        2.0,
        params,
        frames,
        CHANNELS,
    )
    .map_err(|e| AudioError::ResampleError(e.to_string()))?;

    // Deinterleave
    let mut planar = vec![Vec::with_capacity(frames); CHANNELS];
    for frame in samples.chunks_exact(CHANNELS) {
        for (channel, sample) in planar.iter_mut().zip(frame) {
            channel.push(*sample);
        }
    }

    let resampled = resampler
        .process(&planar, None)
        .map_err(|e| AudioError::ResampleError(e.to_string()))?;

    // Interleave
    let output_frames = resampled[0].len();
    let mut interleaved = Vec::with_capacity(output_frames * CHANNELS);
    for frame_idx in 0..output_frames {
        for channel in &resampled {
            interleaved.push(channel[frame_idx]);
        }
    }

    Ok(interleaved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_passthrough() {
        let input = vec![0.1, -0.1, 0.2, -0.2];
        assert_eq!(resample_stereo(&input, 48000, 48000).unwrap(), input);
    }

    #[test]
    fn upsampling_grows_length_by_ratio() {
        let input = vec![0.0f32; 44100 * 2];
        let output = resample_stereo(&input, 44100, 48000).unwrap();

        let frames = output.len() / 2;
        assert_eq!(output.len() % 2, 0);
        // Sinc resamplers trim a little at the edges
        assert!((47000..=48100).contains(&frames), "got {frames} frames");
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(resample_stereo(&[0.0, 0.0], 0, 48000).is_err());
    }
}
