/// Synthesized sine tones for `SourceRef::Tone` clips
use crate::decode::DecodedClip;
use std::f32::consts::TAU;

/// Peak amplitude of generated tones
const AMPLITUDE: f32 = 0.5;

/// Fade-in/out length, avoids clicks at the edges
const FADE_MS: u32 = 5;

/// Render a stereo sine tone at `sample_rate`
pub fn render_tone(frequency_hz: f32, duration_ms: u32, sample_rate: u32) -> DecodedClip {
    let frames = (u64::from(sample_rate) * u64::from(duration_ms) / 1000) as usize;
    let fade = ((u64::from(sample_rate) * u64::from(FADE_MS) / 1000) as usize)
        .min(frames / 2)
        .max(1);

    let mut samples = Vec::with_capacity(frames * 2);
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let envelope = if i < fade {
            i as f32 / fade as f32
        } else if i >= frames - fade {
            (frames - i) as f32 / fade as f32
        } else {
            1.0
        };
        let sample = (TAU * frequency_hz * t).sin() * AMPLITUDE * envelope;
        samples.push(sample);
        samples.push(sample);
    }

    DecodedClip::new(samples, sample_rate)
}
