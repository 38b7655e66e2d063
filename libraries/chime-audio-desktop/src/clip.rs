//! Desktop clip handle
//!
//! Decodes once (on `load`, or on the first `start` if nobody loaded it),
//! resamples once per output rate, then plays through the shared engine.
//! The clip remembers where it was paused so `start` continues from there
//! unless it was rewound.

use crate::backend::OutputSlot;
use crate::decode::{decode_file, DecodedClip};
use crate::resample::resample_stereo;
use crate::tone::render_tone;
use async_trait::async_trait;
use chime_core::{ChimeError, ClipHandle, Result, SoundName, SourceRef};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Rate tones are rendered at before resampling to the device
const TONE_SAMPLE_RATE: u32 = 48000;

/// How often `ended` checks the engine
const END_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One sound on the desktop backend
pub struct DesktopClip {
    name: SoundName,
    source: SourceRef,
    output: Arc<OutputSlot>,
    owner: u64,
    decoded: OnceCell<DecodedClip>,
    /// Decoded clip resampled to the output rate
    prepared: Mutex<Option<DecodedClip>>,
    /// Position to start from, in samples
    offset: AtomicUsize,
    volume: Mutex<f32>,
}

impl DesktopClip {
    pub(crate) fn new(name: SoundName, source: SourceRef, output: Arc<OutputSlot>) -> Self {
        let owner = output.allocate_owner();
        Self {
            name,
            source,
            output,
            owner,
            decoded: OnceCell::new(),
            prepared: Mutex::new(None),
            offset: AtomicUsize::new(0),
            volume: Mutex::new(1.0),
        }
    }

    /// Logical name
    pub fn name(&self) -> &SoundName {
        &self.name
    }

    /// Decoded media at its native rate, if loaded
    pub fn decoded(&self) -> Option<&DecodedClip> {
        self.decoded.get()
    }

    async fn decode(&self) -> Result<&DecodedClip> {
        self.decoded
            .get_or_try_init(|| async {
                let source = self.source.clone();
                let decoded = tokio::task::spawn_blocking(move || match source {
                    SourceRef::File { path } => decode_file(&path),
                    SourceRef::Tone {
                        frequency_hz,
                        duration_ms,
                    } => Ok(render_tone(frequency_hz, duration_ms, TONE_SAMPLE_RATE)),
                })
                .await
                .map_err(|e| ChimeError::load_failed(e.to_string()))??;
                Ok::<_, ChimeError>(decoded)
            })
            .await
    }

    /// Samples at `rate`, resampling and caching on first use
    async fn prepare(&self, rate: u32) -> Result<DecodedClip> {
        if let Some(prepared) = self.prepared_at(rate) {
            return Ok(prepared);
        }

        let decoded = self.decode().await?.clone();
        let prepared = if decoded.sample_rate() == rate {
            decoded
        } else {
            tokio::task::spawn_blocking(move || {
                resample_stereo(decoded.samples(), decoded.sample_rate(), rate)
                    .map(|samples| DecodedClip::new(samples, rate))
            })
            .await
            .map_err(|e| ChimeError::load_failed(e.to_string()))??
        };

        *self.prepared.lock().unwrap_or_else(PoisonError::into_inner) = Some(prepared.clone());
        Ok(prepared)
    }

    fn prepared_at(&self, rate: u32) -> Option<DecodedClip> {
        self.prepared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|p| p.sample_rate() == rate)
            .cloned()
    }

    fn volume(&self) -> f32 {
        *self.volume.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ClipHandle for DesktopClip {
    async fn load(&self) -> Result<()> {
        let decoded = self.decode().await?;
        tracing::debug!(
            sound = %self.name,
            duration = ?decoded.duration(),
            "Clip decoded"
        );

        // Resample ahead of time if the device is already open
        if let Some(engine) = self.output.current() {
            self.prepare(engine.sample_rate()).await?;
        }
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let engine = self.output.open().await?;
        let prepared = self.prepare(engine.sample_rate()).await?;

        let samples = Arc::clone(prepared.samples());
        let from = self.offset.load(Ordering::Acquire).min(samples.len()) & !1;
        engine.play(self.owner, samples, from, self.volume());

        tracing::trace!(sound = %self.name, from, "Clip started");
        Ok(())
    }

    async fn ended(&self) {
        loop {
            if self
                .output
                .current()
                .is_some_and(|engine| engine.is_finished(self.owner))
            {
                return;
            }
            tokio::time::sleep(END_POLL_INTERVAL).await;
        }
    }

    fn pause(&self) {
        if let Some(position) = self
            .output
            .current()
            .and_then(|engine| engine.pause(self.owner))
        {
            self.offset.store(position, Ordering::Release);
        }
    }

    fn rewind(&self) {
        self.offset.store(0, Ordering::Release);
        if let Some(engine) = self.output.current() {
            engine.rewind(self.owner);
        }
    }

    fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        *self.volume.lock().unwrap_or_else(PoisonError::into_inner) = volume;
        if let Some(engine) = self.output.current() {
            engine.set_volume(self.owner, volume);
        }
    }

    fn position(&self) -> Duration {
        let engine = self.output.current();
        let samples = engine
            .as_ref()
            .filter(|engine| engine.is_playing(self.owner))
            .and_then(|engine| engine.position(self.owner))
            .unwrap_or_else(|| self.offset.load(Ordering::Acquire));

        let rate = engine.map_or(0, |engine| engine.sample_rate());
        if rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64((samples / 2) as f64 / f64::from(rate))
    }

    fn is_paused(&self) -> bool {
        !self
            .output
            .current()
            .is_some_and(|engine| engine.is_playing(self.owner))
    }
}

impl std::fmt::Debug for DesktopClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopClip")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("loaded", &self.decoded.initialized())
            .finish_non_exhaustive()
    }
}
