//! Audio unlock priming
//!
//! Some platforms keep audio blocked until a user gesture. On the first
//! gesture of a session the layer starts and immediately stops a registered
//! clip at near-zero volume, and separately resumes the backend's low-level
//! audio context. Both run detached; failures are logged and forgotten.

use crate::registry::Registry;
use crate::sequencer::PlaybackLock;
use chime_core::SoundName;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Volume used while priming
pub const PRIMING_VOLUME: f32 = 0.01;

/// Default bound on the priming start request
pub const PRIMING_START_TIMEOUT: Duration = Duration::from_millis(800);

/// One-shot unlock priming for a session
pub struct UnlockLayer {
    registry: Arc<Registry>,
    lock: PlaybackLock,
    probe: SoundName,
    volume: f32,
    start_timeout: Duration,
    attempted: AtomicBool,
}

impl UnlockLayer {
    /// Prime with the beep clip at `PRIMING_VOLUME`
    pub fn new(registry: Arc<Registry>, lock: PlaybackLock) -> Self {
        Self::with_probe(registry, lock, SoundName::beep(), PRIMING_VOLUME)
    }

    /// Prime with a specific clip and volume
    pub fn with_probe(
        registry: Arc<Registry>,
        lock: PlaybackLock,
        probe: SoundName,
        volume: f32,
    ) -> Self {
        Self {
            registry,
            lock,
            probe,
            volume: volume.clamp(0.0, 1.0),
            start_timeout: PRIMING_START_TIMEOUT,
            attempted: AtomicBool::new(false),
        }
    }

    /// Override how long the priming start may take before it is abandoned
    ///
    /// The playback lock is held for at most this long.
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Whether priming already ran this session
    pub fn is_attempted(&self) -> bool {
        self.attempted.load(Ordering::Acquire)
    }

    /// Handle a user gesture
    ///
    /// Spawns the priming tasks on the first call and returns `true`; every
    /// later call is a no-op returning `false`. Must be called from within a
    /// Tokio runtime.
    pub fn on_user_gesture(&self) -> bool {
        if self.attempted.swap(true, Ordering::AcqRel) {
            return false;
        }

        tracing::debug!(probe = %self.probe, "Priming audio output");
        self.spawn_media_priming();
        self.spawn_context_resume();
        true
    }

    fn spawn_media_priming(&self) {
        let registry = Arc::clone(&self.registry);
        let lock = self.lock.clone();
        let probe = self.probe.clone();
        let volume = self.volume;
        let start_timeout = self.start_timeout;

        tokio::spawn(async move {
            // A playing sequence owns the handles and proves output works.
            let Some(_guard) = lock.try_acquire() else {
                tracing::debug!("Sequence playing, skipping media priming");
                return;
            };

            let resource = match registry.resolve(&probe) {
                Ok(resource) => resource,
                Err(e) => {
                    tracing::debug!(error = %e, "No clip to prime with");
                    return;
                }
            };

            let handle = resource.handle();
            handle.set_volume(volume);
            let started = tokio::time::timeout(start_timeout, handle.start()).await;
            handle.pause();
            handle.rewind();
            handle.set_volume(1.0);

            match started {
                Ok(Ok(())) => tracing::debug!(probe = %probe, "Media priming succeeded"),
                Ok(Err(e)) => tracing::debug!(probe = %probe, error = %e, "Media priming failed"),
                Err(_) => tracing::debug!(
                    probe = %probe,
                    timeout = ?start_timeout,
                    "Media priming start timed out"
                ),
            }
        });
    }

    fn spawn_context_resume(&self) {
        let backend = Arc::clone(self.registry.backend());
        tokio::spawn(async move {
            if let Err(e) = backend.resume_context().await {
                tracing::debug!(error = %e, "Audio context resume failed");
            }
        });
    }
}

impl std::fmt::Debug for UnlockLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockLayer")
            .field("probe", &self.probe)
            .field("volume", &self.volume)
            .field("start_timeout", &self.start_timeout)
            .field("attempted", &self.is_attempted())
            .finish_non_exhaustive()
    }
}
