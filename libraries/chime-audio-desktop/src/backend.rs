//! `AudioBackend` implementation over CPAL
//!
//! The output device is opened lazily, on the first start or context
//! resume, so a machine without audio can still register and load sounds.
//! A failed open is not cached; the next start tries again.

use crate::clip::DesktopClip;
use crate::engine::{AudioEngine, NO_OWNER};
use crate::error::{AudioError, Result};
use async_trait::async_trait;
use chime_core::{AudioBackend, ClipHandle, SoundName, SourceRef};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Lazily opened engine shared by every clip of a backend
pub(crate) struct OutputSlot {
    engine: Mutex<Option<Arc<AudioEngine>>>,
    next_owner: AtomicU64,
}

impl OutputSlot {
    fn new() -> Self {
        Self {
            engine: Mutex::new(None),
            next_owner: AtomicU64::new(NO_OWNER + 1),
        }
    }

    pub(crate) fn allocate_owner(&self) -> u64 {
        self.next_owner.fetch_add(1, Ordering::Relaxed)
    }

    /// The engine, if it is already open
    pub(crate) fn current(&self) -> Option<Arc<AudioEngine>> {
        self.engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The engine, opening the default device if needed
    pub(crate) async fn open(self: &Arc<Self>) -> Result<Arc<AudioEngine>> {
        if let Some(engine) = self.current() {
            return Ok(engine);
        }

        let slot = Arc::clone(self);
        tokio::task::spawn_blocking(move || slot.open_blocking())
            .await
            .map_err(|e| AudioError::DeviceError(e.to_string()))?
    }

    fn open_blocking(&self) -> Result<Arc<AudioEngine>> {
        let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(engine) = engine.as_ref() {
            return Ok(Arc::clone(engine));
        }

        match AudioEngine::open_default() {
            Ok(opened) => {
                let opened = Arc::new(opened);
                *engine = Some(Arc::clone(&opened));
                Ok(opened)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to open audio output");
                Err(e)
            }
        }
    }
}

/// Desktop audio backend on the default CPAL output device
pub struct CpalBackend {
    output: Arc<OutputSlot>,
}

impl CpalBackend {
    /// Create a backend; no device is touched until playback
    pub fn new() -> Self {
        Self {
            output: Arc::new(OutputSlot::new()),
        }
    }

    /// Whether the output device has been opened
    pub fn is_open(&self) -> bool {
        self.output.current().is_some()
    }

    /// Output sample rate, once the device is open
    pub fn sample_rate(&self) -> Option<u32> {
        self.output.current().map(|engine| engine.sample_rate())
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioBackend for CpalBackend {
    fn open(&self, name: &SoundName, source: &SourceRef) -> chime_core::Result<Arc<dyn ClipHandle>> {
        Ok(Arc::new(DesktopClip::new(
            name.clone(),
            source.clone(),
            Arc::clone(&self.output),
        )))
    }

    async fn resume_context(&self) -> chime_core::Result<()> {
        let engine = self.output.open().await?;
        tokio::task::spawn_blocking(move || engine.resume())
            .await
            .map_err(|e| chime_core::ChimeError::audio(e.to_string()))??;
        tracing::debug!("Audio output resumed");
        Ok(())
    }
}

impl std::fmt::Debug for CpalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalBackend")
            .field("open", &self.is_open())
            .finish()
    }
}
