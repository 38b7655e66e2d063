/// Core traits for Chime
use crate::error::Result;
use crate::types::{SoundName, SourceRef};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;

/// Platform playable handle for one clip
///
/// This is the primitive the Clip Player drives: one shared instance per
/// logical sound, reused sequentially. Implementations must tolerate
/// `pause`/`rewind` at any time, including before the first `start`.
#[async_trait]
pub trait ClipHandle: Send + Sync {
    /// Load (decode/fetch) the underlying media
    ///
    /// # Errors
    /// Returns an error if the media cannot be read or decoded
    async fn load(&self) -> Result<()>;

    /// Request playback from the current position
    ///
    /// Resolves once playback has actually begun.
    ///
    /// # Errors
    /// Returns `StartDenied` (or another error) when the platform refuses
    /// to begin playback
    async fn start(&self) -> Result<()>;

    /// Resolves when the current playback run reaches the end of the media
    ///
    /// Dropping the returned future stops waiting; it does not stop playback.
    async fn ended(&self);

    /// Pause playback, keeping the position
    fn pause(&self);

    /// Move the playback position back to zero
    fn rewind(&self);

    /// Set playback volume (0.0 - 1.0)
    fn set_volume(&self, volume: f32);

    /// Current playback position
    fn position(&self) -> Duration;

    /// Whether the handle is currently not playing
    fn is_paused(&self) -> bool;
}

/// Platform audio backend
///
/// Creates clip handles and exposes the optional low-level audio context
/// used by the unlock layer.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Create the playable handle for a sound
    ///
    /// Must not block on loading; the registry triggers `ClipHandle::load`
    /// separately.
    ///
    /// # Errors
    /// Returns an error if the source kind is unsupported by this backend
    fn open(&self, name: &SoundName, source: &SourceRef) -> Result<Arc<dyn ClipHandle>>;

    /// Construct and resume the low-level audio context, if the platform
    /// has one
    ///
    /// The default implementation does nothing.
    ///
    /// # Errors
    /// Returns an error if the context cannot be created or resumed
    async fn resume_context(&self) -> Result<()> {
        Ok(())
    }
}

/// Wall-clock source for the trigger scheduler
pub trait WallClock: Send + Sync {
    /// Current local date and time
    fn now(&self) -> NaiveDateTime;
}
