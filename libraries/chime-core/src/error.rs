/// Core error types for Chime
use crate::types::{ClipOutcome, SoundName};
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `ChimeError`
pub type Result<T> = std::result::Result<T, ChimeError>;

/// Core error type for Chime
#[derive(Error, Debug)]
pub enum ChimeError {
    /// A sound is configured inconsistently (e.g. re-registered with a
    /// different source)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A logical sound name was never registered
    #[error("Sound not registered: {0}")]
    ResourceNotFound(SoundName),

    /// The platform refused to begin playback
    #[error("Playback start denied: {0}")]
    StartDenied(String),

    /// Playback neither completed nor errored within the attempt timeout
    #[error("Playback stalled after {0:?}")]
    PlaybackStalled(Duration),

    /// A clip inside a reminder sequence did not complete
    #[error("Clip {name} settled as {outcome}")]
    SequenceClipFailure {
        /// The clip that failed
        name: SoundName,
        /// How it settled
        outcome: ClipOutcome,
    },

    /// Loading/decoding the underlying media failed
    #[error("Load failed: {0}")]
    LoadFailed(String),

    /// Audio device errors
    #[error("Audio error: {0}")]
    Audio(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ChimeError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a start-denied error
    pub fn start_denied(msg: impl Into<String>) -> Self {
        Self::StartDenied(msg.into())
    }

    /// Create a load error
    pub fn load_failed(msg: impl Into<String>) -> Self {
        Self::LoadFailed(msg.into())
    }

    /// Create an audio error
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Whether retrying the same operation could succeed.
    ///
    /// Missing or misconfigured sounds never fix themselves between attempts.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Configuration(_) | Self::ResourceNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_not_retryable() {
        assert!(!ChimeError::configuration("dup").is_retryable());
        assert!(!ChimeError::ResourceNotFound(SoundName::beep()).is_retryable());
        assert!(ChimeError::start_denied("gesture required").is_retryable());
        assert!(ChimeError::load_failed("truncated").is_retryable());
    }

    #[test]
    fn clip_failure_message_names_the_clip() {
        let err = ChimeError::SequenceClipFailure {
            name: SoundName::medicine_time(),
            outcome: ClipOutcome::TimedOut,
        };
        assert_eq!(err.to_string(), "Clip medicine-time settled as timed-out");
    }
}
