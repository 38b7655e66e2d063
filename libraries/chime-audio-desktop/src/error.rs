/// Desktop audio errors
use chime_core::ChimeError;
use thiserror::Error;

/// Result type for desktop audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Desktop audio errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// No default output device
    #[error("Audio device not found")]
    DeviceNotFound,

    /// Failed to query or configure the device
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Failed to build output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    /// Failed to play stream
    #[error("Failed to play stream: {0}")]
    PlayError(String),

    /// Failed to pause stream
    #[error("Failed to pause stream: {0}")]
    PauseError(String),

    /// The audio thread is gone
    #[error("Audio engine stopped")]
    EngineStopped,

    /// Sample rate conversion error
    #[error("Sample rate conversion error: {0}")]
    ResampleError(String),

    /// Unsupported audio format or source kind
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Reading or decoding the media failed
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::PlayError(err.to_string())
    }
}

impl From<cpal::PauseStreamError> for AudioError {
    fn from(err: cpal::PauseStreamError) -> Self {
        AudioError::PauseError(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        AudioError::DeviceError(err.to_string())
    }
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AudioError::DecodeError(err.to_string())
    }
}

impl From<AudioError> for ChimeError {
    fn from(err: AudioError) -> Self {
        match err {
            // Media problems surface as load failures
            AudioError::UnsupportedFormat(_)
            | AudioError::DecodeError(_)
            | AudioError::ResampleError(_) => ChimeError::load_failed(err.to_string()),
            AudioError::Io(e) => ChimeError::Io(e),
            // The output refused to run: the platform denied the start
            AudioError::DeviceNotFound
            | AudioError::DeviceError(_)
            | AudioError::StreamBuildError(_)
            | AudioError::PlayError(_)
            | AudioError::PauseError(_)
            | AudioError::EngineStopped => ChimeError::start_denied(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_errors_become_start_denied() {
        let err: ChimeError = AudioError::DeviceNotFound.into();
        assert!(matches!(err, ChimeError::StartDenied(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn media_errors_become_load_failed() {
        let err: ChimeError = AudioError::DecodeError("truncated".into()).into();
        assert!(matches!(err, ChimeError::LoadFailed(ref m) if m.contains("truncated")));
    }
}
