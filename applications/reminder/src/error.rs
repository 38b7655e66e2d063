/// Reminder application error types
use chime_core::ChimeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReminderError>;

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Playback error: {0}")]
    Playback(#[from] ChimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ReminderError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
