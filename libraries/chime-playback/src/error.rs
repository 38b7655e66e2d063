//! Error types for the reminder engine

use std::time::Duration;
use thiserror::Error;

pub use chime_core::{ChimeError, Result};

/// Reasons a manual test request is turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TestRejected {
    /// A previous manual test is still running (or in its trailing window)
    #[error("A test is already in progress")]
    InProgress,

    /// The last accepted test started too recently
    #[error("Test cooling down, retry in {remaining:?}")]
    CoolingDown {
        /// Time left until a new request is accepted
        remaining: Duration,
    },

    /// A scheduled reminder is playing right now
    #[error("A reminder is playing")]
    Busy,
}
