/// Resource readiness and playback outcomes
use super::sound::SoundName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Load state of an audio resource
///
/// Advances `NotLoaded -> Loading -> Ready | Errored`. The only backwards
/// edge is `Errored -> Loading`, taken on an explicit reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    /// Registered, no load requested yet
    #[default]
    NotLoaded,
    /// Load in flight
    Loading,
    /// Media decoded and playable
    Ready,
    /// Last load failed
    Errored,
}

impl ReadyState {
    /// Whether a state machine edge from `self` to `next` is allowed
    #[must_use]
    pub fn can_advance_to(self, next: ReadyState) -> bool {
        use ReadyState::{Errored, Loading, NotLoaded, Ready};
        matches!(
            (self, next),
            (NotLoaded, Loading) | (Loading, Ready) | (Loading, Errored) | (Errored, Loading)
        )
    }

    /// Whether `ensure_loaded` should issue a platform load request
    #[must_use]
    pub fn needs_load(self) -> bool {
        matches!(self, ReadyState::NotLoaded | ReadyState::Errored)
    }

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotLoaded => "not loaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Errored => "errored",
        }
    }
}

impl std::fmt::Display for ReadyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one Clip Player invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipOutcome {
    /// The platform reported the clip ended
    Completed,
    /// The attempt timer fired first
    TimedOut,
    /// Playback never started (after retries) or the sound is missing
    Failed,
}

impl ClipOutcome {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::TimedOut => "timed-out",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ClipOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of a single Clip Player invocation
///
/// Ephemeral: built by the player, handed to the sequencer and the event
/// bus, then dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackAttempt {
    /// Sound that was played
    pub sound: SoundName,

    /// Wall-clock time the invocation started
    pub started_at: DateTime<Utc>,

    /// Time from invocation to settlement, retries included
    pub elapsed: Duration,

    /// How the invocation settled
    pub outcome: ClipOutcome,

    /// Zero-based index of the final attempt
    pub retry_index: u32,

    /// Last error reported by the platform, if any
    pub error: Option<String>,
}

impl PlaybackAttempt {
    /// Whether the clip played to its end
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.outcome == ClipOutcome::Completed
    }
}
