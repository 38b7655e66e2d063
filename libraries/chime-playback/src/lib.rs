//! Chime Playback - Reminder Engine
//!
//! Platform-agnostic playback engine for the Chime medicine reminder.
//!
//! This crate provides:
//! - Sound registry with asynchronous load tracking
//! - Clip player with bounded retries, a per-attempt timeout and guaranteed
//!   cleanup
//! - Sequencer that plays the fixed reminder sequence clip by clip
//! - Trigger scheduler firing each daily slot at most once
//! - Manual test trigger with re-entrancy and cooldown guards
//! - One-shot unlock priming for platforms that gate audio on a gesture
//!
//! # Architecture
//!
//! `chime-playback` never touches an audio device. Clips are driven through
//! the `ClipHandle`/`AudioBackend` traits from `chime-core`, so the same
//! engine runs against cpal on the desktop and against scripted handles in
//! tests.
//!
//! ```text
//! TriggerScheduler ─┐
//!                   ├─> Sequencer ─> ClipPlayer ─> Registry ─> ClipHandle
//! ManualTrigger ────┘
//! ```
//!
//! Both trigger sources share one `PlaybackLock`: scheduled firings queue
//! behind it, manual tests are rejected while it is held.
//!
//! # Example
//!
//! ```rust
//! use chime_playback::SequenceDefinition;
//! use chime_core::SlotLabel;
//! use chrono::Weekday;
//!
//! let seq = SequenceDefinition::reminder(Weekday::Mon, SlotLabel::Morning);
//! assert_eq!(seq.len(), 6);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod daily;
pub mod error;
pub mod events;
pub mod manual;
pub mod player;
pub mod registry;
pub mod scheduler;
pub mod sequence;
pub mod sequencer;
pub mod unlock;

pub use daily::DailyPlaybackState;
pub use error::{ChimeError, Result, TestRejected};
pub use events::{EventBus, FiringSource, ReminderEvent, TestStatus};
pub use manual::{ManualTrigger, TEST_FAILED_NOTICE};
pub use player::ClipPlayer;
pub use registry::{AudioResource, Registry};
pub use scheduler::{Firing, TriggerScheduler, DEFAULT_TICK_INTERVAL};
pub use sequence::{SequenceDefinition, ALL_WEEKDAYS, BEEP_COUNT};
pub use sequencer::{PlaybackLock, SequenceReport, Sequencer};
pub use unlock::UnlockLayer;
