//! Chime Core
//!
//! Platform-agnostic core types, traits, and error handling for the Chime
//! medicine reminder.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `SoundName`, `SlotLabel`, `ReminderSlot`, `ReadyState`,
//!   `PlaybackAttempt`, `PlaybackPolicy`
//! - **Core Traits**: `ClipHandle`, `AudioBackend`, `WallClock`
//! - **Error Handling**: Unified `ChimeError` and `Result` types
//!
//! Nothing here touches an audio device or a runtime. The playback engine
//! (`chime-playback`) drives these traits; platform crates implement them.
//!
//! # Example
//!
//! ```rust
//! use chime_core::{SlotLabel, SoundName};
//! use chrono::Weekday;
//!
//! let day = SoundName::day(Weekday::Mon);
//! assert_eq!(day.as_str(), "day:monday");
//!
//! let slot = SoundName::time_of_day(SlotLabel::Morning);
//! assert_eq!(slot.as_str(), "time:morning");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{ChimeError, Result};
pub use traits::{AudioBackend, ClipHandle, WallClock};

pub use types::{
    // Sounds
    weekday_name, SoundName, SourceRef,
    // Slots
    ReminderSlot, SlotLabel,
    // Resource + attempt state
    ClipOutcome, PlaybackAttempt, ReadyState,
    // Policy
    ClipOptions, DeviceClass, PlaybackPolicy,
};
