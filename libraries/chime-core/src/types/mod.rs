mod policy;
mod slot;
mod sound;
mod state;

pub use policy::{ClipOptions, DeviceClass, PlaybackPolicy};
pub use slot::{ReminderSlot, SlotLabel};
pub use sound::{weekday_name, SoundName, SourceRef};
pub use state::{ClipOutcome, PlaybackAttempt, ReadyState};
