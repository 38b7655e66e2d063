/// Chime Reminder - spoken medicine reminders on desktop machines
///
/// Announces "beep beep beep, medicine time, <day>, <time of day>" at
/// 06:00, 12:00 and 18:00, and on demand for a quick audio check.
pub mod app;
pub mod capability;
pub mod clock;
pub mod config;
pub mod error;

pub use app::{ReminderApp, SoundStatus};
pub use clock::SystemClock;
pub use config::ReminderConfig;
pub use error::{ReminderError, Result};
