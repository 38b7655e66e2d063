/// Local wall clock
use chime_core::WallClock;
use chrono::{Local, NaiveDateTime};

/// Reads the machine's local time zone on every call, so DST changes and
/// manual clock adjustments show up at the next scheduler tick
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
