//! Per-day slot flags
//!
//! Each slot fires at most once per calendar day. Flags only go from false
//! to true within a day; all three reset together, with the date, when the
//! observed day changes.

use chime_core::{ReminderSlot, SlotLabel};
use chrono::{NaiveDate, NaiveDateTime, Timelike};

/// Which slots already fired today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyPlaybackState {
    date: NaiveDate,
    played: [bool; 3],
}

impl DailyPlaybackState {
    /// Fresh state for `date` with nothing played
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            played: [false; 3],
        }
    }

    /// Day the flags belong to
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Whether `label` already fired on `date()`
    pub fn is_played(&self, label: SlotLabel) -> bool {
        self.played[label.index()]
    }

    /// Labels that already fired, in slot order
    pub fn played_labels(&self) -> Vec<SlotLabel> {
        SlotLabel::ALL
            .into_iter()
            .filter(|label| self.is_played(*label))
            .collect()
    }

    /// Reset date and all flags if `today` differs from the stored date
    ///
    /// Returns `true` if a rollover happened.
    pub fn reset_if_new_day(&mut self, today: NaiveDate) -> bool {
        if self.date == today {
            return false;
        }
        *self = Self::new(today);
        true
    }

    /// Set the flag for `label`; returns `true` if it was not set before
    pub fn mark_played(&mut self, label: SlotLabel) -> bool {
        let flag = &mut self.played[label.index()];
        let newly = !*flag;
        *flag = true;
        newly
    }

    /// Apply one clock sample: roll the day over if needed, then claim every
    /// slot whose time matches and has not fired today
    pub fn due_slots(&mut self, now: NaiveDateTime) -> Vec<SlotLabel> {
        self.reset_if_new_day(now.date());

        let (hour, minute) = (now.hour(), now.minute());
        ReminderSlot::ALL
            .iter()
            .filter(|slot| slot.matches(hour, minute))
            .filter_map(|slot| self.mark_played(slot.label).then_some(slot.label))
            .collect()
    }
}
