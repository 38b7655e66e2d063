//! The fixed reminder sequence
//!
//! Three beeps, the "medicine time" announcement, the day name, then the
//! time-of-day name. The order is part of the reminder's meaning.

use chime_core::{SlotLabel, SoundName};
use chrono::Weekday;

/// Number of attention beeps before the announcement
pub const BEEP_COUNT: usize = 3;

/// Ordered list of sounds for one firing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDefinition {
    sounds: Vec<SoundName>,
}

impl SequenceDefinition {
    /// Build the reminder sequence for a day and slot
    pub fn reminder(day: Weekday, slot: SlotLabel) -> Self {
        let mut sounds = Vec::with_capacity(BEEP_COUNT + 3);
        sounds.extend(std::iter::repeat(SoundName::beep()).take(BEEP_COUNT));
        sounds.push(SoundName::medicine_time());
        sounds.push(SoundName::day(day));
        sounds.push(SoundName::time_of_day(slot));
        Self { sounds }
    }

    /// Every distinct sound any reminder sequence can reference, sorted
    pub fn all_referenced() -> Vec<SoundName> {
        let mut names = vec![SoundName::beep(), SoundName::medicine_time()];
        names.extend(ALL_WEEKDAYS.iter().map(|day| SoundName::day(*day)));
        names.extend(SlotLabel::ALL.iter().map(|slot| SoundName::time_of_day(*slot)));
        names.sort();
        names
    }

    /// Sounds in play order
    pub fn sounds(&self) -> &[SoundName] {
        &self.sounds
    }

    /// Iterate sounds in play order
    pub fn iter(&self) -> std::slice::Iter<'_, SoundName> {
        self.sounds.iter()
    }

    /// Number of clips
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// Always false for reminder sequences
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

/// Monday through Sunday
pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];
