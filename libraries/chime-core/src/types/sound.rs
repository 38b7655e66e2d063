/// Logical sound names and media sources
use super::slot::SlotLabel;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Stable logical identifier of a playable clip
///
/// Names follow a small convention: `beep`, `medicine-time`,
/// `day:<weekday>` and `time:<slot>`. Arbitrary names are allowed so extra
/// clips can be registered, but the reminder sequence only references the
/// conventional ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundName(String);

impl SoundName {
    /// Logical name of the short attention beep
    pub const BEEP: &'static str = "beep";

    /// Logical name of the "medicine time" announcement
    pub const MEDICINE_TIME: &'static str = "medicine-time";

    /// Create a sound name from any string
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The attention beep
    pub fn beep() -> Self {
        Self::new(Self::BEEP)
    }

    /// The "medicine time" announcement
    pub fn medicine_time() -> Self {
        Self::new(Self::MEDICINE_TIME)
    }

    /// Spoken day-of-week clip, e.g. `day:monday`
    pub fn day(day: Weekday) -> Self {
        Self(format!("day:{}", weekday_name(day)))
    }

    /// Spoken time-of-day clip, e.g. `time:noon`
    pub fn time_of_day(slot: SlotLabel) -> Self {
        Self(format!("time:{}", slot.as_str()))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the short beep clip (as opposed to a spoken clip)
    pub fn is_beep(&self) -> bool {
        self.0 == Self::BEEP
    }
}

impl std::fmt::Display for SoundName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SoundName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Lowercase English weekday name
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Opaque reference to the media behind a sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceRef {
    /// Encoded media file on disk (mp3, wav, ogg, flac, ...)
    File {
        /// Path to the file
        path: PathBuf,
    },

    /// Synthesized sine tone, generated in memory
    Tone {
        /// Tone frequency in Hz
        frequency_hz: f32,
        /// Tone length in milliseconds
        duration_ms: u32,
    },
}

impl SourceRef {
    /// File source
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Tone source
    pub fn tone(frequency_hz: f32, duration_ms: u32) -> Self {
        Self::Tone {
            frequency_hz,
            duration_ms,
        }
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File { path } => write!(f, "{}", path.display()),
            Self::Tone {
                frequency_hz,
                duration_ms,
            } => write!(f, "tone {frequency_hz}Hz/{duration_ms}ms"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conventional_names() {
        assert_eq!(SoundName::beep().as_str(), "beep");
        assert_eq!(SoundName::medicine_time().as_str(), "medicine-time");
        assert_eq!(SoundName::day(Weekday::Sun).as_str(), "day:sunday");
        assert_eq!(SoundName::time_of_day(SlotLabel::Evening).as_str(), "time:evening");
    }

    #[test]
    fn only_beep_is_beep() {
        assert!(SoundName::beep().is_beep());
        assert!(!SoundName::medicine_time().is_beep());
        assert!(!SoundName::new("beep2").is_beep());
    }

    #[test]
    fn source_ref_is_tagged_by_kind() {
        let json = serde_json::to_string(&SourceRef::tone(880.0, 250)).unwrap();
        assert!(json.contains(r#""kind":"tone""#));

        let parsed: SourceRef =
            serde_json::from_str(r#"{"kind":"file","path":"sounds/monday.mp3"}"#).unwrap();
        assert_eq!(parsed, SourceRef::file("sounds/monday.mp3"));
    }
}
