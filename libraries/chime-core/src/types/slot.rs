/// Daily reminder slots
use serde::{Deserialize, Serialize};

/// Label of one of the three daily reminder slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotLabel {
    /// 06:00
    Morning,
    /// 12:00
    Noon,
    /// 18:00
    Evening,
}

impl SlotLabel {
    /// All labels in firing order
    pub const ALL: [SlotLabel; 3] = [SlotLabel::Morning, SlotLabel::Noon, SlotLabel::Evening];

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Noon => "noon",
            Self::Evening => "evening",
        }
    }

    /// Position of this label in `ALL`
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Morning => 0,
            Self::Noon => 1,
            Self::Evening => 2,
        }
    }

    /// Time-of-day label for a 24-hour clock hour.
    ///
    /// Morning until noon, noon until 18:00, evening after that.
    #[must_use]
    pub fn for_hour(hour: u32) -> Self {
        if hour < 12 {
            Self::Morning
        } else if hour < 18 {
            Self::Noon
        } else {
            Self::Evening
        }
    }

    /// The slot definition carrying this label
    #[must_use]
    pub fn slot(&self) -> ReminderSlot {
        ReminderSlot::ALL[self.index()]
    }
}

impl std::str::FromStr for SlotLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "noon" => Ok(Self::Noon),
            "evening" => Ok(Self::Evening),
            other => Err(format!("unknown time of day: {other}")),
        }
    }
}

impl std::fmt::Display for SlotLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed daily reminder time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSlot {
    /// Hour on a 24-hour clock; the slot fires at minute zero
    pub hour: u32,
    /// Slot label
    pub label: SlotLabel,
}

impl ReminderSlot {
    /// The three daily slots: 06:00, 12:00, 18:00
    pub const ALL: [ReminderSlot; 3] = [
        ReminderSlot {
            hour: 6,
            label: SlotLabel::Morning,
        },
        ReminderSlot {
            hour: 12,
            label: SlotLabel::Noon,
        },
        ReminderSlot {
            hour: 18,
            label: SlotLabel::Evening,
        },
    ];

    /// Whether a wall-clock `(hour, minute)` sample falls on this slot
    #[must_use]
    pub fn matches(&self, hour: u32, minute: u32) -> bool {
        self.hour == hour && minute == 0
    }
}
