//! Reminder events
//!
//! Structured, serializable notifications for observers (loggers, UIs).
//! Events are published on a broadcast bus; publishing never blocks and
//! never fails, even with no subscribers.

use chime_core::{PlaybackAttempt, SlotLabel};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default event bus capacity (lagging subscribers lose oldest events)
const EVENT_BUS_CAPACITY: usize = 64;

/// What started a firing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FiringSource {
    /// Clock-driven slot firing
    Scheduled,
    /// Manual test request
    Manual,
}

/// Caller-visible state of the manual test affordance
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TestStatus {
    /// Ready for a new request
    #[default]
    Idle,
    /// A test sequence is running or just finished
    InProgress,
    /// The last test run broke outside the sequencer's contract
    Failed {
        /// User-facing notice
        notice: String,
    },
}

/// Events emitted by the reminder engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReminderEvent {
    /// The observed calendar day advanced and all slot flags were cleared
    DayRolledOver {
        /// The new day
        date: NaiveDate,
    },

    /// A daily slot fired
    SlotFired {
        /// Day of the firing
        date: NaiveDate,
        /// The slot
        slot: SlotLabel,
    },

    /// A reminder sequence began playing
    SequenceStarted {
        /// Trigger source
        source: FiringSource,
        /// Day whose name is announced
        day: Weekday,
        /// Slot whose name is announced
        slot: SlotLabel,
    },

    /// One clip settled
    ClipSettled {
        /// Trigger source
        source: FiringSource,
        /// The settled attempt
        attempt: PlaybackAttempt,
    },

    /// A reminder sequence finished (always, regardless of clip failures)
    SequenceFinished {
        /// Trigger source
        source: FiringSource,
        /// Clips that completed
        completed: usize,
        /// Clips that timed out or failed
        failed: usize,
    },

    /// The manual test status changed
    TestStatusChanged {
        /// New status
        status: TestStatus,
    },

    /// User-facing notice from the manual test path
    TestNotice {
        /// Message text
        message: String,
    },
}

/// Broadcast bus for `ReminderEvent`s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ReminderEvent>,
}

impl EventBus {
    /// Create a bus with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(EVENT_BUS_CAPACITY)
    }

    /// Create a bus with a specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: ReminderEvent) {
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ReminderEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
