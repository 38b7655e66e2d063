//! Manual test trigger
//!
//! Lets a user play the reminder sequence on demand. A request is turned
//! away while a previous test is still running (including its trailing
//! window), inside the cooldown measured from the last accepted start, or
//! while any reminder is playing.
//!
//! The busy check looks at the playback lock when the request arrives. A
//! scheduled firing that takes the lock between acceptance and the test's
//! own acquire runs first; the accepted test then plays right after it.

use crate::error::TestRejected;
use crate::events::{EventBus, ReminderEvent, TestStatus};
use crate::sequencer::Sequencer;
use crate::unlock::UnlockLayer;
use chime_core::{SlotLabel, WallClock};
use chrono::{Datelike, Timelike, Weekday};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Notice shown when a test run breaks outside the sequencer's contract
pub const TEST_FAILED_NOTICE: &str =
    "Audio test failed. Please check your device volume and permissions.";

/// Default minimum spacing between accepted requests
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Default time the busy state lingers after a test finishes
pub const DEFAULT_TRAILING: Duration = Duration::from_secs(3);

struct Shared {
    events: EventBus,
    busy: AtomicBool,
    status: watch::Sender<TestStatus>,
}

impl Shared {
    fn set_status(&self, status: TestStatus) {
        self.status.send_replace(status.clone());
        self.events
            .publish(ReminderEvent::TestStatusChanged { status });
    }
}

/// On-demand test playback with re-entrancy and cooldown guards
pub struct ManualTrigger {
    sequencer: Arc<Sequencer>,
    unlock: Arc<UnlockLayer>,
    clock: Arc<dyn WallClock>,
    shared: Arc<Shared>,
    cooldown: Duration,
    trailing: Duration,
    last_started: Mutex<Option<Instant>>,
}

impl ManualTrigger {
    /// Create a trigger with the default cooldown and trailing delay
    pub fn new(
        sequencer: Arc<Sequencer>,
        unlock: Arc<UnlockLayer>,
        clock: Arc<dyn WallClock>,
        events: EventBus,
    ) -> Self {
        let (status, _) = watch::channel(TestStatus::Idle);
        Self {
            sequencer,
            unlock,
            clock,
            shared: Arc::new(Shared {
                events,
                busy: AtomicBool::new(false),
                status,
            }),
            cooldown: DEFAULT_COOLDOWN,
            trailing: DEFAULT_TRAILING,
            last_started: Mutex::new(None),
        }
    }

    /// Override the cooldown window
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Override the trailing delay
    #[must_use]
    pub fn with_trailing(mut self, trailing: Duration) -> Self {
        self.trailing = trailing;
        self
    }

    /// Watch the caller-visible test status
    pub fn status(&self) -> watch::Receiver<TestStatus> {
        self.shared.status.subscribe()
    }

    /// Whether a test is running or in its trailing window
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    /// Request a test for the current real day and time of day
    ///
    /// # Errors
    /// See [`ManualTrigger::request_test`].
    pub fn request_current(&self) -> Result<JoinHandle<()>, TestRejected> {
        let now = self.clock.now();
        self.request_test(now.weekday(), SlotLabel::for_hour(now.hour()))
    }

    /// Request a test announcing `day` and `slot`
    ///
    /// Counts as a user gesture for the unlock layer. On acceptance the test
    /// runs detached; the returned handle resolves once the trailing delay
    /// has passed and the trigger is ready again. Must be called from within
    /// a Tokio runtime.
    ///
    /// # Errors
    /// `InProgress` while a previous test is busy, `CoolingDown` inside the
    /// cooldown window, `Busy` while a reminder is playing.
    pub fn request_test(
        &self,
        day: Weekday,
        slot: SlotLabel,
    ) -> Result<JoinHandle<()>, TestRejected> {
        self.unlock.on_user_gesture();

        let now = Instant::now();
        {
            let mut last_started = self
                .last_started
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            if self.is_busy() {
                tracing::debug!("Test request rejected, already in progress");
                return Err(TestRejected::InProgress);
            }

            if let Some(last) = *last_started {
                let since = now.saturating_duration_since(last);
                if since < self.cooldown {
                    let remaining = self.cooldown - since;
                    tracing::debug!(?remaining, "Test request rejected, cooling down");
                    return Err(TestRejected::CoolingDown { remaining });
                }
            }

            if self.sequencer.is_playing() {
                tracing::debug!("Test request rejected, reminder playing");
                return Err(TestRejected::Busy);
            }

            if self
                .shared
                .busy
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Err(TestRejected::InProgress);
            }
            *last_started = Some(now);
        }

        tracing::info!(?day, %slot, "Starting audio test");
        self.shared.set_status(TestStatus::InProgress);

        let sequencer = Arc::clone(&self.sequencer);
        let shared = Arc::clone(&self.shared);
        let trailing = self.trailing;

        Ok(tokio::spawn(async move {
            // Run in its own task so a panic surfaces as a JoinError here.
            let run = tokio::spawn(async move { sequencer.play_test_sequence(day, slot).await });

            match run.await {
                Ok(report) => tracing::info!(
                    completed = report.completed(),
                    failed = report.failed(),
                    "Audio test finished"
                ),
                Err(e) => {
                    tracing::error!(error = %e, "Audio test aborted");
                    shared.events.publish(ReminderEvent::TestNotice {
                        message: TEST_FAILED_NOTICE.to_string(),
                    });
                    shared.set_status(TestStatus::Failed {
                        notice: TEST_FAILED_NOTICE.to_string(),
                    });
                }
            }

            tokio::time::sleep(trailing).await;
            shared.busy.store(false, Ordering::Release);
            if *shared.status.borrow() == TestStatus::InProgress {
                shared.set_status(TestStatus::Idle);
            }
        }))
    }
}

impl std::fmt::Debug for ManualTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualTrigger")
            .field("cooldown", &self.cooldown)
            .field("trailing", &self.trailing)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}
