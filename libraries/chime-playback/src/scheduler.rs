//! Trigger scheduler
//!
//! Polls the wall clock and fires the sequencer once per slot per day.
//! Firings are spawned and not awaited; the playback lock inside the
//! sequencer keeps a second firing from overlapping the first.

use crate::daily::DailyPlaybackState;
use crate::events::{EventBus, ReminderEvent};
use crate::sequencer::{SequenceReport, Sequencer};
use chime_core::{SlotLabel, WallClock};
use chrono::Datelike;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Recommended poll interval; slots match on an exact minute
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(10);

/// Longest poll interval that still samples every minute
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// A slot firing started by `tick`
#[derive(Debug)]
pub struct Firing {
    /// Slot that fired
    pub slot: SlotLabel,
    /// The spawned sequence
    pub handle: JoinHandle<SequenceReport>,
}

/// Clock-driven trigger for the three daily slots
pub struct TriggerScheduler {
    sequencer: Arc<Sequencer>,
    clock: Arc<dyn WallClock>,
    events: EventBus,
    state: Mutex<DailyPlaybackState>,
    tick_interval: Duration,
}

impl TriggerScheduler {
    /// Create a scheduler; today's flags start cleared
    ///
    /// `tick_interval` is clamped to `1s..=60s`.
    pub fn new(
        sequencer: Arc<Sequencer>,
        clock: Arc<dyn WallClock>,
        events: EventBus,
        tick_interval: Duration,
    ) -> Self {
        let today = clock.now().date();
        Self {
            sequencer,
            clock,
            events,
            state: Mutex::new(DailyPlaybackState::new(today)),
            tick_interval: tick_interval.clamp(Duration::from_secs(1), MAX_TICK_INTERVAL),
        }
    }

    /// Poll interval in effect
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Copy of the current daily state
    pub fn state(&self) -> DailyPlaybackState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sample the clock once and fire every due slot
    ///
    /// Must be called from within a Tokio runtime.
    pub fn tick(&self) -> Vec<Firing> {
        let now = self.clock.now();

        let (rolled_over, due) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let rolled_over = state.reset_if_new_day(now.date());
            (rolled_over, state.due_slots(now))
        };

        if rolled_over {
            tracing::info!(date = %now.date(), "New day, reminder flags reset");
            self.events
                .publish(ReminderEvent::DayRolledOver { date: now.date() });
        }

        let day = now.weekday();
        due.into_iter()
            .map(|slot| {
                tracing::info!(%slot, ?day, "Reminder slot due");
                self.events.publish(ReminderEvent::SlotFired {
                    date: now.date(),
                    slot,
                });

                let sequencer = Arc::clone(&self.sequencer);
                let handle =
                    tokio::spawn(async move { sequencer.play_reminder(day, slot).await });
                Firing { slot, handle }
            })
            .collect()
    }

    /// Tick every `tick_interval` until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(interval = ?self.tick_interval, "Reminder scheduler started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }
                () = &mut shutdown => break,
            }
        }
        tracing::info!("Reminder scheduler stopped");
    }
}
