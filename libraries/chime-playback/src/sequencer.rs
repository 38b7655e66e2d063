//! Reminder sequencer
//!
//! Plays a `SequenceDefinition` clip by clip. Each clip's outcome is awaited
//! before the next starts, so clips never overlap. A clip that times out or
//! fails is recorded and skipped; the sequence always runs to the end.

use crate::events::{EventBus, FiringSource, ReminderEvent};
use crate::player::ClipPlayer;
use crate::sequence::SequenceDefinition;
use chime_core::{ChimeError, PlaybackAttempt, PlaybackPolicy, SlotLabel};
use chrono::Weekday;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Exclusive right to drive the shared clip handles
///
/// Shared by every trigger source so a scheduled firing, a manual test, and
/// the unlock priming never touch the same handle at once.
#[derive(Debug, Clone, Default)]
pub struct PlaybackLock(Arc<Mutex<()>>);

impl PlaybackLock {
    /// Create an unheld lock
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the lock
    pub async fn acquire(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.0).lock_owned().await
    }

    /// Take the lock if nobody holds it
    pub fn try_acquire(&self) -> Option<OwnedMutexGuard<()>> {
        Arc::clone(&self.0).try_lock_owned().ok()
    }

    /// Whether someone holds the lock right now
    pub fn is_held(&self) -> bool {
        self.0.try_lock().is_err()
    }
}

/// Per-clip results of one firing
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceReport {
    /// Trigger source
    pub source: FiringSource,
    /// Announced day
    pub day: Weekday,
    /// Announced slot
    pub slot: SlotLabel,
    /// One entry per clip, in play order
    pub attempts: Vec<PlaybackAttempt>,
}

impl SequenceReport {
    /// Clips that completed
    pub fn completed(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_completed()).count()
    }

    /// Clips that timed out or failed
    pub fn failed(&self) -> usize {
        self.attempts.len() - self.completed()
    }
}

/// Plays reminder sequences through a `ClipPlayer`
pub struct Sequencer {
    player: ClipPlayer,
    policy: PlaybackPolicy,
    events: EventBus,
    lock: PlaybackLock,
}

impl Sequencer {
    /// Create a sequencer
    pub fn new(
        player: ClipPlayer,
        policy: PlaybackPolicy,
        events: EventBus,
        lock: PlaybackLock,
    ) -> Self {
        Self {
            player,
            policy,
            events,
            lock,
        }
    }

    /// Policy in effect
    pub fn policy(&self) -> &PlaybackPolicy {
        &self.policy
    }

    /// Lock guarding the clip handles
    pub fn lock(&self) -> &PlaybackLock {
        &self.lock
    }

    /// Whether a sequence is playing right now
    pub fn is_playing(&self) -> bool {
        self.lock.is_held()
    }

    /// Play the reminder for a scheduled slot firing
    pub async fn play_reminder(&self, day: Weekday, slot: SlotLabel) -> SequenceReport {
        self.run(FiringSource::Scheduled, day, slot).await
    }

    /// Play the same sequence for a manual test
    pub async fn play_test_sequence(&self, day: Weekday, slot: SlotLabel) -> SequenceReport {
        self.run(FiringSource::Manual, day, slot).await
    }

    async fn run(&self, source: FiringSource, day: Weekday, slot: SlotLabel) -> SequenceReport {
        let _guard = self.lock.acquire().await;
        let definition = SequenceDefinition::reminder(day, slot);

        tracing::info!(?source, ?day, %slot, clips = definition.len(), "Starting reminder sequence");
        self.events
            .publish(ReminderEvent::SequenceStarted { source, day, slot });

        let mut attempts = Vec::with_capacity(definition.len());
        for (index, sound) in definition.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.policy.inter_clip_pause()).await;
            }

            let attempt = self.player.play(sound, self.policy.options_for(sound)).await;

            if !attempt.is_completed() {
                let failure = ChimeError::SequenceClipFailure {
                    name: sound.clone(),
                    outcome: attempt.outcome,
                };
                tracing::warn!(
                    error = %failure,
                    retry_index = attempt.retry_index,
                    cause = attempt.error.as_deref().unwrap_or("-"),
                    "Continuing reminder after clip failure"
                );
            }

            self.events.publish(ReminderEvent::ClipSettled {
                source,
                attempt: attempt.clone(),
            });
            attempts.push(attempt);
        }

        let report = SequenceReport {
            source,
            day,
            slot,
            attempts,
        };

        tracing::info!(
            ?source,
            completed = report.completed(),
            failed = report.failed(),
            "Reminder sequence finished"
        );
        self.events.publish(ReminderEvent::SequenceFinished {
            source,
            completed: report.completed(),
            failed: report.failed(),
        });

        report
    }
}
