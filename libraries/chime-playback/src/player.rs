//! Clip player
//!
//! Plays one registered sound to a terminal outcome. Never returns an
//! error: every failure mode is folded into the returned `PlaybackAttempt`.
//!
//! Per attempt:
//! 1. pause, rewind, volume to full
//! 2. wait `pre_attempt_delay`
//! 3. request start, racing the start and the "ended" signal against one
//!    `per_attempt_timeout` timer armed at the start request
//!
//! A denied start is retried after `retry_delay` up to `max_retries` times.
//! A timeout is terminal for the invocation. The handle is left paused at
//! position zero on every exit path, including cancellation.

use crate::registry::Registry;
use chime_core::{
    ChimeError, ClipHandle, ClipOptions, ClipOutcome, PlaybackAttempt, Result, SoundName,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{sleep, Instant};

/// Plays single clips from a registry
#[derive(Clone)]
pub struct ClipPlayer {
    registry: Arc<Registry>,
}

impl ClipPlayer {
    /// Create a player over a registry
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Registry the player resolves sounds from
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Play `sound` with `options`, returning how it settled
    pub async fn play(&self, sound: &SoundName, options: &ClipOptions) -> PlaybackAttempt {
        let started_at = Utc::now();
        let clock = Instant::now();

        let settle = |outcome: ClipOutcome, retry_index: u32, error: Option<&ChimeError>| {
            PlaybackAttempt {
                sound: sound.clone(),
                started_at,
                elapsed: clock.elapsed(),
                outcome,
                retry_index,
                error: error.map(ToString::to_string),
            }
        };

        // Missing sounds fail at once: retrying cannot register them.
        let resource = match self.registry.resolve(sound) {
            Ok(resource) => resource,
            Err(e) => {
                tracing::warn!(sound = %sound, error = %e, "Cannot play unregistered sound");
                return settle(ClipOutcome::Failed, 0, Some(&e));
            }
        };

        // Fresh or errored media gets a new load request before playing.
        if let Err(e) = self.registry.ensure_loaded(sound) {
            tracing::debug!(sound = %sound, error = %e, "Load request skipped");
        }

        let handle = resource.handle().as_ref();
        let _cleanup = ResetOnDrop(handle);

        let mut retry_index = 0;
        loop {
            handle.pause();
            handle.rewind();
            handle.set_volume(1.0);

            if !options.pre_attempt_delay().is_zero() {
                sleep(options.pre_attempt_delay()).await;
            }

            match attempt(handle, options).await {
                Ok(ClipOutcome::TimedOut) => {
                    let stalled = ChimeError::PlaybackStalled(options.per_attempt_timeout());
                    tracing::warn!(sound = %sound, retry_index, "Clip timed out");
                    return settle(ClipOutcome::TimedOut, retry_index, Some(&stalled));
                }
                Ok(outcome) => {
                    tracing::debug!(sound = %sound, retry_index, %outcome, "Clip settled");
                    return settle(outcome, retry_index, None);
                }
                Err(e) if retry_index < options.max_retries && e.is_retryable() => {
                    tracing::debug!(
                        sound = %sound,
                        attempt = retry_index + 1,
                        error = %e,
                        "Clip start failed, retrying"
                    );
                    handle.pause();
                    sleep(options.retry_delay()).await;
                    retry_index += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        sound = %sound,
                        retries = retry_index,
                        error = %e,
                        "Giving up on clip"
                    );
                    return settle(ClipOutcome::Failed, retry_index, Some(&e));
                }
            }
        }
    }
}

/// One start-and-wait attempt
///
/// The timer is armed before the start request so a start that hangs is
/// bounded too.
async fn attempt(handle: &dyn ClipHandle, options: &ClipOptions) -> Result<ClipOutcome> {
    let deadline = sleep(options.per_attempt_timeout());
    tokio::pin!(deadline);

    tokio::select! {
        started = handle.start() => started?,
        () = &mut deadline => return Ok(ClipOutcome::TimedOut),
    }

    tokio::select! {
        () = handle.ended() => Ok(ClipOutcome::Completed),
        () = &mut deadline => Ok(ClipOutcome::TimedOut),
    }
}

/// Leaves the handle paused at position zero when dropped
struct ResetOnDrop<'a>(&'a dyn ClipHandle);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.pause();
        self.0.rewind();
    }
}
