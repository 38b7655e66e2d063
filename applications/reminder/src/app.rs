/// Application wiring
///
/// Builds the engine from configuration: registry with every configured
/// sound, one sequencer and playback lock shared by the scheduler, the
/// manual trigger and the unlock layer.
use crate::config::ReminderConfig;
use crate::error::Result;
use chime_core::{
    AudioBackend, DeviceClass, PlaybackPolicy, ReadyState, SlotLabel, SoundName, SourceRef,
    WallClock,
};
use chime_playback::{
    ClipPlayer, EventBus, ManualTrigger, PlaybackLock, ReminderEvent, Registry, SequenceReport,
    Sequencer, TriggerScheduler, UnlockLayer,
};
use chrono::Weekday;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Load state of one registered sound
#[derive(Debug, Clone, PartialEq)]
pub struct SoundStatus {
    pub name: SoundName,
    pub source: SourceRef,
    pub state: ReadyState,
}

pub struct ReminderApp {
    registry: Arc<Registry>,
    sequencer: Arc<Sequencer>,
    scheduler: TriggerScheduler,
    manual: ManualTrigger,
    unlock: Arc<UnlockLayer>,
    events: EventBus,
    policy: PlaybackPolicy,
}

impl ReminderApp {
    /// Wire the engine for `backend` and `clock`
    ///
    /// Registers every sound from the configuration but does not load any.
    pub fn build(
        config: &ReminderConfig,
        backend: Arc<dyn AudioBackend>,
        clock: Arc<dyn WallClock>,
        detected: DeviceClass,
    ) -> Result<Self> {
        config.validate()?;
        let policy = config.policy(detected);

        let registry = Arc::new(Registry::new(backend));
        for (name, source) in config.sounds.sources() {
            registry.register(name, source)?;
        }

        let events = EventBus::new();
        let lock = PlaybackLock::new();
        let sequencer = Arc::new(Sequencer::new(
            ClipPlayer::new(Arc::clone(&registry)),
            policy,
            events.clone(),
            lock.clone(),
        ));

        let scheduler = TriggerScheduler::new(
            Arc::clone(&sequencer),
            Arc::clone(&clock),
            events.clone(),
            config.scheduler.tick_interval(),
        );

        let unlock = Arc::new(UnlockLayer::with_probe(
            Arc::clone(&registry),
            lock,
            SoundName::beep(),
            policy.unlock_volume,
        )
        .with_start_timeout(policy.beep.per_attempt_timeout()));

        let manual = ManualTrigger::new(
            Arc::clone(&sequencer),
            Arc::clone(&unlock),
            clock,
            events.clone(),
        )
        .with_cooldown(config.scheduler.test_cooldown())
        .with_trailing(config.scheduler.test_trailing());

        tracing::info!(
            sounds = registry.len(),
            inter_clip_pause_ms = policy.inter_clip_pause_ms,
            tick = ?scheduler.tick_interval(),
            "Reminder engine ready"
        );

        Ok(Self {
            registry,
            sequencer,
            scheduler,
            manual,
            unlock,
            events,
            policy,
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn sequencer(&self) -> &Arc<Sequencer> {
        &self.sequencer
    }

    pub fn scheduler(&self) -> &TriggerScheduler {
        &self.scheduler
    }

    pub fn manual(&self) -> &ManualTrigger {
        &self.manual
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn policy(&self) -> &PlaybackPolicy {
        &self.policy
    }

    /// Request loads for every sound and report gaps in the sequence table
    ///
    /// Must be called from within a Tokio runtime.
    pub fn preload(&self) -> Vec<SoundName> {
        let requested = self.registry.preload_all();
        let missing = self.registry.missing_sounds();

        tracing::info!(requested, "Preloading sounds");
        for name in &missing {
            tracing::warn!(sound = %name, "Sound referenced by reminders is not registered");
        }
        missing
    }

    /// Preload, then wait for every sound to settle
    pub async fn sound_report(&self, timeout: Duration) -> Vec<SoundStatus> {
        self.preload();

        let mut report = Vec::with_capacity(self.registry.len());
        for resource in self.registry.resources() {
            let state = resource.wait_settled(timeout).await;
            report.push(SoundStatus {
                name: resource.name().clone(),
                source: resource.source().clone(),
                state,
            });
        }
        report
    }

    /// Play one test sequence now and wait for it
    ///
    /// Counts as a user gesture, so the output is primed first.
    pub async fn play_test_now(&self, day: Weekday, slot: SlotLabel) -> SequenceReport {
        self.unlock.on_user_gesture();
        self.sequencer.play_test_sequence(day, slot).await
    }

    /// Ask for a manual test of the current day and time of day
    ///
    /// Rejections are logged; returns whether the test was accepted.
    pub fn request_test(&self) -> bool {
        match self.manual.request_current() {
            Ok(_) => true,
            Err(rejected) => {
                tracing::info!(reason = %rejected, "Test request ignored");
                false
            }
        }
    }

    /// Print events as JSON lines on stdout until the bus closes
    pub fn spawn_event_printer(&self) -> JoinHandle<()> {
        let rx = self.events.subscribe();
        tokio::spawn(async move {
            write_events(rx, std::io::stdout()).await;
        })
    }

    /// Run the scheduler until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.scheduler.run(shutdown).await;
    }
}

impl std::fmt::Debug for ReminderApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReminderApp")
            .field("sounds", &self.registry.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Write each event as one JSON line until the sender side closes
pub async fn write_events<W: Write>(mut rx: broadcast::Receiver<ReminderEvent>, mut out: W) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                if let Err(e) = write_event(&mut out, &event) {
                    tracing::warn!(error = %e, "Failed to write event");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event printer fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

fn write_event<W: Write>(out: &mut W, event: &ReminderEvent) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    out.write_all(b"\n")?;
    out.flush()
}
