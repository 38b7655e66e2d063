//! Shared test doubles for the playback engine
//!
//! `ScriptedBackend` hands out clips whose behavior is looked up per sound
//! name at start time and which record every call with a Tokio timestamp,
//! so paused-time tests can assert exact timings.

#![allow(dead_code)]

use async_trait::async_trait;
use chime_core::{
    AudioBackend, ChimeError, ClipHandle, ClipOptions, PlaybackPolicy, Result, SoundName,
    SourceRef, WallClock,
};
use chime_playback::{
    ClipPlayer, EventBus, PlaybackLock, Registry, SequenceDefinition, Sequencer,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

// ============================================================================
// SCRIPTS AND CALL LOG
// ============================================================================

/// How a clip behaves when started
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Script {
    /// Starts at once and ends after the given time
    Complete { after: Duration },
    /// Starts but never signals the end
    NeverEnds,
    /// Start request never resolves
    HangStart,
    /// Every start is refused
    DenyStart,
    /// The first `times` starts are refused, later ones complete after `after`
    DenyFirst { times: usize, after: Duration },
    /// Start panics
    Panic,
}

impl Script {
    pub fn complete_ms(ms: u64) -> Self {
        Self::Complete {
            after: Duration::from_millis(ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallKind {
    Load,
    Start,
    Ended,
    Pause,
    Rewind,
    Volume(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sound: SoundName,
    pub kind: CallKind,
    pub at: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Shared {
    default: Script,
    scripts: Mutex<HashMap<SoundName, Script>>,
    failing_loads: Mutex<HashSet<SoundName>>,
    load_delay: Mutex<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl Shared {
    fn record(&self, sound: &SoundName, kind: CallKind) {
        lock(&self.calls).push(Call {
            sound: sound.clone(),
            kind,
            at: Instant::now(),
        });
    }

    fn script_for(&self, sound: &SoundName) -> Script {
        lock(&self.scripts).get(sound).copied().unwrap_or(self.default)
    }
}

// ============================================================================
// SCRIPTED CLIP
// ============================================================================

#[derive(Default)]
struct ClipState {
    run_started: Option<Instant>,
    offset: Duration,
    volume: f32,
    starts: usize,
    loads: usize,
}

pub struct ScriptedClip {
    name: SoundName,
    shared: Arc<Shared>,
    state: Mutex<ClipState>,
}

impl ScriptedClip {
    pub fn volume(&self) -> f32 {
        lock(&self.state).volume
    }

    pub fn start_count(&self) -> usize {
        lock(&self.state).starts
    }

    pub fn load_count(&self) -> usize {
        lock(&self.state).loads
    }

    fn end_after(&self) -> Option<Duration> {
        match self.shared.script_for(&self.name) {
            Script::Complete { after } | Script::DenyFirst { after, .. } => Some(after),
            _ => None,
        }
    }
}

#[async_trait]
impl ClipHandle for ScriptedClip {
    async fn load(&self) -> Result<()> {
        lock(&self.state).loads += 1;
        self.shared.record(&self.name, CallKind::Load);

        let delay = *lock(&self.shared.load_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if lock(&self.shared.failing_loads).contains(&self.name) {
            return Err(ChimeError::load_failed(format!("{} is corrupt", self.name)));
        }
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        let script = self.shared.script_for(&self.name);
        if script == Script::Panic {
            panic!("scripted panic starting {}", self.name);
        }

        let attempt = {
            let mut state = lock(&self.state);
            state.starts += 1;
            state.starts
        };
        self.shared.record(&self.name, CallKind::Start);

        match script {
            Script::HangStart => std::future::pending().await,
            Script::DenyStart => {
                return Err(ChimeError::start_denied("user gesture required"));
            }
            Script::DenyFirst { times, .. } if attempt <= times => {
                return Err(ChimeError::start_denied("user gesture required"));
            }
            _ => {}
        }

        let mut state = lock(&self.state);
        if state.run_started.is_none() {
            state.run_started = Some(Instant::now());
        }
        Ok(())
    }

    async fn ended(&self) {
        let Some(after) = self.end_after() else {
            return std::future::pending().await;
        };

        let deadline = {
            let state = lock(&self.state);
            state
                .run_started
                .map(|started| started + after.saturating_sub(state.offset))
        };
        let Some(deadline) = deadline else {
            return std::future::pending().await;
        };
        tokio::time::sleep_until(deadline).await;

        {
            let mut state = lock(&self.state);
            state.run_started = None;
            state.offset = after;
        }
        self.shared.record(&self.name, CallKind::Ended);
    }

    fn pause(&self) {
        {
            let mut state = lock(&self.state);
            if let Some(started) = state.run_started.take() {
                state.offset += started.elapsed();
            }
        }
        self.shared.record(&self.name, CallKind::Pause);
    }

    fn rewind(&self) {
        {
            let mut state = lock(&self.state);
            state.offset = Duration::ZERO;
            if state.run_started.is_some() {
                state.run_started = Some(Instant::now());
            }
        }
        self.shared.record(&self.name, CallKind::Rewind);
    }

    fn set_volume(&self, volume: f32) {
        lock(&self.state).volume = volume;
        self.shared.record(&self.name, CallKind::Volume(volume));
    }

    fn position(&self) -> Duration {
        let state = lock(&self.state);
        state.offset + state.run_started.map_or(Duration::ZERO, |s| s.elapsed())
    }

    fn is_paused(&self) -> bool {
        lock(&self.state).run_started.is_none()
    }
}

// ============================================================================
// SCRIPTED BACKEND
// ============================================================================

pub struct ScriptedBackend {
    shared: Arc<Shared>,
    clips: Mutex<HashMap<SoundName, Arc<ScriptedClip>>>,
    resumes: AtomicUsize,
    fail_resume: bool,
}

impl ScriptedBackend {
    pub fn new(default: Script) -> Arc<Self> {
        Arc::new(Self::build(default, false))
    }

    pub fn without_context(default: Script) -> Arc<Self> {
        Arc::new(Self::build(default, true))
    }

    fn build(default: Script, fail_resume: bool) -> Self {
        Self {
            shared: Arc::new(Shared {
                default,
                scripts: Mutex::new(HashMap::new()),
                failing_loads: Mutex::new(HashSet::new()),
                load_delay: Mutex::new(Duration::ZERO),
                calls: Mutex::new(Vec::new()),
            }),
            clips: Mutex::new(HashMap::new()),
            resumes: AtomicUsize::new(0),
            fail_resume,
        }
    }

    pub fn script(&self, name: impl Into<SoundName>, script: Script) {
        lock(&self.shared.scripts).insert(name.into(), script);
    }

    pub fn fail_loads(&self, name: impl Into<SoundName>, fail: bool) {
        let mut failing = lock(&self.shared.failing_loads);
        let name = name.into();
        if fail {
            failing.insert(name);
        } else {
            failing.remove(&name);
        }
    }

    pub fn set_load_delay(&self, delay: Duration) {
        *lock(&self.shared.load_delay) = delay;
    }

    pub fn clip(&self, name: impl Into<SoundName>) -> Arc<ScriptedClip> {
        let name = name.into();
        lock(&self.clips)
            .get(&name)
            .cloned()
            .unwrap_or_else(|| panic!("no clip opened for {name}"))
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.shared.calls).clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.kind == kind).collect()
    }

    /// Sound names in start order
    pub fn started_names(&self) -> Vec<String> {
        self.calls_of(CallKind::Start)
            .into_iter()
            .map(|c| c.sound.as_str().to_string())
            .collect()
    }

    pub fn resume_calls(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioBackend for ScriptedBackend {
    fn open(&self, name: &SoundName, _source: &SourceRef) -> Result<Arc<dyn ClipHandle>> {
        let clip = Arc::new(ScriptedClip {
            name: name.clone(),
            shared: Arc::clone(&self.shared),
            state: Mutex::new(ClipState {
                volume: 1.0,
                ..ClipState::default()
            }),
        });
        lock(&self.clips).insert(name.clone(), Arc::clone(&clip));
        Ok(clip)
    }

    async fn resume_context(&self) -> Result<()> {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        if self.fail_resume {
            return Err(ChimeError::audio("no audio context"));
        }
        Ok(())
    }
}

// ============================================================================
// CLOCK
// ============================================================================

/// Wall clock the test moves by hand
pub struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Arc<Self> {
        Arc::new(Self(Mutex::new(at(date, hour, minute))))
    }

    pub fn set(&self, now: NaiveDateTime) {
        *lock(&self.0) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = lock(&self.0);
        *now += by;
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *lock(&self.0)
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// 2024-01-01, a Monday
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    date.and_hms_opt(hour, minute, 0).unwrap()
}

pub fn fast_options() -> ClipOptions {
    ClipOptions {
        max_retries: 2,
        retry_delay_ms: 100,
        per_attempt_timeout_ms: 1000,
        pre_attempt_delay_ms: 0,
    }
}

/// No pre-attempt delay, 100ms retry delay, 1s timeout, 300ms pause
pub fn fast_policy() -> PlaybackPolicy {
    PlaybackPolicy {
        beep: fast_options(),
        spoken: fast_options(),
        inter_clip_pause_ms: 300,
        unlock_volume: 0.01,
    }
}

/// Register every sound a reminder can reference
pub fn register_all(registry: &Registry) {
    for name in SequenceDefinition::all_referenced() {
        let source = SourceRef::file(format!("sounds/{name}.mp3"));
        registry.register(name, source).unwrap();
    }
}

/// A fully wired engine over a scripted backend
pub struct Engine {
    pub backend: Arc<ScriptedBackend>,
    pub registry: Arc<Registry>,
    pub events: EventBus,
    pub lock: PlaybackLock,
    pub sequencer: Arc<Sequencer>,
}

impl Engine {
    pub fn new(backend: Arc<ScriptedBackend>, policy: PlaybackPolicy) -> Self {
        let registry = Arc::new(Registry::new(backend.clone()));
        register_all(&registry);

        let events = EventBus::new();
        let lock = PlaybackLock::new();
        let sequencer = Arc::new(Sequencer::new(
            ClipPlayer::new(Arc::clone(&registry)),
            policy,
            events.clone(),
            lock.clone(),
        ));

        Self {
            backend,
            registry,
            events,
            lock,
            sequencer,
        }
    }

    pub fn player(&self) -> ClipPlayer {
        ClipPlayer::new(Arc::clone(&self.registry))
    }
}
