//! Test doubles for the reminder application

#![allow(dead_code)]

use async_trait::async_trait;
use chime_core::{
    AudioBackend, ChimeError, ClipHandle, Result, SoundName, SourceRef, WallClock,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Every clip plays for this long
pub const CLIP_LENGTH: Duration = Duration::from_millis(100);

/// Backend whose clips load at once and play for `CLIP_LENGTH`
///
/// Names marked broken fail to load and refuse to start.
#[derive(Default)]
pub struct InstantBackend {
    broken: HashSet<String>,
    started: Arc<Mutex<Vec<SoundName>>>,
}

impl InstantBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_broken(names: &[&str]) -> Self {
        Self {
            broken: names.iter().map(|n| (*n).to_string()).collect(),
            started: Arc::default(),
        }
    }

    pub fn started(&self) -> Vec<SoundName> {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AudioBackend for InstantBackend {
    fn open(&self, name: &SoundName, _source: &SourceRef) -> Result<Arc<dyn ClipHandle>> {
        Ok(Arc::new(InstantClip {
            name: name.clone(),
            broken: self.broken.contains(name.as_str()),
            playing: AtomicBool::new(false),
            started: Arc::clone(&self.started),
        }))
    }
}

struct InstantClip {
    name: SoundName,
    broken: bool,
    playing: AtomicBool,
    started: Arc<Mutex<Vec<SoundName>>>,
}

#[async_trait]
impl ClipHandle for InstantClip {
    async fn load(&self) -> Result<()> {
        if self.broken {
            return Err(ChimeError::load_failed(format!("{} is broken", self.name)));
        }
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        if self.broken {
            return Err(ChimeError::start_denied("broken clip"));
        }
        self.playing.store(true, Ordering::Release);
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.name.clone());
        Ok(())
    }

    async fn ended(&self) {
        tokio::time::sleep(CLIP_LENGTH).await;
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::Release);
    }

    fn rewind(&self) {}

    fn set_volume(&self, _volume: f32) {}

    fn position(&self) -> Duration {
        Duration::ZERO
    }

    fn is_paused(&self) -> bool {
        !self.playing.load(Ordering::Acquire)
    }
}

/// Clock stuck at one instant
pub struct FixedClock(pub NaiveDateTime);

impl WallClock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Wednesday 2024-01-03 at `hour:minute`
pub fn wednesday_at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 3)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}
