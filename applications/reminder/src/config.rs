/// Reminder configuration
///
/// Read from an optional TOML file, then from `CHIME_`-prefixed environment
/// variables (`__` separates nested keys, e.g.
/// `CHIME_SCHEDULER__TICK_INTERVAL_SECS=30`).
use crate::error::{ReminderError, Result};
use chime_core::{
    weekday_name, ClipOptions, DeviceClass, PlaybackPolicy, SlotLabel, SoundName, SourceRef,
};
use chime_playback::{SequenceDefinition, ALL_WEEKDAYS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "chime.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CHIME";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReminderConfig {
    #[serde(default)]
    pub sounds: SoundSettings,

    #[serde(default)]
    pub playback: PlaybackSettings,

    #[serde(default)]
    pub scheduler: SchedulerSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SoundSettings {
    /// Base directory for relative file paths
    #[serde(default = "default_sound_dir")]
    pub dir: PathBuf,

    /// Entries layered over the built-in table, keyed by logical name
    #[serde(default)]
    pub table: BTreeMap<String, SourceRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackProfile {
    /// Pick the preset from the detected device class
    #[default]
    Auto,
    Standard,
    Constrained,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default)]
    pub profile: PlaybackProfile,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inter_clip_pause_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_volume: Option<f32>,

    #[serde(default)]
    pub beep: ClipOverrides,

    #[serde(default)]
    pub spoken: ClipOverrides,
}

/// Per-field overrides of a preset's `ClipOptions`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClipOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_attempt_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_attempt_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerSettings {
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    #[serde(default = "default_test_cooldown_secs")]
    pub test_cooldown_secs: u64,

    #[serde(default = "default_test_trailing_secs")]
    pub test_trailing_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Print every reminder event as a JSON line on stdout
    #[serde(default)]
    pub events_json: bool,
}

impl ReminderConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    /// Load using a specific environment source
    pub fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if required && !file.exists() {
            return Err(ReminderError::Config(format!(
                "Config file not found: {}",
                file.display()
            )));
        }
        settings = settings.add_source(
            config::File::from(file)
                .format(config::FileFormat::Toml)
                .required(required),
        );

        settings = settings.add_source(env);

        let config = settings.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Playback policy for a detected device class
    pub fn policy(&self, detected: DeviceClass) -> PlaybackPolicy {
        self.playback.policy(detected)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for class in self.playback.candidate_classes() {
            self.policy(class)
                .validate()
                .map_err(|e| ReminderError::Config(e.to_string()))?;
        }

        let tick = self.scheduler.tick_interval_secs;
        if !(1..=60).contains(&tick) {
            return Err(ReminderError::Config(format!(
                "scheduler.tick_interval_secs must be within 1..=60, got {tick}"
            )));
        }

        let cooldown = self.scheduler.test_cooldown_secs;
        if !(3..=5).contains(&cooldown) {
            return Err(ReminderError::Config(format!(
                "scheduler.test_cooldown_secs must be within 3..=5, got {cooldown}"
            )));
        }

        let table = self.sounds.merged_table();
        for name in SequenceDefinition::all_referenced() {
            match table.get(name.as_str()) {
                Some(source) if !is_empty_source(source) => {}
                _ => {
                    return Err(ReminderError::Config(format!(
                        "sounds.table has no usable entry for \"{name}\""
                    )))
                }
            }
        }

        Ok(())
    }
}

impl SoundSettings {
    /// Built-in table with the configured entries layered on top
    pub fn merged_table(&self) -> BTreeMap<String, SourceRef> {
        let mut table = default_sound_table();
        table.extend(self.table.iter().map(|(k, v)| (k.clone(), v.clone())));
        table
    }

    /// Every sound to register, file paths resolved against `dir`
    pub fn sources(&self) -> Vec<(SoundName, SourceRef)> {
        self.merged_table()
            .into_iter()
            .map(|(name, source)| {
                let source = match source {
                    SourceRef::File { path } if path.is_relative() => {
                        SourceRef::file(self.dir.join(path))
                    }
                    other => other,
                };
                (SoundName::new(name), source)
            })
            .collect()
    }
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            dir: default_sound_dir(),
            table: BTreeMap::new(),
        }
    }
}

impl PlaybackProfile {
    /// Device class this profile selects
    pub fn device_class(self, detected: DeviceClass) -> DeviceClass {
        match self {
            Self::Auto => detected,
            Self::Standard => DeviceClass::Standard,
            Self::Constrained => DeviceClass::Constrained,
        }
    }
}

impl PlaybackSettings {
    /// Preset for the selected class with overrides applied
    pub fn policy(&self, detected: DeviceClass) -> PlaybackPolicy {
        let mut policy = PlaybackPolicy::for_device(self.profile.device_class(detected));
        self.beep.apply(&mut policy.beep);
        self.spoken.apply(&mut policy.spoken);
        if let Some(pause) = self.inter_clip_pause_ms {
            policy.inter_clip_pause_ms = pause;
        }
        if let Some(volume) = self.unlock_volume {
            policy.unlock_volume = volume;
        }
        policy
    }

    fn candidate_classes(&self) -> Vec<DeviceClass> {
        match self.profile {
            PlaybackProfile::Auto => vec![DeviceClass::Standard, DeviceClass::Constrained],
            PlaybackProfile::Standard => vec![DeviceClass::Standard],
            PlaybackProfile::Constrained => vec![DeviceClass::Constrained],
        }
    }
}

impl ClipOverrides {
    /// Overwrite the fields that are set
    pub fn apply(&self, options: &mut ClipOptions) {
        if let Some(v) = self.max_retries {
            options.max_retries = v;
        }
        if let Some(v) = self.retry_delay_ms {
            options.retry_delay_ms = v;
        }
        if let Some(v) = self.per_attempt_timeout_ms {
            options.per_attempt_timeout_ms = v;
        }
        if let Some(v) = self.pre_attempt_delay_ms {
            options.pre_attempt_delay_ms = v;
        }
    }
}

impl SchedulerSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn test_cooldown(&self) -> Duration {
        Duration::from_secs(self.test_cooldown_secs)
    }

    pub fn test_trailing(&self) -> Duration {
        Duration::from_secs(self.test_trailing_secs)
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            test_cooldown_secs: default_test_cooldown_secs(),
            test_trailing_secs: default_test_trailing_secs(),
        }
    }
}

/// Environment source for `CHIME_*` variables
pub fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn is_empty_source(source: &SourceRef) -> bool {
    match source {
        SourceRef::File { path } => path.as_os_str().is_empty(),
        SourceRef::Tone {
            frequency_hz,
            duration_ms,
        } => *frequency_hz <= 0.0 || *duration_ms == 0,
    }
}

// Default values
fn default_sound_dir() -> PathBuf {
    PathBuf::from("sounds")
}

/// `beep.mp3`, `medicine_time.mp3`, `<weekday>.mp3` and `<slot>.mp3`
pub fn default_sound_table() -> BTreeMap<String, SourceRef> {
    let mut table = BTreeMap::new();
    table.insert(SoundName::BEEP.to_string(), SourceRef::file("beep.mp3"));
    table.insert(
        SoundName::MEDICINE_TIME.to_string(),
        SourceRef::file("medicine_time.mp3"),
    );
    for day in ALL_WEEKDAYS {
        let file = format!("{}.mp3", weekday_name(day));
        table.insert(SoundName::day(day).to_string(), SourceRef::file(file));
    }
    for slot in SlotLabel::ALL {
        let file = format!("{}.mp3", slot.as_str());
        table.insert(SoundName::time_of_day(slot).to_string(), SourceRef::file(file));
    }
    table
}

fn default_tick_interval_secs() -> u64 {
    10
}

fn default_test_cooldown_secs() -> u64 {
    5
}

fn default_test_trailing_secs() -> u64 {
    3
}
