/// Playback policy: retry counts, delays, and timeouts per device class
use super::sound::SoundName;
use crate::error::{ChimeError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-clip playback options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipOptions {
    /// Extra attempts after a failed start
    pub max_retries: u32,

    /// Wait between a failed start and the next attempt
    pub retry_delay_ms: u64,

    /// Upper bound on one attempt, measured from the start request
    pub per_attempt_timeout_ms: u64,

    /// Settle time between reset and the start request
    pub pre_attempt_delay_ms: u64,
}

impl ClipOptions {
    /// Retry delay as a `Duration`
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Attempt timeout as a `Duration`
    pub fn per_attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.per_attempt_timeout_ms)
    }

    /// Pre-attempt delay as a `Duration`
    pub fn pre_attempt_delay(&self) -> Duration {
        Duration::from_millis(self.pre_attempt_delay_ms)
    }

    /// Reject options the player cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.per_attempt_timeout_ms == 0 {
            return Err(ChimeError::configuration(
                "per_attempt_timeout_ms must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for ClipOptions {
    fn default() -> Self {
        PlaybackPolicy::standard().spoken
    }
}

/// Coarse platform class used to pick a policy preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Responsive output, playback starts promptly
    #[default]
    Standard,
    /// Slow-starting or gesture-restricted output that needs longer settles
    Constrained,
}

impl std::str::FromStr for DeviceClass {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "constrained" => Ok(Self::Constrained),
            other => Err(format!("unknown device class: {other}")),
        }
    }
}

/// Playback parameters selected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackPolicy {
    /// Options for the short beep clip
    pub beep: ClipOptions,

    /// Options for spoken clips (announcement, day name, time of day)
    pub spoken: ClipOptions,

    /// Pause inserted between consecutive clips of a sequence
    pub inter_clip_pause_ms: u64,

    /// Volume used for the silent unlock/priming start
    pub unlock_volume: f32,
}

impl PlaybackPolicy {
    /// Preset for responsive outputs
    pub fn standard() -> Self {
        Self {
            beep: ClipOptions {
                max_retries: 2,
                retry_delay_ms: 300,
                per_attempt_timeout_ms: 800,
                pre_attempt_delay_ms: 0,
            },
            spoken: ClipOptions {
                max_retries: 2,
                retry_delay_ms: 300,
                per_attempt_timeout_ms: 5000,
                pre_attempt_delay_ms: 100,
            },
            inter_clip_pause_ms: 500,
            unlock_volume: 0.01,
        }
    }

    /// Preset for slow or restricted outputs
    pub fn constrained() -> Self {
        Self {
            beep: ClipOptions {
                max_retries: 2,
                retry_delay_ms: 1000,
                per_attempt_timeout_ms: 700,
                pre_attempt_delay_ms: 50,
            },
            spoken: ClipOptions {
                max_retries: 2,
                retry_delay_ms: 500,
                per_attempt_timeout_ms: 5000,
                pre_attempt_delay_ms: 300,
            },
            inter_clip_pause_ms: 1000,
            unlock_volume: 0.01,
        }
    }

    /// Preset for a device class
    pub fn for_device(class: DeviceClass) -> Self {
        match class {
            DeviceClass::Standard => Self::standard(),
            DeviceClass::Constrained => Self::constrained(),
        }
    }

    /// Options that apply to a given sound
    pub fn options_for(&self, sound: &SoundName) -> &ClipOptions {
        if sound.is_beep() {
            &self.beep
        } else {
            &self.spoken
        }
    }

    /// Inter-clip pause as a `Duration`
    pub fn inter_clip_pause(&self) -> Duration {
        Duration::from_millis(self.inter_clip_pause_ms)
    }

    /// Validate every field
    pub fn validate(&self) -> Result<()> {
        self.beep.validate()?;
        self.spoken.validate()?;
        if !(0.0..=1.0).contains(&self.unlock_volume) {
            return Err(ChimeError::configuration(format!(
                "unlock_volume must be within 0.0..=1.0, got {}",
                self.unlock_volume
            )));
        }
        Ok(())
    }
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert!(PlaybackPolicy::standard().validate().is_ok());
        assert!(PlaybackPolicy::constrained().validate().is_ok());
    }

    #[test]
    fn beep_gets_beep_options() {
        let policy = PlaybackPolicy::standard();
        assert_eq!(policy.options_for(&SoundName::beep()), &policy.beep);
        assert_eq!(policy.options_for(&SoundName::medicine_time()), &policy.spoken);
    }

    #[test]
    fn constrained_waits_longer() {
        let standard = PlaybackPolicy::standard();
        let constrained = PlaybackPolicy::constrained();
        assert!(constrained.inter_clip_pause_ms > standard.inter_clip_pause_ms);
        assert!(constrained.spoken.pre_attempt_delay_ms > standard.spoken.pre_attempt_delay_ms);
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut policy = PlaybackPolicy::standard();
        policy.beep.per_attempt_timeout_ms = 0;
        assert!(matches!(policy.validate(), Err(ChimeError::Configuration(_))));
    }

    #[test]
    fn unlock_volume_bounds() {
        let mut policy = PlaybackPolicy::standard();
        policy.unlock_volume = 1.5;
        assert!(policy.validate().is_err());
    }
}
