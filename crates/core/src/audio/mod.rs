use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};

use crate::{config::AudioConfig, PacerError, Result};

/// Opaque reference to an audio clip understood by the [`AudioSink`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipRef(String);

impl ClipRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outbound audio port. Implementations own the actual playback handles;
/// every method takes `&self` so cue and ambient playback can share one sink.
pub trait AudioSink {
    /// Starts `clip` from position zero. May be refused by the platform.
    fn play(&self, clip: &ClipRef) -> Result<()>;
    /// Pauses `clip` and rewinds it to the start.
    fn stop(&self, clip: &ClipRef);
    fn set_volume(&self, clip: &ClipRef, level: f32);
    fn set_muted(&self, clip: &ClipRef, muted: bool);
}

/// Snapshot of the user-adjustable audio levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioLevels {
    pub cue_volume: f32,
    pub cue_muted: bool,
    pub ambient_volume: f32,
}

impl From<AudioConfig> for AudioLevels {
    fn from(config: AudioConfig) -> Self {
        Self {
            cue_volume: config.cue_volume,
            cue_muted: config.cue_muted,
            ambient_volume: config.ambient_volume,
        }
    }
}

/// Shared handle over the audio levels. Sliders and the mute toggle write
/// through one clone, the cue and ambient players read through another on
/// every playback.
#[derive(Debug, Clone)]
pub struct AudioSettings {
    shared: Arc<Mutex<AudioLevels>>,
}

impl AudioSettings {
    pub fn new(levels: impl Into<AudioLevels>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(levels.into())),
        }
    }

    pub fn snapshot(&self) -> Result<AudioLevels> {
        Ok(*self.lock()?)
    }

    /// Stores the cue volume clamped into `0.0..=1.0` and returns it.
    pub fn set_cue_volume(&self, level: f32) -> Result<f32> {
        let level = clamp_level(level);
        self.lock()?.cue_volume = level;
        Ok(level)
    }

    pub fn set_cue_muted(&self, muted: bool) -> Result<()> {
        self.lock()?.cue_muted = muted;
        Ok(())
    }

    /// Stores the background volume clamped into `0.0..=1.0` and returns it.
    pub fn set_ambient_volume(&self, level: f32) -> Result<f32> {
        let level = clamp_level(level);
        self.lock()?.ambient_volume = level;
        Ok(level)
    }

    fn lock(&self) -> Result<MutexGuard<'_, AudioLevels>> {
        self.shared.lock().map_err(|_| PacerError::SettingsPoisoned)
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self::new(AudioConfig::default())
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_levels() {
        let settings = AudioSettings::default();
        let slider = settings.clone();

        slider.set_cue_volume(0.8).unwrap();
        slider.set_cue_muted(true).unwrap();

        let levels = settings.snapshot().unwrap();
        assert_eq!(levels.cue_volume, 0.8);
        assert!(levels.cue_muted);
        assert_eq!(levels.ambient_volume, 0.5);
    }

    #[test]
    fn volumes_are_clamped() {
        let settings = AudioSettings::default();
        assert_eq!(settings.set_cue_volume(3.0).unwrap(), 1.0);
        assert_eq!(settings.set_ambient_volume(-1.0).unwrap(), 0.0);
        assert_eq!(settings.set_ambient_volume(f32::NAN).unwrap(), 0.0);
    }
}
