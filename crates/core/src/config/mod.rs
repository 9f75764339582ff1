use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{ClipRef, PacerError, PhaseLabel, Result};

/// Phase counts the label sets are allowed to describe.
pub const SUPPORTED_PHASE_COUNTS: [usize; 3] = [2, 3, 4];

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub default_technique: String,
    /// Technique id to ordered phase durations in milliseconds.
    pub techniques: BTreeMap<String, Vec<u64>>,
    /// Phase count to the labels shown for each phase.
    pub phase_labels: BTreeMap<usize, Vec<PhaseLabel>>,
    pub idle_label: String,
    pub cues: CueConfig,
    pub animation: AnimationConfig,
    pub ambient: AmbientConfig,
    pub audio: AudioConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let techniques = [
            ("box", vec![4000, 4000, 4000, 4000]),
            ("478", vec![4000, 7000, 8000]),
            ("resonant", vec![6000, 6000]),
            ("2to1", vec![4000, 8000]),
            ("426", vec![4000, 2000, 6000, 1000]),
            ("yogi", vec![3000, 6000]),
        ]
        .into_iter()
        .map(|(id, phases)| (id.to_string(), phases))
        .collect();

        use PhaseLabel::*;
        let phase_labels = BTreeMap::from([
            (2, vec![Inhale, Exhale]),
            (3, vec![Inhale, Hold, Exhale]),
            (4, vec![Inhale, Hold, Exhale, Hold]),
        ]);

        Self {
            default_technique: "box".to_string(),
            techniques,
            phase_labels,
            idle_label: "Press Start to begin.".to_string(),
            cues: CueConfig::default(),
            animation: AnimationConfig::default(),
            ambient: AmbientConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parses a JSON document, filling omitted sections with defaults, and
    /// validates the result.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the JSON configuration stored at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Rejects configurations the scheduler cannot run safely. A zero
    /// duration would re-arm the phase timer immediately and spin.
    pub fn validate(&self) -> Result<()> {
        if self.techniques.is_empty() {
            return Err(PacerError::invalid_config("no techniques configured"));
        }

        for (id, phases) in &self.techniques {
            if !SUPPORTED_PHASE_COUNTS.contains(&phases.len()) {
                return Err(PacerError::invalid_config(format!(
                    "technique `{id}` has {} phases, expected 2, 3 or 4",
                    phases.len()
                )));
            }
            if let Some(index) = phases.iter().position(|duration| *duration == 0) {
                return Err(PacerError::invalid_config(format!(
                    "technique `{id}` has a zero duration at phase {index}"
                )));
            }
        }

        for (count, labels) in &self.phase_labels {
            if labels.len() != *count {
                return Err(PacerError::invalid_config(format!(
                    "label set for {count} phases lists {} labels",
                    labels.len()
                )));
            }
        }

        if !self.techniques.contains_key(&self.default_technique) {
            return Err(PacerError::invalid_config(format!(
                "default technique `{}` is not in the catalog",
                self.default_technique
            )));
        }

        for (name, level) in [
            ("cue volume", self.audio.cue_volume),
            ("ambient volume", self.audio.ambient_volume),
        ] {
            if !(0.0..=1.0).contains(&level) {
                return Err(PacerError::invalid_config(format!(
                    "{name} {level} is outside 0.0..=1.0"
                )));
            }
        }

        if self.animation.inhale_scale <= 0.0 || self.animation.exhale_scale <= 0.0 {
            return Err(PacerError::invalid_config("animation scales must be positive"));
        }

        Ok(())
    }
}

/// Audio clips triggered on phase entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    pub inhale: ClipRef,
    pub exhale: ClipRef,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            inhale: ClipRef::new("audio/bowl.mp3"),
            exhale: ClipRef::new("audio/windchime.mp3"),
        }
    }
}

/// Scale targets for the breathing pulse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub inhale_scale: f32,
    /// Contracted scale, also used as the neutral pose while idle.
    pub exhale_scale: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            inhale_scale: 1.5,
            exhale_scale: 1.0,
        }
    }
}

/// Looping background sounds and the backdrop shown with each of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub sounds: BTreeMap<String, ClipRef>,
    pub backdrops: BTreeMap<String, String>,
    pub default_sound: Option<String>,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        let names = ["rain", "river", "fire"];
        let sounds = names
            .iter()
            .map(|name| (name.to_string(), ClipRef::new(format!("audio/{name}.mp3"))))
            .collect();
        let backdrops = [
            ("rain", "images/snow.PNG"),
            ("river", "images/river.PNG"),
            ("fire", "images/fire.PNG"),
        ]
        .into_iter()
        .map(|(name, image)| (name.to_string(), image.to_string()))
        .collect();

        Self {
            sounds,
            backdrops,
            default_sound: Some("rain".to_string()),
        }
    }
}

/// Initial values for the externally adjustable audio settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub cue_volume: f32,
    pub cue_muted: bool,
    pub ambient_volume: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            cue_volume: 0.5,
            cue_muted: false,
            ambient_volume: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.techniques["478"], vec![4000, 7000, 8000]);
        assert_eq!(config.default_technique, "box");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = AppConfig::from_json_str(
            r#"{ "default_technique": "slow", "techniques": { "slow": [5000, 5000] } }"#,
        )
        .unwrap();

        assert_eq!(config.techniques.len(), 1);
        assert_eq!(config.phase_labels[&2], vec![PhaseLabel::Inhale, PhaseLabel::Exhale]);
        assert_eq!(config.cues.inhale.as_str(), "audio/bowl.mp3");
    }

    #[test]
    fn rejects_zero_durations() {
        let err = AppConfig::from_json_str(r#"{ "techniques": { "box": [4000, 0, 4000, 4000] } }"#)
            .unwrap_err();
        assert!(matches!(err, PacerError::InvalidConfig(_)));
        assert!(format!("{err}").contains("zero duration"));
    }

    #[test]
    fn rejects_unsupported_phase_counts() {
        let mut config = AppConfig::default();
        config.techniques.insert("long".to_string(), vec![1000; 5]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_mismatched_label_sets() {
        let mut config = AppConfig::default();
        config.phase_labels.insert(3, vec![PhaseLabel::Inhale, PhaseLabel::Exhale]);
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("label set for 3 phases"));
    }

    #[test]
    fn rejects_unknown_default_technique() {
        let mut config = AppConfig::default();
        config.default_technique = "missing".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let mut config = AppConfig::default();
        config.audio.cue_volume = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_surfaces_parse_error() {
        let err = AppConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, PacerError::Json(_)));
    }
}
