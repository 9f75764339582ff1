use std::{collections::BTreeMap, fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{AppConfig, Result};

/// Labels a breathing phase can carry. Every label maps to a cue, so lookups
/// can never come back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseLabel {
    Inhale,
    Hold,
    Exhale,
}

impl PhaseLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inhale => "Inhale",
            Self::Hold => "Hold",
            Self::Exhale => "Exhale",
        }
    }

    pub fn is_hold(self) -> bool {
        matches!(self, Self::Hold)
    }
}

impl fmt::Display for PhaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, ordered sequence of phase durations in whole milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    pub id: String,
    pub phases: Vec<u64>,
}

impl Technique {
    pub fn new(id: impl Into<String>, phases: Vec<u64>) -> Self {
        Self {
            id: id.into(),
            phases,
        }
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Duration of the phase at `index`, wrapping around the cycle.
    pub fn duration(&self, index: usize) -> Duration {
        let ms = self.phases[index % self.phases.len()];
        Duration::from_millis(ms)
    }

    /// Length of one full cycle.
    pub fn cycle_length(&self) -> Duration {
        let total = self
            .phases
            .iter()
            .fold(0u64, |total, ms| total.saturating_add(*ms));
        Duration::from_millis(total)
    }
}

/// Read-only lookup over the configured techniques and label sets.
#[derive(Debug, Clone)]
pub struct TechniqueCatalog {
    techniques: BTreeMap<String, Technique>,
    labels: BTreeMap<usize, Vec<PhaseLabel>>,
    default_id: String,
}

impl TechniqueCatalog {
    /// Builds a catalog from a configuration, rejecting it when
    /// [`AppConfig::validate`] does.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let techniques = config
            .techniques
            .iter()
            .map(|(id, phases)| (id.clone(), Technique::new(id.clone(), phases.clone())))
            .collect();

        Ok(Self {
            techniques,
            labels: config.phase_labels.clone(),
            default_id: config.default_technique.clone(),
        })
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn default_technique(&self) -> &Technique {
        &self.techniques[&self.default_id]
    }

    /// Resolves a technique id, falling back to the default technique when
    /// the id is unknown.
    pub fn phases(&self, id: &str) -> &Technique {
        match self.techniques.get(id) {
            Some(technique) => technique,
            None => {
                tracing::warn!(
                    technique = id,
                    fallback = %self.default_id,
                    "unknown technique, using default"
                );
                self.default_technique()
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.techniques.contains_key(id)
    }

    pub fn techniques(&self) -> impl Iterator<Item = &Technique> {
        self.techniques.values()
    }

    /// Label sequence for a phase count, if one is configured.
    pub fn labels(&self, phase_count: usize) -> Option<&[PhaseLabel]> {
        self.labels.get(&phase_count).map(Vec::as_slice)
    }

    /// Label of the phase at `index` for a technique with `phase_count`
    /// phases. Anything outside the known label sets reads as `Exhale`.
    pub fn label_for(&self, phase_count: usize, index: usize) -> PhaseLabel {
        self.labels(phase_count)
            .and_then(|labels| labels.get(index).copied())
            .unwrap_or(PhaseLabel::Exhale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TechniqueCatalog {
        TechniqueCatalog::from_config(&AppConfig::default()).unwrap()
    }

    #[test]
    fn resolves_known_techniques() {
        let catalog = catalog();
        let technique = catalog.phases("resonant");
        assert_eq!(technique.id, "resonant");
        assert_eq!(technique.phases, vec![6000, 6000]);
    }

    #[test]
    fn unknown_technique_falls_back_to_default() {
        let catalog = catalog();
        assert_eq!(catalog.phases("nope").id, "box");
    }

    #[test]
    fn labels_follow_phase_count() {
        let catalog = catalog();
        assert_eq!(catalog.label_for(3, 1), PhaseLabel::Hold);
        assert_eq!(catalog.label_for(4, 3), PhaseLabel::Hold);
        assert_eq!(catalog.label_for(2, 1), PhaseLabel::Exhale);
    }

    #[test]
    fn missing_label_sets_read_as_exhale() {
        let catalog = catalog();
        assert!(catalog.labels(7).is_none());
        assert_eq!(catalog.label_for(7, 0), PhaseLabel::Exhale);
        assert_eq!(catalog.label_for(2, 5), PhaseLabel::Exhale);
    }

    #[test]
    fn durations_wrap_and_sum() {
        let technique = Technique::new("478", vec![4000, 7000, 8000]);
        assert_eq!(technique.duration(4), Duration::from_millis(7000));
        assert_eq!(technique.cycle_length(), Duration::from_secs(19));
    }

    #[test]
    fn cycle_length_saturates_on_huge_durations() {
        let technique = Technique::new("endless", vec![u64::MAX, 1000]);
        assert_eq!(technique.cycle_length(), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.techniques.insert("broken".to_string(), vec![0, 1000]);
        assert!(TechniqueCatalog::from_config(&config).is_err());
    }
}
