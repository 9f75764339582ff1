use std::{rc::Rc, time::Duration};

use crate::{
    config::{AnimationConfig, CueConfig},
    AudioSettings, AudioSink, ClipRef, PhaseLabel, Surface,
};

/// Target pose for the breathing pulse. A `None` transition snaps (or
/// holds) the pulse at `scale` without animating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationUpdate {
    pub scale: f32,
    pub transition: Option<Duration>,
}

/// Side effects bound to a phase label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueBinding<'a> {
    pub clip: Option<&'a ClipRef>,
    /// `None` freezes the pulse at its current scale.
    pub scale: Option<f32>,
}

/// Total mapping from [`PhaseLabel`] to its [`CueBinding`].
#[derive(Debug, Clone)]
pub struct CueTable {
    cues: CueConfig,
    animation: AnimationConfig,
}

impl CueTable {
    pub fn new(cues: CueConfig, animation: AnimationConfig) -> Self {
        Self { cues, animation }
    }

    pub fn binding(&self, label: PhaseLabel) -> CueBinding<'_> {
        match label {
            PhaseLabel::Inhale => CueBinding {
                clip: Some(&self.cues.inhale),
                scale: Some(self.animation.inhale_scale),
            },
            PhaseLabel::Exhale => CueBinding {
                clip: Some(&self.cues.exhale),
                scale: Some(self.animation.exhale_scale),
            },
            PhaseLabel::Hold => CueBinding {
                clip: None,
                scale: None,
            },
        }
    }

    pub fn clips(&self) -> [&ClipRef; 2] {
        [&self.cues.inhale, &self.cues.exhale]
    }

    pub fn neutral_scale(&self) -> f32 {
        self.animation.exhale_scale
    }
}

/// Triggers the audio and animation cue for each phase entry.
pub struct CueDispatcher {
    table: CueTable,
    settings: AudioSettings,
    audio: Rc<dyn AudioSink>,
    surface: Rc<dyn Surface>,
    current_scale: f32,
}

impl CueDispatcher {
    pub fn new(
        table: CueTable,
        settings: AudioSettings,
        audio: Rc<dyn AudioSink>,
        surface: Rc<dyn Surface>,
    ) -> Self {
        let current_scale = table.neutral_scale();
        Self {
            table,
            settings,
            audio,
            surface,
            current_scale,
        }
    }

    /// Scale the pulse was last told to reach.
    pub fn current_scale(&self) -> f32 {
        self.current_scale
    }

    /// Stops any playing cue, then plays and animates the cue for `label`
    /// over `duration`. Playback failures are logged and swallowed.
    pub fn dispatch(&mut self, label: PhaseLabel, duration: Duration) {
        self.stop_clips();

        let binding = self.table.binding(label);
        if let Some(clip) = binding.clip {
            self.play_clip(label, clip);
        }

        let update = match binding.scale {
            Some(scale) => {
                self.current_scale = scale;
                AnimationUpdate {
                    scale,
                    transition: Some(duration),
                }
            }
            None => AnimationUpdate {
                scale: self.current_scale,
                transition: None,
            },
        };
        self.surface.animate(update);
    }

    /// Silences every cue clip and snaps the pulse back to its neutral pose.
    pub fn silence(&mut self) {
        self.stop_clips();
        self.current_scale = self.table.neutral_scale();
        self.surface.animate(AnimationUpdate {
            scale: self.current_scale,
            transition: None,
        });
    }

    /// Pushes the current cue volume to every cue clip.
    pub fn apply_volume(&self, level: f32) {
        for clip in self.table.clips() {
            self.audio.set_volume(clip, level);
        }
    }

    /// Pushes the mute flag to every cue clip.
    pub fn apply_muted(&self, muted: bool) {
        for clip in self.table.clips() {
            self.audio.set_muted(clip, muted);
        }
    }

    fn play_clip(&self, label: PhaseLabel, clip: &ClipRef) {
        let levels = match self.settings.snapshot() {
            Ok(levels) => levels,
            Err(err) => {
                tracing::warn!(%err, "skipping cue audio");
                return;
            }
        };

        if levels.cue_muted {
            tracing::debug!(%label, "cue audio muted");
            return;
        }

        self.audio.set_volume(clip, levels.cue_volume);
        if let Err(err) = self.audio.play(clip) {
            tracing::warn!(%label, %clip, %err, "cue playback failed");
        }
    }

    fn stop_clips(&self) {
        for clip in self.table.clips() {
            self.audio.stop(clip);
        }
    }
}

impl std::fmt::Debug for CueDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueDispatcher")
            .field("table", &self.table)
            .field("current_scale", &self.current_scale)
            .finish()
    }
}
