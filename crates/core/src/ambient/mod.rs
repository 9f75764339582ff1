use std::{collections::BTreeMap, rc::Rc};

use crate::{config::AmbientConfig, AudioSettings, AudioSink, ClipRef, Surface};

/// Looping background sound that plays alongside a running session, plus
/// the backdrop image paired with it.
pub struct AmbientPlayer {
    sounds: BTreeMap<String, ClipRef>,
    backdrops: BTreeMap<String, String>,
    selected: Option<String>,
    settings: AudioSettings,
    audio: Rc<dyn AudioSink>,
    surface: Rc<dyn Surface>,
}

impl AmbientPlayer {
    pub fn new(
        config: &AmbientConfig,
        settings: AudioSettings,
        audio: Rc<dyn AudioSink>,
        surface: Rc<dyn Surface>,
    ) -> Self {
        Self {
            sounds: config.sounds.clone(),
            backdrops: config.backdrops.clone(),
            selected: None,
            settings,
            audio,
            surface,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Switches the background sound. Every sound is rewound, the backdrop
    /// follows the selection, and playback resumes only if `session_running`.
    pub fn select(&mut self, name: &str, session_running: bool) {
        if !self.sounds.contains_key(name) {
            tracing::warn!(sound = name, "unknown background sound");
            return;
        }

        self.stop_all();
        self.selected = Some(name.to_string());
        if let Some(image) = self.backdrops.get(name) {
            self.surface.set_backdrop(image);
        }
        tracing::debug!(sound = name, session_running, "background sound selected");

        if session_running {
            self.play_selected();
        }
    }

    pub fn session_started(&self) {
        self.stop_all();
        self.play_selected();
    }

    pub fn session_stopped(&self) {
        self.stop_all();
    }

    /// Pushes the background volume to every background clip.
    pub fn apply_volume(&self, level: f32) {
        for clip in self.sounds.values() {
            self.audio.set_volume(clip, level);
        }
    }

    fn play_selected(&self) {
        let Some(clip) = self.selected.as_ref().and_then(|name| self.sounds.get(name)) else {
            return;
        };

        match self.settings.snapshot() {
            Ok(levels) => self.audio.set_volume(clip, levels.ambient_volume),
            Err(err) => tracing::warn!(%err, "using previous background volume"),
        }

        if let Err(err) = self.audio.play(clip) {
            tracing::warn!(%clip, %err, "background playback failed");
        }
    }

    fn stop_all(&self) {
        for clip in self.sounds.values() {
            self.audio.stop(clip);
        }
    }
}

impl std::fmt::Debug for AmbientPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmbientPlayer")
            .field("sounds", &self.sounds)
            .field("selected", &self.selected)
            .finish()
    }
}
