use std::{
    rc::Rc,
    time::{Duration, Instant},
};

use crate::{
    AmbientPlayer, AnimationUpdate, AppConfig, AudioSettings, AudioSink, CueDispatcher, CueTable,
    ManualTimer, PhaseLabel, PhaseReporter, Result, Scheduler, TechniqueCatalog, Timer, TimerId,
    WallTimer,
};

/// Outbound UI port: everything the user sees.
pub trait Surface {
    fn show_label(&self, label: &str);
    fn animate(&self, update: AnimationUpdate);
    fn set_controls(&self, state: ControlState);
    fn set_backdrop(&self, image: &str);
}

/// Which session buttons are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

impl ControlState {
    pub fn for_running(running: bool) -> Self {
        Self {
            start_enabled: !running,
            stop_enabled: running,
        }
    }
}

/// Display-side half of the controller; receives the scheduler's reports.
struct SessionView {
    surface: Rc<dyn Surface>,
    idle_label: String,
    label: String,
    phase_index: usize,
    controls: ControlState,
}

impl SessionView {
    fn publish_controls(&mut self, running: bool) {
        self.controls = ControlState::for_running(running);
        self.surface.set_controls(self.controls);
    }
}

impl PhaseReporter for SessionView {
    fn phase_entered(&mut self, index: usize, label: PhaseLabel) {
        self.phase_index = index;
        self.label = label.to_string();
        self.surface.show_label(&self.label);
    }

    fn session_idle(&mut self) {
        self.phase_index = 0;
        self.label.clone_from(&self.idle_label);
        self.surface.show_label(&self.label);
    }
}

/// Translates UI events into scheduler calls and keeps the visible session
/// state (label, button enablement, background sound) in step.
pub struct SessionController<T: Timer> {
    scheduler: Scheduler<T>,
    view: SessionView,
    ambient: AmbientPlayer,
    settings: AudioSettings,
}

impl<T: Timer> SessionController<T> {
    /// Wires the scheduler, cue dispatcher and ambient player from a
    /// validated configuration and shows the idle state.
    pub fn new(
        config: &AppConfig,
        timer: T,
        audio: Rc<dyn AudioSink>,
        surface: Rc<dyn Surface>,
    ) -> Result<Self> {
        let catalog = TechniqueCatalog::from_config(config)?;
        let settings = AudioSettings::new(config.audio);

        let cues = CueDispatcher::new(
            CueTable::new(config.cues.clone(), config.animation),
            settings.clone(),
            audio.clone(),
            surface.clone(),
        );
        cues.apply_volume(config.audio.cue_volume);
        cues.apply_muted(config.audio.cue_muted);

        let mut ambient =
            AmbientPlayer::new(&config.ambient, settings.clone(), audio, surface.clone());
        ambient.apply_volume(config.audio.ambient_volume);
        if let Some(name) = &config.ambient.default_sound {
            ambient.select(name, false);
        }

        let mut controller = Self {
            scheduler: Scheduler::new(catalog, cues, timer),
            view: SessionView {
                surface,
                idle_label: config.idle_label.clone(),
                label: String::new(),
                phase_index: 0,
                controls: ControlState::for_running(false),
            },
            ambient,
            settings,
        };
        controller.view.session_idle();
        controller.view.publish_controls(false);
        Ok(controller)
    }

    pub fn scheduler(&self) -> &Scheduler<T> {
        &self.scheduler
    }

    /// Handle to the shared audio settings for external sliders.
    pub fn settings(&self) -> AudioSettings {
        self.settings.clone()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn displayed_label(&self) -> &str {
        &self.view.label
    }

    pub fn displayed_phase(&self) -> usize {
        self.view.phase_index
    }

    pub fn controls(&self) -> ControlState {
        self.view.controls
    }

    pub fn background_sound(&self) -> Option<&str> {
        self.ambient.selected()
    }

    pub fn on_start_clicked(&mut self) {
        self.scheduler.start(&mut self.view);
        self.ambient.session_started();
        self.view.publish_controls(true);
    }

    pub fn on_stop_clicked(&mut self) {
        self.scheduler.stop(&mut self.view);
        self.ambient.session_stopped();
        self.view.publish_controls(false);
    }

    /// Single play/pause button.
    pub fn on_toggle_clicked(&mut self) {
        if self.is_running() {
            self.on_stop_clicked();
        } else {
            self.on_start_clicked();
        }
    }

    pub fn on_technique_changed(&mut self, id: &str) {
        self.scheduler.set_technique(id, &mut self.view);
        self.ambient.session_stopped();
        self.view.publish_controls(false);
    }

    /// Pushes a phase label to the display. The scheduler reports through
    /// the same view on every phase entry; this is the entry point for
    /// collaborators that drive the display directly.
    pub fn on_display_update(&mut self, index: usize, label: PhaseLabel) {
        self.view.phase_entered(index, label);
    }

    pub fn on_timer_fired(&mut self, id: TimerId) {
        self.scheduler.on_timer_fired(id, &mut self.view);
    }

    pub fn change_volume(&mut self, level: f32) -> Result<()> {
        let level = self.settings.set_cue_volume(level)?;
        self.scheduler.cues().apply_volume(level);
        Ok(())
    }

    pub fn toggle_mute(&mut self, muted: bool) -> Result<()> {
        self.settings.set_cue_muted(muted)?;
        self.scheduler.cues().apply_muted(muted);
        Ok(())
    }

    pub fn change_background_volume(&mut self, level: f32) -> Result<()> {
        let level = self.settings.set_ambient_volume(level)?;
        self.ambient.apply_volume(level);
        Ok(())
    }

    pub fn select_background(&mut self, name: &str) {
        let running = self.is_running();
        self.ambient.select(name, running);
    }
}

impl SessionController<ManualTimer> {
    /// Moves virtual time forward, delivering every phase change on the way.
    pub fn advance(&mut self, by: Duration) {
        self.scheduler.advance(by, &mut self.view);
    }

    /// Delivers the next phase change; `None` while idle.
    pub fn fire_next(&mut self) -> Option<Duration> {
        self.scheduler.fire_next(&mut self.view)
    }
}

impl SessionController<WallTimer> {
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.timer().next_deadline()
    }

    pub fn poll(&mut self, now: Instant) {
        self.scheduler.poll(now, &mut self.view);
    }
}

impl<T: Timer> std::fmt::Debug for SessionController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("technique", &self.scheduler.technique().id)
            .field("running", &self.is_running())
            .field("label", &self.view.label)
            .field("controls", &self.view.controls)
            .finish()
    }
}
