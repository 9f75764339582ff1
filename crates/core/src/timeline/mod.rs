use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use crate::{CueDispatcher, PhaseLabel, Technique, TechniqueCatalog};

/// Handle for one armed deferred callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Source of deferred callbacks. The owner of the timer delivers a firing by
/// handing the returned [`TimerId`] back to [`Scheduler::on_timer_fired`].
pub trait Timer {
    fn arm(&mut self, delay: Duration) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

/// Virtual clock used for deterministic playback and simulation.
#[derive(Debug, Default, Clone)]
pub struct ManualTimer {
    now: Duration,
    next_id: u64,
    armed: BTreeMap<TimerId, Duration>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since the timer was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed callbacks that have not fired or been cancelled.
    pub fn outstanding(&self) -> usize {
        self.armed.len()
    }

    /// Earliest armed callback and its deadline.
    pub fn next_due(&self) -> Option<(TimerId, Duration)> {
        self.armed
            .iter()
            .min_by_key(|(id, deadline)| (**deadline, **id))
            .map(|(id, deadline)| (*id, *deadline))
    }

    /// Moves the clock to the earliest deadline not later than `until` and
    /// disarms that callback.
    pub fn fire_due(&mut self, until: Duration) -> Option<TimerId> {
        let (id, deadline) = self.next_due()?;
        if deadline > until {
            return None;
        }
        self.armed.remove(&id);
        self.now = self.now.max(deadline);
        Some(id)
    }

    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

impl Timer for ManualTimer {
    fn arm(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.armed.insert(id, self.now + delay);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.armed.remove(&id);
    }
}

/// Monotonic timer for an external event loop: the loop sleeps until
/// [`WallTimer::next_deadline`] and then collects the due callback.
#[derive(Debug, Default, Clone)]
pub struct WallTimer {
    next_id: u64,
    armed: Option<(TimerId, Instant)>,
}

impl WallTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed.map(|(_, deadline)| deadline)
    }

    /// Disarms and returns the callback if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<TimerId> {
        match self.armed {
            Some((id, deadline)) if deadline <= now => {
                self.armed = None;
                Some(id)
            }
            _ => None,
        }
    }
}

impl Timer for WallTimer {
    fn arm(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        if let Some((previous, _)) = self.armed.replace((id, Instant::now() + delay)) {
            tracing::warn!(?previous, "replacing an armed phase timer");
        }
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if matches!(self.armed, Some((armed, _)) if armed == id) {
            self.armed = None;
        }
    }
}

/// Receives the scheduler's display reports.
pub trait PhaseReporter {
    fn phase_entered(&mut self, index: usize, label: PhaseLabel);
    fn session_idle(&mut self);
}

/// Mutable state of the single breathing session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub technique: Technique,
    pub phase_index: usize,
    pub running: bool,
    pub pending: Option<TimerId>,
}

impl SessionState {
    fn new(technique: Technique) -> Self {
        Self {
            technique,
            phase_index: 0,
            running: false,
            pending: None,
        }
    }
}

/// Breathing-cycle state machine. Walks the active technique's phases,
/// dispatching cues on entry and keeping at most one timer armed.
#[derive(Debug)]
pub struct Scheduler<T: Timer> {
    catalog: TechniqueCatalog,
    state: SessionState,
    cues: CueDispatcher,
    timer: T,
}

impl<T: Timer> Scheduler<T> {
    /// Creates an idle scheduler on the catalog's default technique.
    pub fn new(catalog: TechniqueCatalog, cues: CueDispatcher, timer: T) -> Self {
        let state = SessionState::new(catalog.default_technique().clone());
        Self {
            catalog,
            state,
            cues,
            timer,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn phase_index(&self) -> usize {
        self.state.phase_index
    }

    pub fn technique(&self) -> &Technique {
        &self.state.technique
    }

    /// Label of the phase the session is in (or would start in).
    pub fn current_label(&self) -> PhaseLabel {
        self.catalog
            .label_for(self.state.technique.phase_count(), self.state.phase_index)
    }

    pub fn catalog(&self) -> &TechniqueCatalog {
        &self.catalog
    }

    pub fn cues(&self) -> &CueDispatcher {
        &self.cues
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Starts a session at phase 0. A running session is reset first, so
    /// repeated starts restart the cycle.
    pub fn start(&mut self, reporter: &mut dyn PhaseReporter) {
        if self.state.running {
            self.stop(reporter);
        }

        tracing::info!(technique = %self.state.technique.id, "breathing session started");
        self.state.running = true;
        self.state.phase_index = 0;
        self.enter_phase(reporter);
    }

    /// Cancels the armed timer, returns to phase 0 and silences all cues.
    /// Does nothing while idle.
    pub fn stop(&mut self, reporter: &mut dyn PhaseReporter) {
        self.disarm();
        if !self.state.running {
            return;
        }

        tracing::info!(technique = %self.state.technique.id, "breathing session stopped");
        self.state.running = false;
        self.state.phase_index = 0;
        self.cues.silence();
        reporter.session_idle();
    }

    /// Stops the session and installs a new technique. Unknown ids fall back
    /// to the default technique. Does not restart.
    pub fn set_technique(&mut self, id: &str, reporter: &mut dyn PhaseReporter) {
        self.stop(reporter);
        self.state.technique = self.catalog.phases(id).clone();
        tracing::info!(technique = %self.state.technique.id, "technique selected");
    }

    /// Advances to the next phase when `id` is the armed timer of a running
    /// session. Stale or cancelled firings are ignored.
    pub fn on_timer_fired(&mut self, id: TimerId, reporter: &mut dyn PhaseReporter) {
        if !self.state.running || self.state.pending != Some(id) {
            tracing::debug!(?id, "ignoring stale phase timer");
            return;
        }

        self.state.pending = None;
        self.state.phase_index = (self.state.phase_index + 1) % self.state.technique.phase_count();
        self.enter_phase(reporter);
    }

    fn enter_phase(&mut self, reporter: &mut dyn PhaseReporter) {
        let index = self.state.phase_index;
        let label = self
            .catalog
            .label_for(self.state.technique.phase_count(), index);
        let duration = self.state.technique.duration(index);
        tracing::debug!(index, %label, ?duration, "entering phase");

        self.cues.dispatch(label, duration);
        reporter.phase_entered(index, label);

        self.disarm();
        self.state.pending = Some(self.timer.arm(duration));
    }

    fn disarm(&mut self) {
        if let Some(id) = self.state.pending.take() {
            self.timer.cancel(id);
        }
    }
}

impl Scheduler<ManualTimer> {
    /// Fires the earliest armed timer, moving virtual time to its deadline.
    /// Returns the new virtual time, or `None` when nothing is armed.
    pub fn fire_next(&mut self, reporter: &mut dyn PhaseReporter) -> Option<Duration> {
        let (_, deadline) = self.timer.next_due()?;
        let id = self.timer.fire_due(deadline)?;
        self.on_timer_fired(id, reporter);
        Some(self.timer.now())
    }

    /// Moves virtual time forward by `by`, firing every timer that falls due
    /// on the way.
    pub fn advance(&mut self, by: Duration, reporter: &mut dyn PhaseReporter) {
        let until = self.timer.now() + by;
        while let Some(id) = self.timer.fire_due(until) {
            self.on_timer_fired(id, reporter);
        }
        self.timer.advance_to(until);
    }
}

impl Scheduler<WallTimer> {
    /// Delivers the armed timer if its deadline has passed by `now`.
    pub fn poll(&mut self, now: Instant, reporter: &mut dyn PhaseReporter) {
        while let Some(id) = self.timer.take_due(now) {
            self.on_timer_fired(id, reporter);
        }
    }
}
