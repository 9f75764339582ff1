//! Core library for the Breath Pacer guided breathing application.
//!
//! The heart of the crate is the breathing-cycle [`Scheduler`]: it walks a
//! technique's phases, dispatches the audio and animation cue for each one,
//! and keeps exactly one deferred phase timer armed while a session runs.
//! Everything the user sees or hears goes through the [`Surface`] and
//! [`AudioSink`] ports so the scheduler can run against real devices, the
//! console, or the virtual clock used by tests and simulations.

pub mod ambient;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod cue;
pub mod error;
pub mod session;
pub mod timeline;

#[cfg(test)]
mod testing;

pub use ambient::AmbientPlayer;
pub use audio::{AudioLevels, AudioSettings, AudioSink, ClipRef};
pub use catalog::{PhaseLabel, Technique, TechniqueCatalog};
pub use config::{AppConfig, AudioConfig};
pub use cue::{AnimationUpdate, CueBinding, CueDispatcher, CueTable};
pub use error::{PacerError, Result};
pub use session::{ControlState, SessionController, Surface};
pub use timeline::{
    ManualTimer, PhaseReporter, Scheduler, SessionState, Timer, TimerId, WallTimer,
};
