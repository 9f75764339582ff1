//! Recording collaborators shared by the unit tests.

use std::{cell::RefCell, collections::HashSet};

use crate::{AnimationUpdate, AudioSink, ClipRef, ControlState, PacerError, Result, Surface};

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCall {
    Play(String),
    Stop(String),
    Volume(String, f32),
    Muted(String, bool),
}

/// Audio sink that records every call and can be told to refuse clips.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: RefCell<Vec<AudioCall>>,
    refused: RefCell<HashSet<String>>,
}

impl RecordingSink {
    pub fn refuse(&self, clip: &str) {
        self.refused.borrow_mut().insert(clip.to_string());
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.borrow().clone()
    }

    pub fn plays(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                AudioCall::Play(clip) => Some(clip.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl AudioSink for RecordingSink {
    fn play(&self, clip: &ClipRef) -> Result<()> {
        self.calls.borrow_mut().push(AudioCall::Play(clip.to_string()));
        if self.refused.borrow().contains(clip.as_str()) {
            return Err(PacerError::Playback {
                clip: clip.to_string(),
                reason: "autoplay blocked".to_string(),
            });
        }
        Ok(())
    }

    fn stop(&self, clip: &ClipRef) {
        self.calls.borrow_mut().push(AudioCall::Stop(clip.to_string()));
    }

    fn set_volume(&self, clip: &ClipRef, level: f32) {
        self.calls
            .borrow_mut()
            .push(AudioCall::Volume(clip.to_string(), level));
    }

    fn set_muted(&self, clip: &ClipRef, muted: bool) {
        self.calls
            .borrow_mut()
            .push(AudioCall::Muted(clip.to_string(), muted));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Label(String),
    Animate(AnimationUpdate),
    Controls(ControlState),
    Backdrop(String),
}

/// Surface that records every update it receives.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: RefCell<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.borrow().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Label(label) => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn animations(&self) -> Vec<AnimationUpdate> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Animate(update) => Some(*update),
                _ => None,
            })
            .collect()
    }

    pub fn last_controls(&self) -> Option<ControlState> {
        self.calls.borrow().iter().rev().find_map(|call| match call {
            SurfaceCall::Controls(state) => Some(*state),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl Surface for RecordingSurface {
    fn show_label(&self, label: &str) {
        self.calls
            .borrow_mut()
            .push(SurfaceCall::Label(label.to_string()));
    }

    fn animate(&self, update: AnimationUpdate) {
        self.calls.borrow_mut().push(SurfaceCall::Animate(update));
    }

    fn set_controls(&self, state: ControlState) {
        self.calls.borrow_mut().push(SurfaceCall::Controls(state));
    }

    fn set_backdrop(&self, image: &str) {
        self.calls
            .borrow_mut()
            .push(SurfaceCall::Backdrop(image.to_string()));
    }
}
