use breath_pacer_core::{AnimationUpdate, AudioSink, ClipRef, ControlState, Result, Surface};

/// Audio sink that reports playback through the log instead of a device.
#[derive(Debug, Default)]
pub struct ConsoleAudio;

impl AudioSink for ConsoleAudio {
    fn play(&self, clip: &ClipRef) -> Result<()> {
        tracing::info!(%clip, "audio play");
        Ok(())
    }

    fn stop(&self, clip: &ClipRef) {
        tracing::trace!(%clip, "audio stop");
    }

    fn set_volume(&self, clip: &ClipRef, level: f32) {
        tracing::debug!(%clip, level, "audio volume");
    }

    fn set_muted(&self, clip: &ClipRef, muted: bool) {
        tracing::debug!(%clip, muted, "audio muted");
    }
}

/// Surface that prints the breathing label and logs everything else.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    /// Print labels to stdout; simulations print their own timeline.
    pub echo_labels: bool,
}

impl Surface for ConsoleSurface {
    fn show_label(&self, label: &str) {
        if self.echo_labels {
            println!("{label}");
        }
    }

    fn animate(&self, update: AnimationUpdate) {
        match update.transition {
            Some(duration) => tracing::debug!(scale = update.scale, ?duration, "pulse transition"),
            None => tracing::debug!(scale = update.scale, "pulse held"),
        }
    }

    fn set_controls(&self, state: ControlState) {
        tracing::debug!(
            start_enabled = state.start_enabled,
            stop_enabled = state.stop_enabled,
            "controls"
        );
    }

    fn set_backdrop(&self, image: &str) {
        tracing::info!(image, "backdrop");
    }
}
