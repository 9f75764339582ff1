/// Result alias that carries the custom [`PacerError`] type.
pub type Result<T> = std::result::Result<T, PacerError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum PacerError {
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The configuration file could not be parsed.
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The configuration parsed but describes something the scheduler
    /// cannot run.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An audio backend refused to start a clip.
    #[error("could not play `{clip}`: {reason}")]
    Playback { clip: String, reason: String },
    /// The shared audio settings lock was poisoned by a panicking writer.
    #[error("audio settings have been poisoned")]
    SettingsPoisoned,
}

impl PacerError {
    pub fn invalid_config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
