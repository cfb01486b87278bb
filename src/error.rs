use std::path::PathBuf;

use thiserror::Error;

use crate::timeline::HostError;

pub type Result<T> = std::result::Result<T, SubtrackError>;

#[derive(Debug, Error)]
pub enum SubtrackError {
    #[error("Malformed timecode '{input}': {reason}")]
    MalformedTimecode { input: String, reason: String },

    #[error("The timeline refused to add a new subtitle track")]
    TrackCreationFailed,

    #[error("Timeline call '{operation}' failed: {source}")]
    ExternalCapabilityFailure {
        operation: &'static str,
        #[source]
        source: HostError,
    },

    #[error("Invalid subtitle track index {index}, valid range is 1 to {count}")]
    InvalidTrackIndex { index: usize, count: usize },

    #[error("Failed to import '{}' into the media pool", .0.display())]
    ImportFailed(PathBuf),

    #[error("Could not connect to the editing application: {0}")]
    ConnectionFailed(#[source] HostError),

    #[error("No project is currently open")]
    NoProjectOpen,

    #[error("The current project has no active timeline")]
    NoActiveTimeline,

    #[error("{0}")]
    ParseError(String),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SubtrackError {
    pub fn malformed(input: &str, reason: impl Into<String>) -> Self {
        Self::MalformedTimecode {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Wraps a raised host failure with the name of the call that raised it.
    pub fn host(operation: &'static str) -> impl FnOnce(HostError) -> Self {
        move |source| Self::ExternalCapabilityFailure { operation, source }
    }
}
