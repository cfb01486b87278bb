//! Settings, loaded from an optional TOML file.
//!
//! ```toml
//! [timeline]
//! default_frame_rate = 24.0
//!
//! [placement]
//! restore_track_states = false
//!
//! [cleanup]
//! filler_words = ["um", "uh"]
//!
//! [logging]
//! filter = "info"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubtrackError};
use crate::timecode::FrameRate;
use crate::timeline::PlacementOptions;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timeline: TimelineSettings,
    pub placement: PlacementSettings,
    pub cleanup: CleanupSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    /// Used when the timeline does not report a usable frame rate.
    pub default_frame_rate: FrameRate,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            default_frame_rate: FrameRate::FALLBACK,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    /// Re-enable the tracks that were enabled before a placement. Off by
    /// default: placement leaves only the new track enabled.
    pub restore_track_states: bool,
}

impl From<&PlacementSettings> for PlacementOptions {
    fn from(settings: &PlacementSettings) -> Self {
        PlacementOptions {
            restore_track_states: settings.restore_track_states,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupSettings {
    pub filler_words: Vec<String>,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            filler_words: ["um", "uh", "erm", "嗯", "呃"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default `tracing` filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn from_toml(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|e| SubtrackError::ParseError(format!("Invalid settings: {}", e)))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }
}
