//! The editing application's timeline, as seen from this crate.
//!
//! Everything behind [`Timeline`] is owned by the host application: calls are
//! synchronous, may raise on transport loss, and act on global mutable state
//! (most notably each track's enabled flag).

mod gate;
#[cfg(test)]
pub(crate) mod memory;
mod placement;

pub use gate::PlacementGate;
pub use placement::{
    place_subtitles, Placement, PlacementOptions, PlacementState, TrackSnapshot, TrackState,
};

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// A failure raised by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        HostError {
            message: message.into(),
        }
    }
}

pub type HostResult<T> = std::result::Result<T, HostError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
}

impl TrackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Subtitle => "subtitle",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque handle to an item in the host's media pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef(pub String);

/// A clip on a track, positioned in absolute timeline frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackItem {
    pub name: String,
    pub start_frame: u64,
    pub end_frame: u64,
}

/// Track indices are 1-based, as in the host application.
pub trait Timeline {
    /// Key used to serialize placements on this timeline.
    fn name(&self) -> HostResult<String>;
    fn track_count(&self, kind: TrackKind) -> HostResult<usize>;
    fn track_name(&self, kind: TrackKind, index: usize) -> HostResult<String>;
    fn is_track_enabled(&self, kind: TrackKind, index: usize) -> HostResult<bool>;
    fn set_track_enabled(&self, kind: TrackKind, index: usize, enabled: bool) -> HostResult<()>;
    /// Appends a track of `kind`; `false` means the host refused.
    fn add_track(&self, kind: TrackKind) -> HostResult<bool>;
    fn items_in_track(&self, kind: TrackKind, index: usize) -> HostResult<Vec<TrackItem>>;
    fn start_timecode(&self) -> HostResult<String>;
    /// The raw frame rate setting, if the host reports one.
    fn frame_rate_setting(&self) -> HostResult<Option<String>>;
    fn set_playhead(&self, timecode: &str) -> HostResult<()>;
    /// Imports a file into the media pool; `None` when nothing was imported.
    fn import_media(&self, path: &Path) -> HostResult<Option<MediaRef>>;
    /// Pastes `media` into every enabled track at the playhead. The host is
    /// known to return `false` even after a successful paste.
    fn append(&self, media: &MediaRef) -> HostResult<bool>;
}
