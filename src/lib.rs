//! Subtitle round-tripping for a multi-track editing timeline.
//!
//! - [`timecode`]: frame counts to and from broadcast timecodes and
//!   interchange timestamps.
//! - [`serialiser`]: edited subtitle entries to an interchange (SRT) document.
//! - [`timeline`]: the host timeline contract and the track isolation run
//!   that lands an imported batch on exactly one new track.
//! - [`workflow`] and [`session`]: requests against the host's current
//!   timeline.

pub mod config;
pub mod error;
pub mod parser;
pub mod processor;
pub mod serialiser;
pub mod session;
pub mod srt;
pub mod timecode;
pub mod timeline;
pub mod workflow;

pub use error::{Result, SubtrackError};
pub use serialiser::build_interchange_document;
pub use timecode::{
    broadcast_timecode_to_frames, frames_to_broadcast_timecode, frames_to_interchange_timestamp,
    FrameRate,
};
