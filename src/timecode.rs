//! Frame and timecode arithmetic.
//!
//! Two renderers turn a frame count into text, and they deliberately follow
//! different conventions:
//!
//! - [`frames_to_broadcast_timecode`] produces `HH:MM:SS:FF` (or `HH:MM:SS;FF`
//!   at drop-frame rates). Its rollover counts frames from one: frame `n` is
//!   the `n + 1`th frame, which lands on index `n`, and frame zero is pinned
//!   to the zero timecode.
//! - [`frames_to_interchange_timestamp`] produces `HH:MM:SS,mmm` by real
//!   division of the frame count by the rate, with no offset, truncating at
//!   every level.
//!
//! Broadcast display and interchange export each depend on their own
//! convention. Keep them as separate functions.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SubtrackError};
use crate::parser::parse_broadcast_timecode;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3600;
const HOURS_PER_DAY: u64 = 24;

/// Frames per second, as reported by the editing application.
///
/// Zero (or any non-positive or non-finite value) is accepted and makes
/// every conversion degenerate to the zero timecode.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameRate(f64);

impl FrameRate {
    /// Rate assumed when the timeline does not report one.
    pub const FALLBACK: FrameRate = FrameRate(24.0);

    pub const fn new(fps: f64) -> Self {
        FrameRate(fps)
    }

    pub fn fps(self) -> f64 {
        self.0
    }

    pub fn is_degenerate(self) -> bool {
        !(self.0 > 0.0 && self.0.is_finite())
    }

    /// Integer frames per second used for the frame field's modulus.
    ///
    /// 23.976 counts as 24, 29.97 as 30.
    pub fn nominal_fps(self) -> u64 {
        if self.is_degenerate() {
            return 0;
        }
        (self.0.round() as u64).max(1)
    }

    /// NTSC-style non-integer rates whose nominal rate is a multiple of 30
    /// (29.97, 59.94, ...). Only the separator before the frame field
    /// changes; the frame math stays non-drop.
    pub fn is_drop_frame(self) -> bool {
        !self.is_degenerate()
            && (self.0 - self.0.round()).abs() > 1e-6
            && self.nominal_fps() % 30 == 0
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A broadcast timecode split into its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timecode {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub frames: u64,
    pub drop_frame: bool,
}

impl Timecode {
    pub const ZERO: Timecode = Timecode {
        hours: 0,
        minutes: 0,
        seconds: 0,
        frames: 0,
        drop_frame: false,
    };

    /// Rolls a 0-based frame index over into frames, seconds, minutes and
    /// hours. Hours wrap at 24.
    fn from_frame_index(index: u64, rate: FrameRate) -> Self {
        let fps = rate.nominal_fps();
        let total_seconds = index / fps;

        Timecode {
            hours: (total_seconds / SECONDS_PER_HOUR) % HOURS_PER_DAY,
            minutes: (total_seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total_seconds % SECONDS_PER_MINUTE,
            frames: index % fps,
            drop_frame: rate.is_drop_frame(),
        }
    }

    /// The 0-based frame index this timecode denotes, `None` if it does not
    /// fit in a `u64` at `rate`.
    fn frame_index(&self, rate: FrameRate) -> Option<u64> {
        let total_seconds =
            self.hours * SECONDS_PER_HOUR + self.minutes * SECONDS_PER_MINUTE + self.seconds;
        total_seconds
            .checked_mul(rate.nominal_fps())?
            .checked_add(self.frames)
    }

    /// Parses `HH:MM:SS:FF` or `HH:MM:SS;FF` and checks every field against
    /// its modulus at `rate`.
    pub fn parse(input: &str, rate: FrameRate) -> Result<Self> {
        let raw = parse_broadcast_timecode(input)?;

        if raw.hours >= HOURS_PER_DAY {
            return Err(SubtrackError::malformed(
                input,
                format!("hours must be 0-23, got {}", raw.hours),
            ));
        }
        if raw.minutes >= SECONDS_PER_MINUTE {
            return Err(SubtrackError::malformed(
                input,
                format!("minutes must be 0-59, got {}", raw.minutes),
            ));
        }
        if raw.seconds >= SECONDS_PER_MINUTE {
            return Err(SubtrackError::malformed(
                input,
                format!("seconds must be 0-59, got {}", raw.seconds),
            ));
        }
        let fps = rate.nominal_fps();
        if !rate.is_degenerate() && raw.frames >= fps {
            return Err(SubtrackError::malformed(
                input,
                format!("frames must be 0-{} at {} fps, got {}", fps - 1, rate, raw.frames),
            ));
        }
        if !rate.is_degenerate() && raw.frame_digits > 2 && fps < 100 {
            return Err(SubtrackError::malformed(
                input,
                format!("a three digit frame field needs 100 fps or more, not {}", rate),
            ));
        }

        Ok(Timecode {
            hours: raw.hours,
            minutes: raw.minutes,
            seconds: raw.seconds,
            frames: raw.frames,
            drop_frame: raw.separator == ';',
        })
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let separator = if self.drop_frame { ';' } else { ':' };
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}",
            self.hours, self.minutes, self.seconds, separator, self.frames
        )
    }
}

/// An `HH:MM:SS,mmm` timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InterchangeTimestamp {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub millis: u64,
}

impl InterchangeTimestamp {
    pub const ZERO: InterchangeTimestamp = InterchangeTimestamp {
        hours: 0,
        minutes: 0,
        seconds: 0,
        millis: 0,
    };

    /// Decomposes a real number of seconds, truncating at every level.
    pub fn from_seconds(total_seconds: f64) -> Self {
        let whole = total_seconds.floor();
        InterchangeTimestamp {
            hours: (total_seconds / 3600.0).floor() as u64,
            minutes: ((total_seconds % 3600.0) / 60.0).floor() as u64,
            seconds: (total_seconds % 60.0).floor() as u64,
            millis: ((total_seconds - whole) * 1000.0).floor() as u64,
        }
    }
}

impl From<Duration> for InterchangeTimestamp {
    fn from(duration: Duration) -> Self {
        let total_secs = duration.as_secs();
        InterchangeTimestamp {
            hours: total_secs / SECONDS_PER_HOUR,
            minutes: (total_secs % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total_secs % SECONDS_PER_MINUTE,
            millis: u64::from(duration.subsec_millis()),
        }
    }
}

impl fmt::Display for InterchangeTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02},{:03}",
            self.hours, self.minutes, self.seconds, self.millis
        )
    }
}

/// Renders a 0-based frame count as a broadcast timecode.
///
/// A degenerate rate or frame zero yields `00:00:00:00`. Otherwise frame `n`
/// is the `n + 1`th frame in the 1-based numbering of the rollover, which
/// puts it at index `n`.
pub fn frames_to_broadcast_timecode(frame: u64, rate: FrameRate) -> String {
    if rate.is_degenerate() || frame == 0 {
        return Timecode::ZERO.to_string();
    }
    Timecode::from_frame_index(frame, rate).to_string()
}

/// Parses a broadcast timecode into a 0-based frame count.
///
/// A degenerate rate yields frame zero once the string is well formed.
pub fn broadcast_timecode_to_frames(tc: &str, rate: FrameRate) -> Result<u64> {
    let timecode = Timecode::parse(tc, rate)?;
    if rate.is_degenerate() {
        return Ok(0);
    }
    timecode
        .frame_index(rate)
        .ok_or_else(|| SubtrackError::malformed(tc, format!("too many frames at {} fps", rate)))
}

/// Renders a 0-based frame count as an interchange timestamp.
///
/// No frame offset is applied here, unlike [`frames_to_broadcast_timecode`].
pub fn frames_to_interchange_timestamp(frame: u64, rate: FrameRate) -> String {
    if rate.is_degenerate() {
        return InterchangeTimestamp::ZERO.to_string();
    }
    InterchangeTimestamp::from_seconds(frame as f64 / rate.fps()).to_string()
}
