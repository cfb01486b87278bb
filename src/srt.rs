use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::timecode::{FrameRate, InterchangeTimestamp};

/// How a span of text changed relative to the original subtitle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffKind {
    #[serde(rename = "normal", alias = "unchanged")]
    Unchanged,
    #[serde(rename = "added", alias = "inserted")]
    Inserted,
    #[serde(rename = "removed", alias = "deleted")]
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSpan {
    #[serde(rename = "type")]
    pub kind: DiffKind,
    #[serde(rename = "value")]
    pub text: String,
}

impl DiffSpan {
    pub fn new(kind: DiffKind, text: impl Into<String>) -> Self {
        DiffSpan {
            kind,
            text: text.into(),
        }
    }

    pub fn unchanged(text: impl Into<String>) -> Self {
        Self::new(DiffKind::Unchanged, text)
    }

    pub fn inserted(text: impl Into<String>) -> Self {
        Self::new(DiffKind::Inserted, text)
    }

    pub fn deleted(text: impl Into<String>) -> Self {
        Self::new(DiffKind::Deleted, text)
    }
}

/// An edited subtitle, as handed to the codec. Timecodes are absolute
/// broadcast timecodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleEntry {
    pub id: u64,
    pub start_timecode: String,
    pub end_timecode: String,
    pub diffs: Vec<DiffSpan>,
}

impl SubtitleEntry {
    /// The text as it reads after editing: every span that was not deleted,
    /// in span order.
    pub fn display_text(&self) -> String {
        self.diffs
            .iter()
            .filter(|span| span.kind != DiffKind::Deleted)
            .map(|span| span.text.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub frame_rate: FrameRate,
    pub subtitles: Vec<SubtitleEntry>,
}

/// A subtitle as read off a timeline track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleItem {
    pub id: u64,
    pub start_timecode: String,
    pub end_timecode: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSubtitles {
    pub frame_rate: FrameRate,
    pub data: Vec<SubtitleItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleTrackInfo {
    pub track_index: usize,
    pub track_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub project_name: String,
    pub timeline_name: Option<String>,
}

/// One block of an interchange document, as read back by the parser.
///
/// Serializes as `{"id", "start", "end", "text"}` with `HH:MM:SS,mmm`
/// timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterchangeCue {
    #[serde(rename = "id")]
    pub sequence: usize,
    #[serde(serialize_with = "interchange_timestamp")]
    pub start: Duration,
    #[serde(serialize_with = "interchange_timestamp")]
    pub end: Duration,
    pub text: String,
}

fn interchange_timestamp<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&InterchangeTimestamp::from(*duration))
}
