//! Requests against the current timeline: listing tracks, reading subtitles
//! off a track, moving the playhead and exporting an edited batch.

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{Result, SubtrackError};
use crate::serialiser::build_interchange_document;
use crate::session::TimelineContext;
use crate::srt::{ExportRequest, ProjectInfo, SubtitleItem, SubtitleTrackInfo, TrackSubtitles};
use crate::timecode::{broadcast_timecode_to_frames, frames_to_broadcast_timecode, FrameRate};
use crate::timeline::{place_subtitles, Placement, PlacementGate, PlacementOptions, Timeline, TrackKind};

pub fn project_info<T: Timeline>(ctx: &TimelineContext<T>) -> Result<ProjectInfo> {
    let timeline_name = ctx
        .timeline
        .name()
        .map_err(SubtrackError::host("GetName"))?;
    Ok(ProjectInfo {
        project_name: ctx.project_name.clone(),
        timeline_name: Some(timeline_name),
    })
}

pub fn subtitle_tracks<T: Timeline + ?Sized>(timeline: &T) -> Result<Vec<SubtitleTrackInfo>> {
    let count = timeline
        .track_count(TrackKind::Subtitle)
        .map_err(SubtrackError::host("GetTrackCount"))?;
    (1..=count)
        .map(|track_index| {
            timeline
                .track_name(TrackKind::Subtitle, track_index)
                .map(|track_name| SubtitleTrackInfo {
                    track_index,
                    track_name,
                })
                .map_err(SubtrackError::host("GetTrackName"))
        })
        .collect()
}

/// Reads every subtitle on a 1-based track, with broadcast timecodes.
pub fn read_track<T: Timeline + ?Sized>(
    timeline: &T,
    track_index: usize,
    frame_rate: FrameRate,
) -> Result<TrackSubtitles> {
    let count = timeline
        .track_count(TrackKind::Subtitle)
        .map_err(SubtrackError::host("GetTrackCount"))?;
    if count == 0 {
        return Ok(TrackSubtitles {
            frame_rate,
            data: Vec::new(),
        });
    }
    if track_index == 0 || track_index > count {
        return Err(SubtrackError::InvalidTrackIndex {
            index: track_index,
            count,
        });
    }

    let items = timeline
        .items_in_track(TrackKind::Subtitle, track_index)
        .map_err(SubtrackError::host("GetItemListInTrack"))?;
    let data = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| SubtitleItem {
            id: i as u64 + 1,
            start_timecode: frames_to_broadcast_timecode(item.start_frame, frame_rate),
            end_timecode: frames_to_broadcast_timecode(item.end_frame, frame_rate),
            text: item.name,
        })
        .collect();

    Ok(TrackSubtitles { frame_rate, data })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JumpTo {
    Start,
    End,
    Middle,
}

/// The timecode a jump lands on. The middle is the integer midpoint of the
/// two frame counts.
pub fn jump_target(
    in_point: &str,
    out_point: &str,
    jump_to: JumpTo,
    frame_rate: FrameRate,
) -> Result<String> {
    match jump_to {
        JumpTo::Start => Ok(in_point.to_string()),
        JumpTo::End => Ok(out_point.to_string()),
        JumpTo::Middle => {
            let in_frames = broadcast_timecode_to_frames(in_point, frame_rate)?;
            let out_frames = broadcast_timecode_to_frames(out_point, frame_rate)?;
            let middle = (in_frames + out_frames) / 2;
            Ok(frames_to_broadcast_timecode(middle, frame_rate))
        }
    }
}

pub fn jump_playhead<T: Timeline + ?Sized>(
    timeline: &T,
    in_point: &str,
    out_point: &str,
    jump_to: JumpTo,
    frame_rate: FrameRate,
) -> Result<String> {
    let target = jump_target(in_point, out_point, jump_to, frame_rate)?;
    timeline
        .set_playhead(&target)
        .map_err(SubtrackError::host("SetCurrentTimecode"))?;
    info!("Playhead moved to {}", target);
    Ok(target)
}

/// Writes the batch to a temporary interchange file, imports it and places
/// it on a new subtitle track. The temporary file is gone when this returns.
pub fn export_to_timeline<T: Timeline>(
    ctx: &TimelineContext<T>,
    request: &ExportRequest,
    gate: &PlacementGate,
    options: PlacementOptions,
) -> Result<Placement> {
    let timeline = &ctx.timeline;

    let start_timecode = timeline
        .start_timecode()
        .map_err(SubtrackError::host("GetStartTimecode"))?;
    let base_frame = broadcast_timecode_to_frames(&start_timecode, ctx.frame_rate)?;
    let document = build_interchange_document(&request.subtitles, request.frame_rate, base_frame)?;

    let mut file = tempfile::Builder::new()
        .prefix("subtrack-")
        .suffix(".srt")
        .tempfile()?;
    file.write_all(document.as_bytes())?;
    file.flush()?;
    info!("Wrote temporary interchange file {}", file.path().display());

    let media = timeline
        .import_media(file.path())
        .map_err(SubtrackError::host("ImportMedia"))?
        .ok_or_else(|| SubtrackError::ImportFailed(file.path().to_path_buf()))?;

    let key = timeline.name().map_err(SubtrackError::host("GetName"))?;
    let placement = gate.run(&key, || {
        place_subtitles(timeline, &media, &request.subtitles, options)
    })?;

    let path = file.path().to_path_buf();
    match file.close() {
        Ok(()) => info!("Removed temporary file {}", path.display()),
        Err(err) => error!("Failed to remove temporary file {}: {}", path.display(), err),
    }

    info!(
        "Exported {} subtitles to track {}",
        request.subtitles.len(),
        placement.target_track
    );
    Ok(placement)
}
