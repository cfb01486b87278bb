//! Track isolation: landing a freshly imported subtitle batch on exactly one
//! new track.
//!
//! The host can only paste into whichever tracks are enabled, so the run
//! appends a track, records every track's enabled flag, disables all but the
//! new one, parks the playhead on the first subtitle and pastes.
//!
//! The recorded flags are not restored afterwards unless the caller opts in:
//! the new track stays enabled and its siblings stay disabled. A run that
//! fails part way leaves the flags as they were at the point of failure.
//! Runs on the same timeline must be serialized, see [`PlacementGate`].
//!
//! [`PlacementGate`]: super::PlacementGate

use tracing::{error, info, warn};

use super::{MediaRef, Timeline, TrackKind};
use crate::error::{Result, SubtrackError};
use crate::srt::SubtitleEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementState {
    Idle,
    TrackCreated,
    StatesSaved,
    Isolated,
    Positioned,
    Placed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackState {
    pub index: usize,
    pub enabled: bool,
}

/// Enabled flags of every subtitle track, taken right after the new track
/// was added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSnapshot {
    pub tracks: Vec<TrackState>,
}

impl TrackSnapshot {
    pub fn enabled(&self, index: usize) -> Option<bool> {
        self.tracks
            .iter()
            .find(|track| track.index == index)
            .map(|track| track.enabled)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub target_track: usize,
    pub snapshot: TrackSnapshot,
    pub state: PlacementState,
    /// What the host's paste call reported. `false` is not a failure.
    pub appended: bool,
    pub restored: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementOptions {
    /// Re-apply the snapshot to the pre-existing tracks once placed.
    pub restore_track_states: bool,
}

/// Runs the isolation protocol for a batch already imported as `media`.
pub fn place_subtitles<T: Timeline + ?Sized>(
    timeline: &T,
    media: &MediaRef,
    entries: &[SubtitleEntry],
    options: PlacementOptions,
) -> Result<Placement> {
    let mut run = Run {
        timeline,
        state: PlacementState::Idle,
    };
    match run.execute(media, entries, options) {
        Ok(placement) => Ok(placement),
        Err(err) => {
            error!(
                from = ?run.state,
                to = ?PlacementState::Failed,
                "Subtitle placement aborted: {}",
                err
            );
            Err(err)
        }
    }
}

struct Run<'a, T: ?Sized> {
    timeline: &'a T,
    state: PlacementState,
}

impl<'a, T: Timeline + ?Sized> Run<'a, T> {
    fn execute(
        &mut self,
        media: &MediaRef,
        entries: &[SubtitleEntry],
        options: PlacementOptions,
    ) -> Result<Placement> {
        let target_track = self.create_track()?;
        let snapshot = self.save_states()?;
        self.isolate(target_track, &snapshot)?;

        let appended = match entries.first() {
            Some(first) => {
                self.position(&first.start_timecode)?;
                self.paste(media)?
            }
            None => {
                info!("No subtitles to place, leaving track {} empty", target_track);
                self.advance(PlacementState::Placed);
                false
            }
        };

        let restored = options.restore_track_states && self.restore(target_track, &snapshot);

        Ok(Placement {
            target_track,
            snapshot,
            state: self.state,
            appended,
            restored,
        })
    }

    fn advance(&mut self, next: PlacementState) {
        info!(from = ?self.state, to = ?next, "Placement transition");
        self.state = next;
    }

    fn create_track(&mut self) -> Result<usize> {
        let added = self
            .timeline
            .add_track(TrackKind::Subtitle)
            .map_err(SubtrackError::host("AddTrack"))?;
        if !added {
            return Err(SubtrackError::TrackCreationFailed);
        }
        // Tracks are only ever appended, so the new one is the last.
        let target = self
            .timeline
            .track_count(TrackKind::Subtitle)
            .map_err(SubtrackError::host("GetTrackCount"))?;
        info!("Created subtitle track {}", target);
        self.advance(PlacementState::TrackCreated);
        Ok(target)
    }

    fn save_states(&mut self) -> Result<TrackSnapshot> {
        let count = self
            .timeline
            .track_count(TrackKind::Subtitle)
            .map_err(SubtrackError::host("GetTrackCount"))?;
        let tracks = (1..=count)
            .map(|index| {
                self.timeline
                    .is_track_enabled(TrackKind::Subtitle, index)
                    .map(|enabled| TrackState { index, enabled })
                    .map_err(SubtrackError::host("GetIsTrackEnabled"))
            })
            .collect::<Result<Vec<TrackState>>>()?;
        self.advance(PlacementState::StatesSaved);
        Ok(TrackSnapshot { tracks })
    }

    fn isolate(&mut self, target: usize, snapshot: &TrackSnapshot) -> Result<()> {
        for track in snapshot.tracks.iter().filter(|t| t.index != target) {
            self.timeline
                .set_track_enabled(TrackKind::Subtitle, track.index, false)
                .map_err(SubtrackError::host("SetTrackEnable"))?;
        }
        self.timeline
            .set_track_enabled(TrackKind::Subtitle, target, true)
            .map_err(SubtrackError::host("SetTrackEnable"))?;
        info!("Isolated subtitle track {}", target);
        self.advance(PlacementState::Isolated);
        Ok(())
    }

    fn position(&mut self, timecode: &str) -> Result<()> {
        self.timeline
            .set_playhead(timecode)
            .map_err(SubtrackError::host("SetCurrentTimecode"))?;
        info!("Playhead moved to {}", timecode);
        self.advance(PlacementState::Positioned);
        Ok(())
    }

    fn paste(&mut self, media: &MediaRef) -> Result<bool> {
        let appended = self
            .timeline
            .append(media)
            .map_err(SubtrackError::host("AppendToTimeline"))?;
        if !appended {
            warn!("AppendToTimeline reported no result; the paste may still have landed");
        }
        self.advance(PlacementState::Placed);
        Ok(appended)
    }

    /// Runs after `Placed`, so a host error here is only a warning: the
    /// subtitles have landed whatever the sibling flags end up as.
    fn restore(&mut self, target: usize, snapshot: &TrackSnapshot) -> bool {
        for track in snapshot.tracks.iter().filter(|t| t.index != target) {
            if let Err(err) =
                self.timeline
                    .set_track_enabled(TrackKind::Subtitle, track.index, track.enabled)
            {
                warn!(
                    "SetTrackEnable raised while restoring track {}, leaving the rest as placed: {}",
                    track.index, err
                );
                return false;
            }
        }
        info!("Restored enabled flags of {} sibling tracks", snapshot.len().saturating_sub(1));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srt::DiffSpan;
    use crate::timeline::memory::{Call, MemoryTimeline};
    use pretty_assertions::assert_eq;

    fn entries(starts: &[&str]) -> Vec<SubtitleEntry> {
        starts
            .iter()
            .enumerate()
            .map(|(i, start)| SubtitleEntry {
                id: i as u64 + 1,
                start_timecode: start.to_string(),
                end_timecode: start.to_string(),
                diffs: vec![DiffSpan::unchanged("text")],
            })
            .collect()
    }

    fn media() -> MediaRef {
        MediaRef("batch.srt".to_string())
    }

    #[test]
    fn test_single_track_is_isolated() {
        let timeline = MemoryTimeline::with_subtitle_tracks(&[true]);

        let placement = place_subtitles(
            &timeline,
            &media(),
            &entries(&["01:00:02:10"]),
            PlacementOptions::default(),
        )
        .unwrap();

        assert_eq!(placement.state, PlacementState::Placed);
        assert_eq!(placement.target_track, 2);
        assert_eq!(timeline.subtitle_flags(), vec![false, true]);
        assert_eq!(timeline.playhead(), Some("01:00:02:10".to_string()));
        assert_eq!(timeline.pasted_onto(), vec![(media(), vec![2])]);
    }

    #[test]
    fn test_snapshot_is_recorded_but_not_reapplied() {
        let timeline = MemoryTimeline::with_subtitle_tracks(&[true, false, true]);

        let placement = place_subtitles(
            &timeline,
            &media(),
            &entries(&["00:00:01:00", "00:00:05:00"]),
            PlacementOptions::default(),
        )
        .unwrap();

        assert_eq!(placement.snapshot.enabled(1), Some(true));
        assert_eq!(placement.snapshot.enabled(2), Some(false));
        assert_eq!(placement.snapshot.enabled(3), Some(true));
        assert_eq!(placement.snapshot.len(), 4);
        assert!(!placement.restored);
        assert_eq!(timeline.subtitle_flags(), vec![false, false, false, true]);
    }

    #[test]
    fn test_opt_in_restore() {
        let timeline = MemoryTimeline::with_subtitle_tracks(&[true, false]);

        let placement = place_subtitles(
            &timeline,
            &media(),
            &entries(&["00:00:01:00"]),
            PlacementOptions {
                restore_track_states: true,
            },
        )
        .unwrap();

        assert!(placement.restored);
        assert_eq!(timeline.pasted_onto(), vec![(media(), vec![3])]);
        assert_eq!(timeline.subtitle_flags(), vec![true, false, true]);
    }

    #[test]
    fn test_failed_restore_still_places() {
        let timeline = MemoryTimeline::with_subtitle_tracks(&[true, false]);
        timeline.fail_on_exactly(Call::SetTrackEnabled(1, true));

        let placement = place_subtitles(
            &timeline,
            &media(),
            &entries(&["00:00:01:00"]),
            PlacementOptions {
                restore_track_states: true,
            },
        )
        .unwrap();

        assert_eq!(placement.state, PlacementState::Placed);
        assert!(!placement.restored);
        assert_eq!(timeline.pasted_onto(), vec![(media(), vec![3])]);
        assert_eq!(timeline.subtitle_flags(), vec![false, false, true]);
    }

    #[test]
    fn test_empty_batch_places_nothing() {
        let timeline = MemoryTimeline::with_subtitle_tracks(&[true]);

        let placement =
            place_subtitles(&timeline, &media(), &[], PlacementOptions::default()).unwrap();

        assert_eq!(placement.state, PlacementState::Placed);
        assert!(!placement.appended);
        assert_eq!(timeline.playhead(), None);
        assert!(timeline.pasted_onto().is_empty());
        assert_eq!(timeline.subtitle_flags(), vec![false, true]);
    }

    #[test]
    fn test_falsy_append_is_not_a_failure() {
        let timeline = MemoryTimeline::with_subtitle_tracks(&[]);
        timeline.set_append_result(false);

        let placement = place_subtitles(
            &timeline,
            &media(),
            &entries(&["00:00:00:00"]),
            PlacementOptions::default(),
        )
        .unwrap();

        assert_eq!(placement.state, PlacementState::Placed);
        assert_eq!(placement.target_track, 1);
        assert!(!placement.appended);
    }

    #[test]
    fn test_refused_track_creation() {
        let timeline = MemoryTimeline::with_subtitle_tracks(&[true]);
        timeline.refuse_add_track();

        match place_subtitles(&timeline, &media(), &entries(&["00:00:01:00"]), PlacementOptions::default()) {
            Err(SubtrackError::TrackCreationFailed) => (),
            other => panic!("expected TrackCreationFailed, got {:?}", other),
        }
        assert_eq!(timeline.subtitle_flags(), vec![true]);
    }

    #[test]
    fn test_raise_mid_run_leaves_state_mutated() {
        let timeline = MemoryTimeline::with_subtitle_tracks(&[true, true]);
        timeline.fail_on(Call::SetPlayhead);

        match place_subtitles(&timeline, &media(), &entries(&["00:00:01:00"]), PlacementOptions::default()) {
            Err(SubtrackError::ExternalCapabilityFailure { operation, .. }) => {
                assert_eq!(operation, "SetCurrentTimecode")
            }
            other => panic!("expected ExternalCapabilityFailure, got {:?}", other),
        }
        // No rollback: isolation already happened.
        assert_eq!(timeline.subtitle_flags(), vec![false, false, true]);
        assert!(timeline.pasted_onto().is_empty());
    }

    #[test]
    fn test_raise_while_saving_states() {
        let timeline = MemoryTimeline::with_subtitle_tracks(&[true, false]);
        timeline.fail_on(Call::IsTrackEnabled(1));

        match place_subtitles(&timeline, &media(), &entries(&["00:00:01:00"]), PlacementOptions::default()) {
            Err(SubtrackError::ExternalCapabilityFailure { operation, .. }) => {
                assert_eq!(operation, "GetIsTrackEnabled")
            }
            other => panic!("expected ExternalCapabilityFailure, got {:?}", other),
        }
        // The new track stays, nothing was isolated yet.
        assert_eq!(timeline.subtitle_flags(), vec![true, false, true]);
        assert_eq!(timeline.playhead(), None);
        assert!(timeline.pasted_onto().is_empty());
    }

    #[test]
    fn test_raise_while_pasting() {
        let timeline = MemoryTimeline::with_subtitle_tracks(&[true, true]);
        timeline.fail_on(Call::Append);

        match place_subtitles(
            &timeline,
            &media(),
            &entries(&["00:00:01:00"]),
            PlacementOptions {
                restore_track_states: true,
            },
        ) {
            Err(SubtrackError::ExternalCapabilityFailure { operation, .. }) => {
                assert_eq!(operation, "AppendToTimeline")
            }
            other => panic!("expected ExternalCapabilityFailure, got {:?}", other),
        }
        // Isolated and positioned, never restored.
        assert_eq!(timeline.subtitle_flags(), vec![false, false, true]);
        assert_eq!(timeline.playhead(), Some("00:00:01:00".to_string()));
        assert!(timeline.pasted_onto().is_empty());
    }

    #[test]
    fn test_call_order() {
        let timeline = MemoryTimeline::with_subtitle_tracks(&[true]);

        place_subtitles(&timeline, &media(), &entries(&["00:00:01:00"]), PlacementOptions::default())
            .unwrap();

        let calls: Vec<Call> = timeline.calls();
        assert_eq!(
            calls,
            vec![
                Call::AddTrack,
                Call::TrackCount,
                Call::TrackCount,
                Call::IsTrackEnabled(1),
                Call::IsTrackEnabled(2),
                Call::SetTrackEnabled(1, false),
                Call::SetTrackEnabled(2, true),
                Call::SetPlayhead,
                Call::Append,
            ]
        );
    }
}
