//! In-memory timeline that records every call, for tests.

use std::mem::{discriminant, Discriminant};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{HostError, HostResult, MediaRef, Timeline, TrackItem, TrackKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Name,
    TrackCount,
    TrackName(usize),
    IsTrackEnabled(usize),
    SetTrackEnabled(usize, bool),
    AddTrack,
    ItemsInTrack(usize),
    StartTimecode,
    FrameRateSetting,
    SetPlayhead,
    ImportMedia,
    Append,
}

struct MemoryTrack {
    name: String,
    enabled: bool,
    items: Vec<TrackItem>,
}

struct Inner {
    name: String,
    tracks: Vec<MemoryTrack>,
    start_timecode: String,
    frame_rate: Option<String>,
    playhead: Option<String>,
    imported: Vec<(PathBuf, String)>,
    pasted: Vec<(MediaRef, Vec<usize>)>,
    calls: Vec<Call>,
    fail_on: Option<Discriminant<Call>>,
    fail_on_exactly: Option<Call>,
    refuse_add_track: bool,
    import_succeeds: bool,
    append_result: bool,
}

pub(crate) struct MemoryTimeline {
    inner: Mutex<Inner>,
}

impl MemoryTimeline {
    pub fn with_subtitle_tracks(enabled: &[bool]) -> Self {
        let tracks = enabled
            .iter()
            .enumerate()
            .map(|(i, &enabled)| MemoryTrack {
                name: format!("Subtitle {}", i + 1),
                enabled,
                items: Vec::new(),
            })
            .collect();
        MemoryTimeline {
            inner: Mutex::new(Inner {
                name: "Timeline 1".to_string(),
                tracks,
                start_timecode: "00:00:00:00".to_string(),
                frame_rate: Some("24".to_string()),
                playhead: None,
                imported: Vec::new(),
                pasted: Vec::new(),
                calls: Vec::new(),
                fail_on: None,
                fail_on_exactly: None,
                refuse_add_track: false,
                import_succeeds: true,
                append_result: true,
            }),
        }
    }

    pub fn named(self, name: &str) -> Self {
        self.inner.lock().name = name.to_string();
        self
    }

    pub fn set_start_timecode(&self, timecode: &str) {
        self.inner.lock().start_timecode = timecode.to_string();
    }

    pub fn set_frame_rate(&self, setting: Option<&str>) {
        self.inner.lock().frame_rate = setting.map(String::from);
    }

    pub fn set_items(&self, index: usize, items: Vec<TrackItem>) {
        self.inner.lock().tracks[index - 1].items = items;
    }

    pub fn fail_on(&self, call: Call) {
        self.inner.lock().fail_on = Some(discriminant(&call));
    }

    /// Like [`fail_on`](Self::fail_on), but only for `call` with these
    /// exact arguments.
    pub fn fail_on_exactly(&self, call: Call) {
        self.inner.lock().fail_on_exactly = Some(call);
    }

    pub fn refuse_add_track(&self) {
        self.inner.lock().refuse_add_track = true;
    }

    pub fn refuse_import(&self) {
        self.inner.lock().import_succeeds = false;
    }

    pub fn set_append_result(&self, result: bool) {
        self.inner.lock().append_result = result;
    }

    pub fn subtitle_flags(&self) -> Vec<bool> {
        self.inner.lock().tracks.iter().map(|t| t.enabled).collect()
    }

    pub fn playhead(&self) -> Option<String> {
        self.inner.lock().playhead.clone()
    }

    pub fn pasted_onto(&self) -> Vec<(MediaRef, Vec<usize>)> {
        self.inner.lock().pasted.clone()
    }

    /// Paths and contents of every imported file, captured at import time.
    pub fn imported(&self) -> Vec<(PathBuf, String)> {
        self.inner.lock().imported.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    fn record(&self, call: Call) -> HostResult<()> {
        let mut inner = self.inner.lock();
        let failing = inner.fail_on == Some(discriminant(&call))
            || inner.fail_on_exactly.as_ref() == Some(&call);
        inner.calls.push(call.clone());
        if failing {
            return Err(HostError::new(format!("{:?} raised: connection lost", call)));
        }
        Ok(())
    }

    fn check_index(&self, kind: TrackKind, index: usize) -> HostResult<()> {
        let count = self.inner.lock().tracks.len();
        if kind != TrackKind::Subtitle || index == 0 || index > count {
            return Err(HostError::new(format!("no {} track {}", kind, index)));
        }
        Ok(())
    }
}

impl Timeline for MemoryTimeline {
    fn name(&self) -> HostResult<String> {
        self.record(Call::Name)?;
        Ok(self.inner.lock().name.clone())
    }

    fn track_count(&self, kind: TrackKind) -> HostResult<usize> {
        self.record(Call::TrackCount)?;
        match kind {
            TrackKind::Subtitle => Ok(self.inner.lock().tracks.len()),
            _ => Ok(0),
        }
    }

    fn track_name(&self, kind: TrackKind, index: usize) -> HostResult<String> {
        self.record(Call::TrackName(index))?;
        self.check_index(kind, index)?;
        Ok(self.inner.lock().tracks[index - 1].name.clone())
    }

    fn is_track_enabled(&self, kind: TrackKind, index: usize) -> HostResult<bool> {
        self.record(Call::IsTrackEnabled(index))?;
        self.check_index(kind, index)?;
        Ok(self.inner.lock().tracks[index - 1].enabled)
    }

    fn set_track_enabled(&self, kind: TrackKind, index: usize, enabled: bool) -> HostResult<()> {
        self.record(Call::SetTrackEnabled(index, enabled))?;
        self.check_index(kind, index)?;
        self.inner.lock().tracks[index - 1].enabled = enabled;
        Ok(())
    }

    fn add_track(&self, kind: TrackKind) -> HostResult<bool> {
        self.record(Call::AddTrack)?;
        let mut inner = self.inner.lock();
        if inner.refuse_add_track || kind != TrackKind::Subtitle {
            return Ok(false);
        }
        let name = format!("Subtitle {}", inner.tracks.len() + 1);
        inner.tracks.push(MemoryTrack {
            name,
            enabled: true,
            items: Vec::new(),
        });
        Ok(true)
    }

    fn items_in_track(&self, kind: TrackKind, index: usize) -> HostResult<Vec<TrackItem>> {
        self.record(Call::ItemsInTrack(index))?;
        self.check_index(kind, index)?;
        Ok(self.inner.lock().tracks[index - 1].items.clone())
    }

    fn start_timecode(&self) -> HostResult<String> {
        self.record(Call::StartTimecode)?;
        Ok(self.inner.lock().start_timecode.clone())
    }

    fn frame_rate_setting(&self) -> HostResult<Option<String>> {
        self.record(Call::FrameRateSetting)?;
        Ok(self.inner.lock().frame_rate.clone())
    }

    fn set_playhead(&self, timecode: &str) -> HostResult<()> {
        self.record(Call::SetPlayhead)?;
        self.inner.lock().playhead = Some(timecode.to_string());
        Ok(())
    }

    fn import_media(&self, path: &Path) -> HostResult<Option<MediaRef>> {
        self.record(Call::ImportMedia)?;
        let contents = std::fs::read_to_string(path).map_err(|e| HostError::new(e.to_string()))?;
        let mut inner = self.inner.lock();
        if !inner.import_succeeds {
            return Ok(None);
        }
        inner.imported.push((path.to_path_buf(), contents));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Some(MediaRef(name)))
    }

    fn append(&self, media: &MediaRef) -> HostResult<bool> {
        self.record(Call::Append)?;
        let mut inner = self.inner.lock();
        let enabled: Vec<usize> = inner
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.enabled)
            .map(|(i, _)| i + 1)
            .collect();
        inner.pasted.push((media.clone(), enabled));
        Ok(inner.append_result)
    }
}
