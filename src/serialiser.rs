//! Builds interchange (SRT) documents from edited subtitle entries.
//!
//! The output is byte-exact: a 1-based sequence number, the
//! `HH:MM:SS,mmm --> HH:MM:SS,mmm` line and the text, with one blank line
//! between blocks and none after the last.

use crate::error::Result;
use crate::srt::SubtitleEntry;
use crate::timecode::{broadcast_timecode_to_frames, frames_to_interchange_timestamp, FrameRate};

use std::io::{BufWriter, Write};
use std::path::Path;

pub fn build_interchange_document(
    entries: &[SubtitleEntry],
    rate: FrameRate,
    base_frame: u64,
) -> Result<String> {
    let blocks = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| write_block(i + 1, entry, rate, base_frame))
        .collect::<Result<Vec<String>>>()?;
    Ok(blocks.join("\n\n"))
}

fn write_block(
    sequence_number: usize,
    entry: &SubtitleEntry,
    rate: FrameRate,
    base_frame: u64,
) -> Result<String> {
    let text = entry.display_text();
    let start = relative_offset(&entry.start_timecode, rate, base_frame)?;
    let end = relative_offset(&entry.end_timecode, rate, base_frame)?;

    Ok(format!(
        "{}\n{} --> {}\n{}",
        sequence_number,
        frames_to_interchange_timestamp(start, rate),
        frames_to_interchange_timestamp(end, rate),
        text
    ))
}

/// Frames between `base_frame` and the timecode, pinned to zero when the
/// timecode lies before the base.
fn relative_offset(timecode: &str, rate: FrameRate, base_frame: u64) -> Result<u64> {
    let absolute = broadcast_timecode_to_frames(timecode, rate)?;
    Ok(absolute.saturating_sub(base_frame))
}

pub fn serialise<P: AsRef<Path>>(document: &str, output: P) -> Result<()> {
    let file = std::fs::File::create(output)?;
    let mut writer = BufWriter::new(file);
    write_document(&mut writer, document)?;
    writer.flush()?;
    Ok(())
}

pub fn write_document<W: Write>(buf: &mut W, document: &str) -> Result<()> {
    buf.write_all(document.as_bytes())?;
    Ok(())
}
