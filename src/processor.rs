use crate::error::Result;
use crate::srt::{DiffSpan, ExportRequest, SubtitleEntry, SubtitleItem};
use crate::timecode::FrameRate;

use regex::{NoExpand, Regex, RegexBuilder};
use tracing::debug;

/// A subtitle read off the timeline, together with the text it had there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedSubtitle {
    pub item: SubtitleItem,
    pub original_text: String,
}

impl EditedSubtitle {
    pub fn new(item: SubtitleItem) -> Self {
        let original_text = item.text.clone();
        EditedSubtitle {
            item,
            original_text,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.item.text != self.original_text
    }

    pub fn to_entry(&self) -> SubtitleEntry {
        SubtitleEntry {
            id: self.item.id,
            start_timecode: self.item.start_timecode.clone(),
            end_timecode: self.item.end_timecode.clone(),
            diffs: diff_spans(&self.original_text, &self.item.text),
        }
    }
}

pub struct ProcessOpts {
    pub filler_words: Vec<String>,
    pub find_replace: Option<FindReplace>,
}

pub fn process(items: Vec<SubtitleItem>, opts: &ProcessOpts) -> Result<Vec<EditedSubtitle>> {
    let subs = items.into_iter().map(EditedSubtitle::new).collect();
    let subs = remove_filler_words(subs, &opts.filler_words)?;
    match &opts.find_replace {
        Some(find_replace) => find_replace.apply(subs),
        None => Ok(subs),
    }
}

pub fn to_export_request(subs: &[EditedSubtitle], frame_rate: FrameRate) -> ExportRequest {
    ExportRequest {
        frame_rate,
        subtitles: subs.iter().map(EditedSubtitle::to_entry).collect(),
    }
}

/// Describes how `edited` differs from `original`: the common prefix and
/// suffix stay unchanged, and whatever lies between is one deletion followed
/// by one insertion.
pub fn diff_spans(original: &str, edited: &str) -> Vec<DiffSpan> {
    let prefix_len: usize = original
        .chars()
        .zip(edited.chars())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf8())
        .sum();
    let (prefix, original_rest) = original.split_at(prefix_len);
    let edited_rest = &edited[prefix_len..];

    let suffix_len: usize = original_rest
        .chars()
        .rev()
        .zip(edited_rest.chars().rev())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| a.len_utf8())
        .sum();
    let (removed, suffix) = original_rest.split_at(original_rest.len() - suffix_len);
    let added = &edited_rest[..edited_rest.len() - suffix_len];

    let spans = [
        DiffSpan::unchanged(prefix),
        DiffSpan::deleted(removed),
        DiffSpan::inserted(added),
        DiffSpan::unchanged(suffix),
    ];
    spans.into_iter().filter(|span| !span.text.is_empty()).collect()
}

/// Find-and-replace across subtitle texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindReplace {
    pub pattern: String,
    pub replacement: String,
    pub match_case: bool,
    pub whole_word: bool,
    pub use_regex: bool,
}

impl FindReplace {
    /// `None` when there is nothing to search for.
    pub fn compile(&self) -> Result<Option<Regex>> {
        if self.pattern.is_empty() {
            return Ok(None);
        }
        let pattern = if self.use_regex {
            self.pattern.clone()
        } else {
            regex::escape(&self.pattern)
        };
        let pattern = if self.whole_word {
            format!(r"\b(?:{})\b", pattern)
        } else {
            pattern
        };
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!self.match_case)
            .build()?;
        Ok(Some(regex))
    }

    pub fn matching<'a>(&self, subs: &'a [EditedSubtitle]) -> Result<Vec<&'a EditedSubtitle>> {
        match self.compile()? {
            Some(regex) => Ok(subs.iter().filter(|sub| is_match(&regex, sub)).collect()),
            None => Ok(subs.iter().collect()),
        }
    }

    pub fn apply(&self, subs: Vec<EditedSubtitle>) -> Result<Vec<EditedSubtitle>> {
        let regex = match self.compile()? {
            Some(regex) => regex,
            None => return Ok(subs),
        };
        let replaced = subs
            .into_iter()
            .map(|mut sub| {
                if is_match(&regex, &sub) {
                    let text = if self.use_regex {
                        regex.replace_all(&sub.item.text, self.replacement.as_str())
                    } else {
                        regex.replace_all(&sub.item.text, NoExpand(&self.replacement))
                    };
                    sub.item.text = text.into_owned();
                }
                sub
            })
            .collect();
        Ok(replaced)
    }
}

/// Strips every listed word from the subtitles that contain one, then
/// collapses the leftover whitespace.
pub fn remove_filler_words(
    subs: Vec<EditedSubtitle>,
    words: &[String],
) -> Result<Vec<EditedSubtitle>> {
    let escaped: Vec<String> = words
        .iter()
        .filter(|w| !w.is_empty())
        .map(|w| regex::escape(w))
        .collect();
    if escaped.is_empty() {
        return Ok(subs);
    }
    let fillers = Regex::new(&escaped.join("|"))?;
    let whitespace = Regex::new(r"\s+")?;

    let cleaned = subs
        .into_iter()
        .map(|mut sub| {
            if is_match(&fillers, &sub) {
                let stripped = fillers.replace_all(&sub.item.text, "").into_owned();
                sub.item.text = whitespace.replace_all(&stripped, " ").trim().to_string();
            }
            sub
        })
        .collect();
    Ok(cleaned)
}

fn is_match(regex: &Regex, sub: &EditedSubtitle) -> bool {
    let mtch = regex.is_match(&sub.item.text);
    if mtch {
        debug!("Matched \"{}\" against /{}/", sub.item.text, regex);
    }
    mtch
}
