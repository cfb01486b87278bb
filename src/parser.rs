use crate::error::{Result, SubtrackError};
use crate::srt::InterchangeCue;

use std::time::Duration;

use nom::bytes::complete::{tag, take_while1, take_while_m_n};
use nom::character::complete::{
    char, digit1, line_ending, multispace0, multispace1, one_of, space0, space1,
};
use nom::combinator::{all_consuming, map_res, opt};
use nom::error::{convert_error, ErrorKind, VerboseError};
use nom::multi::many_till;
use nom::sequence::terminated;
use nom::{branch::alt, error_position, Err, IResult};

/// Parser for interchange (SRT) documents.
#[derive(Default)]
pub struct Parser;
impl Parser {
    pub fn new() -> Self {
        Self {}
    }

    pub fn parse(&mut self, input: &str) -> Result<Vec<InterchangeCue>> {
        match srt_file(input) {
            Ok((_, cues)) => Ok(cues),
            Err(Err::Error(err)) | Err(Err::Failure(err)) => {
                let conv = convert_error(input, err);
                Err(SubtrackError::ParseError(format!(
                    "Failed to parse interchange document:\n{}",
                    conv
                )))
            }
            Err(Err::Incomplete(_)) => Err(SubtrackError::ParseError(
                "Incomplete data received by non-streaming parser.".to_string(),
            )),
        }
    }
}

/// The fields of a broadcast timecode, before range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawTimecode {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub frames: u64,
    /// Digits written in the frame field, 2 or 3.
    pub frame_digits: usize,
    pub separator: char,
}

pub(crate) fn parse_broadcast_timecode(input: &str) -> Result<RawTimecode> {
    match all_consuming(broadcast_timecode)(input) {
        Ok((_, raw)) => Ok(raw),
        Err(_) => Err(SubtrackError::malformed(
            input,
            "expected HH:MM:SS:FF or HH:MM:SS;FF",
        )),
    }
}

fn broadcast_timecode(input: &str) -> IResult<&str, RawTimecode, VerboseError<&str>> {
    let take_field = |min, max| {
        map_res(
            take_while_m_n(min, max, |c: char| c.is_ascii_digit()),
            |s: &str| s.parse::<u64>(),
        )
    };

    let (input, hours) = take_field(2, 2)(input)?;
    let (input, _) = char(':')(input)?;
    let (input, minutes) = take_field(2, 2)(input)?;
    let (input, _) = char(':')(input)?;
    let (input, seconds) = take_field(2, 2)(input)?;
    let (input, separator) = one_of(":;")(input)?;
    // Rates of 100 fps and above need a third frame digit.
    let (input, (frames, frame_digits)) = map_res(
        take_while_m_n(2, 3, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<u64>().map(|frames| (frames, s.len())),
    )(input)?;

    Ok((
        input,
        RawTimecode {
            hours,
            minutes,
            seconds,
            frames,
            frame_digits,
            separator,
        },
    ))
}

fn optional_bom(input: &str) -> IResult<&str, Option<&str>, VerboseError<&str>> {
    opt(tag("\u{FEFF}"))(input)
}

fn srt_file(input: &str) -> IResult<&str, Vec<InterchangeCue>, VerboseError<&str>> {
    let (input, _) = optional_bom(input)?;
    let (input, cues) = all_cues(input)?;
    let (input, _) = end_of_file(input)?;
    Ok((input, cues))
}

fn all_cues(input: &str) -> IResult<&str, Vec<InterchangeCue>, VerboseError<&str>> {
    let mut parsed = Vec::new();
    let (mut input, _) = multispace0(input)?;
    loop {
        match cue(input) {
            Ok((rem_input, cue)) => {
                parsed.push(cue);
                let (rem_input, _) = multispace0(rem_input)?;
                input = rem_input;
            }
            Err(err) => {
                if input.is_empty() {
                    return Ok((input, parsed));
                } else {
                    return Err(err);
                }
            }
        }
    }
}

fn cue(input: &str) -> IResult<&str, InterchangeCue, VerboseError<&str>> {
    let (input, _) = multispace0(input)?;
    let (input, sequence) = terminated(seq_num, multispace1)(input)?;
    let (input, (start, end)) = terminated(show_hide, alt((line_ending, end_of_file)))(input)?;
    let (input, lines) = cue_text(input)?;

    Ok((
        input,
        InterchangeCue {
            sequence,
            start,
            end,
            text: lines.join("\n"),
        },
    ))
}

fn end_of_file(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    if input.is_empty() {
        Ok((input, input))
    } else {
        std::result::Result::Err(Err::Error(error_position!(input, ErrorKind::Eof)))
    }
}

fn cue_text(input: &str) -> IResult<&str, Vec<&str>, VerboseError<&str>> {
    let line = terminated(
        take_while1(|c: char| c != '\n' && c != '\r'),
        alt((line_ending, end_of_file)),
    );

    let (input, (lines, _)) = many_till(line, alt((line_ending, end_of_file)))(input)?;

    Ok((input, lines))
}

fn show_hide(input: &str) -> IResult<&str, (Duration, Duration), VerboseError<&str>> {
    let (input, start) = timestamp(input)?;
    let (input, _) = space1(input)?;
    let (input, _) = tag("-->")(input)?;
    let (input, _) = space1(input)?;
    let (input, end) = timestamp(input)?;
    let (input, _) = space0(input)?;

    Ok((input, (start, end)))
}

fn timestamp(input: &str) -> IResult<&str, Duration, VerboseError<&str>> {
    const MILLIS_MIN: usize = 0;
    const MILLIS_MAX: usize = 3;
    let take_millis = || {
        map_res(
            take_while_m_n(MILLIS_MIN, MILLIS_MAX, |c: char| c.is_ascii_digit()),
            move |s: &str| {
                if s.len() < MILLIS_MAX {
                    // `,2` reads as `,200`: short millisecond fields are right-padded.
                    format!("{:0<3}", s).parse()
                } else {
                    s.parse()
                }
            },
        )
    };

    const HMS_MIN: usize = 0;
    const HMS_MAX: usize = 3;
    let take_hms = || {
        map_res(
            take_while_m_n(HMS_MIN, HMS_MAX, |c: char| c.is_ascii_digit()),
            |s: &str| {
                if s.len() < 2 {
                    // Left-padded: 1:13:45 is 01:13:45.
                    format!("{:0>2}", s).parse()
                } else {
                    s.parse()
                }
            },
        )
    };

    let (input, hours): (_, u64) = take_hms()(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, minutes) = take_hms()(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, seconds) = take_hms()(input)?;
    let (input, _) = alt((tag(","), tag(".")))(input)?;
    let (input, millis): (_, u64) = take_millis()(input)?;

    Ok((
        input,
        Duration::from_millis(
            millis + seconds * 1000 + minutes * 60 * 1000 + hours * 60 * 60 * 1000,
        ),
    ))
}

fn seq_num(input: &str) -> IResult<&str, usize, VerboseError<&str>> {
    map_res(digit1, |s: &str| s.parse())(input)
}
