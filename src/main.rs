use subtrack::config::Settings;
use subtrack::parser::Parser;
use subtrack::processor::{self, FindReplace, ProcessOpts};
use subtrack::srt::{ExportRequest, TrackSubtitles};
use subtrack::timecode::{
    broadcast_timecode_to_frames, frames_to_broadcast_timecode, frames_to_interchange_timestamp,
    FrameRate,
};
use subtrack::workflow::{jump_target, JumpTo};
use subtrack::{build_interchange_document, serialiser};

use std::io::{self, Read};

use anyhow::{anyhow, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[derive(ClapParser)]
#[command(about = "Convert timeline subtitles between broadcast timecodes and SRT")]
struct Cli {
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "Read settings from the given TOML file."
    )]
    config: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Build an SRT document from an export request (JSON)")]
    Export {
        #[arg(
            short,
            long,
            value_name = "FILE",
            help = "The request to read. If not supplied, it will be read from standard input.",
            default_value = "-"
        )]
        input: String,
        #[arg(
            short,
            long,
            value_name = "FILE",
            help = "The file to write to. If not supplied, the document will be written to standard output.",
            default_value = "-"
        )]
        output: String,
        #[arg(
            long,
            value_name = "FRAMES",
            conflicts_with = "start_timecode",
            help = "Frame that becomes 00:00:00,000 in the document."
        )]
        base_frame: Option<u64>,
        #[arg(
            long,
            value_name = "TIMECODE",
            help = "Timeline start timecode that becomes 00:00:00,000 in the document."
        )]
        start_timecode: Option<String>,
    },
    #[command(about = "Convert between frame counts and timecodes")]
    Timecode {
        #[arg(short, long, help = "Frames per second. Defaults to the configured rate.")]
        rate: Option<f64>,
        #[arg(long, value_name = "N", help = "Render a 0-based frame count.")]
        frames: Option<u64>,
        #[arg(long, value_name = "TIMECODE", help = "Parse a broadcast timecode into frames.")]
        parse: Option<String>,
        #[arg(
            long,
            value_enum,
            requires_all = ["in_point", "out_point"],
            help = "Print where a jump between --in and --out lands."
        )]
        jump: Option<JumpTo>,
        #[arg(long = "in", value_name = "TIMECODE")]
        in_point: Option<String>,
        #[arg(long = "out", value_name = "TIMECODE")]
        out_point: Option<String>,
    },
    #[command(about = "Read an SRT document into JSON cues")]
    Import {
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        output: String,
    },
    #[command(about = "Clean up extracted subtitles (JSON) into an export request")]
    Clean {
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        output: String,
        #[arg(long, help = "Keep filler words.")]
        keep_fillers: bool,
        #[arg(long, value_name = "PATTERN", help = "Text to search for.")]
        find: Option<String>,
        #[arg(long, value_name = "TEXT", default_value = "", requires = "find")]
        replace: String,
        #[arg(long, requires = "find")]
        match_case: bool,
        #[arg(long, requires = "find")]
        whole_word: bool,
        #[arg(long, requires = "find", help = "Treat the search text as a regular expression.")]
        regex: bool,
    },
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings: '{}'", path))?,
        None => Settings::default(),
    };
    init_logging(&settings);

    match cli.command {
        Command::Export {
            input,
            output,
            base_frame,
            start_timecode,
        } => {
            let data = read_input(&input)?;
            let request: ExportRequest = serde_json::from_str(&data)
                .with_context(|| format!("Failed to read export request: '{}'", input))?;
            let base_frame = match start_timecode {
                Some(tc) => broadcast_timecode_to_frames(&tc, request.frame_rate)
                    .context("Invalid start timecode")?,
                None => base_frame.unwrap_or(0),
            };
            let document =
                build_interchange_document(&request.subtitles, request.frame_rate, base_frame)
                    .context("Failed to build SRT document")?;
            write_output(&output, &document)
        }
        Command::Timecode {
            rate,
            frames,
            parse,
            jump,
            in_point,
            out_point,
        } => {
            let rate = rate
                .map(FrameRate::new)
                .unwrap_or(settings.timeline.default_frame_rate);
            if let Some(frame) = frames {
                println!("{}", frames_to_broadcast_timecode(frame, rate));
                println!("{}", frames_to_interchange_timestamp(frame, rate));
            }
            if let Some(tc) = parse {
                println!("{}", broadcast_timecode_to_frames(&tc, rate)?);
            }
            if let (Some(jump), Some(in_point), Some(out_point)) = (jump, in_point, out_point) {
                println!("{}", jump_target(&in_point, &out_point, jump, rate)?);
            }
            Ok(())
        }
        Command::Import { input, output } => {
            let data = read_input(&input)?;
            let cues = Parser::new()
                .parse(&data)
                .with_context(|| format!("Failed to parse SRT file: '{}'", input))?;
            if cues.is_empty() {
                return Err(anyhow!("You appear to have supplied an empty file."));
            }
            write_output(&output, &serde_json::to_string_pretty(&cues)?)
        }
        Command::Clean {
            input,
            output,
            keep_fillers,
            find,
            replace,
            match_case,
            whole_word,
            regex,
        } => {
            let data = read_input(&input)?;
            let track: TrackSubtitles = serde_json::from_str(&data)
                .with_context(|| format!("Failed to read subtitles: '{}'", input))?;
            let opts = ProcessOpts {
                filler_words: if keep_fillers {
                    Vec::new()
                } else {
                    settings.cleanup.filler_words.clone()
                },
                find_replace: find.map(|pattern| FindReplace {
                    pattern,
                    replacement: replace,
                    match_case,
                    whole_word,
                    use_regex: regex,
                }),
            };
            let subs = processor::process(track.data, &opts)?;
            tracing::info!(
                "Modified {} of {} subtitles",
                subs.iter().filter(|s| s.is_modified()).count(),
                subs.len()
            );
            let request = processor::to_export_request(&subs, track.frame_rate);
            write_output(&output, &serde_json::to_string_pretty(&request)?)
        }
    }
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to open input file: '{}'", path))
    }
}

fn write_output(path: &str, contents: &str) -> Result<()> {
    if path == "-" {
        let stdout = io::stdout();
        serialiser::write_document(&mut stdout.lock(), contents)?;
    } else {
        serialiser::serialise(contents, path)
            .with_context(|| format!("Failed to write output file: '{}'", path))?;
    }
    Ok(())
}
