//! Convert a type 1 MIDI file into a type 0 file: merge every track
//! into one, optionally replacing track-name/text metadata and
//! squashing note channels.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midimux::prelude::*;

#[derive(Parser)]
#[command(
    name = "miditype0",
    about = "Convert a type 1 MIDI file to type 0 with custom settings"
)]
struct Args {
    /// Name of the input MIDI file
    file_in: PathBuf,

    /// Name of the output MIDI file
    file_out: PathBuf,

    /// Name for the merged track, replacing existing names
    #[arg(long)]
    name: Option<String>,

    /// Text for the merged track, replacing existing text (repeatable)
    #[arg(long)]
    text: Vec<String>,

    /// Channel number (1-15) to squash all notes into
    #[arg(long)]
    squash: Option<u8>,

    /// Additional output for debugging
    #[arg(long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

fn run(args: &Args) -> midimux::Result<()> {
    let file = MidiFile::open(&args.file_in)?;
    match file.format() {
        0 => {
            eprintln!("{} is already a type 0 file", args.file_in.display());
            std::process::exit(1);
        }
        1 => {}
        other => {
            eprintln!("type {other} files are not supported");
            std::process::exit(1);
        }
    }

    let mut writer =
        FileWriter::create_with_extra(&args.file_out, 0, file.division(), file.extra_bytes())?;
    writer.new_track()?;

    let mut options = MergeOptions::new();

    // replacement metadata goes first; the originals are then omitted
    // from the merge so the replacements win
    if let Some(name) = &args.name {
        writer.write_event(&TrackEvent::track_name(name, 0)?)?;
        options = options.omit([0xFF, 0x03]);
    }
    if !args.text.is_empty() {
        for text in &args.text {
            writer.write_event(&TrackEvent::text(text, 0)?)?;
        }
        options = options.omit([0xFF, 0x01]);
    }
    if let Some(channel) = args.squash {
        options = options.squash_channel(channel)?;
    }

    for event in file.merged_events(options)? {
        writer.write_event(&event?)?;
    }
    writer.close()?;

    Ok(())
}
