//! Dump the header and every track of a MIDI file as a table, one row
//! per event, with running tick / elapsed-time / measure columns.

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midimux::prelude::*;

#[derive(Parser)]
#[command(name = "mididump", about = "Dump MIDI data to stdout")]
struct Args {
    /// Name of the MIDI file to dump
    filename: PathBuf,

    /// Print only non-note data
    #[arg(long)]
    skip_notes: bool,

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
    let file = MidiFile::open(&args.filename)?;
    print_header(&file);

    // one map across every track, so conductor-track changes re-time
    // the rest of a type 1 file
    let map = TimingMap::shared();
    for (index, track) in file.tracks().iter().enumerate() {
        print_track_banner(index);

        let timer = Timer::new(file.division(), Rc::clone(&map));
        let mut events = track.events_with(EventFilter::new(), Some(timer))?;
        while let Some(event) = events.next() {
            let event = event?;
            if args.skip_notes && event.kind() == EventKind::ChannelNote {
                continue;
            }
            let (ticks, elapsed, measure) = events
                .timer()
                .map(|t| (t.absolute_ticks(), t.elapsed(), t.measure()))
                .unwrap_or_default();
            print_event(&event, ticks, &elapsed, &measure);
        }
    }

    Ok(())
}

fn print_header(file: &MidiFile) {
    println!("|{:=^31}|", "HEADER");
    println!("| type | tracks | time division |");
    println!(
        "| {:^4} | {:^6} | {:^13} |",
        file.format(),
        file.track_count(),
        file.division()
    );
}

fn print_track_banner(index: usize) {
    println!("\n|{:=^144}|", format!("TRACK {index}"));
    println!(
        "| {:^14} | {:^47} | {:^75} |",
        "offset", "time", "event"
    );
    println!(
        "| {:^6} {:^7} | {:6} | {:^8} | {:^12} | {:^12} | {:^75} |",
        "hex", "(dec)", "delta", "ticks", "et", "measure", "description"
    );
    println!("{}", "-".repeat(146));
}

fn print_event(event: &TrackEvent, ticks: u64, elapsed: &str, measure: &str) {
    let mut desc = event.describe();
    if desc.len() > 75 {
        desc.truncate(72);
        desc.push_str("...");
    }
    println!(
        "| 0x{:04X} ({:05}) | {:6} | {:8} | {:>12} | {:>12} | {:75} |",
        event.offset(),
        event.offset(),
        event.delta_ticks(),
        ticks,
        elapsed,
        measure,
        desc
    );
}
