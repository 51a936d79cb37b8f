#![doc = r#"
Parse, re-time, merge, and rewrite Standard MIDI Files.

A Standard MIDI File is a chunked binary format carrying time-stamped
events across one or more parallel tracks. This crate models the format
byte-exactly and lazily:

- [`VarLen`](vlq::VarLen) — the 7-bit-per-byte variable-length integers
  delta-times and length prefixes are stored in.
- [`TrackEvent`](event::TrackEvent) — one timed event, kept as its exact
  source bytes with typed accessors over them. Payloads are immutable;
  delta-times and channel nibbles may be rewritten.
- [`Timer`](timer::Timer) — running tick, wall-clock, and measure
  position, driven by the tempo and time-signature changes it observes.
- [`MidiFile`](file::MidiFile) / [`Track`](file::Track) — chunk-level
  reading; each track is a byte range iterated lazily and restartably.
- [`MergedEvents`](file::MergedEvents) — N tracks interleaved into one
  absolute-tick-ordered stream with recomputed deltas.
- [`FileWriter`](writer::FileWriter) — two-pass sequential writing with
  seek-back patching of the header and track lengths.

# Example

Flatten every track of a file into one ordered stream:

```no_run
use midimux::prelude::*;

fn list(path: &str) -> midimux::Result<()> {
    let file = MidiFile::open(path)?;
    for event in file.merged_events(MergeOptions::new())? {
        let event = event?;
        println!("{:>6} {}", event.delta_ticks(), event);
    }
    Ok(())
}
```

# Scope

Single-threaded and synchronous by design: producers only work when the
consumer pulls, and the one shared structure — the
[`TimingMap`](timing::TimingMap) a merge's timers consult — is shared
within one thread. This is a file-format crate, not a sequencer: nothing
here renders audio or validates musical semantics such as note on/off
pairing.
"#]

pub mod codes;
mod describe;
pub mod error;
pub mod event;
pub mod file;
pub mod timer;
pub mod timing;
pub mod vlq;
pub mod writer;

pub use error::{Error, Result};

/// Everything most users need in scope.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::event::{END_OF_TRACK, EventKind, MetaKind, TrackEvent};
    pub use crate::file::{
        EventFilter, HEADER_MAGIC, MergeOptions, MergedEvents, MidiFile, TRACK_MAGIC, Timing,
        Track, TrackEvents,
    };
    pub use crate::timer::Timer;
    pub use crate::timing::{Tempo, TimeSignature, TimingMap};
    pub use crate::vlq::{MAX_VLQ, VarLen};
    pub use crate::writer::FileWriter;
}
