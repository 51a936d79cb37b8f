#![doc = r#"
Interleaving N independently-timed tracks into one ordered stream.

Each included track contributes a lazy event cursor with its own
[`Timer`]; all the timers share one [`TimingMap`] and the file's
division, so a tempo or time-signature change found on any track
re-times every other track from that tick on — which is how type 1
files store their conductor data.

The merge proceeds in rounds. A round drains every cursor sitting
exactly at the current tick: the first event emitted in the round
carries the gap from the previous round as its delta, every further
event at the same tick carries delta 0, and events whose raw bytes are
identical to one already emitted this round are suppressed. The next
round's tick is the minimum over the cursors' pending events. When no
cursor remains, one end-of-track event at delta 0 closes the stream.

The result is a stream in non-decreasing absolute-tick order with
deltas recomputed against the merged timeline — the same shape a single
recorded track would have.
"#]

use std::collections::VecDeque;
use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::event::{END_OF_TRACK, TrackEvent};
use crate::timer::Timer;
use crate::timing::TimingMap;

use super::{EventFilter, MidiFile, TrackEvents};

/// Abort a drain when a single track claims this many events at one
/// tick; real tracks never come close, malformed framing can.
const DRAIN_LIMIT: u32 = 100_000;

/// Configuration for [`MidiFile::merged_events`].
#[derive(Debug, Default, Clone)]
pub struct MergeOptions {
    include_tracks: Option<Vec<usize>>,
    omit_events: Vec<Vec<u8>>,
    squash_channel: Option<u8>,
}

impl MergeOptions {
    /// Merge every track with no filtering or remapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the merge to these track indices. Tracks outside the
    /// list are never decoded.
    pub fn tracks(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.include_tracks = Some(indices.into_iter().collect());
        self
    }

    /// Drop events whose bytes start with `prefix`, uniformly across
    /// all merged tracks. End-of-track events are always dropped; the
    /// engine emits its own terminal one.
    pub fn omit(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.omit_events.push(prefix.into());
        self
    }

    /// Remap channels onto `channel` (1 through 15) in every merged
    /// track, with the same note-rewrite / other-drop policy as
    /// [`EventFilter::squash_channel`].
    pub fn squash_channel(mut self, channel: u8) -> Result<Self> {
        if !(1..=15).contains(&channel) {
            return Err(Error::InvalidChannel(channel));
        }
        self.squash_channel = Some(channel);
        Ok(self)
    }
}

impl MidiFile {
    /// Merge the tracks selected by `options` into one lazily produced,
    /// absolute-tick-ordered event stream with recomputed deltas.
    pub fn merged_events(&self, options: MergeOptions) -> Result<MergedEvents> {
        MergedEvents::new(self, options)
    }
}

struct Cursor {
    events: TrackEvents,
    pending: Option<TrackEvent>,
}

impl Cursor {
    /// Absolute tick of the pending event: the cursor's timer has
    /// already observed it.
    fn tick(&self) -> u64 {
        self.events.timer().map_or(0, Timer::absolute_ticks)
    }
}

/// The merged event stream. See the module docs for ordering semantics.
pub struct MergedEvents {
    cursors: Vec<Cursor>,
    current_time: u64,
    pending_delta: u64,
    round: VecDeque<TrackEvent>,
    finished: bool,
    fused: bool,
}

impl MergedEvents {
    fn new(file: &MidiFile, options: MergeOptions) -> Result<Self> {
        let map = TimingMap::shared();

        let mut cursors = Vec::new();
        for (index, track) in file.tracks().iter().enumerate() {
            if let Some(included) = &options.include_tracks {
                if !included.contains(&index) {
                    debug!(index, "track not included in merge");
                    continue;
                }
            }

            let mut filter = EventFilter::new().omit(END_OF_TRACK);
            for prefix in &options.omit_events {
                filter = filter.omit(prefix.clone());
            }
            if let Some(channel) = options.squash_channel {
                filter = filter.squash_channel(channel)?;
            }

            let timer = Timer::new(file.division(), Rc::clone(&map));
            let mut events = track.events_with(filter, Some(timer))?;
            match events.next() {
                Some(Ok(event)) => cursors.push(Cursor {
                    events,
                    pending: Some(event),
                }),
                Some(Err(e)) => return Err(e),
                None => debug!(index, "track has no mergeable events"),
            }
        }

        Ok(Self {
            cursors,
            current_time: 0,
            pending_delta: 0,
            round: VecDeque::new(),
            finished: false,
            fused: false,
        })
    }

    /// Drain every cursor at `current_time` into the round buffer, then
    /// step `current_time` to the minimum pending tick.
    fn fill_round(&mut self) -> Result<()> {
        let mut emitted: Vec<Vec<u8>> = Vec::new();

        let mut index = 0;
        while index < self.cursors.len() {
            let mut drained = 0u32;
            let mut exhausted = false;

            while self.cursors[index].tick() == self.current_time {
                drained += 1;
                if drained > DRAIN_LIMIT {
                    return Err(Error::MergeInvariantViolation {
                        tick: self.current_time,
                        limit: DRAIN_LIMIT,
                    });
                }

                let cursor = &mut self.cursors[index];
                let event = cursor.pending.take();
                if let Some(mut event) = event {
                    if !emitted.iter().any(|bytes| bytes == event.bytes()) {
                        let delta = u32::try_from(self.pending_delta)
                            .map_err(|_| Error::VlqOutOfRange(self.pending_delta))?;
                        event.set_delta_ticks(delta)?;
                        emitted.push(event.bytes().to_vec());
                        self.round.push_back(event);
                    }
                }
                // the inter-round gap is spent on the first emission
                self.pending_delta = 0;

                match cursor.events.next() {
                    Some(Ok(next)) => cursor.pending = Some(next),
                    Some(Err(e)) => return Err(e),
                    None => {
                        exhausted = true;
                        break;
                    }
                }
            }

            if exhausted {
                self.cursors.remove(index);
            } else {
                index += 1;
            }
        }

        if let Some(next_time) = self.cursors.iter().map(Cursor::tick).min() {
            self.pending_delta = next_time - self.current_time;
            self.current_time = next_time;
        }
        Ok(())
    }
}

impl Iterator for MergedEvents {
    type Item = Result<TrackEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused {
            return None;
        }
        loop {
            if let Some(event) = self.round.pop_front() {
                return Some(Ok(event));
            }
            if self.cursors.is_empty() {
                if self.finished {
                    return None;
                }
                self.finished = true;
                return Some(Ok(TrackEvent::end_of_track()));
            }
            if let Err(e) = self.fill_round() {
                self.fused = true;
                return Some(Err(e));
            }
        }
    }
}
