use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Error, Result};
use crate::event::{EventKind, TrackEvent};
use crate::timer::Timer;

/// One track chunk: a byte range of back-to-back events in the source
/// file.
///
/// A track owns no read cursor. Every call to [`events`](Self::events)
/// re-opens the source and starts from the first event, so iterations
/// are independent and restartable; the handle is released when the
/// iterator is dropped.
#[derive(Debug, Clone)]
pub struct Track {
    path: PathBuf,
    start: u64,
    byte_len: u64,
}

impl Track {
    pub(crate) fn new(path: PathBuf, start: u64, byte_len: u64) -> Self {
        Self {
            path,
            start,
            byte_len,
        }
    }

    /// File offset of the first event byte.
    pub fn start_offset(&self) -> u64 {
        self.start
    }

    /// File offset one past the last event byte.
    pub fn end_offset(&self) -> u64 {
        self.start + self.byte_len
    }

    /// Declared length of the event bytes.
    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Iterate the track's events from the start.
    pub fn events(&self) -> Result<TrackEvents> {
        self.events_with(EventFilter::default(), None)
    }

    /// Iterate with a filter and, optionally, a [`Timer`] the iterator
    /// drives once per decoded event — including events the filter then
    /// drops, so the timer always reflects the true position in the
    /// track.
    pub fn events_with(&self, filter: EventFilter, timer: Option<Timer>) -> Result<TrackEvents> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.start))?;
        Ok(TrackEvents {
            reader: BufReader::new(file),
            offset: self.start,
            end: self.end_offset(),
            running_status: None,
            filter,
            timer,
            fused: false,
        })
    }
}

/// Which events an iteration yields, and how channels are remapped.
///
/// Prefixes compare against the event bytes (status first), so
/// `[0xFF, 0x03]` matches every track-name meta event and `[0x91]` every
/// note on channel 1.
#[derive(Debug, Default, Clone)]
pub struct EventFilter {
    omit: Vec<Vec<u8>>,
    include: Vec<Vec<u8>>,
    squash_channel: Option<u8>,
}

impl EventFilter {
    /// Keep everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop events whose bytes start with `prefix`.
    pub fn omit(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.omit.push(prefix.into());
        self
    }

    /// Keep only events whose bytes start with one of the given
    /// prefixes. No `include` calls means no restriction.
    pub fn include(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.include.push(prefix.into());
        self
    }

    /// Remap channel events onto `channel` (1 through 15). Note events
    /// on another channel are rewritten in place; every other channel
    /// event on another channel is dropped instead — remapping a
    /// controller or program change would corrupt the target channel's
    /// state, so those never migrate.
    pub fn squash_channel(mut self, channel: u8) -> Result<Self> {
        if !(1..=15).contains(&channel) {
            return Err(Error::InvalidChannel(channel));
        }
        self.squash_channel = Some(channel);
        Ok(self)
    }
}

/// Lazy iterator over one track's events.
///
/// Yields events byte-exact and in file order, honoring running-status
/// compression across the whole track. Decoding stops at the track's
/// declared end offset; after a decode error the iterator is fused.
pub struct TrackEvents {
    reader: BufReader<File>,
    offset: u64,
    end: u64,
    running_status: Option<u8>,
    filter: EventFilter,
    timer: Option<Timer>,
    fused: bool,
}

impl TrackEvents {
    /// The attached timer, if iteration was started with one. Reflects
    /// the position of the most recently decoded event.
    pub fn timer(&self) -> Option<&Timer> {
        self.timer.as_ref()
    }

    /// Apply the squash policy. `Ok(true)` keeps the event (possibly
    /// rewritten), `Ok(false)` drops it.
    fn squash(&mut self, event: &mut TrackEvent, target: u8) -> Result<bool> {
        // a running event inherits category and channel from the status
        // it reuses
        let status = match event.kind() {
            EventKind::Running => match self.running_status {
                Some(s) => s,
                None => return Ok(true),
            },
            _ => event.bytes()[0],
        };
        let kind = match EventKind::from_status(status) {
            Some(k) if k.is_channel() => k,
            _ => return Ok(true),
        };
        if status & 0x0F == target {
            return Ok(true);
        }
        if kind == EventKind::ChannelNote {
            event.resolve_running(status);
            event.set_channel(target)?;
            Ok(true)
        } else {
            debug!(offset = event.offset(), "squash drops non-note event");
            Ok(false)
        }
    }
}

impl Iterator for TrackEvents {
    type Item = Result<TrackEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.fused || self.offset >= self.end {
                return None;
            }

            let mut event =
                match TrackEvent::read(&mut self.reader, self.offset, self.running_status) {
                    Ok(event) => event,
                    Err(e) => {
                        self.fused = true;
                        return Some(Err(e));
                    }
                };
            self.offset += event.encoded_len() as u64;

            // channel statuses arm running status, system statuses
            // (sysex, meta) cancel it, data bytes leave it alone
            let status = event.bytes()[0];
            if (0x80..0xF0).contains(&status) {
                self.running_status = Some(status);
            } else if status >= 0xF0 {
                self.running_status = None;
            }

            if let Some(timer) = &mut self.timer {
                timer.observe(&event);
            }

            if let Some(target) = self.filter.squash_channel {
                match self.squash(&mut event, target) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        self.fused = true;
                        return Some(Err(e));
                    }
                }
            }

            if self
                .filter
                .omit
                .iter()
                .any(|prefix| event.bytes().starts_with(prefix))
            {
                debug!(offset = event.offset(), "omitted by prefix");
                continue;
            }

            if !self.filter.include.is_empty()
                && !self
                    .filter
                    .include
                    .iter()
                    .any(|prefix| event.bytes().starts_with(prefix))
            {
                continue;
            }

            return Some(Ok(event));
        }
    }
}
