#![doc = r#"
Sequential two-pass writing of a Standard MIDI File.

The protocol is `create`, then for each track `new_track`, any number of
`write_event`s, `close_track`, and finally `close`. A track's byte
length is unknowable until its last event is written, so `new_track`
emits a zero placeholder that `close_track` patches by seeking back;
`close` patches the header's track count the same way. Until `close`
returns, the file on disk is incomplete.
"#]

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::event::TrackEvent;
use crate::file::{HEADER_MAGIC, TRACK_MAGIC};
use crate::vlq::VarLen;

/// Byte offset of the header's track-count field.
const TRACK_COUNT_OFFSET: u64 = 10;

/// Writes one file through the `create → (new_track → write_event* →
/// close_track)* → close` protocol.
pub struct FileWriter {
    file: File,
    format: u16,
    track_count: u16,
    open_track_offset: Option<u64>,
}

impl FileWriter {
    /// Create `path` and write its header chunk. `format` must be 0, 1,
    /// or 2 and `division` at least 1.
    pub fn create(path: impl AsRef<Path>, format: u16, division: u16) -> Result<Self> {
        Self::create_with_extra(path, format, division, &[])
    }

    /// Like [`create`](Self::create), carrying opaque header bytes
    /// beyond the mandatory six — the counterpart of
    /// [`MidiFile::extra_bytes`](crate::file::MidiFile::extra_bytes) for
    /// lossless header round-trips.
    pub fn create_with_extra(
        path: impl AsRef<Path>,
        format: u16,
        division: u16,
        extra_bytes: &[u8],
    ) -> Result<Self> {
        if format > 2 {
            return Err(Error::InvalidFormat(format));
        }
        if division == 0 {
            return Err(Error::InvalidDivision);
        }

        let mut file = File::create(path)?;
        file.write_all(&HEADER_MAGIC)?;
        file.write_all(&(6 + extra_bytes.len() as u32).to_be_bytes())?;
        file.write_all(&format.to_be_bytes())?;
        // placeholder, patched with the true count on close
        file.write_all(&0u16.to_be_bytes())?;
        file.write_all(&division.to_be_bytes())?;
        file.write_all(extra_bytes)?;
        debug!(format, division, extra = extra_bytes.len(), "header written");

        Ok(Self {
            file,
            format,
            track_count: 0,
            open_track_offset: None,
        })
    }

    /// Begin a track chunk: magic plus a zero length placeholder.
    ///
    /// Fails with [`Error::TrackStillOpen`] if the previous track was
    /// not closed, and [`Error::SingleTrackFormat`] on a second track in
    /// a type 0 file.
    pub fn new_track(&mut self) -> Result<()> {
        if self.open_track_offset.is_some() {
            return Err(Error::TrackStillOpen);
        }
        if self.format == 0 && self.track_count >= 1 {
            return Err(Error::SingleTrackFormat);
        }

        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&TRACK_MAGIC)?;
        self.file.write_all(&0u32.to_be_bytes())?;
        self.open_track_offset = Some(offset);
        self.track_count += 1;
        debug!(track = self.track_count - 1, offset, "track opened");
        Ok(())
    }

    /// Append one event to the open track: its delta bytes followed by
    /// its event bytes, verbatim.
    pub fn write_event(&mut self, event: &TrackEvent) -> Result<()> {
        if self.open_track_offset.is_none() {
            return Err(Error::NoTrackOpen);
        }
        self.file.write_all(event.delta_bytes())?;
        self.file.write_all(event.bytes())?;
        Ok(())
    }

    /// Append one event, overriding its delta-time with `delta_ticks`.
    pub fn write_event_with_delta(&mut self, event: &TrackEvent, delta_ticks: u32) -> Result<()> {
        if self.open_track_offset.is_none() {
            return Err(Error::NoTrackOpen);
        }
        let delta = VarLen::from_u32(delta_ticks)?;
        self.file.write_all(delta.bytes())?;
        self.file.write_all(event.bytes())?;
        Ok(())
    }

    /// Patch the open track's length field with the bytes written since
    /// [`new_track`](Self::new_track).
    pub fn close_track(&mut self) -> Result<()> {
        let offset = self.open_track_offset.take().ok_or(Error::NoTrackOpen)?;
        let end = self.file.seek(SeekFrom::End(0))?;
        let byte_len = (end - offset - 8) as u32;
        self.file.seek(SeekFrom::Start(offset + 4))?;
        self.file.write_all(&byte_len.to_be_bytes())?;
        self.file.seek(SeekFrom::End(0))?;
        debug!(offset, byte_len, "track closed");
        Ok(())
    }

    /// Close any open track, patch the header's track count, and flush.
    pub fn close(mut self) -> Result<()> {
        if self.open_track_offset.is_some() {
            self.close_track()?;
        }
        self.file.seek(SeekFrom::Start(TRACK_COUNT_OFFSET))?;
        self.file.write_all(&self.track_count.to_be_bytes())?;
        self.file.sync_all()?;
        debug!(tracks = self.track_count, "file closed");
        Ok(())
    }
}
