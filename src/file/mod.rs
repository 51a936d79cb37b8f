#![doc = r#"
Chunk-level reading of a Standard MIDI File.

A file is a header chunk (`MThd`) followed by track chunks (`MTrk`).
[`MidiFile::open`] validates the magics and chunk framing, records where
each track's event bytes live, and stops there: event decoding happens
lazily, per track, when an iterator is pulled. Each track chunk's length
field is authoritative — content is not rescanned for an end-of-track
event, matching the leniency of most MIDI software.

Headers longer than the minimum six bytes are legal; the excess is
preserved verbatim so a file can be re-serialized losslessly.
"#]

mod track;
pub use track::*;

mod merge;
pub use merge::*;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result, read_exact};

/// The four bytes opening the header chunk.
pub const HEADER_MAGIC: [u8; 4] = *b"MThd";
/// The four bytes opening every track chunk.
pub const TRACK_MAGIC: [u8; 4] = *b"MTrk";

/// How the header's time-division word is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// Bit 15 clear: metrical time, delta ticks per quarter note.
    TicksPerQuarterNote(u16),
    /// Bit 15 set: SMPTE time code. The high byte holds the negated
    /// frames per second, the low byte the subframe resolution.
    Smpte {
        /// Frames per second (24, 25, 29, or 30 in well-formed files).
        frames_per_second: u8,
        /// Subdivisions of a frame.
        subframes: u8,
    },
}

impl Timing {
    /// Interpret a raw division word.
    pub const fn from_division(word: u16) -> Self {
        if word & 0x8000 == 0 {
            Timing::TicksPerQuarterNote(word)
        } else {
            Timing::Smpte {
                frames_per_second: ((word >> 8) as i8).wrapping_neg() as u8,
                subframes: (word & 0x00FF) as u8,
            }
        }
    }

    /// `Some` for metrical timing.
    pub const fn ticks_per_quarter_note(&self) -> Option<u16> {
        match self {
            Timing::TicksPerQuarterNote(t) => Some(*t),
            Timing::Smpte { .. } => None,
        }
    }
}

/// A parsed file: header fields plus the located tracks.
///
/// Immutable once constructed. Tracks hold byte ranges into the source
/// file, not decoded events; see [`Track::events`].
#[derive(Debug, Clone)]
pub struct MidiFile {
    path: PathBuf,
    format: u16,
    track_count: u16,
    division: u16,
    extra_bytes: Vec<u8>,
    tracks: Vec<Track>,
}

impl MidiFile {
    /// Read the header and locate every track chunk of the file at `path`.
    ///
    /// Fails with [`Error::BadMagic`] on a chunk magic mismatch,
    /// [`Error::TruncatedHeader`] if the header declares fewer than six
    /// bytes, and [`Error::TruncatedInput`] if the file ends inside a
    /// declared chunk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);

        let mut magic = [0u8; 4];
        read_exact(&mut reader, &mut magic, 0, "header magic")?;
        if magic != HEADER_MAGIC {
            return Err(Error::BadMagic {
                expected: HEADER_MAGIC,
                found: magic,
                offset: 0,
            });
        }

        let length = read_u32(&mut reader, 4, "header length")?;
        debug!(length, "header chunk");
        if length < 6 {
            return Err(Error::TruncatedHeader { length });
        }

        let mut header = vec![0u8; length as usize];
        read_exact(&mut reader, &mut header, 8, "file header")?;

        let format = u16::from_be_bytes([header[0], header[1]]);
        let track_count = u16::from_be_bytes([header[2], header[3]]);
        let division = u16::from_be_bytes([header[4], header[5]]);
        let extra_bytes = header[6..].to_vec();
        debug!(
            format,
            track_count,
            division,
            extra = extra_bytes.len(),
            "file header"
        );

        let mut tracks = Vec::with_capacity(track_count as usize);
        let mut offset = 8 + length as u64;
        for index in 0..track_count {
            let mut magic = [0u8; 4];
            read_exact(&mut reader, &mut magic, offset, "track chunk header")?;
            if magic != TRACK_MAGIC {
                return Err(Error::BadMagic {
                    expected: TRACK_MAGIC,
                    found: magic,
                    offset,
                });
            }
            let byte_len = read_u32(&mut reader, offset + 4, "track length")? as u64;
            let start = offset + 8;
            debug!(index, offset, byte_len, "track chunk");
            tracks.push(Track::new(path.clone(), start, byte_len));

            reader.seek(SeekFrom::Start(start + byte_len))?;
            offset = start + byte_len;
        }

        Ok(Self {
            path,
            format,
            track_count,
            division,
            extra_bytes,
            tracks,
        })
    }

    /// The source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The raw format type field; 0, 1, or 2 in well-formed files (not
    /// enforced on read).
    pub fn format(&self) -> u16 {
        self.format
    }

    /// The declared track count.
    pub fn track_count(&self) -> u16 {
        self.track_count
    }

    /// The raw time-division word.
    pub fn division(&self) -> u16 {
        self.division
    }

    /// The typed view of the division word.
    pub fn timing(&self) -> Timing {
        Timing::from_division(self.division)
    }

    /// Header bytes beyond the mandatory six, preserved verbatim.
    pub fn extra_bytes(&self) -> &[u8] {
        &self.extra_bytes
    }

    /// The located tracks, in file order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// The complete header chunk as it would be re-serialized, extra
    /// bytes included.
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(14 + self.extra_bytes.len());
        bytes.extend_from_slice(&HEADER_MAGIC);
        bytes.extend_from_slice(&(6 + self.extra_bytes.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.format.to_be_bytes());
        bytes.extend_from_slice(&self.track_count.to_be_bytes());
        bytes.extend_from_slice(&self.division.to_be_bytes());
        bytes.extend_from_slice(&self.extra_bytes);
        bytes
    }
}

fn read_u32(src: &mut impl Read, offset: u64, context: &'static str) -> Result<u32> {
    let mut buf = [0u8; 4];
    read_exact(src, &mut buf, offset, context)?;
    Ok(u32::from_be_bytes(buf))
}
