use std::io::{self, Read};

use thiserror::Error;

#[doc = r#"
Every failure the crate can produce while reading, transforming, or
writing Standard MIDI File data.

Decode errors are local to the event, track, or file being processed and
are never retried: MIDI's variable-length event framing makes byte-level
resynchronization unsafe, so a malformed event aborts iteration of its
track. Variants carry the byte offset at which the failure was observed
where one is meaningful.
"#]
#[derive(Debug, Error)]
pub enum Error {
    /// A chunk did not start with the expected four-byte magic.
    #[error("expected chunk magic {expected:?} at offset 0x{offset:X}, found {found:?}")]
    BadMagic {
        /// The magic the chunk should have carried.
        expected: [u8; 4],
        /// The four bytes actually present.
        found: [u8; 4],
        /// File offset of the chunk.
        offset: u64,
    },

    /// The source ended in the middle of a field.
    #[error("input truncated at offset 0x{offset:X} while reading {context}")]
    TruncatedInput {
        /// Offset of the field being read when the source ran out.
        offset: u64,
        /// What was being read.
        context: &'static str,
    },

    /// The header chunk declared fewer than the six mandatory bytes.
    #[error("header declares {length} bytes, the format requires at least 6")]
    TruncatedHeader {
        /// The declared header length.
        length: u32,
    },

    /// A status byte that matches no defined event category. The event's
    /// length cannot be determined, so the track cannot be read further.
    #[error("unknown event type 0x{status:02X} at offset 0x{offset:X}")]
    UnknownEventType {
        /// The offending status byte.
        status: u8,
        /// File offset of the status byte.
        offset: u64,
    },

    /// Channel mutation attempted on an event without a channel nibble.
    #[error("event is not a channel event")]
    NotAChannelEvent,

    /// Channel numbers for remapping are restricted to 1 through 15.
    #[error("channel must be 1..=15, got {0}")]
    InvalidChannel(u8),

    /// The merge engine drained an implausible number of events from a
    /// single track at one tick, which indicates malformed input.
    #[error("merge drained more than {limit} events at tick {tick} from one track")]
    MergeInvariantViolation {
        /// The tick at which the drain ran away.
        tick: u64,
        /// The per-track, per-tick drain bound that was exceeded.
        limit: u32,
    },

    /// The value does not fit in the four 7-bit groups the format allows.
    #[error("value 0x{0:X} does not fit in four variable-length groups")]
    VlqOutOfRange(u64),

    /// A variable-length quantity ran past four bytes without terminating.
    #[error("variable-length quantity at offset 0x{offset:X} exceeds four bytes")]
    VlqTooLong {
        /// File offset of the quantity's first byte.
        offset: u64,
    },

    /// Format type outside 0, 1, 2 handed to the writer.
    #[error("format type {0} is not 0, 1, or 2")]
    InvalidFormat(u16),

    /// Zero time division handed to the writer.
    #[error("time division must be at least 1")]
    InvalidDivision,

    /// Type 0 files carry exactly one track.
    #[error("type 0 files carry exactly one track")]
    SingleTrackFormat,

    /// `new_track` called while a track is still open.
    #[error("close the current track before opening a new one")]
    TrackStillOpen,

    /// A track operation attempted with no track open.
    #[error("no track is open")]
    NoTrackOpen,

    /// Time-signature denominators must be powers of two.
    #[error("time signature denominator {0} is not a power of two")]
    InvalidDenominator(u16),

    /// An underlying I/O failure that is not a premature end of input.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The crate-wide result type (see [`Error`]).
pub type Result<T> = std::result::Result<T, Error>;

/// `read_exact` that reports a premature end of input as
/// [`Error::TruncatedInput`] at the given offset instead of a bare I/O error.
pub(crate) fn read_exact(
    src: &mut impl Read,
    buf: &mut [u8],
    offset: u64,
    context: &'static str,
) -> Result<()> {
    src.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::TruncatedInput { offset, context },
        _ => Error::Io(e),
    })
}
