#![doc = r#"
The byte-exact model of one timed MIDI event.

A [`TrackEvent`] is the pair of a variable-length delta-time and the
event bytes exactly as they appear in the file: the status byte followed
by its category-specific payload. The payload is immutable once decoded.
Two things may legitimately be rewritten downstream: the delta-time
(the merge engine and the writer re-time events) and, for channel
events, the channel nibble of the status byte.

# Running status

Consecutive channel events sharing a status byte may omit it; a leading
byte below `0x80` is the first data byte of an event that reuses the
previous status. Such events keep their compressed form here — the
[`EventKind::Running`] category — so that writing them back is lossless.
The decoder needs the previous status to size the payload; iteration
over a track supplies it.
"#]

use std::io::Read;

use num_enum::FromPrimitive;

use crate::error::{Error, Result, read_exact};
use crate::timing::{Tempo, TimeSignature};
use crate::vlq::VarLen;

/// The canonical end-of-track meta event, without delta-time.
pub const END_OF_TRACK: [u8; 3] = [0xFF, 0x2F, 0x00];

/// Structural category of an event, decided by its leading byte alone.
///
/// Exactly one category applies to any event; the leading byte fixes the
/// payload layout for every category except [`Meta`](Self::Meta) and
/// [`Sysex`](Self::Sysex), which carry an explicit length prefix, and
/// [`Running`](Self::Running), whose layout comes from the reused status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Note on or off (status `0x9n` / `0x8n`), two data bytes.
    ChannelNote,
    /// Polyphonic key pressure (`0xAn`), two data bytes.
    ChannelPolyPressure,
    /// Controller change (`0xBn`), two data bytes.
    ChannelController,
    /// Program change (`0xCn`), one data byte.
    ChannelProgram,
    /// Channel key pressure (`0xDn`), one data byte.
    ChannelPressure,
    /// Pitch bend (`0xEn`), two data bytes.
    ChannelPitchBend,
    /// Meta event (`0xFF`): sub-type byte, then length-prefixed payload.
    Meta,
    /// System exclusive (`0xF0` / `0xF7`): id byte, then length-prefixed
    /// payload.
    Sysex,
    /// Leading byte below `0x80`: the event reuses the previous status.
    Running,
}

impl EventKind {
    /// Categorize a leading byte. `None` for the undefined system statuses
    /// `0xF1..=0xF6` and `0xF8..=0xFE`, whose event length is unknowable.
    pub const fn from_status(status: u8) -> Option<Self> {
        if status < 0x80 {
            return Some(Self::Running);
        }
        match status {
            0xF0 | 0xF7 => Some(Self::Sysex),
            0xFF => Some(Self::Meta),
            _ => match status & 0xF0 {
                0x80 | 0x90 => Some(Self::ChannelNote),
                0xA0 => Some(Self::ChannelPolyPressure),
                0xB0 => Some(Self::ChannelController),
                0xC0 => Some(Self::ChannelProgram),
                0xD0 => Some(Self::ChannelPressure),
                0xE0 => Some(Self::ChannelPitchBend),
                _ => None,
            },
        }
    }

    /// True for the six categories carrying a channel nibble.
    pub const fn is_channel(&self) -> bool {
        matches!(
            self,
            Self::ChannelNote
                | Self::ChannelPolyPressure
                | Self::ChannelController
                | Self::ChannelProgram
                | Self::ChannelPressure
                | Self::ChannelPitchBend
        )
    }

    /// Fixed data-byte count after the status byte; `None` where the
    /// length is explicit (meta, sysex) or borrowed (running).
    const fn fixed_payload_len(&self) -> Option<usize> {
        match self {
            Self::ChannelProgram | Self::ChannelPressure => Some(1),
            Self::ChannelNote
            | Self::ChannelPolyPressure
            | Self::ChannelController
            | Self::ChannelPitchBend => Some(2),
            Self::Meta | Self::Sysex | Self::Running => None,
        }
    }
}

/// The sub-type byte of a meta event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum MetaKind {
    /// Free text.
    Text = 0x01,
    /// Copyright notice.
    Copyright = 0x02,
    /// Sequence or track name.
    TrackName = 0x03,
    /// Instrument name.
    InstrumentName = 0x04,
    /// Lyric.
    Lyric = 0x05,
    /// Marker.
    Marker = 0x06,
    /// Cue point.
    CuePoint = 0x07,
    /// MIDI channel prefix.
    ChannelPrefix = 0x20,
    /// End of track.
    EndOfTrack = 0x2F,
    /// Tempo change, three big-endian payload bytes of µs per quarter.
    SetTempo = 0x51,
    /// SMPTE offset.
    SmpteOffset = 0x54,
    /// Time signature, four payload bytes.
    TimeSignature = 0x58,
    /// Key signature.
    KeySignature = 0x59,
    /// Sequencer-specific data.
    SequencerSpecific = 0x7F,
    /// Anything else; the byte is preserved.
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// One timed MIDI event, byte-exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEvent {
    offset: u64,
    delta: VarLen,
    kind: EventKind,
    bytes: Vec<u8>,
}

impl TrackEvent {
    /// Decode one event from `src`: a delta-time quantity followed by the
    /// event bytes. `offset` is the event's position in the underlying
    /// source (kept for diagnostics). `running_status` is the last channel
    /// status seen on this track, if any; it sizes the payload when the
    /// byte after the delta lacks the high bit.
    ///
    /// Fails with [`Error::UnknownEventType`] for a status byte matching
    /// no category, or for a running-status byte with no prior status to
    /// reuse, and with [`Error::TruncatedInput`] when the source ends
    /// inside the event.
    pub fn read<R: Read>(src: &mut R, offset: u64, running_status: Option<u8>) -> Result<Self> {
        let delta = VarLen::read(src, offset)?;
        let mut pos = offset + delta.byte_len() as u64;
        let status_offset = pos;

        let mut first = [0u8; 1];
        read_exact(src, &mut first, pos, "event status")?;
        pos += 1;
        let mut bytes = vec![first[0]];

        let kind = EventKind::from_status(first[0]).ok_or(Error::UnknownEventType {
            status: first[0],
            offset: status_offset,
        })?;

        match kind {
            EventKind::Meta | EventKind::Sysex => {
                // sub-type (meta) or id (sysex), then an explicit length
                let mut sub = [0u8; 1];
                read_exact(src, &mut sub, pos, "event sub-type")?;
                pos += 1;
                bytes.push(sub[0]);

                let length = VarLen::read(src, pos)?;
                pos += length.byte_len() as u64;
                bytes.extend_from_slice(length.bytes());

                let start = bytes.len();
                bytes.resize(start + length.value() as usize, 0);
                read_exact(src, &mut bytes[start..], pos, "event payload")?;
            }
            EventKind::Running => {
                let status = running_status.ok_or(Error::UnknownEventType {
                    status: first[0],
                    offset: status_offset,
                })?;
                // the byte already consumed is the first data byte
                let payload = EventKind::from_status(status)
                    .and_then(|k| k.fixed_payload_len())
                    .ok_or(Error::UnknownEventType {
                        status,
                        offset: status_offset,
                    })?;
                let start = bytes.len();
                bytes.resize(start + payload - 1, 0);
                read_exact(src, &mut bytes[start..], pos, "event payload")?;
            }
            _ => {
                let payload = match kind.fixed_payload_len() {
                    Some(n) => n,
                    None => unreachable!("channel kinds have fixed payloads"),
                };
                let start = bytes.len();
                bytes.resize(start + payload, 0);
                read_exact(src, &mut bytes[start..], pos, "event payload")?;
            }
        }

        Ok(Self {
            offset,
            delta,
            kind,
            bytes,
        })
    }

    fn from_parts(delta: VarLen, kind: EventKind, bytes: Vec<u8>) -> Self {
        Self {
            offset: 0,
            delta,
            kind,
            bytes,
        }
    }

    /// The terminal `FF 2F 00` event at delta 0.
    pub fn end_of_track() -> Self {
        Self::from_parts(VarLen::ZERO, EventKind::Meta, END_OF_TRACK.to_vec())
    }

    fn meta_with_text(delta_ticks: u32, sub: u8, text: &str) -> Result<Self> {
        let delta = VarLen::from_u32(delta_ticks)?;
        let length = VarLen::from_u32(text.len() as u32)?;
        let mut bytes = vec![0xFF, sub];
        bytes.extend_from_slice(length.bytes());
        bytes.extend_from_slice(text.as_bytes());
        Ok(Self::from_parts(delta, EventKind::Meta, bytes))
    }

    /// A sequence/track name meta event (`FF 03`).
    pub fn track_name(name: &str, delta_ticks: u32) -> Result<Self> {
        Self::meta_with_text(delta_ticks, 0x03, name)
    }

    /// A free-text meta event (`FF 01`).
    pub fn text(text: &str, delta_ticks: u32) -> Result<Self> {
        Self::meta_with_text(delta_ticks, 0x01, text)
    }

    /// A time-signature meta event (`FF 58 04`). The denominator is the
    /// musical one (4 for quarters) and must be a power of two.
    pub fn set_time_signature(
        delta_ticks: u32,
        numerator: u8,
        denominator: u16,
        clocks_per_click: u8,
        thirty_seconds_per_quarter: u8,
    ) -> Result<Self> {
        if !denominator.is_power_of_two() {
            return Err(Error::InvalidDenominator(denominator));
        }
        let signature = TimeSignature {
            numerator,
            denominator_log2: denominator.trailing_zeros() as u8,
            clocks_per_click,
            thirty_seconds_per_quarter,
        };
        let delta = VarLen::from_u32(delta_ticks)?;
        let mut bytes = vec![0xFF, 0x58, 0x04];
        bytes.extend_from_slice(&signature.to_bytes());
        Ok(Self::from_parts(delta, EventKind::Meta, bytes))
    }

    /// A tempo-change meta event (`FF 51 03`).
    pub fn set_tempo(delta_ticks: u32, tempo: Tempo) -> Result<Self> {
        let delta = VarLen::from_u32(delta_ticks)?;
        let us = tempo.micros_per_quarter();
        let bytes = vec![
            0xFF,
            0x51,
            0x03,
            (us >> 16) as u8,
            (us >> 8) as u8,
            us as u8,
        ];
        Ok(Self::from_parts(delta, EventKind::Meta, bytes))
    }

    /// Position of the event in its source file. Zero for constructed
    /// events.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The structural category; fixed by the leading byte at decode time.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Delta-time in ticks since the previous event of the same track.
    pub fn delta_ticks(&self) -> u32 {
        self.delta.value()
    }

    /// The exact delta-time encoding.
    pub fn delta_bytes(&self) -> &[u8] {
        self.delta.bytes()
    }

    /// The event bytes: status (where present) plus payload, exactly as
    /// read or constructed.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total encoded size: delta bytes plus event bytes.
    pub fn encoded_len(&self) -> usize {
        self.delta.byte_len() + self.bytes.len()
    }

    /// Replace the delta-time with a minimal encoding of `ticks`. The
    /// event bytes are untouched; this is how the merge engine and the
    /// writer re-time events.
    pub fn set_delta_ticks(&mut self, ticks: u32) -> Result<()> {
        self.delta = VarLen::from_u32(ticks)?;
        Ok(())
    }

    /// True for the six channel categories. Running events answer false:
    /// they carry no status byte of their own.
    pub fn is_channel_event(&self) -> bool {
        self.kind.is_channel()
    }

    /// The channel nibble, for channel events.
    pub fn channel(&self) -> Option<u8> {
        self.is_channel_event().then(|| self.bytes[0] & 0x0F)
    }

    /// Rewrite the channel nibble. Valid targets are 1 through 15.
    ///
    /// Fails with [`Error::NotAChannelEvent`] or [`Error::InvalidChannel`]
    /// before touching anything.
    pub fn set_channel(&mut self, channel: u8) -> Result<()> {
        if !self.is_channel_event() {
            return Err(Error::NotAChannelEvent);
        }
        if !(1..=15).contains(&channel) {
            return Err(Error::InvalidChannel(channel));
        }
        self.bytes[0] = (self.bytes[0] & 0xF0) | channel;
        Ok(())
    }

    /// Expand a running-status event into its explicit form by prefixing
    /// the effective status byte. No-op for events that already carry one.
    pub(crate) fn resolve_running(&mut self, status: u8) {
        if self.kind != EventKind::Running {
            return;
        }
        if let Some(kind) = EventKind::from_status(status) {
            self.bytes.insert(0, status);
            self.kind = kind;
        }
    }

    /// The meta sub-type, for meta events.
    pub fn meta_kind(&self) -> Option<MetaKind> {
        (self.kind == EventKind::Meta).then(|| MetaKind::from(self.bytes[1]))
    }

    /// True for the `FF 2F` end-of-track meta event.
    pub fn is_end_of_track(&self) -> bool {
        self.meta_kind() == Some(MetaKind::EndOfTrack)
    }

    /// The length-prefixed payload of a meta or sysex event.
    pub fn variable_payload(&self) -> Option<&[u8]> {
        if !matches!(self.kind, EventKind::Meta | EventKind::Sysex) {
            return None;
        }
        let mut src = &self.bytes[2..];
        let length = VarLen::read(&mut src, 0).ok()?;
        let start = 2 + length.byte_len();
        self.bytes.get(start..start + length.value() as usize)
    }

    /// The payload of a textual meta event, lossily decoded as UTF-8.
    pub fn meta_text(&self) -> Option<String> {
        self.meta_kind()?;
        self.variable_payload()
            .map(|p| String::from_utf8_lossy(p).into_owned())
    }

    /// The time signature carried by a `FF 58` meta event.
    pub fn time_signature(&self) -> Option<TimeSignature> {
        if self.meta_kind() != Some(MetaKind::TimeSignature) {
            return None;
        }
        TimeSignature::from_payload(self.variable_payload()?)
    }

    /// The tempo carried by a `FF 51` meta event: three big-endian bytes
    /// of microseconds per quarter note.
    pub fn tempo(&self) -> Option<Tempo> {
        if self.meta_kind() != Some(MetaKind::SetTempo) {
            return None;
        }
        let payload = self.variable_payload()?;
        let us = payload.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
        Some(Tempo::new(us))
    }
}

#[cfg(test)]
fn decode(bytes: &[u8], running: Option<u8>) -> Result<TrackEvent> {
    let mut src = bytes;
    TrackEvent::read(&mut src, 0, running)
}

#[test]
fn decode_note_on() {
    let event = decode(&[0x10, 0x93, 0x3C, 0x64], None).unwrap();
    assert_eq!(event.delta_ticks(), 0x10);
    assert_eq!(event.kind(), EventKind::ChannelNote);
    assert_eq!(event.channel(), Some(3));
    assert_eq!(event.bytes(), &[0x93, 0x3C, 0x64]);
}

#[test]
fn decode_running_status() {
    let event = decode(&[0x00, 0x3C, 0x00], Some(0x93)).unwrap();
    assert_eq!(event.kind(), EventKind::Running);
    assert_eq!(event.bytes(), &[0x3C, 0x00]);
    assert_eq!(event.channel(), None);
}

#[test]
fn running_status_without_prior_fails() {
    let err = decode(&[0x00, 0x3C, 0x00], None).unwrap_err();
    assert!(matches!(err, Error::UnknownEventType { status: 0x3C, .. }));
}

#[test]
fn undefined_system_status_fails() {
    let err = decode(&[0x00, 0xF5], None).unwrap_err();
    assert!(matches!(err, Error::UnknownEventType { status: 0xF5, .. }));
}

#[test]
fn decode_meta_with_length() {
    let event = decode(&[0x00, 0xFF, 0x03, 0x04, b'l', b'e', b'a', b'd'], None).unwrap();
    assert_eq!(event.kind(), EventKind::Meta);
    assert_eq!(event.meta_kind(), Some(MetaKind::TrackName));
    assert_eq!(event.meta_text().as_deref(), Some("lead"));
}

#[test]
fn meta_payload_truncated_fails() {
    let err = decode(&[0x00, 0xFF, 0x03, 0x08, b'x'], None).unwrap_err();
    assert!(matches!(err, Error::TruncatedInput { .. }));
}

#[test]
fn tempo_and_signature_extraction() {
    let tempo = TrackEvent::set_tempo(0, Tempo::new(500_000)).unwrap();
    assert_eq!(tempo.bytes(), &[0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
    assert_eq!(tempo.tempo(), Some(Tempo::new(500_000)));
    assert_eq!(tempo.time_signature(), None);

    let sig = TrackEvent::set_time_signature(0, 3, 4, 24, 8).unwrap();
    assert_eq!(sig.bytes(), &[0xFF, 0x58, 0x04, 3, 2, 24, 8]);
    let parsed = sig.time_signature().unwrap();
    assert_eq!(parsed.numerator, 3);
    assert_eq!(parsed.denominator(), 4);
    assert_eq!(sig.tempo(), None);
}

#[test]
fn non_power_of_two_denominator_rejected() {
    let err = TrackEvent::set_time_signature(0, 4, 6, 24, 8).unwrap_err();
    assert!(matches!(err, Error::InvalidDenominator(6)));
}

#[test]
fn set_channel_rules() {
    let mut note = decode(&[0x00, 0x95, 0x3C, 0x40], None).unwrap();
    note.set_channel(3).unwrap();
    assert_eq!(note.bytes(), &[0x93, 0x3C, 0x40]);

    assert!(matches!(
        note.set_channel(0),
        Err(Error::InvalidChannel(0))
    ));
    assert!(matches!(
        note.set_channel(16),
        Err(Error::InvalidChannel(16))
    ));
    // rejected before mutation
    assert_eq!(note.channel(), Some(3));

    let mut meta = TrackEvent::end_of_track();
    assert!(matches!(meta.set_channel(3), Err(Error::NotAChannelEvent)));
}

#[test]
fn rewrite_delta_keeps_payload() {
    let mut event = decode(&[0x81, 0x00, 0x93, 0x3C, 0x64], None).unwrap();
    assert_eq!(event.delta_ticks(), 128);
    event.set_delta_ticks(0).unwrap();
    assert_eq!(event.delta_bytes(), &[0x00]);
    assert_eq!(event.bytes(), &[0x93, 0x3C, 0x64]);
}

#[test]
fn end_of_track_detection() {
    let eot = TrackEvent::end_of_track();
    assert!(eot.is_end_of_track());
    assert_eq!(eot.delta_ticks(), 0);
    assert_eq!(eot.bytes(), &END_OF_TRACK);

    let unknown_meta = decode(&[0x00, 0xFF, 0x42, 0x00], None).unwrap();
    assert_eq!(unknown_meta.meta_kind(), Some(MetaKind::Unknown(0x42)));
    assert!(!unknown_meta.is_end_of_track());
}
