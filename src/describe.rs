//! Human-readable event descriptions for dumps and diagnostics.
//!
//! Presentation only: nothing in the codec, timer, or merge path depends
//! on these strings.

use std::fmt;

use crate::codes;
use crate::event::{EventKind, MetaKind, TrackEvent};

impl TrackEvent {
    /// One line describing the event, in the shape the dump tool prints.
    pub fn describe(&self) -> String {
        let bytes = self.bytes();
        let status = bytes[0];

        match self.kind() {
            EventKind::ChannelNote => {
                let on_off = if status & 0xF0 == 0x90 { "on" } else { "off" };
                format!(
                    "0x{:X} channel={} note {} {} velocity=0x{:X} ({})",
                    status & 0xF0,
                    status & 0x0F,
                    note_or_invalid(bytes[1]),
                    on_off,
                    bytes[2],
                    bytes[2]
                )
            }
            EventKind::ChannelPolyPressure => format!(
                "0x{:X} channel={} aftertouch {} pressure=0x{:X} ({})",
                status & 0xF0,
                status & 0x0F,
                note_or_invalid(bytes[1]),
                bytes[2],
                bytes[2]
            ),
            EventKind::ChannelController => {
                let name = codes::controller_name(bytes[1]).unwrap_or("*unassigned*");
                format!(
                    "0x{:X} channel={} controller 0x{:02X} ({}) {} value=0x{:X} ({})",
                    status & 0xF0,
                    status & 0x0F,
                    bytes[1],
                    bytes[1],
                    name,
                    bytes[2],
                    bytes[2]
                )
            }
            EventKind::ChannelProgram => {
                let name = codes::program_name(bytes[1]).unwrap_or("*unknown*");
                format!(
                    "0x{:X} channel={} program={} '{}'",
                    status & 0xF0,
                    status & 0x0F,
                    bytes[1] as u16 + 1,
                    name
                )
            }
            EventKind::ChannelPressure => format!(
                "0x{:X} channel={} pressure={}",
                status & 0xF0,
                status & 0x0F,
                bytes[1]
            ),
            EventKind::ChannelPitchBend => {
                // 14-bit value, LSB first
                let bend = ((bytes[2] as u16) << 7) | bytes[1] as u16;
                format!(
                    "0x{:X} channel={} pitch bend={}",
                    status & 0xF0,
                    status & 0x0F,
                    bend
                )
            }
            EventKind::Meta => self.describe_meta(),
            EventKind::Sysex => {
                let data = match self.variable_payload() {
                    Some(p) if !p.is_empty() => hex_dump(p),
                    _ => "*no data*".to_string(),
                };
                format!("0x{:X} sysex id=0x{:X} '{}'", status, bytes[1], data)
            }
            EventKind::Running => format!("running status data={}", hex_dump(bytes)),
        }
    }

    fn describe_meta(&self) -> String {
        let sub = self.bytes()[1];
        let kind = MetaKind::from(sub);
        let name = codes::meta_name(kind);

        let info = match kind {
            MetaKind::TimeSignature => self
                .time_signature()
                .map(|ts| format!(" {ts}"))
                .unwrap_or_default(),
            MetaKind::SetTempo => self
                .tempo()
                .map(|t| match t.bpm() {
                    Some(bpm) => format!(" {}us/q ({}bpm)", t.micros_per_quarter(), bpm),
                    None => format!(" {}us/q", t.micros_per_quarter()),
                })
                .unwrap_or_default(),
            _ => match self.meta_text() {
                Some(text) if !text.is_empty() => format!(" '{text}'"),
                _ => String::new(),
            },
        };

        format!("0xFF meta 0x{sub:X} ({sub}) {name}{info}")
    }
}

impl fmt::Display for TrackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

fn note_or_invalid(key: u8) -> String {
    codes::note_name(key).unwrap_or_else(|| "*invalid*".to_string())
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::Tempo;

    fn decode(bytes: &[u8]) -> TrackEvent {
        let mut src = bytes;
        TrackEvent::read(&mut src, 0, None).unwrap()
    }

    #[test]
    fn note_description_names_the_key() {
        let event = decode(&[0x00, 0x93, 0x3C, 0x64]);
        let text = event.describe();
        assert!(text.contains("channel=3"));
        assert!(text.contains("C4"));
        assert!(text.contains("on"));
    }

    #[test]
    fn tempo_description_includes_bpm() {
        let event = TrackEvent::set_tempo(0, Tempo::new(500_000)).unwrap();
        let text = event.describe();
        assert!(text.contains("Set Tempo"));
        assert!(text.contains("500000us/q"));
        assert!(text.contains("120bpm"));
    }

    #[test]
    fn signature_description_is_musical() {
        let event = TrackEvent::set_time_signature(0, 6, 8, 24, 8).unwrap();
        assert!(event.describe().contains("6/8"));
    }
}
