#![doc = r#"
Time signatures, tempo, and the sparse tick-indexed map both are kept in.

Tempo and time-signature changes appear as meta events somewhere in a
track and stay in effect until the next change. A [`TimingMap`] records
each change at the absolute tick where it was declared; lookups resolve
to the entry with the greatest key at or below the queried tick. Type 0
and type 1 files conventionally keep all of these changes on one track,
so one map is typically shared by every [`Timer`](crate::timer::Timer)
walking the file.
"#]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// The four raw bytes of a time-signature meta event.
///
/// The denominator is stored as its base-2 logarithm, so it is a power
/// of two by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    /// Beats per measure.
    pub numerator: u8,
    /// log2 of the beat unit: 2 means quarter notes, 3 eighths.
    pub denominator_log2: u8,
    /// MIDI clocks between metronome clicks.
    pub clocks_per_click: u8,
    /// Notated 32nd notes per MIDI quarter note.
    pub thirty_seconds_per_quarter: u8,
}

impl TimeSignature {
    /// Build from a meta-event payload. Uses the last four bytes, so a
    /// payload longer than the standard four is tolerated; shorter is not.
    pub fn from_payload(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        let data = &data[data.len() - 4..];
        Some(Self {
            numerator: data[0],
            denominator_log2: data[1],
            clocks_per_click: data[2],
            thirty_seconds_per_quarter: data[3],
        })
    }

    /// The musical denominator, `2^denominator_log2`. A malformed
    /// exponent above 15 saturates instead of overflowing.
    pub const fn denominator(&self) -> u16 {
        if self.denominator_log2 < 16 {
            1u16 << self.denominator_log2
        } else {
            1u16 << 15
        }
    }

    /// The four payload bytes as written in a meta event.
    pub const fn to_bytes(&self) -> [u8; 4] {
        [
            self.numerator,
            self.denominator_log2,
            self.clocks_per_click,
            self.thirty_seconds_per_quarter,
        ]
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator())
    }
}

/// A tempo in microseconds per quarter note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tempo(u32);

impl Tempo {
    /// 120 beats per minute, the conventional default.
    pub const DEFAULT: Self = Self(500_000);

    /// Wrap a raw microseconds-per-quarter-note value.
    pub const fn new(micros_per_quarter: u32) -> Self {
        Self(micros_per_quarter)
    }

    /// Convert from beats per minute. `None` for zero bpm.
    pub const fn from_bpm(bpm: u32) -> Option<Self> {
        if bpm == 0 {
            return None;
        }
        Some(Self(60_000_000 / bpm))
    }

    /// Microseconds per quarter note.
    pub const fn micros_per_quarter(&self) -> u32 {
        self.0
    }

    /// Beats per minute, truncated. `None` for a degenerate zero tempo.
    pub const fn bpm(&self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        Some(60_000_000 / self.0)
    }
}

/// Sparse last-value-wins mappings from absolute tick to the
/// time signature and tempo taking effect there.
#[derive(Debug, Default, Clone)]
pub struct TimingMap {
    signatures: BTreeMap<u64, TimeSignature>,
    tempos: BTreeMap<u64, Tempo>,
}

impl TimingMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty map ready to be shared across the timers of one file.
    /// Single-threaded by design; see the crate docs.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// The signature in effect at `tick`: the entry with the greatest
    /// key at or below it. `None` before the first entry.
    pub fn signature_at(&self, tick: u64) -> Option<TimeSignature> {
        self.signatures.range(..=tick).next_back().map(|(_, v)| *v)
    }

    /// The tempo in effect at `tick`. `None` before the first entry.
    pub fn tempo_at(&self, tick: u64) -> Option<Tempo> {
        self.tempos.range(..=tick).next_back().map(|(_, v)| *v)
    }

    /// Record a signature change taking effect at `tick`, inclusive.
    pub fn set_signature(&mut self, tick: u64, signature: TimeSignature) {
        self.signatures.insert(tick, signature);
    }

    /// Record a tempo change taking effect at `tick`, inclusive.
    pub fn set_tempo(&mut self, tick: u64, tempo: Tempo) {
        self.tempos.insert(tick, tempo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_four() -> TimeSignature {
        TimeSignature {
            numerator: 4,
            denominator_log2: 2,
            clocks_per_click: 24,
            thirty_seconds_per_quarter: 8,
        }
    }

    #[test]
    fn denominator_is_power_of_two() {
        let ts = TimeSignature::from_payload(&[6, 3, 24, 8]).unwrap();
        assert_eq!(ts.numerator, 6);
        assert_eq!(ts.denominator(), 8);
        assert_eq!(ts.to_string(), "6/8");
    }

    #[test]
    fn payload_shorter_than_four_rejected() {
        assert!(TimeSignature::from_payload(&[4, 2, 24]).is_none());
    }

    #[test]
    fn floor_lookup() {
        let mut map = TimingMap::new();
        map.set_tempo(100, Tempo::new(500_000));
        map.set_tempo(400, Tempo::new(250_000));

        assert_eq!(map.tempo_at(0), None);
        assert_eq!(map.tempo_at(99), None);
        assert_eq!(map.tempo_at(100), Some(Tempo::new(500_000)));
        assert_eq!(map.tempo_at(399), Some(Tempo::new(500_000)));
        assert_eq!(map.tempo_at(400), Some(Tempo::new(250_000)));
        assert_eq!(map.tempo_at(u64::MAX), Some(Tempo::new(250_000)));
    }

    #[test]
    fn signature_before_first_entry_is_unknown() {
        let mut map = TimingMap::new();
        map.set_signature(10, four_four());
        assert_eq!(map.signature_at(9), None);
        assert_eq!(map.signature_at(10), Some(four_four()));
    }

    #[test]
    fn bpm_conversions() {
        assert_eq!(Tempo::from_bpm(120), Some(Tempo::new(500_000)));
        assert_eq!(Tempo::new(500_000).bpm(), Some(120));
        assert_eq!(Tempo::from_bpm(0), None);
    }
}
