#![doc = r#"
Running tick, wall-clock, and measure position for one event stream.

A [`Timer`] is fed every event of a track, in order, exactly once. It
accumulates absolute ticks, converts them to elapsed seconds through the
tempo in effect, and folds them into measure:beat.tick position through
the time signature in effect. Both "in effect" lookups go through a
[`TimingMap`] that the timer also feeds: a tempo or time-signature event
it observes is recorded at the tick where it was declared, taking effect
from that tick inclusive.

The map is shared: during a merge every per-track timer consults (and
feeds) the same map, so a tempo change on the conductor track re-times
the other tracks, which is how type 1 files are meant to be read.

Until the first time signature is seen, measure and beat hold at their
initial position while raw ticks accumulate; until the first tempo is
seen, elapsed seconds hold at zero.
"#]

use std::cell::RefCell;
use std::rc::Rc;

use crate::event::TrackEvent;
use crate::timing::TimingMap;

/// Tick/seconds/measure tracker for one track (or one merge session).
///
/// State is strictly cumulative: feed events through [`observe`] (or raw
/// deltas through [`advance`]) once each, in increasing time order.
/// There is no rollback.
///
/// [`observe`]: Self::observe
/// [`advance`]: Self::advance
#[derive(Debug, Clone)]
pub struct Timer {
    division: u16,
    map: Rc<RefCell<TimingMap>>,
    absolute_ticks: u64,
    absolute_seconds: f64,
    measures: f64,
    beats: f64,
    measure_ticks: f64,
}

impl Timer {
    /// A timer at position zero. `division` is the file's ticks per
    /// quarter note; `map` is the timing map to consult and feed,
    /// possibly shared with other timers.
    pub fn new(division: u16, map: Rc<RefCell<TimingMap>>) -> Self {
        Self {
            division,
            map,
            absolute_ticks: 0,
            absolute_seconds: 0.0,
            measures: 0.0,
            beats: 0.0,
            measure_ticks: 0.0,
        }
    }

    /// The ticks-per-quarter-note this timer converts with.
    pub fn division(&self) -> u16 {
        self.division
    }

    /// Ticks since the start of the track.
    pub fn absolute_ticks(&self) -> u64 {
        self.absolute_ticks
    }

    /// Seconds since the start of the track, per the observed tempo map.
    pub fn absolute_seconds(&self) -> f64 {
        self.absolute_seconds
    }

    /// Move forward by `delta_ticks`.
    ///
    /// Beat arithmetic follows bar/beat/tick convention: a beat is
    /// `division * 4 / numerator` ticks, beats wrap into measures at the
    /// signature's denominator, remainders stay as ticks into the beat.
    pub fn advance(&mut self, delta_ticks: u32) {
        self.measure_ticks += delta_ticks as f64;
        self.absolute_ticks += delta_ticks as u64;

        let map = self.map.borrow();

        if let Some(signature) = map.signature_at(self.absolute_ticks) {
            let ticks_per_beat = self.division as f64 * 4.0 / signature.numerator as f64;
            self.beats += (self.measure_ticks / ticks_per_beat).floor();
            self.measure_ticks %= ticks_per_beat;

            let denominator = signature.denominator() as f64;
            self.measures += (self.beats / denominator).floor();
            self.beats %= denominator;
        }

        if let Some(tempo) = map.tempo_at(self.absolute_ticks) {
            let us = tempo.micros_per_quarter();
            if us > 0 {
                let quarters = delta_ticks as f64 / self.division as f64;
                self.absolute_seconds += us as f64 / 1_000_000.0 * quarters;
            }
        }
    }

    /// Advance by the event's delta, then record any tempo or
    /// time-signature change it carries into the map at the new absolute
    /// tick.
    pub fn observe(&mut self, event: &TrackEvent) {
        self.advance(event.delta_ticks());

        if let Some(signature) = event.time_signature() {
            self.map
                .borrow_mut()
                .set_signature(self.absolute_ticks, signature);
        } else if let Some(tempo) = event.tempo() {
            self.map.borrow_mut().set_tempo(self.absolute_ticks, tempo);
        }
    }

    /// Position as `measure:beat.ticks`, 1-based measure and beat.
    pub fn measure(&self) -> String {
        format!(
            "{}:{}.{:03}",
            self.measures as u64 + 1,
            self.beats as u64 + 1,
            self.measure_ticks as u64
        )
    }

    /// Elapsed time as `H:MM:SS.ss`.
    pub fn elapsed(&self) -> String {
        let total = self.absolute_seconds;
        let hours = (total / 3600.0) as u64;
        let minutes = (total % 3600.0 / 60.0) as u64;
        let seconds = total % 60.0;
        format!("{hours}:{minutes:02}:{seconds:05.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::Tempo;

    fn timer_with(signature: Option<(u8, u16)>, tempo: Option<u32>) -> Timer {
        let map = TimingMap::shared();
        {
            let mut m = map.borrow_mut();
            if let Some((num, den)) = signature {
                let ts = crate::event::TrackEvent::set_time_signature(0, num, den, 24, 8)
                    .unwrap()
                    .time_signature()
                    .unwrap();
                m.set_signature(0, ts);
            }
            if let Some(us) = tempo {
                m.set_tempo(0, Tempo::new(us));
            }
        }
        Timer::new(480, map)
    }

    #[test]
    fn ticks_are_the_running_sum_of_deltas() {
        let mut timer = timer_with(None, None);
        let mut sum = 0u64;
        for delta in [0u32, 1, 480, 0, 37, 1920] {
            let before = timer.absolute_ticks();
            timer.advance(delta);
            sum += delta as u64;
            assert!(timer.absolute_ticks() >= before);
            assert_eq!(timer.absolute_ticks(), sum);
        }
    }

    #[test]
    fn tempo_converts_ticks_to_seconds() {
        // 120 bpm at 480 tpqn: one quarter note is half a second
        let mut timer = timer_with(None, Some(500_000));
        timer.advance(480);
        assert!((timer.absolute_seconds() - 0.5).abs() < 1e-9);
        timer.advance(960);
        assert!((timer.absolute_seconds() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn seconds_hold_before_first_tempo() {
        let mut timer = timer_with(Some((4, 4)), None);
        timer.advance(480);
        assert_eq!(timer.absolute_seconds(), 0.0);
    }

    #[test]
    fn four_beats_of_four_four_is_one_measure() {
        let mut timer = timer_with(Some((4, 4)), None);
        assert_eq!(timer.measure(), "1:1.000");
        timer.advance(1920);
        assert_eq!(timer.measure(), "2:1.000");
        timer.advance(480 + 7);
        assert_eq!(timer.measure(), "2:2.007");
    }

    #[test]
    fn measure_holds_before_first_signature() {
        let mut timer = timer_with(None, None);
        timer.advance(1920);
        assert_eq!(timer.absolute_ticks(), 1920);
        // raw ticks accumulate unnormalized until a signature appears
        assert_eq!(timer.measure(), "1:1.1920");
    }

    #[test]
    fn observe_records_changes_at_their_tick() {
        let map = TimingMap::shared();
        let mut timer = Timer::new(480, Rc::clone(&map));

        let tempo = TrackEvent::set_tempo(960, Tempo::new(250_000)).unwrap();
        timer.observe(&tempo);

        // declared at tick 960, in effect from there on
        assert_eq!(map.borrow().tempo_at(959), None);
        assert_eq!(map.borrow().tempo_at(960), Some(Tempo::new(250_000)));

        // no tempo covered ticks 0..=960, so no seconds accumulated
        assert_eq!(timer.absolute_seconds(), 0.0);

        // the next quarter note runs at the new tempo
        timer.advance(480);
        assert!((timer.absolute_seconds() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn elapsed_formats_hours_minutes_seconds() {
        let mut timer = timer_with(None, Some(1_000_000));
        // 3723.5 quarter notes at one second each
        for _ in 0..3723 {
            timer.advance(480);
        }
        timer.advance(240);
        assert_eq!(timer.elapsed(), "1:02:03.50");
    }
}
