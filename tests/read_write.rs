mod common;

use common::{eot, note_off, note_on, persist, smf, track};
use midimux::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn bad_header_magic() {
    let mut bytes = smf(0, 480, &[eot()]);
    bytes[0] = b'X';
    let file = persist(&bytes);
    let err = MidiFile::open(file.path()).unwrap_err();
    assert!(matches!(
        err,
        Error::BadMagic {
            expected: HEADER_MAGIC,
            offset: 0,
            ..
        }
    ));
}

#[test]
fn bad_track_magic() {
    let mut bytes = smf(0, 480, &[eot()]);
    bytes[8 + 6] = b'X';
    let file = persist(&bytes);
    let err = MidiFile::open(file.path()).unwrap_err();
    assert!(matches!(
        err,
        Error::BadMagic {
            expected: TRACK_MAGIC,
            offset: 14,
            ..
        }
    ));
}

#[test]
fn header_shorter_than_six_bytes_is_rejected() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&4u32.to_be_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 1]);
    let file = persist(&bytes);
    let err = MidiFile::open(file.path()).unwrap_err();
    assert!(matches!(err, Error::TruncatedHeader { length: 4 }));
}

#[test]
fn oversized_header_preserves_extra_bytes() {
    // a ten-byte header: the four bytes past the standard six are opaque
    let extra = [0xDE, 0xAD, 0xBE, 0xEF];
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&10u32.to_be_bytes());
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&1u16.to_be_bytes());
    bytes.extend_from_slice(&480u16.to_be_bytes());
    bytes.extend_from_slice(&extra);
    let header = bytes.clone();
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&4u32.to_be_bytes());
    bytes.extend_from_slice(&eot());

    let file = persist(&bytes);
    let midi = MidiFile::open(file.path()).unwrap();

    assert_eq!(midi.extra_bytes(), &extra);
    assert_eq!(midi.header_bytes(), header);
    assert_eq!(midi.tracks().len(), 1);
    assert_eq!(midi.tracks()[0].start_offset(), 8 + 10 + 8);
}

#[test]
fn timing_word_decodes_both_ways() {
    assert_eq!(Timing::from_division(480), Timing::TicksPerQuarterNote(480));
    // -25 fps in the high byte, 40 subframes in the low
    let word = ((-25i8 as u8 as u16) << 8) | 40;
    assert_eq!(
        Timing::from_division(word),
        Timing::Smpte {
            frames_per_second: 25,
            subframes: 40
        }
    );
}

#[test]
fn track_iteration_is_restartable() {
    let body = track(&[note_on(0, 0, 60, 100), note_off(100, 0, 60), eot()]);
    let file = persist(&smf(0, 480, &[body]));
    let midi = MidiFile::open(file.path()).unwrap();
    let t = &midi.tracks()[0];

    let first: Vec<_> = t.events().unwrap().map(|e| e.unwrap()).collect();
    let second: Vec<_> = t.events().unwrap().map(|e| e.unwrap()).collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn running_status_spans_the_track() {
    let body = vec![
        0x00, 0x90, 60, 100, // explicit note on
        0x10, 62, 100, // running: another note on
        0x10, 62, 0, // running: note off via zero velocity
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let file = persist(&smf(0, 480, &[body]));
    let midi = MidiFile::open(file.path()).unwrap();

    let events: Vec<_> = midi.tracks()[0]
        .events()
        .unwrap()
        .map(|e| e.unwrap())
        .collect();

    assert_eq!(events.len(), 4);
    assert_eq!(events[0].kind(), EventKind::ChannelNote);
    assert_eq!(events[1].kind(), EventKind::Running);
    // compressed form is preserved byte-exactly
    assert_eq!(events[1].bytes(), &[62, 100]);
    assert_eq!(events[2].bytes(), &[62, 0]);
}

#[test]
fn squash_materializes_running_notes() {
    let body = vec![
        0x00, 0x95, 60, 100, // note on, channel 5
        0x10, 62, 100, // running note on, still channel 5
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let file = persist(&smf(0, 480, &[body]));
    let midi = MidiFile::open(file.path()).unwrap();

    let filter = EventFilter::new().squash_channel(3).unwrap();
    let events: Vec<_> = midi.tracks()[0]
        .events_with(filter, None)
        .unwrap()
        .map(|e| e.unwrap())
        .collect();

    assert_eq!(events[0].bytes(), &[0x93, 60, 100]);
    // the running event gains an explicit status so the channel nibble
    // exists to rewrite
    assert_eq!(events[1].bytes(), &[0x93, 62, 100]);
}

#[test]
fn include_prefixes_keep_only_matches() {
    let body = track(&[
        note_on(0, 0, 60, 100),
        vec![0x00, 0xB0, 0x07, 100],
        note_off(10, 0, 60),
        eot(),
    ]);
    let file = persist(&smf(0, 480, &[body]));
    let midi = MidiFile::open(file.path()).unwrap();

    let filter = EventFilter::new().include([0x90u8]).include([0x80u8]);
    let events: Vec<_> = midi.tracks()[0]
        .events_with(filter, None)
        .unwrap()
        .map(|e| e.unwrap())
        .collect();

    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.kind() == EventKind::ChannelNote));
}

#[test]
fn malformed_event_aborts_the_track() {
    // 0xF5 is not a defined status; the track cannot be resynchronized
    let body = vec![0x00, 0xF5, 0x00, 0x00];
    let file = persist(&smf(0, 480, &[body]));
    let midi = MidiFile::open(file.path()).unwrap();

    let mut events = midi.tracks()[0].events().unwrap();
    assert!(matches!(
        events.next(),
        Some(Err(Error::UnknownEventType { status: 0xF5, .. }))
    ));
    // fused after the failure
    assert!(events.next().is_none());
}

#[test]
fn written_events_round_trip_byte_identically() {
    let body = vec![
        0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // tempo
        0x00, 0x90, 60, 100, // note on
        0x10, 62, 100, // running note on
        0x81, 0x00, 0x80, 60, 0, // two-byte delta note off
        0x00, 0xFF, 0x2F, 0x00,
    ];
    let original = smf(0, 480, &[body]);
    let file = persist(&original);
    let midi = MidiFile::open(file.path()).unwrap();

    let out = tempfile::NamedTempFile::new().unwrap();
    let mut writer = FileWriter::create(out.path(), 0, 480).unwrap();
    writer.new_track().unwrap();
    for event in midi.tracks()[0].events().unwrap() {
        writer.write_event(&event.unwrap()).unwrap();
    }
    writer.close().unwrap();

    let rewritten = std::fs::read(out.path()).unwrap();
    assert_eq!(rewritten, original);
}

#[test]
fn merge_to_type_zero_round_trips() {
    let a = track(&[
        vec![0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20],
        note_on(0, 0, 60, 100),
        note_off(100, 0, 60),
        eot(),
    ]);
    let b = track(&[note_on(50, 1, 62, 100), note_off(50, 1, 62), eot()]);
    let file = persist(&smf(1, 480, &[a, b]));
    let midi = MidiFile::open(file.path()).unwrap();

    let expected: Vec<_> = midi
        .merged_events(MergeOptions::new())
        .unwrap()
        .map(|e| e.unwrap())
        .collect();

    let out = tempfile::NamedTempFile::new().unwrap();
    let mut writer = FileWriter::create(out.path(), 0, midi.division()).unwrap();
    writer.new_track().unwrap();
    for event in midi.merged_events(MergeOptions::new()).unwrap() {
        writer.write_event(&event.unwrap()).unwrap();
    }
    writer.close().unwrap();

    let reread = MidiFile::open(out.path()).unwrap();
    assert_eq!(reread.format(), 0);
    assert_eq!(reread.track_count(), 1);
    assert_eq!(reread.division(), 480);

    let events: Vec<_> = reread.tracks()[0]
        .events()
        .unwrap()
        .map(|e| e.unwrap())
        .collect();
    assert_eq!(events.len(), expected.len());
    for (read_back, merged) in events.iter().zip(&expected) {
        assert_eq!(read_back.delta_ticks(), merged.delta_ticks());
        assert_eq!(read_back.bytes(), merged.bytes());
    }
}

#[test]
fn writer_enforces_its_protocol() {
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        FileWriter::create(dir.path().join("bad.mid"), 3, 480),
        Err(Error::InvalidFormat(3))
    ));
    assert!(matches!(
        FileWriter::create(dir.path().join("bad.mid"), 0, 0),
        Err(Error::InvalidDivision)
    ));

    let mut writer = FileWriter::create(dir.path().join("out.mid"), 0, 480).unwrap();
    assert!(matches!(
        writer.write_event(&TrackEvent::end_of_track()),
        Err(Error::NoTrackOpen)
    ));
    assert!(matches!(writer.close_track(), Err(Error::NoTrackOpen)));

    writer.new_track().unwrap();
    assert!(matches!(writer.new_track(), Err(Error::TrackStillOpen)));
    writer.write_event(&TrackEvent::end_of_track()).unwrap();
    writer.close_track().unwrap();

    // a second track would break the type 0 contract
    assert!(matches!(writer.new_track(), Err(Error::SingleTrackFormat)));
    writer.close().unwrap();
}

#[test]
fn header_extras_pass_through_the_writer() {
    let extra = [0x01, 0x02];
    let out = tempfile::NamedTempFile::new().unwrap();
    let mut writer = FileWriter::create_with_extra(out.path(), 0, 96, &extra).unwrap();
    writer.new_track().unwrap();
    writer.write_event(&TrackEvent::end_of_track()).unwrap();
    writer.close().unwrap();

    let reread = MidiFile::open(out.path()).unwrap();
    assert_eq!(reread.extra_bytes(), &extra);
    assert_eq!(reread.division(), 96);
    assert_eq!(reread.track_count(), 1);
}
