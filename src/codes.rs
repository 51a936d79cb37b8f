//! Static name tables for presentation: General MIDI program names,
//! controller names, meta-event names, and note spelling. Lookup data
//! consumed by [`describe`](crate::event::TrackEvent::describe); nothing
//! here affects parsing.

use crate::event::MetaKind;

/// The 128 General MIDI program names, indexed by program number.
pub const PROGRAMS: [&str; 128] = [
    "Acoustic Grand Piano",
    "Bright Acoustic Piano",
    "Electric Grand Piano",
    "Honky-Tonk Piano",
    "Electric Piano 1",
    "Electric Piano 2",
    "Harpsichord",
    "Clavi",
    "Celesta",
    "Glockenspiel",
    "Music Box",
    "Vibraphone",
    "Marimba",
    "Xylophone",
    "Tubular Bells",
    "Dulcimer",
    "Drawbar Organ",
    "Percussive Organ",
    "Rock Organ",
    "Church Organ",
    "Reed Organ",
    "Accordion",
    "Harmonica",
    "Tango Accordion",
    "Nylon-String Guitar",
    "Steel-String Guitar",
    "Jazz Guitar",
    "Clean Guitar",
    "Muted Guitar",
    "Overdriven Guitar",
    "Distortion Guitar",
    "Guitar Harmonics",
    "Acoustic Bass",
    "Fingered Bass",
    "Picked Bass",
    "Fretless Bass",
    "Slap Bass 1",
    "Slap Bass 2",
    "Synth Bass 1",
    "Synth Bass 2",
    "Violin",
    "Viola",
    "Cello",
    "Contrabass",
    "Tremolo Strings",
    "Pizzicato Strings",
    "Orchestral Harp",
    "Timpani",
    "String Ensemble 1",
    "String Ensemble 2",
    "Synth Strings 1",
    "Synth Strings 2",
    "Choir Aahs",
    "Voice Oohs",
    "Synth Voice",
    "Orchestra Hit",
    "Trumpet",
    "Trombone",
    "Tuba",
    "Muted Trumpet",
    "French Horn",
    "Brass Section",
    "Synth Brass 1",
    "Synth Brass 2",
    "Soprano Sax",
    "Alto Sax",
    "Tenor Sax",
    "Baritone Sax",
    "Oboe",
    "English Horn",
    "Bassoon",
    "Clarinet",
    "Piccolo",
    "Flute",
    "Recorder",
    "Pan Flute",
    "Blown Bottle",
    "Shakuhachi",
    "Whistle",
    "Ocarina",
    "Square Lead",
    "Sawtooth Lead",
    "Calliope Lead",
    "Chiff Lead",
    "Charang Lead",
    "Voice Lead",
    "Fifths Lead",
    "Bass & Lead",
    "New Age Pad",
    "Warm Pad",
    "Polysynth Pad",
    "Choir Pad",
    "Bowed Pad",
    "Metallic Pad",
    "Halo Pad",
    "Sweep Pad",
    "Rain",
    "Soundtrack",
    "Crystal",
    "Atmosphere",
    "Brightness",
    "Goblins",
    "Echoes",
    "Sci-Fi",
    "Sitar",
    "Banjo",
    "Shamisen",
    "Koto",
    "Kalimba",
    "Bag Pipe",
    "Fiddle",
    "Shanai",
    "Tinkle Bell",
    "Agogo",
    "Steel Drums",
    "Woodblock",
    "Taiko Drum",
    "Melodic Tom",
    "Synth Drum",
    "Reverse Cymbal",
    "Guitar Fret Noise",
    "Breath Noise",
    "Seashore",
    "Bird Tweet",
    "Telephone Ring",
    "Helicopter",
    "Applause",
    "Gunshot",
];

/// The General MIDI name of a program number, if in range.
pub fn program_name(program: u8) -> Option<&'static str> {
    PROGRAMS.get(program as usize).copied()
}

/// The defined controller names; `None` for unassigned numbers.
pub fn controller_name(controller: u8) -> Option<&'static str> {
    let name = match controller {
        0x00 => "Bank Select",
        0x01 => "Modulation Wheel",
        0x02 => "Breath Controller",
        0x04 => "Foot Controller",
        0x05 => "Portamento Time",
        0x06 => "Data Entry",
        0x07 => "Channel Volume",
        0x08 => "Balance",
        0x0A => "Pan",
        0x0B => "Expression Controller",
        0x0C => "Effect Control 1",
        0x0D => "Effect Control 2",
        0x10 => "General Purpose Controller 1",
        0x11 => "General Purpose Controller 2",
        0x12 => "General Purpose Controller 3",
        0x13 => "General Purpose Controller 4",
        0x20 => "Bank Select LSB",
        0x21 => "Modulation Wheel LSB",
        0x22 => "Breath Controller LSB",
        0x24 => "Foot Controller LSB",
        0x25 => "Portamento Time LSB",
        0x26 => "Data Entry LSB",
        0x27 => "Channel Volume LSB",
        0x28 => "Balance LSB",
        0x2A => "Pan LSB",
        0x2B => "Expression Controller LSB",
        0x2C => "Effect Control 1 LSB",
        0x2D => "Effect Control 2 LSB",
        0x40 => "Damper Pedal",
        0x41 => "Portamento",
        0x42 => "Sostenuto",
        0x43 => "Soft Pedal",
        0x44 => "Legato Footswitch",
        0x45 => "Hold 2",
        0x46 => "Sound Controller 1 (Variation)",
        0x47 => "Sound Controller 2 (Timbre)",
        0x48 => "Sound Controller 3 (Release Time)",
        0x49 => "Sound Controller 4 (Attack Time)",
        0x4A => "Sound Controller 5 (Brightness)",
        0x4B => "Sound Controller 6",
        0x4C => "Sound Controller 7",
        0x4D => "Sound Controller 8",
        0x4E => "Sound Controller 9",
        0x4F => "Sound Controller 10",
        0x50 => "General Purpose Controller 5",
        0x51 => "General Purpose Controller 6",
        0x52 => "General Purpose Controller 7",
        0x53 => "General Purpose Controller 8",
        0x54 => "Portamento Control",
        0x5B => "Effects 1 Depth",
        0x5C => "Effects 2 Depth",
        0x5D => "Effects 3 Depth",
        0x5E => "Effects 4 Depth",
        0x5F => "Effects 5 Depth",
        0x60 => "Data Increment",
        0x61 => "Data Decrement",
        0x62 => "NRPN LSB",
        0x63 => "NRPN MSB",
        0x64 => "RPN LSB",
        0x65 => "RPN MSB",
        0x78 => "All Sound Off",
        0x79 => "Reset All Controllers",
        0x7A => "Local Control",
        0x7B => "All Notes Off",
        0x7C => "Omni Mode Off",
        0x7D => "Omni Mode On",
        0x7E => "Mono Mode On",
        0x7F => "Poly Mode On",
        _ => return None,
    };
    Some(name)
}

/// Display name of a meta sub-type.
pub fn meta_name(kind: MetaKind) -> &'static str {
    match kind {
        MetaKind::Text => "Text",
        MetaKind::Copyright => "Copyright",
        MetaKind::TrackName => "Sequence/Track Name",
        MetaKind::InstrumentName => "Instrument Name",
        MetaKind::Lyric => "Lyric",
        MetaKind::Marker => "Marker",
        MetaKind::CuePoint => "Cue Point",
        MetaKind::ChannelPrefix => "MIDI Channel Prefix",
        MetaKind::EndOfTrack => "End of Track",
        MetaKind::SetTempo => "Set Tempo",
        MetaKind::SmpteOffset => "SMPTE Offset",
        MetaKind::TimeSignature => "Time Signature",
        MetaKind::KeySignature => "Key Signature",
        MetaKind::SequencerSpecific => "Sequencer-Specific",
        MetaKind::Unknown(_) => "Unknown Meta Event",
    }
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#/Db", "D", "D#/Eb", "E", "F", "F#/Gb", "G", "G#/Ab", "A", "A#/Bb", "B",
];

/// Spell a key number as note name plus octave, middle C (60) being C4.
/// `None` above the 7-bit range.
pub fn note_name(key: u8) -> Option<String> {
    if key > 127 {
        return None;
    }
    let from_middle_c = key as i16 - 60;
    let octave = 4 + from_middle_c.div_euclid(12);
    let name = NOTE_NAMES[from_middle_c.rem_euclid(12) as usize];
    Some(format!("{name}{octave}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_spelling() {
        assert_eq!(note_name(60).as_deref(), Some("C4"));
        assert_eq!(note_name(61).as_deref(), Some("C#/Db4"));
        assert_eq!(note_name(59).as_deref(), Some("B3"));
        assert_eq!(note_name(0).as_deref(), Some("C-1"));
        assert_eq!(note_name(127).as_deref(), Some("G9"));
        assert_eq!(note_name(128), None);
    }

    #[test]
    fn table_lookups() {
        assert_eq!(program_name(0), Some("Acoustic Grand Piano"));
        assert_eq!(program_name(127), Some("Gunshot"));
        assert_eq!(controller_name(0x07), Some("Channel Volume"));
        assert_eq!(controller_name(0x03), None);
        assert_eq!(meta_name(MetaKind::SetTempo), "Set Tempo");
    }
}
