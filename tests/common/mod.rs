//! Byte-level builders for test files. The reader API is path-based, so
//! every fixture goes through a real temp file.

use std::io::Write;

use tempfile::NamedTempFile;

/// Assemble a complete file: header plus one `MTrk` chunk per track.
pub fn smf(format: u16, division: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&format.to_be_bytes());
    bytes.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    bytes.extend_from_slice(&division.to_be_bytes());
    for track in tracks {
        bytes.extend_from_slice(b"MTrk");
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(track);
    }
    bytes
}

/// Write `bytes` to a temp file that lives as long as the handle.
pub fn persist(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// A note-on with a single-byte delta.
pub fn note_on(delta: u8, channel: u8, key: u8, velocity: u8) -> Vec<u8> {
    vec![delta, 0x90 | channel, key, velocity]
}

/// A note-off with a single-byte delta.
pub fn note_off(delta: u8, channel: u8, key: u8) -> Vec<u8> {
    vec![delta, 0x80 | channel, key, 0]
}

/// The end-of-track meta event with a zero delta.
pub fn eot() -> Vec<u8> {
    vec![0x00, 0xFF, 0x2F, 0x00]
}

/// Concatenate event byte strings into one track body.
pub fn track(events: &[Vec<u8>]) -> Vec<u8> {
    events.concat()
}
