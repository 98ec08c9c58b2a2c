//! Piano key naming
//!
//! The sample set covers the 88 keys of a standard piano, MIDI 21 (A0)
//! through MIDI 108 (C8). Files are named with flats, e.g. `Bb0.aiff`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SampleError};

/// Lowest piano key (A0)
pub const LOWEST_MIDI: u8 = 21;

/// Highest piano key (C8)
pub const HIGHEST_MIDI: u8 = 108;

/// Number of keys on the keyboard
pub const KEY_COUNT: usize = (HIGHEST_MIDI - LOWEST_MIDI + 1) as usize;

const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// A single key on the piano, identified by MIDI number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PianoNote {
    midi: u8,
}

impl PianoNote {
    /// Create a note from a MIDI number in the piano range
    pub fn from_midi(midi: u8) -> Result<Self> {
        if !(LOWEST_MIDI..=HIGHEST_MIDI).contains(&midi) {
            return Err(SampleError::NoteOutOfRange { midi });
        }
        Ok(Self { midi })
    }

    /// MIDI note number
    pub fn midi(&self) -> u8 {
        self.midi
    }

    /// Octave in scientific pitch notation (C4 = middle C)
    pub fn octave(&self) -> i8 {
        (self.midi / 12) as i8 - 1
    }

    /// Pitch class name using flats
    pub fn pitch_class(&self) -> &'static str {
        FLAT_NAMES[(self.midi % 12) as usize]
    }

    /// Full note name, e.g. "Bb3"
    pub fn name(&self) -> String {
        format!("{}{}", self.pitch_class(), self.octave())
    }

    /// Fundamental frequency in Hz (A4 = 440 Hz)
    pub fn frequency(&self) -> f32 {
        440.0 * 2.0_f32.powf((self.midi as f32 - 69.0) / 12.0)
    }
}

impl fmt::Display for PianoNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class(), self.octave())
    }
}

impl FromStr for PianoNote {
    type Err = SampleError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SampleError::InvalidNote {
            name: s.to_string(),
        };

        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let letter = chars.next().ok_or_else(invalid)?;
        let base: i32 = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(invalid()),
        };

        let rest = &trimmed[letter.len_utf8()..];
        let (offset, octave_str) = if let Some(r) = rest.strip_prefix('b') {
            (-1, r)
        } else if let Some(r) = rest.strip_prefix('#') {
            (1, r)
        } else {
            (0, rest)
        };

        let octave: i32 = octave_str.parse().map_err(|_| invalid())?;
        let midi = (octave + 1) * 12 + base + offset;
        let midi = u8::try_from(midi).map_err(|_| invalid())?;

        PianoNote::from_midi(midi)
    }
}

impl TryFrom<String> for PianoNote {
    type Error = SampleError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PianoNote> for String {
    fn from(note: PianoNote) -> Self {
        note.name()
    }
}

/// All 88 piano keys in ascending order
pub fn all_notes() -> Vec<PianoNote> {
    (LOWEST_MIDI..=HIGHEST_MIDI)
        .map(|midi| PianoNote { midi })
        .collect()
}

/// Parse a comma-separated list of note names
///
/// Duplicates are dropped and the result is sorted in keyboard order.
pub fn parse_note_list(list: &str) -> Result<Vec<PianoNote>> {
    let mut notes = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<PianoNote>>>()?;

    notes.sort();
    notes.dedup();
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_keyboard_has_88_keys() {
        let notes = all_notes();
        assert_eq!(notes.len(), KEY_COUNT);
        assert_eq!(notes.len(), 88);
        assert_eq!(notes.first().map(|n| n.name()), Some("A0".to_string()));
        assert_eq!(notes.last().map(|n| n.name()), Some("C8".to_string()));
    }

    #[test]
    fn test_names_use_flats() {
        let names: Vec<String> = all_notes().iter().take(6).map(|n| n.name()).collect();
        assert_eq!(names, vec!["A0", "Bb0", "B0", "C1", "Db1", "D1"]);
    }

    #[test_case("A0", 21)]
    #[test_case("Bb0", 22)]
    #[test_case("C4", 60)]
    #[test_case("C#4", 61)]
    #[test_case("Db4", 61)]
    #[test_case("A4", 69)]
    #[test_case("C8", 108)]
    fn test_parse_note(name: &str, midi: u8) {
        let note: PianoNote = name.parse().unwrap();
        assert_eq!(note.midi(), midi);
    }

    #[test_case("H4")]
    #[test_case("")]
    #[test_case("C")]
    #[test_case("G#0")]
    #[test_case("Db8")]
    #[test_case("c4")]
    #[test_case("bb3")]
    fn test_parse_rejects(name: &str) {
        assert!(name.parse::<PianoNote>().is_err());
    }

    #[test]
    fn test_sharp_input_normalizes_to_flat() {
        let note: PianoNote = "F#3".parse().unwrap();
        assert_eq!(note.name(), "Gb3");
    }

    #[test]
    fn test_name_roundtrip_for_every_key() {
        for note in all_notes() {
            let parsed: PianoNote = note.name().parse().unwrap();
            assert_eq!(parsed, note);
        }
    }

    #[test]
    fn test_frequency() {
        let a4: PianoNote = "A4".parse().unwrap();
        approx::assert_relative_eq!(a4.frequency(), 440.0, epsilon = 1e-3);
        let a0: PianoNote = "A0".parse().unwrap();
        approx::assert_relative_eq!(a0.frequency(), 27.5, epsilon = 1e-3);
    }

    #[test]
    fn test_parse_note_list_sorts_and_dedups() {
        let notes = parse_note_list("C4, A0,C4,Bb1").unwrap();
        let names: Vec<String> = notes.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["A0", "Bb1", "C4"]);
    }

    #[test]
    fn test_from_midi_out_of_range() {
        assert!(PianoNote::from_midi(20).is_err());
        assert!(PianoNote::from_midi(109).is_err());
        assert!(PianoNote::from_midi(60).is_ok());
    }
}
