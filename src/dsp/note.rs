//! Note naming — conversions between frequencies, MIDI numbers and
//! note names in 12-tone equal temperament.

use serde::Serialize;

/// Chromatic note names, sharps only, starting at C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// The nearest equal-tempered note to a frequency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteReading {
    pub midi: i32,
    pub name: &'static str,
    pub octave: i32,
    /// Offset from the nearest note, rounded to whole cents.
    pub cents: i32,
}

/// Parse a note name (e.g. "C4", "F#3", "Bb5") into a MIDI note number.
pub fn note_to_midi(note: &str) -> Option<i32> {
    let mut chars = note.chars();
    let base_semitone = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (semitone, octave_str) = if let Some(r) = rest.strip_prefix('#') {
        (base_semitone + 1, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (base_semitone - 1, r)
    } else {
        (base_semitone, rest)
    };

    let octave: i32 = octave_str.parse().ok()?;
    // C4 = 60
    Some((octave + 1) * 12 + semitone)
}

/// Frequency of a MIDI note given the frequency of A4 (MIDI 69).
pub fn midi_to_frequency(midi: i32, reference_a4: f64) -> f64 {
    reference_a4 * 2.0_f64.powf((midi as f64 - 69.0) / 12.0)
}

/// Nearest note to `frequency`. Returns `None` for non-positive or
/// non-finite input.
pub fn frequency_to_note(frequency: f64, reference_a4: f64) -> Option<NoteReading> {
    if !(frequency.is_finite() && frequency > 0.0 && reference_a4 > 0.0) {
        return None;
    }
    let semitones = 12.0 * (frequency / reference_a4).log2();
    let rounded = semitones.round();
    let midi = 69 + rounded as i32;
    let cents = ((semitones - rounded) * 100.0).round() as i32;

    Some(NoteReading {
        midi,
        name: NOTE_NAMES[midi.rem_euclid(12) as usize],
        octave: midi.div_euclid(12) - 1,
        cents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_note_names() {
        assert_eq!(note_to_midi("C4"), Some(60));
        assert_eq!(note_to_midi("A4"), Some(69));
        assert_eq!(note_to_midi("F#3"), Some(54));
        assert_eq!(note_to_midi("Bb5"), Some(82));
        assert_eq!(note_to_midi("C-1"), Some(0));
        assert_eq!(note_to_midi("H2"), None);
        assert_eq!(note_to_midi("C"), None);
        assert_eq!(note_to_midi(""), None);
    }

    #[test]
    fn a4_is_reference() {
        assert!((midi_to_frequency(69, 440.0) - 440.0).abs() < 1e-9);
        assert!((midi_to_frequency(81, 440.0) - 880.0).abs() < 1e-9);
    }

    #[test]
    fn names_a4() {
        let note = frequency_to_note(440.0, 440.0).unwrap();
        assert_eq!(note.name, "A");
        assert_eq!(note.octave, 4);
        assert_eq!(note.midi, 69);
        assert_eq!(note.cents, 0);
    }

    #[test]
    fn names_middle_c() {
        let note = frequency_to_note(261.63, 440.0).unwrap();
        assert_eq!(note.name, "C");
        assert_eq!(note.octave, 4);
        assert_eq!(note.cents, 0);
    }

    #[test]
    fn a432_is_flat_of_a4() {
        // 432 Hz is about 31.8 cents flat of A4
        let note = frequency_to_note(432.0, 440.0).unwrap();
        assert_eq!(note.name, "A");
        assert_eq!(note.cents, -32);
    }

    #[test]
    fn round_trips_through_midi() {
        for midi in [28, 45, 60, 69, 84, 96] {
            let note = frequency_to_note(midi_to_frequency(midi, 440.0), 440.0).unwrap();
            assert_eq!(note.midi, midi);
            assert_eq!(note.cents, 0);
        }
    }

    #[test]
    fn rejects_non_positive() {
        assert!(frequency_to_note(0.0, 440.0).is_none());
        assert!(frequency_to_note(-3.0, 440.0).is_none());
        assert!(frequency_to_note(f64::NAN, 440.0).is_none());
    }
}
