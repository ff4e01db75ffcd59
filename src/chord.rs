// src/chord.rs - Chord label to fretted-note voicing on a fixed six-string tuning
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::ChordError;

pub const STRING_COUNT: usize = 6;

/// Open-string MIDI pitches, low to high (E A D G B E).
pub const STANDARD_TUNING: [u8; STRING_COUNT] = [40, 45, 50, 55, 59, 64];

const ROOT_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 3] = [Self::Major, Self::Minor, Self::Diminished];

    pub fn intervals(self) -> [u8; 3] {
        match self {
            Self::Major => [0, 4, 7],
            Self::Minor => [0, 3, 7],
            Self::Diminished => [0, 3, 6],
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Diminished => "dim",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.suffix() == suffix)
    }
}

/// A parsed gesture label such as `C`, `F#m` or `Bdim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChordLabel {
    /// Pitch class of the root, C = 0.
    pub root: u8,
    pub quality: ChordQuality,
}

impl ChordLabel {
    pub fn new(root: u8, quality: ChordQuality) -> Self {
        Self { root: root % 12, quality }
    }

    /// Every label the classifier can produce: 12 roots x 3 qualities.
    pub fn all() -> impl Iterator<Item = ChordLabel> {
        (0..12u8).flat_map(|root| ChordQuality::ALL.into_iter().map(move |q| Self::new(root, q)))
    }

    pub fn tones(&self) -> [u8; 3] {
        self.quality.intervals().map(|i| (self.root + i) % 12)
    }
}

impl FromStr for ChordLabel {
    type Err = ChordError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ChordError::EmptyLabel);
        }

        // Sharps first so "C#" is not read as "C" + "#..."
        let (root, rest) = ROOT_NAMES
            .iter()
            .enumerate()
            .filter(|(_, name)| label.starts_with(*name))
            .max_by_key(|(_, name)| name.len())
            .map(|(pc, name)| (pc as u8, &label[name.len()..]))
            .ok_or_else(|| ChordError::UnknownRoot(label.to_string()))?;

        let quality = ChordQuality::from_suffix(rest).ok_or_else(|| ChordError::UnknownQuality {
            label: label.to_string(),
            quality: rest.to_string(),
        })?;

        Ok(Self::new(root, quality))
    }
}

impl fmt::Display for ChordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", ROOT_NAMES[(self.root % 12) as usize], self.quality.suffix())
    }
}

/// The four strings used for plucking: lowest kept string plus the top three.
pub type PluckNotes = [u8; 4];

/// Result of mapping one chord onto the fretboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordVoicing {
    pub label: ChordLabel,
    /// One pitch per string, starting at the first string that sounds the root.
    pub notes: Vec<u8>,
    /// `None` when fewer than three strings survived.
    pub pluck: Option<PluckNotes>,
}

#[derive(Debug, Clone)]
pub struct ChordMapper {
    tuning: [u8; STRING_COUNT],
}

impl Default for ChordMapper {
    fn default() -> Self {
        Self::new(STANDARD_TUNING)
    }
}

impl ChordMapper {
    pub fn new(tuning: [u8; STRING_COUNT]) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &[u8; STRING_COUNT] {
        &self.tuning
    }

    /// Parse `label` and voice it. Fails on labels the mapper does not know;
    /// a short voicing is not a failure here, it just has no pluck notes.
    pub fn voice_label(&self, label: &str) -> Result<ChordVoicing, ChordError> {
        let label: ChordLabel = label.parse()?;
        Ok(self.voice(label))
    }

    pub fn voice(&self, label: ChordLabel) -> ChordVoicing {
        let notes = self.chord_notes(&label);
        let pluck = match pluck_notes(&notes) {
            Ok(pluck) => Some(pluck),
            Err(e) => {
                debug!("{}: {}", label, e);
                None
            }
        };
        ChordVoicing { label, notes, pluck }
    }

    /// Nearest chord tone at or above each open string, dropping the strings
    /// below the first one that lands on the root.
    pub fn chord_notes(&self, label: &ChordLabel) -> Vec<u8> {
        let tones = label.tones();
        let mut notes = Vec::with_capacity(STRING_COUNT);
        let mut found_root = false;

        for &open in &self.tuning {
            let pc = open % 12;
            let fret = tones
                .iter()
                .map(|&tone| (tone + 12 - pc) % 12)
                .min()
                .unwrap_or(0);
            let pitch = open + fret;

            if !found_root && pitch % 12 == label.root {
                found_root = true;
            }
            if found_root {
                notes.push(pitch);
            }
        }

        notes
    }
}

/// `[first, len-3, len-2, len-1]` of a voicing.
pub fn pluck_notes(notes: &[u8]) -> Result<PluckNotes, ChordError> {
    let len = notes.len();
    if len < 3 {
        return Err(ChordError::ShortVoicing { found: len });
    }
    Ok([notes[0], notes[len - 3], notes[len - 2], notes[len - 1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_labels() {
        assert_eq!("C".parse::<ChordLabel>(), Ok(ChordLabel::new(0, ChordQuality::Major)));
        assert_eq!("C#m".parse::<ChordLabel>(), Ok(ChordLabel::new(1, ChordQuality::Minor)));
        assert_eq!("A#dim".parse::<ChordLabel>(), Ok(ChordLabel::new(10, ChordQuality::Diminished)));
        assert_eq!("B".parse::<ChordLabel>(), Ok(ChordLabel::new(11, ChordQuality::Major)));

        for label in ChordLabel::all() {
            assert_eq!(label.to_string().parse::<ChordLabel>(), Ok(label));
        }
        assert_eq!(ChordLabel::all().count(), 36);
    }

    #[test]
    fn display_wraps_out_of_range_root() {
        let label = ChordLabel { root: 14, quality: ChordQuality::Minor };
        assert_eq!(label.to_string(), "Dm");
    }

    #[test]
    fn rejects_unknown_labels() {
        assert_eq!("".parse::<ChordLabel>(), Err(ChordError::EmptyLabel));
        assert!(matches!("H".parse::<ChordLabel>(), Err(ChordError::UnknownRoot(_))));
        assert!(matches!(
            "Cmaj7".parse::<ChordLabel>(),
            Err(ChordError::UnknownQuality { .. })
        ));
    }

    #[test]
    fn c_major_on_standard_tuning() {
        let voicing = ChordMapper::default().voice_label("C").unwrap();
        // Low E string is dropped: its nearest tone is E, not the root.
        assert_eq!(voicing.notes, vec![48, 52, 55, 60, 64]);
        assert_eq!(voicing.pluck, Some([48, 55, 60, 64]));
    }

    #[test]
    fn e_minor_keeps_all_strings() {
        let voicing = ChordMapper::default().voice_label("Em").unwrap();
        assert_eq!(voicing.notes, vec![40, 47, 52, 55, 59, 64]);
        assert_eq!(voicing.pluck, Some([40, 55, 59, 64]));
    }

    #[test]
    fn first_kept_string_sounds_the_root() {
        let mapper = ChordMapper::default();
        for label in ChordLabel::all() {
            let notes = mapper.chord_notes(&label);
            if let Some(first) = notes.first() {
                assert_eq!(first % 12, label.root, "{label}");
            }
            for note in &notes {
                assert!(label.tones().contains(&(note % 12)), "{label}: {note}");
            }
        }
    }

    #[test]
    fn pluck_notes_shape() {
        let mapper = ChordMapper::default();
        for label in ChordLabel::all() {
            let voicing = mapper.voice(label);
            assert_eq!(voicing, mapper.voice(label));
            if voicing.notes.len() >= 3 {
                let pluck = voicing.pluck.unwrap();
                assert_eq!(pluck[0], voicing.notes[0]);
                assert_eq!(pluck[3], *voicing.notes.last().unwrap());
            } else {
                assert!(voicing.pluck.is_none());
            }
        }
    }

    #[test]
    fn short_voicing_has_no_pluck_notes() {
        // Root only appears on the top string.
        let mapper = ChordMapper::new([64, 64, 64, 64, 64, 48]);
        let voicing = mapper.voice_label("C").unwrap();
        assert_eq!(voicing.notes, vec![48]);
        assert_eq!(voicing.pluck, None);
        assert_eq!(pluck_notes(&voicing.notes), Err(ChordError::ShortVoicing { found: 1 }));
        assert_eq!(pluck_notes(&[]), Err(ChordError::ShortVoicing { found: 0 }));
    }
}
