// Static scale catalog and pitch conversion.
//
// Each scale is a fixed run of semitone offsets spanning exactly one octave:
// it starts at 0, never decreases, and ends at 12. The closing 12 is a real
// scale step, so an octave range of N exposes `N * size` selectable indices
// and the top index of each octave lands on the next octave's root.
//
// Scales are addressed by `ScaleId`. Its discriminant order is the order of
// the host's Scale knob, so a knob position maps straight onto an index.
// The lookup functions come in two flavours:
// - strict (`lookup`, `scale_name`, `key_name`): return `MelodyError` for
//   indices outside the catalog; used by display and CLI code.
// - clamping (`clamped`, `clamp_scale_index`, `clamp_key`): always resolve
//   to a valid entry; used by the engine, whose input comes from continuous
//   knobs.

use serde::{Deserialize, Serialize};

use crate::error::MelodyError;

/// Semitones per octave. One unit of pitch CV covers this many semitones.
pub const OCTAVE_SEMITONES: u32 = 12;

/// Display names for the twelve keys, indexed by semitone offset from C.
pub const KEY_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// A scale: ordered semitone offsets covering one octave, 0 through 12.
#[derive(Debug, PartialEq, Eq)]
pub struct Scale {
    offsets: &'static [u8],
}

impl Scale {
    const fn new(offsets: &'static [u8]) -> Self {
        Scale { offsets }
    }

    pub fn offsets(&self) -> &'static [u8] {
        self.offsets
    }

    /// Number of steps in one octave of this scale, including the closing 12.
    pub fn size(&self) -> usize {
        self.offsets.len()
    }

    /// Absolute semitone of scale step `index` transposed into `key`.
    ///
    /// `offsets[index % size] + 12 * (index / size) + key`. Indices past the
    /// first octave wrap onto the same offsets one octave higher.
    pub fn semitone(&self, index: usize, key: u8) -> u32 {
        let size = self.size();
        let octave = (index / size) as u32;
        u32::from(self.offsets[index % size]) + OCTAVE_SEMITONES * octave + u32::from(key)
    }

    /// Pitch CV (1 V/oct) of scale step `index` in `key`.
    pub fn pitch(&self, index: usize, key: u8) -> f32 {
        semitone_to_pitch(self.semitone(index, key))
    }
}

/// Convert an absolute semitone count to pitch CV at one unit per octave.
pub fn semitone_to_pitch(semitone: u32) -> f32 {
    semitone as f32 / OCTAVE_SEMITONES as f32
}

static MAJOR: Scale = Scale::new(&[0, 2, 4, 5, 7, 9, 11, 12]);
static LYDIAN: Scale = Scale::new(&[0, 2, 4, 6, 7, 9, 11, 12]);
static MIXOLYDIAN: Scale = Scale::new(&[0, 2, 4, 5, 7, 9, 10, 12]);
static MINOR: Scale = Scale::new(&[0, 2, 3, 5, 7, 8, 10, 12]);
static MELODIC_MINOR: Scale = Scale::new(&[0, 2, 3, 5, 7, 9, 11, 12]);
static HARMONIC_MINOR: Scale = Scale::new(&[0, 2, 3, 5, 7, 8, 11, 12]);
static DORIAN: Scale = Scale::new(&[0, 2, 3, 5, 7, 9, 10, 12]);
static PHRYGIAN: Scale = Scale::new(&[0, 1, 3, 5, 7, 8, 10, 12]);
static AEOLIAN: Scale = Scale::new(&[0, 2, 3, 5, 7, 8, 10, 12]);
static CHROMATIC: Scale = Scale::new(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
static RAGA_KAFI: Scale = Scale::new(&[0, 1, 3, 5, 7, 8, 10, 12]);
static MAQAM_HIJAZ: Scale = Scale::new(&[0, 1, 4, 5, 7, 8, 11, 12]);
static JAPANESE_KUMOI: Scale = Scale::new(&[0, 2, 3, 7, 9, 12]);

/// Catalog entries, in Scale-knob order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleId {
    Major,
    Lydian,
    Mixolydian,
    Minor,
    MelodicMinor,
    HarmonicMinor,
    Dorian,
    Phrygian,
    Aeolian,
    Chromatic,
    RagaKafi,
    MaqamHijaz,
    JapaneseKumoi,
}

/// Number of scales in the catalog.
pub const SCALE_COUNT: usize = ScaleId::ALL.len();

impl ScaleId {
    pub const ALL: [ScaleId; 13] = [
        ScaleId::Major,
        ScaleId::Lydian,
        ScaleId::Mixolydian,
        ScaleId::Minor,
        ScaleId::MelodicMinor,
        ScaleId::HarmonicMinor,
        ScaleId::Dorian,
        ScaleId::Phrygian,
        ScaleId::Aeolian,
        ScaleId::Chromatic,
        ScaleId::RagaKafi,
        ScaleId::MaqamHijaz,
        ScaleId::JapaneseKumoi,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<ScaleId> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleId::Major => "Major",
            ScaleId::Lydian => "Lydian",
            ScaleId::Mixolydian => "Mixolydian",
            ScaleId::Minor => "Minor",
            ScaleId::MelodicMinor => "Melodic Minor",
            ScaleId::HarmonicMinor => "Harmonic Minor",
            ScaleId::Dorian => "Dorian",
            ScaleId::Phrygian => "Phrygian",
            ScaleId::Aeolian => "Aeolian",
            ScaleId::Chromatic => "Chromatic",
            ScaleId::RagaKafi => "Raga Kafi",
            ScaleId::MaqamHijaz => "Maqam Hijaz",
            ScaleId::JapaneseKumoi => "Japanese Kumoi",
        }
    }

    pub fn scale(self) -> &'static Scale {
        match self {
            ScaleId::Major => &MAJOR,
            ScaleId::Lydian => &LYDIAN,
            ScaleId::Mixolydian => &MIXOLYDIAN,
            ScaleId::Minor => &MINOR,
            ScaleId::MelodicMinor => &MELODIC_MINOR,
            ScaleId::HarmonicMinor => &HARMONIC_MINOR,
            ScaleId::Dorian => &DORIAN,
            ScaleId::Phrygian => &PHRYGIAN,
            ScaleId::Aeolian => &AEOLIAN,
            ScaleId::Chromatic => &CHROMATIC,
            ScaleId::RagaKafi => &RAGA_KAFI,
            ScaleId::MaqamHijaz => &MAQAM_HIJAZ,
            ScaleId::JapaneseKumoi => &JAPANESE_KUMOI,
        }
    }

    /// Case-insensitive match against display names, ignoring spaces, so
    /// "harmonic minor", "HarmonicMinor" and "harmonicminor" all resolve.
    pub fn parse(name: &str) -> Option<ScaleId> {
        let wanted: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL.into_iter().find(|id| {
            let candidate: String = id
                .name()
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| c.to_ascii_lowercase())
                .collect();
            candidate == wanted
        })
    }
}

/// Strict lookup of the scale at `scale_index`.
pub fn lookup(scale_index: usize) -> Result<&'static Scale, MelodyError> {
    ScaleId::from_index(scale_index)
        .map(ScaleId::scale)
        .ok_or(MelodyError::ScaleIndexOutOfRange {
            index: scale_index,
            count: SCALE_COUNT,
        })
}

/// Display name of the scale at `scale_index`.
pub fn scale_name(scale_index: usize) -> Result<&'static str, MelodyError> {
    ScaleId::from_index(scale_index)
        .map(ScaleId::name)
        .ok_or(MelodyError::ScaleIndexOutOfRange {
            index: scale_index,
            count: SCALE_COUNT,
        })
}

/// Display name of the key `key_index` semitones above C.
pub fn key_name(key_index: usize) -> Result<&'static str, MelodyError> {
    KEY_NAMES
        .get(key_index)
        .copied()
        .ok_or(MelodyError::KeyIndexOutOfRange { index: key_index })
}

pub fn clamp_scale_index(scale_index: usize) -> usize {
    scale_index.min(SCALE_COUNT - 1)
}

pub fn clamp_key(key: u8) -> u8 {
    key.min(KEY_NAMES.len() as u8 - 1)
}

/// Lookup that never fails: indices past the end resolve to the last scale.
pub fn clamped(scale_index: usize) -> &'static Scale {
    ScaleId::ALL[clamp_scale_index(scale_index)].scale()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scale_spans_one_octave() {
        for id in ScaleId::ALL {
            let offsets = id.scale().offsets();
            assert_eq!(offsets.first(), Some(&0), "{} must start at 0", id.name());
            assert_eq!(offsets.last(), Some(&12), "{} must end at 12", id.name());
            assert!(
                offsets.windows(2).all(|w| w[0] <= w[1]),
                "{} offsets must be non-decreasing",
                id.name()
            );
        }
    }

    #[test]
    fn catalog_sizes() {
        assert_eq!(SCALE_COUNT, 13);
        assert_eq!(ScaleId::Major.scale().size(), 8);
        assert_eq!(ScaleId::Chromatic.scale().size(), 13);
        assert_eq!(ScaleId::JapaneseKumoi.scale().size(), 6);
    }

    #[test]
    fn ids_round_trip_through_index() {
        for (i, id) in ScaleId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(ScaleId::from_index(i), Some(*id));
        }
        assert_eq!(ScaleId::from_index(SCALE_COUNT), None);
    }

    #[test]
    fn semitone_wraps_into_higher_octaves() {
        let major = ScaleId::Major.scale();
        assert_eq!(major.semitone(0, 0), 0);
        assert_eq!(major.semitone(7, 0), 12);
        // Index 8 is the first step of the second octave block.
        assert_eq!(major.semitone(8, 0), 12);
        assert_eq!(major.semitone(9, 0), 14);
        assert_eq!(major.semitone(1, 2), 4);
    }

    #[test]
    fn pitch_is_one_unit_per_octave() {
        let major = ScaleId::Major.scale();
        assert_eq!(major.pitch(0, 0), 0.0);
        assert!((major.pitch(7, 0) - 1.0).abs() < 1e-6);
        assert!((major.pitch(0, 2) - 2.0 / 12.0).abs() < 1e-6);
    }

    #[test]
    fn strict_lookups_reject_out_of_range() {
        assert!(lookup(0).is_ok());
        assert!(matches!(
            lookup(13),
            Err(MelodyError::ScaleIndexOutOfRange { index: 13, count: 13 })
        ));
        assert!(scale_name(99).is_err());
        assert!(matches!(
            key_name(12),
            Err(MelodyError::KeyIndexOutOfRange { index: 12 })
        ));
    }

    #[test]
    fn names() {
        assert_eq!(scale_name(0).unwrap(), "Major");
        assert_eq!(scale_name(12).unwrap(), "Japanese Kumoi");
        assert_eq!(key_name(2).unwrap(), "D");
        assert_eq!(key_name(11).unwrap(), "B");
    }

    #[test]
    fn clamping_always_resolves() {
        assert_eq!(clamp_scale_index(500), 12);
        assert_eq!(clamped(500), ScaleId::JapaneseKumoi.scale());
        assert_eq!(clamp_key(40), 11);
        assert_eq!(clamp_key(3), 3);
    }

    #[test]
    fn parse_is_forgiving() {
        assert_eq!(ScaleId::parse("major"), Some(ScaleId::Major));
        assert_eq!(ScaleId::parse("Harmonic Minor"), Some(ScaleId::HarmonicMinor));
        assert_eq!(ScaleId::parse("japanese-kumoi"), Some(ScaleId::JapaneseKumoi));
        assert_eq!(ScaleId::parse("lydian dominant"), None);
    }
}
