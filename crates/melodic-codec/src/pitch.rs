//! Pitch spelling and the integer pitch index.
//!
//! Every pitch is stored in canonical sharp spelling. Flats and enharmonic
//! naturals are folded onto the sharp-spelled class while parsing, so two
//! pitches compare equal exactly when their [`Pitch::index`] is equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CodecError, Result};

pub const PITCHES_PER_OCTAVE: i32 = 12;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One of the twelve pitch classes, spelled with sharps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Semitones above C (0–11).
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Pitch class for any integer, wrapping modulo 12.
    pub fn from_index(index: i32) -> PitchClass {
        Self::ALL[index.rem_euclid(PITCHES_PER_OCTAVE) as usize]
    }

    /// Canonical sharp spelling: "C", "C#", ...
    pub fn name(self) -> &'static str {
        SHARP_NAMES[self as usize]
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pitch class in a specific octave, e.g. `C#4`.
///
/// Serialized as its canonical name so scores stay human readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pitch {
    class: PitchClass,
    octave: u8,
}

impl Pitch {
    pub fn new(class: PitchClass, octave: u8) -> Self {
        Self { class, octave }
    }

    pub fn class(self) -> PitchClass {
        self.class
    }

    pub fn octave(self) -> u8 {
        self.octave
    }

    /// `pitch_class + 12 × octave`. C0 is 0, C4 is 48.
    pub fn index(self) -> i32 {
        self.class.index() + PITCHES_PER_OCTAVE * self.octave as i32
    }

    /// Inverse of [`Pitch::index`].
    pub fn from_index(index: i32) -> Result<Pitch> {
        let octave = index.div_euclid(PITCHES_PER_OCTAVE);
        if !(0..=u8::MAX as i32).contains(&octave) {
            return Err(CodecError::InvalidPitch(format!(
                "index {} is outside the representable octave range",
                index
            )));
        }
        Ok(Pitch {
            class: PitchClass::from_index(index),
            octave: octave as u8,
        })
    }

    /// Parse `<letter><accidentals><octave>`.
    ///
    /// Accepted accidentals are `#`/`♯` (sharp) and `-`/`b`/`♭` (flat); they
    /// may repeat. The letter is case-insensitive.
    ///
    /// ```
    /// use melodic_codec::Pitch;
    ///
    /// assert_eq!(Pitch::parse("Db4").unwrap().to_string(), "C#4");
    /// assert_eq!(Pitch::parse("E-3").unwrap().to_string(), "D#3");
    /// assert_eq!(Pitch::parse("Cb4").unwrap().to_string(), "B3");
    /// ```
    pub fn parse(input: &str) -> Result<Pitch> {
        let invalid = |why: &str| CodecError::InvalidPitch(format!("{:?}: {}", input, why));

        let mut chars = input.chars();
        let letter = chars.next().ok_or_else(|| invalid("empty pitch name"))?;
        let base = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(invalid("unknown note letter")),
        };

        let rest = chars.as_str();
        let octave_start = rest
            .find(|ch: char| ch.is_ascii_digit())
            .ok_or_else(|| invalid("missing octave"))?;
        let (accidentals, octave_str) = rest.split_at(octave_start);

        let mut shift = 0;
        for ch in accidentals.chars() {
            match ch {
                '#' | '♯' => shift += 1,
                '-' | 'b' | '♭' => shift -= 1,
                _ => return Err(invalid("unknown accidental")),
            }
        }

        let octave: i32 = octave_str
            .parse()
            .map_err(|_| invalid("octave is not a number"))?;

        PITCHES_PER_OCTAVE
            .checked_mul(octave)
            .and_then(|index| index.checked_add(base + shift))
            .and_then(|index| Pitch::from_index(index).ok())
            .ok_or_else(|| invalid("octave out of range"))
    }

    /// Copy of this pitch with its octave clipped into `min..=max`.
    pub fn clamp_octave(self, min: u8, max: u8) -> Pitch {
        Pitch {
            class: self.class,
            octave: self.octave.clamp(min, max.max(min)),
        }
    }
}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index().cmp(&other.index())
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class, self.octave)
    }
}

impl FromStr for Pitch {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Pitch::parse(s)
    }
}

impl TryFrom<String> for Pitch {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self> {
        Pitch::parse(&value)
    }
}

impl From<Pitch> for String {
    fn from(pitch: Pitch) -> String {
        pitch.to_string()
    }
}
