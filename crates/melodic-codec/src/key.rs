//! Event keys: the string identity of one sounding pitch or pitch group.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pitch::Pitch;
use crate::Result;

/// Separator between pitch names inside a key.
pub const DELIMITER: char = '_';

/// Pitch names joined in encounter order, e.g. `"C4_E4_G4"`.
///
/// Order is significant and never normalized: `"E4_C4"` and `"C4_E4"` are
/// different keys, and the order decides which sub-keys the decomposer
/// tries first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventKey(String);

impl EventKey {
    pub fn from_pitches(pitches: &[Pitch]) -> EventKey {
        let names: Vec<String> = pitches.iter().map(Pitch::to_string).collect();
        EventKey::from_parts(&names)
    }

    pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> EventKey {
        let mut key = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                key.push(DELIMITER);
            }
            key.push_str(part.as_ref());
        }
        EventKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Pitch names in encounter order.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.0.split(DELIMITER)
    }

    pub fn part_count(&self) -> usize {
        self.parts().count()
    }

    pub fn is_chord(&self) -> bool {
        self.0.contains(DELIMITER)
    }

    /// Parse every part back into a [`Pitch`].
    pub fn pitches(&self) -> Result<Vec<Pitch>> {
        self.parts().map(Pitch::parse).collect()
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EventKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventKey {
    fn from(value: &str) -> Self {
        EventKey(value.to_string())
    }
}

impl From<String> for EventKey {
    fn from(value: String) -> Self {
        EventKey(value)
    }
}
