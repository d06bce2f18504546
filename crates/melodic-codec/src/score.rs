//! The preprocessed score the codec consumes and produces.
//!
//! Scores arrive already quantized and key-normalized: a flat, time-ordered
//! list of notes and chords with an offset and a duration in quarter notes.

use serde::{Deserialize, Serialize};

use crate::key::EventKey;
use crate::pitch::Pitch;
use crate::{CodecError, Result};

/// What sounds at one instant: a single pitch or an ordered group.
///
/// Serialized as the list of its pitch names. A one-element list
/// deserializes as `Single`; anything else as `Group`, which is only
/// well-formed with two or more pitches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Pitch>", into = "Vec<Pitch>")]
pub enum Element {
    Single(Pitch),
    Group(Vec<Pitch>),
}

impl Element {
    /// Build from a pitch list, choosing `Single` for exactly one pitch.
    pub fn from_pitches(mut pitches: Vec<Pitch>) -> Element {
        if pitches.len() == 1 {
            Element::Single(pitches.remove(0))
        } else {
            Element::Group(pitches)
        }
    }

    pub fn pitches(&self) -> &[Pitch] {
        match self {
            Element::Single(pitch) => std::slice::from_ref(pitch),
            Element::Group(pitches) => pitches,
        }
    }

    /// The key for this element, or `None` for a group with fewer than two pitches.
    pub fn key(&self) -> Option<EventKey> {
        match self {
            Element::Single(pitch) => Some(EventKey::from_pitches(std::slice::from_ref(pitch))),
            Element::Group(pitches) if pitches.len() >= 2 => Some(EventKey::from_pitches(pitches)),
            Element::Group(_) => None,
        }
    }

    fn map_pitches(&self, f: impl Fn(Pitch) -> Pitch) -> Element {
        match self {
            Element::Single(pitch) => Element::Single(f(*pitch)),
            Element::Group(pitches) => Element::Group(pitches.iter().copied().map(f).collect()),
        }
    }
}

impl From<Vec<Pitch>> for Element {
    fn from(pitches: Vec<Pitch>) -> Self {
        Element::from_pitches(pitches)
    }
}

impl From<Element> for Vec<Pitch> {
    fn from(element: Element) -> Self {
        match element {
            Element::Single(pitch) => vec![pitch],
            Element::Group(pitches) => pitches,
        }
    }
}

/// An element placed in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedElement {
    pub pitches: Element,
    /// Absolute position in quarter notes.
    pub offset: f64,
    /// Length in quarter notes.
    pub duration: f64,
}

impl TimedElement {
    pub fn new(pitches: Element, offset: f64, duration: f64) -> Self {
        Self {
            pitches,
            offset,
            duration,
        }
    }

    pub fn end(&self) -> f64 {
        self.offset + self.duration
    }
}

/// Key for the element at `index`, rejecting malformed elements and
/// non-positive or non-finite timing.
pub(crate) fn element_key(index: usize, element: &TimedElement) -> Result<EventKey> {
    if !element.offset.is_finite() {
        return Err(CodecError::MalformedElement {
            index,
            reason: format!("offset {} is not finite", element.offset),
        });
    }
    if !(element.duration.is_finite() && element.duration > 0.0) {
        return Err(CodecError::MalformedElement {
            index,
            reason: format!("duration {} is not positive", element.duration),
        });
    }
    element.pitches.key().ok_or_else(|| CodecError::MalformedElement {
        index,
        reason: format!(
            "group with {} pitch(es) is neither a note nor a chord",
            element.pitches.pitches().len()
        ),
    })
}

/// A flat, offset-ordered sequence of elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawScore")]
pub struct Score {
    elements: Vec<TimedElement>,
}

/// Deserialized form; ordering is restored on conversion.
#[derive(Deserialize)]
struct RawScore {
    elements: Vec<TimedElement>,
}

impl From<RawScore> for Score {
    fn from(raw: RawScore) -> Self {
        Score::from_elements(raw.elements)
    }
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from elements in any order; equal offsets keep their given order.
    pub fn from_elements(mut elements: Vec<TimedElement>) -> Self {
        elements.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self { elements }
    }

    /// Insert after every element starting at or before `element.offset`.
    pub fn insert(&mut self, element: TimedElement) {
        let position = self
            .elements
            .partition_point(|existing| existing.offset <= element.offset);
        self.elements.insert(position, element);
    }

    pub fn elements(&self) -> &[TimedElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimedElement> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Latest end time of any element, 0 for an empty score.
    pub fn end_time(&self) -> f64 {
        self.elements.iter().map(TimedElement::end).fold(0.0, f64::max)
    }

    /// Keys of every element, in order.
    pub fn event_keys(&self) -> Result<Vec<EventKey>> {
        self.elements
            .iter()
            .enumerate()
            .map(|(index, element)| element_key(index, element))
            .collect()
    }

    /// Copy of the score with every pitch clipped into the octave range.
    pub fn clamp_octaves(&self, min: u8, max: u8) -> Score {
        Score {
            elements: self
                .elements
                .iter()
                .map(|e| TimedElement {
                    pitches: e.pitches.map_pitches(|p| p.clamp_octave(min, max)),
                    ..e.clone()
                })
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Score {
    type Item = &'a TimedElement;
    type IntoIter = std::slice::Iter<'a, TimedElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl FromIterator<TimedElement> for Score {
    fn from_iter<I: IntoIterator<Item = TimedElement>>(iter: I) -> Self {
        Score::from_elements(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(name: &str) -> Pitch {
        Pitch::parse(name).unwrap()
    }

    #[test]
    fn single_and_group_keys() {
        assert_eq!(Element::Single(p("C4")).key().unwrap().as_str(), "C4");
        assert_eq!(
            Element::Group(vec![p("E4"), p("C4")]).key().unwrap().as_str(),
            "E4_C4"
        );
    }

    #[test]
    fn short_groups_have_no_key() {
        assert!(Element::Group(vec![]).key().is_none());
        assert!(Element::Group(vec![p("C4")]).key().is_none());
    }

    #[test]
    fn element_key_reports_index_of_malformed_element() {
        let bad = TimedElement::new(Element::Group(vec![]), 2.0, 1.0);
        match element_key(7, &bad) {
            Err(CodecError::MalformedElement { index, .. }) => assert_eq!(index, 7),
            other => panic!("expected MalformedElement, got {:?}", other),
        }
    }

    #[test]
    fn zero_duration_is_malformed() {
        let bad = TimedElement::new(Element::Single(p("C4")), 0.0, 0.0);
        assert!(matches!(
            element_key(0, &bad),
            Err(CodecError::MalformedElement { .. })
        ));
    }

    #[test]
    fn from_elements_orders_by_offset_stably() {
        let score = Score::from_elements(vec![
            TimedElement::new(Element::Single(p("G4")), 1.0, 1.0),
            TimedElement::new(Element::Single(p("C4")), 0.0, 1.0),
            TimedElement::new(Element::Single(p("E4")), 1.0, 1.0),
        ]);
        let keys: Vec<String> = score
            .event_keys()
            .unwrap()
            .into_iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(keys, vec!["C4", "G4", "E4"]);
    }

    #[test]
    fn insert_keeps_equal_offsets_in_arrival_order() {
        let mut score = Score::new();
        score.insert(TimedElement::new(Element::Single(p("C4")), 1.0, 0.5));
        score.insert(TimedElement::new(Element::Single(p("D4")), 0.0, 0.5));
        score.insert(TimedElement::new(Element::Single(p("E4")), 1.0, 0.5));

        let names: Vec<String> = score
            .iter()
            .map(|e| e.pitches.pitches()[0].to_string())
            .collect();
        assert_eq!(names, vec!["D4", "C4", "E4"]);
        assert_eq!(score.end_time(), 1.5);
    }

    #[test]
    fn json_shape() {
        let json = r#"{"elements":[
            {"pitches":["C4"],"offset":0.0,"duration":1.0},
            {"pitches":["C4","Eb4","G4"],"offset":1.0,"duration":2.0}
        ]}"#;
        let score: Score = serde_json::from_str(json).unwrap();
        assert_eq!(score.len(), 2);
        assert_eq!(score.elements()[0].pitches, Element::Single(p("C4")));
        assert_eq!(
            score.elements()[1].pitches.key().unwrap().as_str(),
            "C4_D#4_G4"
        );
    }

    #[test]
    fn out_of_range_octave_in_json_is_an_error() {
        let json = r#"{"elements":[{"pitches":["C999999999"],"offset":0.0,"duration":1.0}]}"#;
        let err = serde_json::from_str::<Score>(json).unwrap_err();
        assert!(err.to_string().contains("octave out of range"), "{}", err);
    }

    #[test]
    fn clamp_octaves_leaves_original_untouched() {
        let score = Score::from_elements(vec![TimedElement::new(
            Element::Group(vec![p("C1"), p("E5"), p("G9")]),
            0.0,
            1.0,
        )]);
        let clamped = score.clamp_octaves(3, 7);
        assert_eq!(
            clamped.elements()[0].pitches.key().unwrap().as_str(),
            "C3_E5_G7"
        );
        assert_eq!(
            score.elements()[0].pitches.key().unwrap().as_str(),
            "C1_E5_G9"
        );
    }
}
