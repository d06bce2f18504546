//! Score to token stream.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::decompose::decompose;
use crate::key::EventKey;
use crate::score::{element_key, Score};
use crate::vocab::{TokenId, Vocabulary};
use crate::{CodecConfig, Result};

/// One encoded row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub token: TokenId,
    /// Quarter notes, shared by every sub-event of a split chord.
    pub duration: f64,
    /// Absolute time, or the delta from the previous emitted element.
    /// Sub-events of a split chord after the first repeat the absolute time,
    /// or carry a zero delta in relative mode.
    pub offset: f64,
}

impl Event {
    pub fn new(token: TokenId, duration: f64, offset: f64) -> Self {
        Self {
            token,
            duration,
            offset,
        }
    }
}

/// Events for one score, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodedSequence {
    events: Vec<Event>,
}

impl EncodedSequence {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn tokens(&self) -> Vec<TokenId> {
        self.events.iter().map(|e| e.token).collect()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl<'a> IntoIterator for &'a EncodedSequence {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// What happened to the elements of one encoded score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeReport {
    /// Elements read from the score.
    pub elements: usize,
    /// Events written, counting every sub-event of a split chord.
    pub emitted_events: usize,
    /// Elements that were split into known sub-chords.
    pub decomposed: usize,
    /// Elements the vocabulary could not represent.
    pub dropped: usize,
}

impl EncodeReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: &EncodeReport) {
        self.elements += other.elements;
        self.emitted_events += other.emitted_events;
        self.decomposed += other.decomposed;
        self.dropped += other.dropped;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    config: CodecConfig,
}

impl Encoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn encode(&self, score: &Score, vocab: &Vocabulary) -> Result<EncodedSequence> {
        self.encode_with_report(score, vocab).map(|(sequence, _)| sequence)
    }

    /// Encode a score, also returning counts of split and dropped elements.
    ///
    /// Fails only on malformed elements. Elements that are neither in the
    /// vocabulary nor decomposable into it are skipped, and the relative
    /// offset cursor stays on the last element that was actually emitted.
    pub fn encode_with_report(
        &self,
        score: &Score,
        vocab: &Vocabulary,
    ) -> Result<(EncodedSequence, EncodeReport)> {
        let mut events = Vec::with_capacity(score.len());
        let mut report = EncodeReport {
            elements: score.len(),
            ..EncodeReport::default()
        };
        // Splits are pure in (key, vocabulary), so repeats within a score reuse them
        let mut splits: HashMap<EventKey, Option<Vec<TokenId>>> = HashMap::new();
        let mut previous_time = 0.0;

        for (index, element) in score.iter().enumerate() {
            let key = element_key(index, element)?;

            let tokens = match vocab.lookup_encode(key.as_str()) {
                Some(token) => vec![token],
                None => {
                    let split = splits
                        .entry(key.clone())
                        .or_insert_with(|| split_tokens(&key, vocab));
                    match split {
                        Some(tokens) => {
                            debug!(index, key = %key, parts = tokens.len(), "split unknown chord");
                            report.decomposed += 1;
                            tokens.clone()
                        }
                        None => {
                            debug!(index, key = %key, "dropping unrepresentable element");
                            report.dropped += 1;
                            continue;
                        }
                    }
                }
            };

            let offset = if self.config.relative_offsets {
                element.offset - previous_time
            } else {
                element.offset
            };
            previous_time = element.offset;

            for (i, token) in tokens.into_iter().enumerate() {
                let offset = if i > 0 && self.config.relative_offsets {
                    0.0
                } else {
                    offset
                };
                events.push(Event::new(token, element.duration, offset));
            }
        }

        report.emitted_events = events.len();
        if report.dropped > 0 {
            info!(
                dropped = report.dropped,
                elements = report.elements,
                "encoded score with unrepresentable elements"
            );
        }
        Ok((EncodedSequence::new(events), report))
    }

    /// Encode every score of a corpus with one vocabulary.
    pub fn encode_all(
        &self,
        corpus: &[Score],
        vocab: &Vocabulary,
    ) -> Result<(Vec<EncodedSequence>, EncodeReport)> {
        let mut sequences = Vec::with_capacity(corpus.len());
        let mut total = EncodeReport::default();
        for score in corpus {
            let (sequence, report) = self.encode_with_report(score, vocab)?;
            total.merge(&report);
            sequences.push(sequence);
        }
        info!(
            scores = corpus.len(),
            events = total.emitted_events,
            decomposed = total.decomposed,
            dropped = total.dropped,
            "encoded corpus"
        );
        Ok((sequences, total))
    }
}

fn split_tokens(key: &EventKey, vocab: &Vocabulary) -> Option<Vec<TokenId>> {
    decompose(key.as_str(), vocab)?
        .iter()
        .map(|part| vocab.lookup_encode(part.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::Pitch;
    use crate::score::{Element, TimedElement};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn element(names: &[&str], offset: f64, duration: f64) -> TimedElement {
        let pitches = names.iter().map(|n| Pitch::parse(n).unwrap()).collect();
        TimedElement::new(Element::from_pitches(pitches), offset, duration)
    }

    /// {"C4":0, "E4":1, "G4":2, "C4_E4_G4":3}
    fn triad_vocab() -> Vocabulary {
        let keys = ["C4", "E4", "G4", "C4_E4_G4"];
        let encode: BTreeMap<EventKey, TokenId> = keys
            .iter()
            .enumerate()
            .map(|(id, k)| (EventKey::from(*k), id as TokenId))
            .collect();
        let decode: BTreeMap<TokenId, EventKey> = keys
            .iter()
            .enumerate()
            .map(|(id, k)| (id as TokenId, EventKey::from(*k)))
            .collect();
        Vocabulary::from_maps(encode, decode).unwrap()
    }

    #[test]
    fn known_elements_map_one_to_one() {
        let score = Score::from_elements(vec![
            element(&["C4", "E4", "G4"], 0.0, 2.0),
            element(&["G4"], 2.0, 1.0),
        ]);
        let encoded = Encoder::new(CodecConfig::absolute())
            .encode(&score, &triad_vocab())
            .unwrap();
        assert_eq!(
            encoded.events(),
            &[Event::new(3, 2.0, 0.0), Event::new(2, 1.0, 2.0)]
        );
    }

    #[test]
    fn unknown_chord_splits_with_shared_duration() {
        let score = Score::from_elements(vec![
            element(&["G4"], 0.0, 2.0),
            element(&["C4", "E4"], 2.0, 1.5),
        ]);
        let (encoded, report) = Encoder::new(CodecConfig::default())
            .encode_with_report(&score, &triad_vocab())
            .unwrap();

        assert_eq!(encoded.tokens(), vec![2, 0, 1]);
        assert_eq!(
            encoded.events(),
            &[
                Event::new(2, 2.0, 0.0),
                Event::new(0, 1.5, 2.0),
                Event::new(1, 1.5, 0.0),
            ]
        );
        assert_eq!(
            report,
            EncodeReport {
                elements: 2,
                emitted_events: 3,
                decomposed: 1,
                dropped: 0
            }
        );
    }

    #[test]
    fn relative_cursor_skips_dropped_elements() {
        let score = Score::from_elements(vec![
            element(&["C4"], 0.0, 1.0),
            element(&["A4"], 1.0, 1.0),
            element(&["E4"], 3.0, 1.0),
        ]);
        let (encoded, report) = Encoder::new(CodecConfig::default())
            .encode_with_report(&score, &triad_vocab())
            .unwrap();

        // E4 is measured from C4, not from the dropped A4
        assert_eq!(
            encoded.events(),
            &[Event::new(0, 1.0, 0.0), Event::new(1, 1.0, 3.0)]
        );
        assert_eq!(report.dropped, 1);
        assert_eq!(report.emitted_events, 2);
    }

    #[test]
    fn first_relative_offset_is_measured_from_zero() {
        let score = Score::from_elements(vec![element(&["E4"], 4.0, 1.0)]);
        let encoded = Encoder::new(CodecConfig::default())
            .encode(&score, &triad_vocab())
            .unwrap();
        assert_eq!(encoded.events()[0].offset, 4.0);
    }

    #[test]
    fn malformed_element_aborts() {
        let score = Score::from_elements(vec![
            element(&["C4"], 0.0, 1.0),
            TimedElement::new(Element::Group(vec![]), 1.0, 1.0),
        ]);
        let result = Encoder::new(CodecConfig::default()).encode(&score, &triad_vocab());
        assert!(matches!(
            result,
            Err(crate::CodecError::MalformedElement { index: 1, .. })
        ));
    }

    #[test]
    fn repeated_unknown_chord_is_split_each_time() {
        let score = Score::from_elements(vec![
            element(&["E4", "G4"], 0.0, 1.0),
            element(&["E4", "G4"], 1.0, 1.0),
        ]);
        let (encoded, report) = Encoder::new(CodecConfig::absolute())
            .encode_with_report(&score, &triad_vocab())
            .unwrap();
        assert_eq!(encoded.tokens(), vec![1, 2, 1, 2]);
        assert_eq!(report.decomposed, 2);
    }

    #[test]
    fn absolute_split_repeats_the_element_time() {
        let score = Score::from_elements(vec![
            element(&["G4"], 0.0, 1.0),
            element(&["C4", "E4"], 2.0, 1.5),
        ]);
        let encoded = Encoder::new(CodecConfig::absolute())
            .encode(&score, &triad_vocab())
            .unwrap();
        assert_eq!(
            encoded.events(),
            &[
                Event::new(2, 1.0, 0.0),
                Event::new(0, 1.5, 2.0),
                Event::new(1, 1.5, 2.0),
            ]
        );
    }

    #[test]
    fn encode_all_merges_reports() {
        let corpus = vec![
            Score::from_elements(vec![element(&["C4"], 0.0, 1.0), element(&["B4"], 1.0, 1.0)]),
            Score::from_elements(vec![element(&["C4", "G4"], 0.0, 1.0)]),
        ];
        let (sequences, report) = Encoder::new(CodecConfig::default())
            .encode_all(&corpus, &triad_vocab())
            .unwrap();

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[1].tokens(), vec![0, 2]);
        assert_eq!(
            report,
            EncodeReport {
                elements: 3,
                emitted_events: 3,
                decomposed: 1,
                dropped: 1
            }
        );
    }

    #[test]
    fn sequence_json_shape() {
        let sequence = EncodedSequence::new(vec![Event::new(3, 0.5, 1.0)]);
        let json = serde_json::to_string(&sequence).unwrap();
        assert_eq!(json, r#"{"events":[{"token":3,"duration":0.5,"offset":1.0}]}"#);
    }
}
