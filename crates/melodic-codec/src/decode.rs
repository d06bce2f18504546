//! Token stream back to a score.

use tracing::debug;

use crate::encode::EncodedSequence;
use crate::layout::{ChannelLayout, Row, DEFAULT_DURATION};
use crate::score::{Element, Score, TimedElement};
use crate::vocab::Vocabulary;
use crate::{CodecConfig, CodecError, Result};

/// Rebuilds scores from encoded sequences.
///
/// Must share its [`CodecConfig`] with the [`Encoder`](crate::Encoder) that
/// produced the input. Sub-events of a split chord come back as separate
/// elements at the same offset; they are not merged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    config: CodecConfig,
}

impl Decoder {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn decode(&self, sequence: &EncodedSequence, vocab: &Vocabulary) -> Result<Score> {
        let mut score = Score::new();
        let mut cursor = 0.0;

        for (index, event) in sequence.iter().enumerate() {
            let key = vocab.lookup_decode(event.token)?;
            let pitches = key.pitches()?;

            let duration = if self.config.preserve_durations {
                event.duration
            } else {
                DEFAULT_DURATION
            };
            if !(duration.is_finite() && duration > 0.0) {
                return Err(CodecError::MalformedElement {
                    index,
                    reason: format!("decoded duration {} is not positive", duration),
                });
            }

            let offset = if !self.config.preserve_offsets {
                score.end_time()
            } else if self.config.relative_offsets {
                cursor += event.offset;
                cursor
            } else {
                event.offset
            };

            score.insert(TimedElement::new(Element::from_pitches(pitches), offset, duration));
        }

        debug!(events = sequence.len(), elements = score.len(), "decoded sequence");
        Ok(score)
    }

    /// Decode rows in the channel layout implied by this decoder's config.
    pub fn decode_rows(&self, rows: &[Row], vocab: &Vocabulary) -> Result<Score> {
        let sequence = ChannelLayout::from_config(&self.config).from_rows(rows, vocab.len())?;
        self.decode(&sequence, vocab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{Encoder, Event};
    use crate::pitch::Pitch;
    use pretty_assertions::assert_eq;

    fn element(names: &[&str], offset: f64, duration: f64) -> TimedElement {
        let pitches = names.iter().map(|n| Pitch::parse(n).unwrap()).collect();
        TimedElement::new(Element::from_pitches(pitches), offset, duration)
    }

    fn melody() -> Score {
        Score::from_elements(vec![
            element(&["C4", "E4", "G4"], 0.0, 1.0),
            element(&["D4"], 1.0, 0.5),
            element(&["E4"], 1.5, 0.5),
            element(&["F4", "A4"], 2.0, 2.0),
            element(&["C5"], 4.0, 0.25),
        ])
    }

    #[test]
    fn round_trip_relative_and_absolute() {
        let score = melody();
        let vocab = Vocabulary::build([&score]).unwrap();

        for config in [CodecConfig::default(), CodecConfig::absolute()] {
            let encoded = Encoder::new(config).encode(&score, &vocab).unwrap();
            let decoded = Decoder::new(config).decode(&encoded, &vocab).unwrap();
            assert_eq!(decoded, score);
        }
    }

    #[test]
    fn round_trip_through_folded_rows() {
        let score = melody();
        let vocab = Vocabulary::build([&score]).unwrap();
        let config = CodecConfig {
            durations_separate: false,
            ..CodecConfig::default()
        };

        let encoded = Encoder::new(config).encode(&score, &vocab).unwrap();
        let rows = ChannelLayout::from_config(&config)
            .to_rows(&encoded, vocab.len())
            .unwrap();
        assert_eq!(rows[0].len(), vocab.len() + 1);

        let decoded = Decoder::new(config).decode_rows(&rows, &vocab).unwrap();
        assert_eq!(decoded, score);
    }

    #[test]
    fn without_offsets_elements_are_laid_end_to_end() {
        let score = Score::from_elements(vec![
            element(&["C4"], 0.0, 1.0),
            element(&["D4"], 3.0, 0.5),
        ]);
        let vocab = Vocabulary::build([&score]).unwrap();
        let config = CodecConfig {
            preserve_offsets: false,
            ..CodecConfig::default()
        };

        let encoded = Encoder::new(config).encode(&score, &vocab).unwrap();
        let decoded = Decoder::new(config).decode(&encoded, &vocab).unwrap();
        let offsets: Vec<f64> = decoded.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0.0, 1.0]);
    }

    #[test]
    fn without_durations_everything_is_a_quarter_note() {
        let score = Score::from_elements(vec![
            element(&["C4"], 0.0, 2.0),
            element(&["D4"], 2.0, 0.5),
        ]);
        let vocab = Vocabulary::build([&score]).unwrap();
        let config = CodecConfig {
            preserve_durations: false,
            ..CodecConfig::default()
        };

        let rows = vec![vec![0.0, 0.0], vec![1.0, 2.0]];
        let decoded = Decoder::new(config).decode_rows(&rows, &vocab).unwrap();
        let timing: Vec<(f64, f64)> = decoded.iter().map(|e| (e.offset, e.duration)).collect();
        assert_eq!(timing, vec![(0.0, 1.0), (2.0, 1.0)]);
    }

    #[test]
    fn split_chord_comes_back_as_stacked_elements() {
        let corpus = Score::from_elements(vec![
            element(&["C4"], 0.0, 1.0),
            element(&["E4"], 1.0, 1.0),
            element(&["G4"], 2.0, 1.0),
        ]);
        let vocab = Vocabulary::build([&corpus]).unwrap();
        let score = Score::from_elements(vec![
            element(&["G4"], 0.0, 1.0),
            element(&["C4", "E4"], 1.0, 2.0),
        ]);

        let expected = Score::from_elements(vec![
            element(&["G4"], 0.0, 1.0),
            element(&["C4"], 1.0, 2.0),
            element(&["E4"], 1.0, 2.0),
        ]);
        for config in [CodecConfig::default(), CodecConfig::absolute()] {
            let encoded = Encoder::new(config).encode(&score, &vocab).unwrap();
            let decoded = Decoder::new(config).decode(&encoded, &vocab).unwrap();
            assert_eq!(decoded, expected, "{:?}", config);
        }
    }

    #[test]
    fn out_of_range_token_is_an_error() {
        let score = Score::from_elements(vec![element(&["C4"], 0.0, 1.0)]);
        let vocab = Vocabulary::build([&score]).unwrap();
        let bogus = EncodedSequence::new(vec![Event::new(9, 1.0, 0.0)]);

        assert!(matches!(
            Decoder::default().decode(&bogus, &vocab),
            Err(CodecError::TokenOutOfRange { id: 9, size: 1 })
        ));
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        let score = Score::from_elements(vec![element(&["C4"], 0.0, 1.0)]);
        let vocab = Vocabulary::build([&score]).unwrap();
        let zero = EncodedSequence::new(vec![Event::new(0, 0.0, 0.0)]);

        assert!(matches!(
            Decoder::new(CodecConfig::default()).decode(&zero, &vocab),
            Err(CodecError::MalformedElement { index: 0, .. })
        ));
    }
}
