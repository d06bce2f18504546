//! Numeric row form of an encoded sequence.
//!
//! Columns, left to right:
//!
//! | durations  | token columns        | duration column | offset column        |
//! |------------|----------------------|-----------------|----------------------|
//! | `Omitted`  | 1 (token id)         | none            | if offsets preserved |
//! | `Separate` | 1 (token id)         | 1               | if offsets preserved |
//! | `Folded`   | vocab size (one-hot) | none            | if offsets preserved |
//!
//! In the folded layout the one-hot token row is scaled by the duration,
//! so the hot column is the token and its value is the duration.

use crate::encode::{EncodedSequence, Event};
use crate::vocab::TokenId;
use crate::{CodecConfig, CodecError, Result};

pub type Row = Vec<f64>;

/// Duration given to rows that carry none.
pub const DEFAULT_DURATION: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationChannel {
    Omitted,
    Separate,
    Folded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    pub durations: DurationChannel,
    pub offsets: bool,
}

impl ChannelLayout {
    pub fn from_config(config: &CodecConfig) -> Self {
        let durations = match (config.preserve_durations, config.durations_separate) {
            (false, _) => DurationChannel::Omitted,
            (true, true) => DurationChannel::Separate,
            (true, false) => DurationChannel::Folded,
        };
        Self {
            durations,
            offsets: config.preserve_offsets,
        }
    }

    pub fn token_columns(&self, vocab_size: usize) -> usize {
        match self.durations {
            DurationChannel::Folded => vocab_size,
            DurationChannel::Omitted | DurationChannel::Separate => 1,
        }
    }

    pub fn width(&self, vocab_size: usize) -> usize {
        let duration = usize::from(self.durations == DurationChannel::Separate);
        self.token_columns(vocab_size) + duration + usize::from(self.offsets)
    }

    pub fn to_rows(&self, sequence: &EncodedSequence, vocab_size: usize) -> Result<Vec<Row>> {
        sequence
            .iter()
            .map(|event| self.render_row(event, vocab_size))
            .collect()
    }

    fn render_row(&self, event: &Event, vocab_size: usize) -> Result<Row> {
        if event.token as usize >= vocab_size {
            return Err(CodecError::TokenOutOfRange {
                id: event.token,
                size: vocab_size,
            });
        }

        let mut row = Vec::with_capacity(self.width(vocab_size));
        match self.durations {
            DurationChannel::Omitted => row.push(f64::from(event.token)),
            DurationChannel::Separate => {
                row.push(f64::from(event.token));
                row.push(event.duration);
            }
            DurationChannel::Folded => {
                row.resize(vocab_size, 0.0);
                row[event.token as usize] = event.duration;
            }
        }
        if self.offsets {
            row.push(event.offset);
        }
        Ok(row)
    }

    pub fn from_rows(&self, rows: &[Row], vocab_size: usize) -> Result<EncodedSequence> {
        let expected = self.width(vocab_size);
        let events = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                if row.len() != expected {
                    return Err(CodecError::RowWidth {
                        row: index,
                        expected,
                        found: row.len(),
                    });
                }
                self.parse_row(index, row, vocab_size)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(EncodedSequence::new(events))
    }

    fn parse_row(&self, index: usize, row: &[f64], vocab_size: usize) -> Result<Event> {
        let (token, duration) = match self.durations {
            DurationChannel::Omitted => (token_value(index, row[0], vocab_size)?, DEFAULT_DURATION),
            DurationChannel::Separate => (token_value(index, row[0], vocab_size)?, row[1]),
            DurationChannel::Folded => hot_column(index, &row[..vocab_size])?,
        };
        let offset = if self.offsets { row[row.len() - 1] } else { 0.0 };
        Ok(Event::new(token, duration, offset))
    }
}

fn token_value(row: usize, value: f64, vocab_size: usize) -> Result<TokenId> {
    let whole = value.is_finite() && value >= 0.0 && value.fract() == 0.0;
    if !(whole && value <= f64::from(TokenId::MAX)) {
        return Err(CodecError::InvalidToken { row, value });
    }
    let id = value as TokenId;
    if id as usize >= vocab_size {
        return Err(CodecError::TokenOutOfRange { id, size: vocab_size });
    }
    Ok(id)
}

/// First column holding the row maximum, and that maximum.
fn hot_column(row: usize, columns: &[f64]) -> Result<(TokenId, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in columns.iter().enumerate() {
        if best.map_or(true, |(_, max)| value > max) {
            best = Some((i, value));
        }
    }
    match best {
        Some((i, max)) if max > 0.0 => Ok((i as TokenId, max)),
        Some((_, max)) => Err(CodecError::InvalidToken { row, value: max }),
        None => Err(CodecError::InvalidToken { row, value: 0.0 }),
    }
}
