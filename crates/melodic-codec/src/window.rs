//! Sliding training windows over encoded rows.

use serde::Serialize;

use crate::encode::Event;
use crate::layout::{ChannelLayout, DurationChannel, Row};
use crate::vocab::TokenId;
use crate::{CodecError, Result};

/// Longest duration a model is expected to see, in quarter notes.
pub const LONGEST_DURATION: f64 = 8.0;
/// Longest offset a model is expected to see, in quarter notes.
pub const LONGEST_OFFSET: f64 = 4.0;

/// Inputs of `W` consecutive rows, each paired with the row that follows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Windows<T> {
    pub inputs: Vec<Vec<T>>,
    pub targets: Vec<T>,
}

impl<T> Windows<T> {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[T], &T)> {
        self.inputs.iter().map(Vec::as_slice).zip(self.targets.iter())
    }
}

/// Cut every window of length `window` with stride 1.
///
/// A sequence shorter than the window is first repeated end to end
/// `1 + window / len` times so at least one example exists. A sequence of
/// exactly `window` rows has no following row and yields no examples.
pub fn make_windows<T: Clone>(rows: &[T], window: usize) -> Result<Windows<T>> {
    if rows.is_empty() || window == 0 {
        return Err(CodecError::InvalidWindow {
            length: rows.len(),
            window,
        });
    }

    let tiled;
    let rows = if rows.len() < window {
        let copies = 1 + window / rows.len();
        tiled = rows.iter().cycle().take(rows.len() * copies).cloned().collect::<Vec<T>>();
        tiled.as_slice()
    } else {
        rows
    };

    let count = rows.len() - window;
    let inputs = (0..count).map(|i| rows[i..i + window].to_vec()).collect();
    let targets = rows[window..].to_vec();
    Ok(Windows { inputs, targets })
}

/// Targets split into one column per model head.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetColumns {
    pub tokens: Vec<TokenId>,
    pub durations: Vec<f64>,
    pub offsets: Vec<f64>,
}

impl Windows<Event> {
    pub fn target_columns(&self) -> TargetColumns {
        TargetColumns {
            tokens: self.targets.iter().map(|e| e.token).collect(),
            durations: self.targets.iter().map(|e| e.duration).collect(),
            offsets: self.targets.iter().map(|e| e.offset).collect(),
        }
    }
}

/// Per-column divisors that bring input rows into roughly `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureScale {
    pub vocab_size: usize,
    pub longest_duration: f64,
    pub longest_offset: f64,
}

impl FeatureScale {
    pub fn new(vocab_size: usize) -> Self {
        Self {
            vocab_size,
            longest_duration: LONGEST_DURATION,
            longest_offset: LONGEST_OFFSET,
        }
    }

    /// Divisor for every column of a row in `layout`.
    pub fn divisors(&self, layout: &ChannelLayout) -> Vec<f64> {
        let mut divisors = match layout.durations {
            DurationChannel::Omitted => vec![self.vocab_size as f64],
            DurationChannel::Separate => vec![self.vocab_size as f64, self.longest_duration],
            // Folded token columns hold durations
            DurationChannel::Folded => vec![self.longest_duration; self.vocab_size],
        };
        if layout.offsets {
            divisors.push(self.longest_offset);
        }
        divisors
    }

    pub fn apply(&self, layout: &ChannelLayout, row: &[f64]) -> Result<Row> {
        self.apply_at(layout, 0, row)
    }

    /// Scale every input row, leaving targets untouched.
    ///
    /// Width errors name the row's position in the windowed sequence.
    pub fn scale_inputs(
        &self,
        layout: &ChannelLayout,
        windows: &Windows<Row>,
    ) -> Result<Vec<Vec<Row>>> {
        windows
            .inputs
            .iter()
            .enumerate()
            .map(|(start, window)| {
                window
                    .iter()
                    .enumerate()
                    .map(|(i, row)| self.apply_at(layout, start + i, row))
                    .collect::<Result<Vec<Row>>>()
            })
            .collect()
    }

    fn apply_at(&self, layout: &ChannelLayout, index: usize, row: &[f64]) -> Result<Row> {
        let divisors = self.divisors(layout);
        if row.len() != divisors.len() {
            return Err(CodecError::RowWidth {
                row: index,
                expected: divisors.len(),
                found: row.len(),
            });
        }
        Ok(row.iter().zip(&divisors).map(|(value, d)| value / d).collect())
    }
}
