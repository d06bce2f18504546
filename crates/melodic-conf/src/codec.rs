//! Codec channel configuration - shared by encoder, decoder and windower.

use serde::{Deserialize, Serialize};

/// Which channels an encoded sequence carries and how offsets are measured.
///
/// The encoded row array carries no tag describing its layout, so the
/// encoder and decoder must be constructed from the same `CodecConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Append an offset column to every row.
    /// Default: true
    #[serde(default = "CodecConfig::default_true")]
    pub preserve_offsets: bool,

    /// Keep note durations. When false every decoded element is a quarter note.
    /// Default: true
    #[serde(default = "CodecConfig::default_true")]
    pub preserve_durations: bool,

    /// Store durations in their own column. When false the duration is
    /// folded into a categorical token row.
    /// Default: true
    #[serde(default = "CodecConfig::default_true")]
    pub durations_separate: bool,

    /// Offsets are deltas from the previous emitted element instead of
    /// absolute score time.
    /// Default: true
    #[serde(default = "CodecConfig::default_true")]
    pub relative_offsets: bool,

    /// Window length used when slicing training examples.
    /// Default: 12
    #[serde(default = "CodecConfig::default_sequence_length")]
    pub sequence_length: usize,
}

impl CodecConfig {
    fn default_true() -> bool {
        true
    }

    fn default_sequence_length() -> usize {
        12
    }

    /// Configuration with absolute offsets, otherwise default.
    pub fn absolute() -> Self {
        Self {
            relative_offsets: false,
            ..Self::default()
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            preserve_offsets: true,
            preserve_durations: true,
            durations_separate: true,
            relative_offsets: true,
            sequence_length: Self::default_sequence_length(),
        }
    }
}
