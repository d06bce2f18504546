//! Vocabulary-constrained event codec.
//!
//! Turns a preprocessed polyphonic score into a fixed-alphabet token stream
//! for sequence models, and rebuilds a score from such a stream. Chords that
//! were never seen while the vocabulary was built are split into known
//! sub-chords by [`decompose`].
//!
//! # Example
//!
//! ```
//! use melodic_codec::{make_windows, CodecConfig, Decoder, Encoder, Score, Vocabulary};
//!
//! let score: Score = serde_json::from_str(r#"{"elements": [
//!     {"pitches": ["C4", "E4", "G4"], "offset": 0.0, "duration": 1.0},
//!     {"pitches": ["D4"], "offset": 1.0, "duration": 0.5},
//!     {"pitches": ["E4"], "offset": 1.5, "duration": 0.5}
//! ]}"#).unwrap();
//!
//! let vocab = Vocabulary::build([&score]).unwrap();
//! let config = CodecConfig::default();
//!
//! let encoded = Encoder::new(config).encode(&score, &vocab).unwrap();
//! let decoded = Decoder::new(config).decode(&encoded, &vocab).unwrap();
//! assert_eq!(decoded, score);
//!
//! let windows = make_windows(encoded.events(), 2).unwrap();
//! assert_eq!(windows.len(), 1);
//! ```

pub mod decode;
pub mod decompose;
pub mod encode;
pub mod key;
pub mod layout;
pub mod pitch;
pub mod score;
pub mod store;
pub mod vocab;
pub mod window;

pub use decode::Decoder;
pub use decompose::{decompose, KeySet};
pub use encode::{EncodeReport, EncodedSequence, Encoder, Event};
pub use key::{EventKey, DELIMITER};
pub use layout::{ChannelLayout, DurationChannel, Row};
pub use melodic_conf::CodecConfig;
pub use pitch::{Pitch, PitchClass};
pub use score::{Element, Score, TimedElement};
pub use store::VocabularyStore;
pub use vocab::{TokenId, Vocabulary};
pub use window::{make_windows, FeatureScale, TargetColumns, Windows};

use std::path::PathBuf;

/// Errors from codec operations.
///
/// An element the vocabulary cannot represent is not an error: the encoder
/// drops it and counts it in its [`EncodeReport`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("corpus contains no events to build a vocabulary from")]
    EmptyCorpus,

    #[error("vocabulary maps differ in size: {encode} keys vs {decode} ids")]
    VocabularyCardinality { encode: usize, decode: usize },

    #[error("vocabulary does not round-trip key {key:?} through id {id}")]
    VocabularyRoundTrip { key: String, id: TokenId },

    #[error("token id {id} is outside a vocabulary of size {size}")]
    TokenOutOfRange { id: TokenId, size: usize },

    #[error("element {index} is malformed: {reason}")]
    MalformedElement { index: usize, reason: String },

    #[error("invalid pitch {0}")]
    InvalidPitch(String),

    #[error("row {row} has {found} columns, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row} holds {value}, which is not a token")]
    InvalidToken { row: usize, value: f64 },

    #[error("cannot cut windows of length {window} from {length} rows")]
    InvalidWindow { length: usize, window: usize },

    #[error("missing codec artifact: {}", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("codec settings in {}: {message}", path.display())]
    Settings { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, CodecError>;
