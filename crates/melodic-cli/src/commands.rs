//! CLI command implementations

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use melodic_codec::{
    make_windows, ChannelLayout, CodecConfig, Decoder, EncodedSequence, Encoder, Event, Row,
    Score, TargetColumns, Vocabulary, VocabularyStore, Windows,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Decoder input: the event object `encode` prints, or its `--rows` form.
#[derive(Deserialize)]
#[serde(untagged)]
enum EncodedInput {
    Sequence(EncodedSequence),
    Rows(Vec<Row>),
}

#[derive(Serialize)]
struct WindowsOutput {
    windows: Windows<Event>,
    targets: TargetColumns,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} {}", what, path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {} {}", what, path.display()))
}

/// Settings saved with the vocabulary win over the loaded config, so an
/// encode and a later decode agree on the channel layout.
fn codec_settings(
    store: &VocabularyStore,
    prefix: Option<&str>,
    fallback: &CodecConfig,
) -> Result<CodecConfig> {
    if store.settings_path(prefix).exists() {
        Ok(store.load_settings(prefix)?)
    } else {
        Ok(*fallback)
    }
}

pub fn build_vocab(
    scores: &[PathBuf],
    dir: &Path,
    prefix: Option<&str>,
    parallel: bool,
    codec: &CodecConfig,
) -> Result<Vocabulary> {
    let corpus = scores
        .iter()
        .map(|path| read_json::<Score>(path, "score"))
        .collect::<Result<Vec<_>>>()?;

    let vocab = if parallel {
        Vocabulary::build_parallel(&corpus)
    } else {
        Vocabulary::build(&corpus)
    }
    .context("Failed to build vocabulary")?;

    let store = VocabularyStore::new(dir);
    store
        .save(&vocab, prefix)
        .with_context(|| format!("Failed to save vocabulary to {}", dir.display()))?;
    store.save_settings(codec, prefix)?;
    Ok(vocab)
}

pub fn encode(
    score: &Path,
    dir: &Path,
    prefix: Option<&str>,
    rows: bool,
    fallback: &CodecConfig,
) -> Result<String> {
    let score: Score = read_json(score, "score")?;
    let store = VocabularyStore::new(dir);
    let vocab = store.load(prefix).context("Failed to load vocabulary")?;
    let config = codec_settings(&store, prefix, fallback)?;

    let (encoded, report) = Encoder::new(config).encode_with_report(&score, &vocab)?;
    if report.dropped > 0 {
        warn!(
            dropped = report.dropped,
            elements = report.elements,
            "some elements are not representable in this vocabulary"
        );
    }
    info!(
        events = report.emitted_events,
        decomposed = report.decomposed,
        "encoded score"
    );

    let output = if rows {
        let rows = ChannelLayout::from_config(&config).to_rows(&encoded, vocab.len())?;
        serde_json::to_string_pretty(&rows)?
    } else {
        serde_json::to_string_pretty(&encoded)?
    };
    Ok(output)
}

pub fn decode(
    encoded: &Path,
    dir: &Path,
    prefix: Option<&str>,
    fallback: &CodecConfig,
) -> Result<String> {
    let input: EncodedInput = read_json(encoded, "encoded sequence")?;
    let store = VocabularyStore::new(dir);
    let vocab = store.load(prefix).context("Failed to load vocabulary")?;
    let decoder = Decoder::new(codec_settings(&store, prefix, fallback)?);

    let score = match input {
        EncodedInput::Sequence(sequence) => decoder.decode(&sequence, &vocab)?,
        EncodedInput::Rows(rows) => decoder.decode_rows(&rows, &vocab)?,
    };
    Ok(serde_json::to_string_pretty(&score)?)
}

pub fn windows(encoded: &Path, length: usize) -> Result<String> {
    let sequence: EncodedSequence = read_json(encoded, "encoded sequence")?;
    let windows = make_windows(sequence.events(), length)
        .with_context(|| format!("Failed to window {}", encoded.display()))?;
    let targets = windows.target_columns();
    info!(windows = windows.len(), length, "cut training windows");

    Ok(serde_json::to_string_pretty(&WindowsOutput { windows, targets })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const SCORE: &str = r#"{"elements": [
        {"pitches": ["C4", "E4", "G4"], "offset": 0.0, "duration": 1.0},
        {"pitches": ["D4"], "offset": 1.0, "duration": 0.5},
        {"pitches": ["E4"], "offset": 1.5, "duration": 0.5},
        {"pitches": ["C4"], "offset": 2.0, "duration": 2.0}
    ]}"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn build_encode_decode_round_trip() {
        let dir = TempDir::new().unwrap();
        let score_path = write(&dir, "score.json", SCORE);
        let vocab_dir = dir.path().join("vocab");

        let vocab = build_vocab(
            &[score_path.clone()],
            &vocab_dir,
            None,
            false,
            &CodecConfig::default(),
        )
        .unwrap();
        assert_eq!(vocab.len(), 4);
        assert!(vocab_dir.join("codec_settings.toml").exists());

        let encoded =
            encode(&score_path, &vocab_dir, None, false, &CodecConfig::default()).unwrap();
        let encoded_path = write(&dir, "encoded.json", &encoded);

        let decoded = decode(&encoded_path, &vocab_dir, None, &CodecConfig::default()).unwrap();
        let original: Score = serde_json::from_str(SCORE).unwrap();
        let restored: Score = serde_json::from_str(&decoded).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn rows_decode_with_saved_settings() {
        let dir = TempDir::new().unwrap();
        let score_path = write(&dir, "score.json", SCORE);
        let vocab_dir = dir.path().join("vocab");
        let folded = CodecConfig {
            durations_separate: false,
            ..CodecConfig::default()
        };

        build_vocab(&[score_path.clone()], &vocab_dir, Some("major"), true, &folded).unwrap();
        assert!(vocab_dir.join("major_codec_settings.toml").exists());
        assert!(!vocab_dir.join("codec_settings.toml").exists());

        let default = CodecConfig::default();
        let rows = encode(&score_path, &vocab_dir, Some("major"), true, &default).unwrap();
        let parsed: Vec<Row> = serde_json::from_str(&rows).unwrap();
        assert_eq!(parsed[0].len(), 5);

        // The fallback config differs, but the saved settings decide the layout
        let rows_path = write(&dir, "rows.json", &rows);
        let decoded = decode(&rows_path, &vocab_dir, Some("major"), &default).unwrap();
        let restored: Score = serde_json::from_str(&decoded).unwrap();
        assert_eq!(restored.len(), 4);
    }

    #[test]
    fn prefixed_vocabularies_keep_their_own_settings() {
        let dir = TempDir::new().unwrap();
        let score_path = write(&dir, "score.json", SCORE);
        let vocab_dir = dir.path().join("vocab");
        let folded = CodecConfig {
            durations_separate: false,
            ..CodecConfig::default()
        };
        let default = CodecConfig::default();

        build_vocab(&[score_path.clone()], &vocab_dir, Some("major"), false, &folded).unwrap();
        build_vocab(&[score_path.clone()], &vocab_dir, Some("minor"), false, &default).unwrap();

        let major = encode(&score_path, &vocab_dir, Some("major"), true, &default).unwrap();
        let minor = encode(&score_path, &vocab_dir, Some("minor"), true, &default).unwrap();
        let major: Vec<Row> = serde_json::from_str(&major).unwrap();
        let minor: Vec<Row> = serde_json::from_str(&minor).unwrap();
        // Folded one-hot over 4 tokens plus offset, versus token, duration, offset
        assert_eq!(major[0].len(), 5);
        assert_eq!(minor[0].len(), 3);
    }

    #[test]
    fn windows_reports_targets() {
        let dir = TempDir::new().unwrap();
        let encoded = r#"{"events": [
            {"token": 0, "duration": 1.0, "offset": 0.0},
            {"token": 1, "duration": 0.5, "offset": 1.0},
            {"token": 2, "duration": 0.5, "offset": 0.5}
        ]}"#;
        let path = write(&dir, "encoded.json", encoded);

        let output: serde_json::Value = serde_json::from_str(&windows(&path, 2).unwrap()).unwrap();
        assert_eq!(output["targets"]["tokens"], serde_json::json!([2]));
        assert_eq!(output["windows"]["inputs"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn missing_vocabulary_is_reported() {
        let dir = TempDir::new().unwrap();
        let score_path = write(&dir, "score.json", SCORE);
        let nowhere = dir.path().join("nowhere");
        let err = encode(&score_path, &nowhere, None, false, &CodecConfig::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("missing codec artifact"));
    }
}
