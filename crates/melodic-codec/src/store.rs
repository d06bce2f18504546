//! On-disk persistence for vocabularies and the settings they were built with.
//!
//! Layout of a store directory:
//!
//! ```text
//! <dir>/
//!   encode_map.json          key -> id
//!   decode_map.json          id -> key
//!   codec_settings.toml
//!   major_encode_map.json    partitioned vocabularies carry a prefix
//!   major_decode_map.json
//!   major_codec_settings.toml
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::key::EventKey;
use crate::vocab::{TokenId, Vocabulary};
use crate::{CodecConfig, CodecError, Result};

const ENCODE_MAP: &str = "encode_map.json";
const DECODE_MAP: &str = "decode_map.json";
const SETTINGS: &str = "codec_settings.toml";

#[derive(Debug, Clone)]
pub struct VocabularyStore {
    dir: PathBuf,
}

impl VocabularyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn encode_map_path(&self, prefix: Option<&str>) -> PathBuf {
        self.dir.join(prefixed(prefix, ENCODE_MAP))
    }

    pub fn decode_map_path(&self, prefix: Option<&str>) -> PathBuf {
        self.dir.join(prefixed(prefix, DECODE_MAP))
    }

    pub fn settings_path(&self, prefix: Option<&str>) -> PathBuf {
        self.dir.join(prefixed(prefix, SETTINGS))
    }

    /// Write both maps, creating the directory if needed.
    pub fn save(&self, vocab: &Vocabulary, prefix: Option<&str>) -> Result<()> {
        create_dir(&self.dir)?;
        write_json(&self.encode_map_path(prefix), &vocab.encode_map())?;
        write_json(&self.decode_map_path(prefix), &vocab.decode_map())?;
        info!(dir = %self.dir.display(), prefix, size = vocab.len(), "saved vocabulary");
        Ok(())
    }

    /// Read both maps and check they form a bijection.
    pub fn load(&self, prefix: Option<&str>) -> Result<Vocabulary> {
        let encode_map: BTreeMap<EventKey, TokenId> = read_json(&self.encode_map_path(prefix))?;
        let decode_map: BTreeMap<TokenId, EventKey> = read_json(&self.decode_map_path(prefix))?;
        let vocab = Vocabulary::from_maps(encode_map, decode_map)?;
        debug!(dir = %self.dir.display(), prefix, size = vocab.len(), "loaded vocabulary");
        Ok(vocab)
    }

    pub fn save_settings(&self, config: &CodecConfig, prefix: Option<&str>) -> Result<()> {
        let path = self.settings_path(prefix);
        create_dir(&self.dir)?;
        let contents = toml::to_string_pretty(config).map_err(|e| CodecError::Settings {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&path, contents).map_err(|source| CodecError::Io { path, source })
    }

    /// Settings saved next to the maps, or defaults when none were saved.
    pub fn load_settings(&self, prefix: Option<&str>) -> Result<CodecConfig> {
        let path = self.settings_path(prefix);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no codec settings, using defaults");
                return Ok(CodecConfig::default());
            }
            Err(source) => return Err(CodecError::Io { path, source }),
        };
        toml::from_str(&contents).map_err(|e| CodecError::Settings {
            path,
            message: e.to_string(),
        })
    }
}

fn prefixed(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}_{}", prefix, name),
        _ => name.to_string(),
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| CodecError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| CodecError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => CodecError::MissingArtifact {
            path: path.to_path_buf(),
        },
        _ => CodecError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    serde_json::from_str(&contents).map_err(|source| CodecError::Json {
        path: path.to_path_buf(),
        source,
    })
}
