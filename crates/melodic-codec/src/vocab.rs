//! The learned bijection between event keys and dense token ids.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::key::EventKey;
use crate::score::{element_key, Score};
use crate::{CodecError, Result};

/// Dense token id in `[0, vocabulary.len())`.
pub type TokenId = u32;

/// Immutable mapping between event keys and token ids.
///
/// Ids are assigned in lexicographic key order, so the same set of keys
/// always yields the same vocabulary regardless of corpus order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    encode: HashMap<EventKey, TokenId>,
    decode: Vec<EventKey>,
}

impl Vocabulary {
    /// Build from every element of every score in the corpus.
    pub fn build<'a, I>(corpus: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Score>,
    {
        let mut keys = BTreeSet::new();
        let mut scores = 0usize;
        for score in corpus {
            keys.extend(score_keys(score)?);
            scores += 1;
        }
        let vocab = Self::from_keys(keys)?;
        info!(keys = vocab.len(), scores, "built vocabulary");
        Ok(vocab)
    }

    /// Same result as [`Vocabulary::build`], collecting per-score key sets
    /// in parallel and unioning them before sorting.
    pub fn build_parallel(corpus: &[Score]) -> Result<Self> {
        let keys = corpus
            .par_iter()
            .map(score_keys)
            .try_reduce(BTreeSet::new, |mut left, right| {
                left.extend(right);
                Ok(left)
            })?;
        let vocab = Self::from_keys(keys)?;
        info!(keys = vocab.len(), scores = corpus.len(), "built vocabulary in parallel");
        Ok(vocab)
    }

    /// Assign ids `0..n` to the keys in sorted order.
    pub fn from_keys(keys: BTreeSet<EventKey>) -> Result<Self> {
        if keys.is_empty() {
            return Err(CodecError::EmptyCorpus);
        }
        let decode: Vec<EventKey> = keys.into_iter().collect();
        let encode = decode
            .iter()
            .enumerate()
            .map(|(id, key)| (key.clone(), id as TokenId))
            .collect();
        Ok(Self { encode, decode })
    }

    /// Rebuild from persisted maps, refusing anything that is not an exact
    /// bijection onto `0..n`.
    pub fn from_maps(
        encode_map: BTreeMap<EventKey, TokenId>,
        decode_map: BTreeMap<TokenId, EventKey>,
    ) -> Result<Self> {
        if encode_map.len() != decode_map.len() {
            return Err(CodecError::VocabularyCardinality {
                encode: encode_map.len(),
                decode: decode_map.len(),
            });
        }
        if encode_map.is_empty() {
            return Err(CodecError::EmptyCorpus);
        }

        let size = decode_map.len();
        let mut decode: Vec<Option<EventKey>> = vec![None; size];
        for (id, key) in decode_map {
            let slot = decode
                .get_mut(id as usize)
                .ok_or(CodecError::TokenOutOfRange { id, size })?;
            *slot = Some(key);
        }
        // BTreeMap keys are unique, so n ids all below n fill every slot
        let decode: Vec<EventKey> = decode.into_iter().flatten().collect();

        for (key, &id) in &encode_map {
            if decode.get(id as usize) != Some(key) {
                return Err(CodecError::VocabularyRoundTrip {
                    key: key.to_string(),
                    id,
                });
            }
        }

        debug!(size, "loaded vocabulary maps");
        Ok(Self {
            encode: encode_map.into_iter().collect(),
            decode,
        })
    }

    /// Token for a key; `None` is a vocabulary miss, not an error.
    pub fn lookup_encode(&self, key: &str) -> Option<TokenId> {
        self.encode.get(key).copied()
    }

    /// Key for a token produced by this vocabulary.
    pub fn lookup_decode(&self, id: TokenId) -> Result<&EventKey> {
        self.decode.get(id as usize).ok_or(CodecError::TokenOutOfRange {
            id,
            size: self.decode.len(),
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.encode.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.decode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decode.is_empty()
    }

    /// Keys in id order.
    pub fn keys(&self) -> impl Iterator<Item = &EventKey> {
        self.decode.iter()
    }

    pub fn encode_map(&self) -> BTreeMap<EventKey, TokenId> {
        self.encode.iter().map(|(k, &v)| (k.clone(), v)).collect()
    }

    pub fn decode_map(&self) -> BTreeMap<TokenId, EventKey> {
        self.decode
            .iter()
            .enumerate()
            .map(|(id, key)| (id as TokenId, key.clone()))
            .collect()
    }
}

fn score_keys(score: &Score) -> Result<BTreeSet<EventKey>> {
    score
        .iter()
        .enumerate()
        .map(|(index, element)| element_key(index, element))
        .collect()
}
