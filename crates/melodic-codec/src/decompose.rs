//! Splitting an unknown chord into known sub-chords.
//!
//! The search order is part of the codec's observable behavior: for a chord
//! with several valid partitions, the one returned is the first found when
//! candidate subsets are tried by decreasing size, and within a size in
//! ascending index-combination order over the chord's own pitch order.

use std::collections::{BTreeSet, HashSet};

use crate::key::{EventKey, DELIMITER};
use crate::vocab::Vocabulary;

/// Anything that can answer "is this key known?".
pub trait KeySet {
    fn contains_key(&self, key: &str) -> bool;
}

impl KeySet for Vocabulary {
    fn contains_key(&self, key: &str) -> bool {
        self.contains(key)
    }
}

impl KeySet for HashSet<String> {
    fn contains_key(&self, key: &str) -> bool {
        self.contains(key)
    }
}

impl KeySet for HashSet<&str> {
    fn contains_key(&self, key: &str) -> bool {
        self.contains(key)
    }
}

impl KeySet for BTreeSet<EventKey> {
    fn contains_key(&self, key: &str) -> bool {
        self.contains(key)
    }
}

/// Partition `key` into two or more known keys whose parts together are
/// exactly the parts of `key`.
///
/// Returns `None` when no partition exists; the caller decides what to do
/// with an unrepresentable event. Each returned sub-key keeps the relative
/// order its pitches had in `key`.
pub fn decompose<K: KeySet + ?Sized>(key: &str, known: &K) -> Option<Vec<EventKey>> {
    let parts: Vec<&str> = key.split(DELIMITER).collect();
    let mut failed = HashSet::new();
    search(&parts, known, &mut failed)
}

/// `failed` holds joined part lists already shown to have no partition.
/// Many candidate paths reach the same remainder; each is searched once.
fn search<K: KeySet + ?Sized>(
    parts: &[&str],
    known: &K,
    failed: &mut HashSet<String>,
) -> Option<Vec<EventKey>> {
    let n = parts.len();
    let whole = EventKey::from_parts(parts).as_str().to_string();
    if failed.contains(&whole) {
        return None;
    }

    // Every known subset across all sizes, largest first
    let mut candidates: Vec<Vec<usize>> = Vec::new();
    for size in (1..n).rev() {
        for indices in Combinations::new(n, size) {
            if known.contains_key(&join(parts, &indices)) {
                candidates.push(indices);
            }
        }
    }

    for indices in &candidates {
        let remainder = complement(n, indices);
        let remainder_key = join(parts, &remainder);
        if known.contains_key(&remainder_key) {
            return Some(vec![
                EventKey::from(join(parts, indices)),
                EventKey::from(remainder_key),
            ]);
        }
    }

    for indices in &candidates {
        let remainder = complement(n, indices);
        let remainder_parts: Vec<&str> = remainder.iter().map(|&i| parts[i]).collect();
        if let Some(rest) = search(&remainder_parts, known, failed) {
            let mut split = Vec::with_capacity(rest.len() + 1);
            split.push(EventKey::from(join(parts, indices)));
            split.extend(rest);
            return Some(split);
        }
    }

    failed.insert(whole);
    None
}

fn join(parts: &[&str], indices: &[usize]) -> String {
    let selected: Vec<&str> = indices.iter().map(|&i| parts[i]).collect();
    EventKey::from_parts(&selected).as_str().to_string()
}

/// Indices in `0..n` that are not in the sorted `taken`.
fn complement(n: usize, taken: &[usize]) -> Vec<usize> {
    (0..n).filter(|i| taken.binary_search(i).is_err()).collect()
}

/// k-combinations of `0..n` as ascending index vectors, in lexicographic order.
struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();

        let k = self.indices.len();
        // Rightmost position that can still move right
        match (0..k).rev().find(|&i| self.indices[i] < i + self.n - k) {
            Some(i) => {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }

        Some(current)
    }
}
