// Exhaustive best-match search over a labeled reference collection.
//
// The collection is small, so every entry is scored with a plain inner
// product. Scores must be strictly greater than the current best to win:
// the first entry to reach the top score keeps it, and a best score of
// exactly 0.0 (including an empty collection) means no match.

use std::collections::HashSet;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use super::error::{MatchError, ModelError};
use super::vector::Embedding;

/// One labeled reference vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub label: String,
    pub vector: Vec<f64>,
}

/// Ordered sequence of labeled reference vectors.
///
/// Order matters: it decides ties. When loaded from a JSON object the order
/// of keys in the file is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceCollection {
    entries: Vec<ReferenceEntry>,
}

impl ReferenceCollection {
    /// Build from `(label, vector)` pairs, rejecting repeated labels.
    pub fn from_pairs<I, L>(pairs: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (L, Vec<f64>)>,
        L: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for (label, vector) in pairs {
            let label = label.into();
            if !seen.insert(label.clone()) {
                return Err(ModelError::DuplicateLabel(label));
            }
            entries.push(ReferenceEntry { label, vector });
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Verify every entry has exactly `dim` dimensions.
    pub fn check_dimension(&self, dim: usize) -> Result<(), MatchError> {
        match self.entries.iter().find(|e| e.vector.len() != dim) {
            Some(entry) => Err(MatchError::DimensionMismatch {
                label: entry.label.clone(),
                expected: dim,
                actual: entry.vector.len(),
            }),
            None => Ok(()),
        }
    }
}

impl<'a> IntoIterator for &'a ReferenceCollection {
    type Item = &'a ReferenceEntry;
    type IntoIter = std::slice::Iter<'a, ReferenceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'de> Deserialize<'de> for ReferenceCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = ReferenceCollection;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping labels to arrays of numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs: Vec<(String, Vec<f64>)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((label, vector)) = map.next_entry::<String, Vec<f64>>()? {
                    pairs.push((label, vector));
                }
                ReferenceCollection::from_pairs(pairs).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// Outcome of a successful scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchResult<'a> {
    Found { label: &'a str, score: f64 },
    NoMatch,
}

impl<'a> MatchResult<'a> {
    pub fn label(&self) -> Option<&'a str> {
        match self {
            MatchResult::Found { label, .. } => Some(*label),
            MatchResult::NoMatch => None,
        }
    }
}

/// Inner product of two equal-length slices.
pub fn inner_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Find the reference entry most similar to `query`.
///
/// Any entry whose dimension differs from the query aborts the scan with
/// `DimensionMismatch`; no partial result is returned.
pub fn best_match<'r>(
    query: &Embedding,
    references: &'r ReferenceCollection,
) -> Result<MatchResult<'r>, MatchError> {
    let query = query.as_slice();
    let mut best_score = 0.0_f64;
    let mut best_label: Option<&'r str> = None;

    for entry in references {
        if entry.vector.len() != query.len() {
            return Err(MatchError::DimensionMismatch {
                label: entry.label.clone(),
                expected: query.len(),
                actual: entry.vector.len(),
            });
        }
        let score = inner_product(query, &entry.vector);
        if score > best_score {
            best_score = score;
            best_label = Some(&entry.label);
        }
    }

    // best_label is only ever set by a score above zero
    Ok(match best_label {
        Some(label) => MatchResult::Found {
            label,
            score: best_score,
        },
        None => MatchResult::NoMatch,
    })
}
