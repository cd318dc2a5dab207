// Error types for the matching core.
//
// Each failure the core can report has its own variant so callers can tell
// "nothing matched" apart from "could not build a query vector" apart from
// "the reference data is broken". None of these are ever folded into a
// default value.

use thiserror::Error;

/// Why a document batch could not be turned into an embedding.
///
/// All variants are recoverable: the batch is unusable, the caller skips it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbedError {
    /// No token from the batch appears in the vocabulary.
    #[error("no vocabulary overlap: {tokens_scanned} tokens scanned, none in vocabulary")]
    NoVocabularyOverlap { tokens_scanned: usize },

    /// Tokens matched, but every matched token carries zero weight.
    #[error("zero weight vector: {matched} matched tokens all carry zero weight")]
    ZeroWeightVector { matched: usize },

    /// The weighted vector could not be scaled to a finite unit length.
    #[error("non-finite vector: {matched} matched tokens produced no finite direction")]
    NonFiniteVector { matched: usize },
}

/// Failure while scanning a reference collection.
///
/// A dimension mismatch means the reference data was prepared against a
/// different vocabulary. It is not recoverable at runtime.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("dimension mismatch for '{label}': query has {expected} dimensions, reference has {actual}")]
    DimensionMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}

/// Invalid static inputs (vocabulary, weight table, reference collection).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("duplicate vocabulary token '{token}' at positions {first} and {second}")]
    DuplicateToken {
        token: String,
        first: usize,
        second: usize,
    },

    #[error("invalid weight {weight} for token '{token}': weights must be finite and non-negative")]
    InvalidWeight { token: String, weight: f64 },

    #[error("duplicate reference label '{0}'")]
    DuplicateLabel(String),

    #[error("reference '{label}' has {actual} dimensions, vocabulary has {expected}")]
    DimensionMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}

impl From<MatchError> for ModelError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::DimensionMismatch {
                label,
                expected,
                actual,
            } => ModelError::DimensionMismatch {
                label,
                expected,
                actual,
            },
        }
    }
}
