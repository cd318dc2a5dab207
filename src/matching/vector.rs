// Weighted, L2-normalized token-frequency vectors.
//
// A batch of posts becomes one vector over the vocabulary:
//
//   1. every token found in the vocabulary adds its weight to its slot
//   2. the vector is divided by the number of matched tokens (term frequency)
//   3. the vector is scaled to unit length
//
// Because the result is unit length, the inner product of two embeddings is
// their cosine similarity.

use tracing::debug;

use super::error::EmbedError;
use super::tokenizer::Tokenizer;
use super::vocabulary::{Vocabulary, WeightTable};

/// Unit-length vector aligned with a vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f64>);

impl Embedding {
    /// Scale arbitrary values to unit length. Returns `None` for an all-zero
    /// (or non-finite) vector, which has no direction.
    pub fn normalized(mut values: Vec<f64>) -> Option<Self> {
        scale_to_unit(&mut values).then_some(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Non-zero dimensions, heaviest first. Ties keep vocabulary order.
    pub fn top_dimensions(&self, k: usize) -> Vec<(usize, f64)> {
        let mut dims: Vec<(usize, f64)> = self
            .0
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, v)| *v > 0.0)
            .collect();
        dims.sort_by(|a, b| b.1.total_cmp(&a.1));
        dims.truncate(k);
        dims
    }
}

/// Builds query embeddings from document batches.
///
/// Holds only borrowed, read-only inputs, so one builder can be shared
/// across threads.
#[derive(Debug, Clone, Copy)]
pub struct VectorBuilder<'a> {
    vocabulary: &'a Vocabulary,
    weights: &'a WeightTable,
    tokenizer: Tokenizer,
}

impl<'a> VectorBuilder<'a> {
    pub fn new(vocabulary: &'a Vocabulary, weights: &'a WeightTable, tokenizer: Tokenizer) -> Self {
        Self {
            vocabulary,
            weights,
            tokenizer,
        }
    }

    /// Turn a batch of documents into a unit-length embedding.
    ///
    /// Fails with `NoVocabularyOverlap` when no token is in the vocabulary
    /// and with `ZeroWeightVector` when every matched token weighs zero.
    /// Weight magnitude alone never causes a failure: huge and tiny weights
    /// both yield a finite unit vector.
    pub fn build<S: AsRef<str>>(&self, documents: &[S]) -> Result<Embedding, EmbedError> {
        // First pass: count matches and find the heaviest matched weight.
        let mut matched: usize = 0;
        let mut scanned: usize = 0;
        let mut max_weight = 0.0_f64;
        for token in self.all_tokens(documents) {
            scanned += 1;
            if self.vocabulary.index_of(token).is_some() {
                matched += 1;
                max_weight = max_weight.max(self.weights.weight(token));
            }
        }

        if matched == 0 {
            return Err(EmbedError::NoVocabularyOverlap {
                tokens_scanned: scanned,
            });
        }
        if max_weight == 0.0 {
            return Err(EmbedError::ZeroWeightVector { matched });
        }

        // Second pass: accumulate weights relative to the heaviest one, so
        // every slot stays within [0, matched] whatever the weight magnitudes.
        let mut acc = vec![0.0_f64; self.vocabulary.len()];
        for token in self.all_tokens(documents) {
            if let Some(i) = self.vocabulary.index_of(token) {
                acc[i] += self.weights.weight(token) / max_weight;
            }
        }

        let count = matched as f64;
        for val in &mut acc {
            *val /= count;
        }

        if !scale_to_unit(&mut acc) {
            return Err(EmbedError::NonFiniteVector { matched });
        }

        debug!(
            documents = documents.len(),
            scanned, matched, "Built query embedding"
        );

        Ok(Embedding(acc))
    }

    fn all_tokens<'d, S: AsRef<str>>(
        &self,
        documents: &'d [S],
    ) -> impl Iterator<Item = &'d str> + 'd {
        let tokenizer = self.tokenizer;
        documents
            .iter()
            .flat_map(move |doc| tokenizer.tokens(doc.as_ref()))
    }
}

/// Scale `values` in place to unit L2 length.
///
/// Divides by the largest magnitude before squaring so neither huge nor
/// tiny components overflow or underflow. Returns `false`, leaving the
/// values unspecified, when the vector is all zero or not finite.
fn scale_to_unit(values: &mut [f64]) -> bool {
    let max = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if max == 0.0 || !max.is_finite() {
        return false;
    }
    for val in values.iter_mut() {
        *val /= max;
    }
    let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return false;
    }
    for val in values.iter_mut() {
        *val /= norm;
    }
    values.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::num::NonZeroUsize;

    use super::*;

    fn inputs(tokens: &[&str], weights: &[(&str, f64)]) -> (Vocabulary, WeightTable) {
        let vocab = Vocabulary::new(tokens.iter().map(|t| t.to_string()).collect()).unwrap();
        let table = WeightTable::new(
            weights
                .iter()
                .map(|(t, w)| (t.to_string(), *w))
                .collect::<HashMap<_, _>>(),
        )
        .unwrap();
        (vocab, table)
    }

    #[test]
    fn test_weighted_and_normalized() {
        let (vocab, table) = inputs(&["a", "b"], &[("a", 1.0), ("b", 2.0)]);
        let builder = VectorBuilder::new(&vocab, &table, Tokenizer::default());
        let emb = builder.build(&["ab"]).unwrap();
        let v = emb.as_slice();
        assert!((v[0] - 0.447_213_6).abs() < 1e-6, "got {}", v[0]);
        assert!((v[1] - 0.894_427_2).abs() < 1e-6, "got {}", v[1]);
    }

    #[test]
    fn test_repeated_tokens_accumulate() {
        let (vocab, table) = inputs(&["a", "b"], &[("a", 1.0), ("b", 1.0)]);
        let builder = VectorBuilder::new(&vocab, &table, Tokenizer::default());
        let emb = builder.build(&["aaab"]).unwrap();
        let v = emb.as_slice();
        // 3:1 ratio survives normalization
        assert!((v[0] / v[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_overlap() {
        let (vocab, table) = inputs(&["a"], &[("a", 1.0)]);
        let builder = VectorBuilder::new(&vocab, &table, Tokenizer::default());
        assert_eq!(
            builder.build(&["zz"]),
            Err(EmbedError::NoVocabularyOverlap { tokens_scanned: 2 })
        );
    }

    #[test]
    fn test_empty_batch_has_no_overlap() {
        let (vocab, table) = inputs(&["a"], &[("a", 1.0)]);
        let builder = VectorBuilder::new(&vocab, &table, Tokenizer::default());
        let docs: [&str; 0] = [];
        assert!(matches!(
            builder.build(&docs),
            Err(EmbedError::NoVocabularyOverlap { tokens_scanned: 0 })
        ));
    }

    #[test]
    fn test_zero_weights() {
        let (vocab, table) = inputs(&["a"], &[("a", 0.0)]);
        let builder = VectorBuilder::new(&vocab, &table, Tokenizer::default());
        assert_eq!(
            builder.build(&["a"]),
            Err(EmbedError::ZeroWeightVector { matched: 1 })
        );
    }

    #[test]
    fn test_token_without_weight_counts_but_adds_nothing() {
        let (vocab, table) = inputs(&["a", "b"], &[("a", 1.0)]);
        let builder = VectorBuilder::new(&vocab, &table, Tokenizer::default());
        let emb = builder.build(&["ab"]).unwrap();
        assert_eq!(emb.as_slice(), &[1.0, 0.0]);
        assert_eq!(
            builder.build(&["b"]),
            Err(EmbedError::ZeroWeightVector { matched: 1 })
        );
    }

    #[test]
    fn test_wider_window() {
        let (vocab, table) = inputs(&["ab", "bc"], &[("ab", 1.0), ("bc", 1.0)]);
        let tokenizer = Tokenizer::new(NonZeroUsize::new(2).unwrap());
        let builder = VectorBuilder::new(&vocab, &table, tokenizer);
        let emb = builder.build(&["abc"]).unwrap();
        let expected = 1.0 / 2.0_f64.sqrt();
        assert!((emb.as_slice()[0] - expected).abs() < 1e-12);
        assert!((emb.as_slice()[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_rejects_zero_vector() {
        assert!(Embedding::normalized(vec![0.0, 0.0]).is_none());
        let emb = Embedding::normalized(vec![3.0, 4.0]).unwrap();
        assert!((emb.as_slice()[0] - 0.6).abs() < 1e-12);
        assert!((emb.as_slice()[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_huge_weights_stay_unit_length() {
        let (vocab, table) = inputs(&["a", "b"], &[("a", 1e308), ("b", 1e308)]);
        let builder = VectorBuilder::new(&vocab, &table, Tokenizer::default());
        let emb = builder.build(&["aab"]).unwrap();
        let ss: f64 = emb.as_slice().iter().map(|v| v * v).sum();
        assert!((ss - 1.0).abs() < 1e-9, "sum of squares {ss}");
        assert!((emb.as_slice()[0] / emb.as_slice()[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_tiny_weights_are_not_zero() {
        let (vocab, table) = inputs(&["a"], &[("a", 1e-200)]);
        let builder = VectorBuilder::new(&vocab, &table, Tokenizer::default());
        let emb = builder.build(&["a"]).unwrap();
        assert!((emb.as_slice()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_handles_extreme_magnitudes() {
        let emb = Embedding::normalized(vec![1e300, 1e300]).unwrap();
        let expected = 1.0 / 2.0_f64.sqrt();
        assert!((emb.as_slice()[0] - expected).abs() < 1e-12);
        let emb = Embedding::normalized(vec![3e-200, 4e-200]).unwrap();
        assert!((emb.as_slice()[1] - 0.8).abs() < 1e-12);
        assert!(Embedding::normalized(vec![f64::INFINITY, 1.0]).is_none());
    }

    #[test]
    fn test_top_dimensions() {
        let emb = Embedding(vec![0.1, 0.0, 0.7, 0.3]);
        assert_eq!(emb.top_dimensions(2), vec![(2, 0.7), (3, 0.3)]);
        assert_eq!(emb.top_dimensions(10).len(), 3);
    }
}
