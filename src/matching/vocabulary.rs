// Vocabulary and weight table: the static inputs that define vector space.

use std::collections::HashMap;

use super::error::ModelError;

/// Ordered, distinct set of tokens. Position `i` is dimension `i` of every
/// embedding built against this vocabulary.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary, rejecting repeated tokens.
    pub fn new(tokens: Vec<String>) -> Result<Self, ModelError> {
        let mut index = HashMap::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if let Some(&first) = index.get(token) {
                return Err(ModelError::DuplicateToken {
                    token: token.clone(),
                    first,
                    second: i,
                });
            }
            index.insert(token.clone(), i);
        }
        Ok(Self { tokens, index })
    }

    /// Dimensionality `D` of embeddings over this vocabulary.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// Token → non-negative weight (typically an inverse document frequency).
///
/// Tokens missing from the table weigh 0.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    weights: HashMap<String, f64>,
}

impl WeightTable {
    pub fn new(weights: HashMap<String, f64>) -> Result<Self, ModelError> {
        if let Some((token, &weight)) = weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ModelError::InvalidWeight {
                token: token.clone(),
                weight,
            });
        }
        Ok(Self { weights })
    }

    pub fn weight(&self, token: &str) -> f64 {
        self.weights.get(token).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.weights.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
