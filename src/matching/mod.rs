// Matching core: tokenize, vectorize, and find the closest reference.

pub mod error;
pub mod similarity;
pub mod tokenizer;
pub mod vector;
pub mod vocabulary;

pub use error::{EmbedError, MatchError, ModelError};
pub use similarity::{best_match, MatchResult, ReferenceCollection, ReferenceEntry};
pub use tokenizer::Tokenizer;
pub use vector::{Embedding, VectorBuilder};
pub use vocabulary::{Vocabulary, WeightTable};
