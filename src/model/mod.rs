// Static model inputs: vocabulary, weights, reference titles and links.
//
// Everything is read from plain JSON files in one directory and held
// read-only for the run:
//
//   vocabulary.json  ["a", "b", ...]                 ordered, distinct
//   weights.json     {"a": 1.2, "b": 0.4, ...}       token -> weight
//   references.json  {"Title": [0.1, 0.0, ...], ...} label -> vector, order kept
//   links.json       {"Title": "https://...", ...}   optional
//
// Files are stored in a platform-appropriate directory
// (~/.local/share/titlematch/model/ on Linux) unless configured otherwise.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::matching::{ModelError, ReferenceCollection, Vocabulary, WeightTable};

pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const WEIGHTS_FILE: &str = "weights.json";
pub const REFERENCES_FILE: &str = "references.json";
pub const LINKS_FILE: &str = "links.json";

/// Returns the default model directory.
/// Uses the platform data directory: ~/.local/share/titlematch/model/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("titlematch")
        .join("model")
}

/// Check whether the three required model files exist.
pub fn model_files_present(dir: &Path) -> bool {
    [VOCABULARY_FILE, WEIGHTS_FILE, REFERENCES_FILE]
        .iter()
        .all(|f| dir.join(f).exists())
}

/// All static inputs for one run.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub vocabulary: Vocabulary,
    pub weights: WeightTable,
    pub references: ReferenceCollection,
    /// Title -> link, used when composing replies. May be empty.
    pub links: HashMap<String, String>,
}

impl Model {
    /// Assemble a model from in-memory parts, checking that every reference
    /// vector has the vocabulary's dimension.
    pub fn new(
        vocabulary: Vocabulary,
        weights: WeightTable,
        references: ReferenceCollection,
        links: HashMap<String, String>,
    ) -> Result<Self, ModelError> {
        references.check_dimension(vocabulary.len())?;
        Ok(Self {
            vocabulary,
            weights,
            references,
            links,
        })
    }

    /// Load and validate all model files from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let tokens: Vec<String> = read_json(&dir.join(VOCABULARY_FILE))?;
        let vocabulary = Vocabulary::new(tokens)
            .with_context(|| format!("Invalid vocabulary in {}", dir.display()))?;

        let raw_weights: HashMap<String, f64> = read_json(&dir.join(WEIGHTS_FILE))?;
        let weights = WeightTable::new(raw_weights)
            .with_context(|| format!("Invalid weight table in {}", dir.display()))?;

        let references: ReferenceCollection = read_json(&dir.join(REFERENCES_FILE))?;

        let links_path = dir.join(LINKS_FILE);
        let links: HashMap<String, String> = if links_path.exists() {
            read_json(&links_path)?
        } else {
            HashMap::new()
        };

        let unweighted = vocabulary
            .tokens()
            .iter()
            .filter(|t| !weights.contains(t))
            .count();
        if unweighted > 0 {
            warn!(
                unweighted,
                "Vocabulary tokens without a weight will contribute nothing"
            );
        }

        let model = Self::new(vocabulary, weights, references, links)
            .with_context(|| format!("Reference vectors in {} do not fit the vocabulary", dir.display()))?;

        info!(
            dim = model.vocabulary.len(),
            references = model.references.len(),
            links = model.links.len(),
            "Loaded model from {}",
            dir.display()
        );

        Ok(model)
    }

    pub fn link(&self, title: &str) -> Option<&str> {
        self.links.get(title).map(String::as_str)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        anyhow::bail!(
            "Model file not found: {}\nSet TITLEMATCH_MODEL_DIR to the directory holding the model files.",
            path.display()
        );
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}
