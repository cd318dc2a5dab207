use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::Duration;

use crate::inbox::{DEFAULT_FRESH_MINUTES, DEFAULT_MAX_BATCH};
use crate::matching::Tokenizer;
use crate::pipeline::RespondSettings;
use crate::reply::ReplyComposer;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory containing the model JSON files
    pub model_dir: PathBuf,
    /// Token window width in characters (TITLEMATCH_WINDOW, default 1)
    pub window: NonZeroUsize,
    /// Posts read per author (TITLEMATCH_MAX_BATCH, default 5)
    pub max_batch: usize,
    /// Freshness window for mentions (TITLEMATCH_FRESH_MINUTES, default 5 minutes)
    pub fresh_window: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every setting has a default; a value that is present but malformed
    /// is an error rather than silently replaced.
    pub fn load() -> Result<Self> {
        let model_dir = env::var("TITLEMATCH_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::model::default_model_dir());

        let window = parse_var("TITLEMATCH_WINDOW", NonZeroUsize::MIN)?;
        let max_batch = parse_var("TITLEMATCH_MAX_BATCH", DEFAULT_MAX_BATCH)?;
        let fresh_window =
            fresh_window(parse_var("TITLEMATCH_FRESH_MINUTES", DEFAULT_FRESH_MINUTES)?)?;

        Ok(Self {
            model_dir,
            window,
            max_batch,
            fresh_window,
        })
    }

    /// Check that the model files are present.
    /// Call this before any operation that matches documents.
    pub fn require_model(&self) -> Result<()> {
        if !crate::model::model_files_present(&self.model_dir) {
            anyhow::bail!(
                "Model files not found in {}\n\
                 Expected vocabulary.json, weights.json and references.json.\n\
                 Set TITLEMATCH_MODEL_DIR to point at them (see .env.example).",
                self.model_dir.display()
            );
        }
        Ok(())
    }

    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new(self.window)
    }

    pub fn respond_settings(&self, composer: ReplyComposer) -> RespondSettings {
        RespondSettings {
            tokenizer: self.tokenizer(),
            max_batch: self.max_batch,
            fresh_window: self.fresh_window,
            composer,
        }
    }
}

fn fresh_window(minutes: i64) -> Result<Duration> {
    if minutes < 0 {
        anyhow::bail!("TITLEMATCH_FRESH_MINUTES must not be negative, got {minutes}");
    }
    Duration::try_minutes(minutes)
        .with_context(|| format!("TITLEMATCH_FRESH_MINUTES is out of range, got {minutes}"))
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {name}: {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable name so parallel tests don't race.

    #[test]
    fn test_parse_var_default_when_unset() {
        let v: usize = parse_var("TITLEMATCH_TEST_UNSET_VAR", 5).unwrap();
        assert_eq!(v, 5);
    }

    #[test]
    fn test_parse_var_reads_value() {
        env::set_var("TITLEMATCH_TEST_WINDOW_OK", " 3 ");
        let v: NonZeroUsize = parse_var("TITLEMATCH_TEST_WINDOW_OK", NonZeroUsize::MIN).unwrap();
        assert_eq!(v.get(), 3);
    }

    #[test]
    fn test_parse_var_rejects_zero_window() {
        env::set_var("TITLEMATCH_TEST_WINDOW_ZERO", "0");
        let result: Result<NonZeroUsize> =
            parse_var("TITLEMATCH_TEST_WINDOW_ZERO", NonZeroUsize::MIN);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("TITLEMATCH_TEST_WINDOW_ZERO"));
    }

    #[test]
    fn test_fresh_window_bounds() {
        assert_eq!(fresh_window(5).unwrap(), Duration::minutes(5));
        assert_eq!(fresh_window(0).unwrap(), Duration::zero());

        let err = fresh_window(-1).unwrap_err();
        assert!(err.to_string().contains("TITLEMATCH_FRESH_MINUTES"));

        // Parses as i64 but no Duration can hold it.
        let err = fresh_window(i64::MAX).unwrap_err();
        assert!(err.to_string().contains("TITLEMATCH_FRESH_MINUTES"), "got {err}");
    }

    #[test]
    fn test_require_model_on_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            model_dir: dir.path().to_path_buf(),
            window: NonZeroUsize::MIN,
            max_batch: 5,
            fresh_window: Duration::minutes(5),
        };
        assert!(config.require_model().is_err());
        assert_eq!(config.tokenizer().width(), 1);
    }
}
