use std::collections::BTreeMap;
use std::io::{self, Read};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use titlematch::config::Config;
use titlematch::inbox::Inbox;
use titlematch::matching::{best_match, Tokenizer, VectorBuilder};
use titlematch::model::Model;
use titlematch::output::terminal;
use titlematch::pipeline;
use titlematch::reply::ReplyComposer;

/// Titlematch: recommend the closest title to a handful of short posts.
///
/// Posts are sliced into fixed-width character windows, weighted against a
/// vocabulary, and compared with a collection of reference titles.
#[derive(Parser)]
#[command(name = "titlematch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the loaded model's size and configuration
    Inspect,

    /// Find the best title for a batch of posts
    Match {
        /// Posts to match (reads --file or stdin when empty)
        documents: Vec<String>,

        /// Read posts from a file, one per line
        #[arg(long)]
        file: Option<PathBuf>,

        /// Override the token window width
        #[arg(long)]
        window: Option<NonZeroUsize>,
    },

    /// Show the heaviest tokens of a batch's query vector
    Embed {
        /// Posts to vectorize (reads --file or stdin when empty)
        documents: Vec<String>,

        /// Read posts from a file, one per line
        #[arg(long)]
        file: Option<PathBuf>,

        /// Override the token window width
        #[arg(long)]
        window: Option<NonZeroUsize>,

        /// Number of dimensions to show (default: 10)
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Match many batches in parallel from a JSON file ({"key": ["post", ...]})
    Batch {
        path: PathBuf,

        /// Override the token window width
        #[arg(long)]
        window: Option<NonZeroUsize>,
    },

    /// Compose replies for fresh mentions from an inbox JSON file
    Respond {
        path: PathBuf,

        /// Treat this RFC 3339 time as "now" (default: current time)
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Seed for reply phrase selection, for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Print replies as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("titlematch=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    config.require_model()?;
    let model = Model::load(&config.model_dir)?;

    match cli.command {
        Commands::Inspect => {
            terminal::display_model_summary(&model, config.window.get());
            println!("  Model dir:    {}", config.model_dir.display().to_string().dimmed());
        }

        Commands::Match {
            documents,
            file,
            window,
        } => {
            let docs = collect_documents(documents, file.as_deref())?;
            let tokenizer = tokenizer_for(&config, window);
            info!(documents = docs.len(), window = tokenizer.width(), "Matching batch");

            let builder = VectorBuilder::new(&model.vocabulary, &model.weights, tokenizer);
            match builder.build(&docs) {
                Ok(query) => {
                    let result = best_match(&query, &model.references)?;
                    let link = result.label().and_then(|title| model.link(title));
                    terminal::display_match(&result, link);
                }
                Err(err) => terminal::display_embed_error(&err),
            }
        }

        Commands::Embed {
            documents,
            file,
            window,
            top,
        } => {
            let docs = collect_documents(documents, file.as_deref())?;
            let builder =
                VectorBuilder::new(&model.vocabulary, &model.weights, tokenizer_for(&config, window));
            match builder.build(&docs) {
                Ok(query) => terminal::display_embedding(&query, &model.vocabulary, top),
                Err(err) => terminal::display_embed_error(&err),
            }
        }

        Commands::Batch { path, window } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let batches: BTreeMap<String, Vec<String>> = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            let batches: Vec<(String, Vec<String>)> = batches.into_iter().collect();

            let outcomes =
                pipeline::recommend_all(&model, tokenizer_for(&config, window), &batches)?;
            terminal::display_outcomes(&outcomes);
        }

        Commands::Respond {
            path,
            now,
            seed,
            json,
        } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let inbox: Inbox = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?;

            let settings = config.respond_settings(ReplyComposer::default());
            let now = now.unwrap_or_else(Utc::now);
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };

            let replies = pipeline::respond(&model, &settings, &inbox, now, &mut rng)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&replies)?);
            } else {
                terminal::display_replies(&replies);
            }
        }
    }

    Ok(())
}

fn tokenizer_for(config: &Config, window: Option<NonZeroUsize>) -> Tokenizer {
    window.map(Tokenizer::new).unwrap_or_else(|| config.tokenizer())
}

/// Posts from the command line, else from `--file`, else from stdin.
fn collect_documents(args: Vec<String>, file: Option<&Path>) -> Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(args);
    }

    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read posts from stdin")?;
            buf
        }
    };

    let docs = split_documents(&text);
    if docs.is_empty() {
        anyhow::bail!("No posts given. Pass them as arguments, with --file, or on stdin.");
    }
    Ok(docs)
}

/// One post per line. Only empty lines are dropped: a line of whitespace is
/// still a post, and its tokens may be in the vocabulary.
fn split_documents(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_documents_keeps_whitespace_lines() {
        let docs = split_documents("first\n\n \nlast\r\n");
        assert_eq!(docs, vec!["first", " ", "last"]);
    }

    #[test]
    fn test_collect_documents_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.txt");
        std::fs::write(&path, "\t\n").unwrap();
        let docs = collect_documents(Vec::new(), Some(&path)).unwrap();
        assert_eq!(docs, vec!["\t"]);
    }
}
