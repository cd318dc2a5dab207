// Colored terminal output for model summaries, matches and replies.
//
// main.rs delegates all printing here so the commands stay short.

use colored::Colorize;

use crate::matching::{Embedding, EmbedError, MatchResult, Vocabulary};
use crate::model::Model;
use crate::pipeline::{Outcome, Reply};

/// Display the size and shape of a loaded model.
pub fn display_model_summary(model: &Model, window: usize) {
    println!("\n{}", "=== Model ===".bold());
    println!("  Vocabulary:   {} tokens", model.vocabulary.len());
    println!("  Weights:      {} entries", model.weights.len());
    println!("  References:   {} titles", model.references.len());
    println!("  Links:        {}", model.links.len());
    println!("  Window width: {window}");

    let unlinked = model
        .references
        .iter()
        .filter(|e| model.link(&e.label).is_none())
        .count();
    if unlinked > 0 {
        println!(
            "  {} {} titles have no link",
            "~".yellow(),
            unlinked
        );
    }
}

/// Display the result of matching one batch.
pub fn display_match(result: &MatchResult<'_>, link: Option<&str>) {
    match result {
        MatchResult::Found { label, score } => {
            println!("\n{} {}", "Best match:".bold(), label.bright_green().bold());
            println!("  Score: {score:.4}");
            if let Some(url) = link {
                println!("  Link:  {}", url.dimmed());
            }
        }
        MatchResult::NoMatch => {
            println!("\n{}", "No match: no reference title scored above zero.".yellow());
        }
    }
}

/// Explain why a batch could not be vectorized.
pub fn display_embed_error(err: &EmbedError) {
    let hint = match err {
        EmbedError::NoVocabularyOverlap { .. } => "none of the text is in the vocabulary",
        EmbedError::ZeroWeightVector { .. } => "every matched token has zero weight",
        EmbedError::NonFiniteVector { .. } => "the weights produced an unusable vector",
    };
    println!("\n{} {hint}", "Skipped:".red().bold());
    println!("  {}", err.to_string().dimmed());
}

/// Display the heaviest dimensions of an embedding as a bar chart.
pub fn display_embedding(embedding: &Embedding, vocabulary: &Vocabulary, top: usize) {
    let dims = embedding.top_dimensions(top);
    println!(
        "\n{}",
        format!(
            "=== Top {} of {} dimensions ===",
            dims.len(),
            embedding.dim()
        )
        .bold()
    );
    println!();

    let bar_width: usize = 20;
    for (rank, (index, value)) in dims.iter().enumerate() {
        let token = vocabulary.token(*index).unwrap_or("?");
        let filled = (value * bar_width as f64).round() as usize;
        let bar = format!(
            "[{}{}]",
            "=".repeat(filled.min(bar_width)),
            " ".repeat(bar_width.saturating_sub(filled))
        );
        println!(
            "  {:>2}. {:<12} {} {:.4}",
            rank + 1,
            format!("{token:?}").bold(),
            bar.bright_blue(),
            value
        );
    }
}

/// Display per-batch outcomes from a parallel run.
pub fn display_outcomes(outcomes: &[(String, Outcome)]) {
    if outcomes.is_empty() {
        println!("No batches to process.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Recommendations ({} batches) ===", outcomes.len()).bold()
    );
    println!();

    for (key, outcome) in outcomes {
        match outcome {
            Outcome::Matched { title, score } => {
                println!("  {:<24} {} ({score:.3})", key, title.bright_green())
            }
            Outcome::NoMatch => println!("  {:<24} {}", key, "no match".yellow()),
            Outcome::Skipped(err) => {
                println!("  {:<24} {} {}", key, "skipped".red(), err.to_string().dimmed())
            }
        }
    }

    let matched = outcomes
        .iter()
        .filter(|(_, o)| o.title().is_some())
        .count();
    println!();
    println!("  {matched}/{} batches matched", outcomes.len());
}

/// Display composed replies.
pub fn display_replies(replies: &[Reply]) {
    if replies.is_empty() {
        println!("No replies to send.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Replies ({}) ===", replies.len()).bold()
    );
    for reply in replies {
        println!();
        println!(
            "  {} @{} (mention {})",
            "->".bright_green(),
            reply.author.bold(),
            reply.reply_to
        );
        for line in reply.body.lines() {
            println!("     {}", super::truncate_chars(line, 140));
        }
    }
}
