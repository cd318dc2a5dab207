// Reply composition: turn a matched title into a recommendation post.

use anyhow::Result;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Phrases used when no custom set is configured.
pub const DEFAULT_PHRASES: &[&str] = &[
    "How about this one?",
    "Here's a pick for you",
    "This one is my recommendation",
    "Maybe you'd like this",
];

/// Picks a phrase and formats the reply body.
#[derive(Debug, Clone)]
pub struct ReplyComposer {
    phrases: Vec<String>,
}

impl Default for ReplyComposer {
    fn default() -> Self {
        Self {
            phrases: DEFAULT_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ReplyComposer {
    pub fn new(phrases: Vec<String>) -> Result<Self> {
        if phrases.is_empty() {
            anyhow::bail!("Reply composer needs at least one phrase");
        }
        Ok(Self { phrases })
    }

    /// Format `@author phrase\ntitle`, plus `\nlink` when one is known.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        author: &str,
        title: &str,
        link: Option<&str>,
        rng: &mut R,
    ) -> String {
        // new() guarantees at least one phrase
        let phrase = self.phrases.choose(rng).map(String::as_str).unwrap_or_default();
        match link {
            Some(url) => format!("@{author} {phrase}\n{title}\n{url}"),
            None => format!("@{author} {phrase}\n{title}"),
        }
    }
}
