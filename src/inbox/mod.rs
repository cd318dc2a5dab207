// Request selection: which mentions get a reply, and which posts to read.
//
// Works on plain data handed over by whatever fetched it. A mention asks for
// a recommendation when it starts a thread (not a reply inside a
// conversation) and arrived within the freshness window. Each author is
// answered once per run, for their first qualifying mention.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default freshness window for mentions.
pub const DEFAULT_FRESH_MINUTES: i64 = 5;

/// Default number of posts read per author.
pub const DEFAULT_MAX_BATCH: usize = 5;

/// A post that mentions the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub id: u64,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Set when the mention is a reply inside an existing conversation.
    #[serde(default)]
    pub in_reply_to: Option<u64>,
}

/// An author to answer and the mention to answer under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTarget {
    pub author: String,
    pub reply_to: u64,
}

/// Everything the offline flow needs: recent mentions plus each author's
/// recent posts (newest first).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inbox {
    pub mentions: Vec<Mention>,
    #[serde(default)]
    pub timelines: HashMap<String, Vec<String>>,
}

/// Pick the mentions that should get a reply, in input order.
pub fn fresh_requests(mentions: &[Mention], now: DateTime<Utc>, window: Duration) -> Vec<ReplyTarget> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    for mention in mentions {
        if mention.in_reply_to.is_some() {
            debug!(id = mention.id, author = %mention.author, "Skipping conversational mention");
            continue;
        }
        // A deadline past the end of representable time never expires.
        let expired = match mention.created_at.checked_add_signed(window) {
            Some(deadline) => now > deadline,
            None => window < Duration::zero(),
        };
        if expired {
            continue;
        }
        if seen.insert(mention.author.as_str()) {
            targets.push(ReplyTarget {
                author: mention.author.clone(),
                reply_to: mention.id,
            });
        }
    }

    targets
}

/// Choose up to `max` posts from an author's timeline.
///
/// Posts containing `@` are conversation, not content, and are skipped.
pub fn select_documents(timeline: &[String], max: usize) -> Vec<String> {
    timeline
        .iter()
        .filter(|post| !post.contains('@'))
        .take(max)
        .cloned()
        .collect()
}
