// Recommendation pipeline: the steps that turn posts into replies.
//
// 1. recommend:      one document batch -> best reference title
// 2. recommend_all:  many independent batches in parallel
// 3. respond:        mentions + timelines -> composed replies
//
// Batches share nothing but the read-only model, so they run on the rayon
// pool without locking. Results come back in input order.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::inbox::{self, Inbox, ReplyTarget};
use crate::matching::{best_match, EmbedError, MatchError, MatchResult, Tokenizer, VectorBuilder};
use crate::model::Model;
use crate::reply::ReplyComposer;

/// What happened to one document batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Matched { title: String, score: f64 },
    /// The batch produced a query vector but no reference scored above zero.
    NoMatch,
    /// The batch could not be turned into a query vector.
    Skipped(EmbedError),
}

impl Outcome {
    pub fn title(&self) -> Option<&str> {
        match self {
            Outcome::Matched { title, .. } => Some(title.as_str()),
            _ => None,
        }
    }
}

/// Recommend a title for one document batch.
///
/// Embedding failures become `Outcome::Skipped`. A malformed reference
/// collection is an error.
pub fn recommend<S: AsRef<str>>(
    model: &Model,
    tokenizer: Tokenizer,
    documents: &[S],
) -> Result<Outcome, MatchError> {
    let builder = VectorBuilder::new(&model.vocabulary, &model.weights, tokenizer);
    let query = match builder.build(documents) {
        Ok(query) => query,
        Err(err) => return Ok(Outcome::Skipped(err)),
    };

    Ok(match best_match(&query, &model.references)? {
        MatchResult::Found { label, score } => Outcome::Matched {
            title: label.to_string(),
            score,
        },
        MatchResult::NoMatch => Outcome::NoMatch,
    })
}

/// Recommend titles for many independent batches in parallel.
///
/// Output order follows input order. A dimension mismatch anywhere aborts
/// the whole call.
pub fn recommend_all<K, S>(
    model: &Model,
    tokenizer: Tokenizer,
    batches: &[(K, Vec<S>)],
) -> Result<Vec<(K, Outcome)>, MatchError>
where
    K: Clone + Send + Sync,
    S: AsRef<str> + Sync,
{
    let outcomes = batches
        .par_iter()
        .map(|(key, docs)| recommend(model, tokenizer, docs).map(|o| (key.clone(), o)))
        .collect::<Result<Vec<_>, _>>()?;

    let matched = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, Outcome::Matched { .. }))
        .count();
    info!(batches = batches.len(), matched, "Processed document batches");

    Ok(outcomes)
}

/// Settings for the end-to-end reply flow.
#[derive(Debug, Clone)]
pub struct RespondSettings {
    pub tokenizer: Tokenizer,
    pub max_batch: usize,
    pub fresh_window: Duration,
    pub composer: ReplyComposer,
}

impl Default for RespondSettings {
    fn default() -> Self {
        Self {
            tokenizer: Tokenizer::default(),
            max_batch: inbox::DEFAULT_MAX_BATCH,
            fresh_window: Duration::minutes(inbox::DEFAULT_FRESH_MINUTES),
            composer: ReplyComposer::default(),
        }
    }
}

/// A reply ready to be posted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub author: String,
    pub reply_to: u64,
    pub title: String,
    pub body: String,
}

/// Run the whole flow over an inbox: pick fresh mentions, read each
/// author's recent posts, match, and compose replies.
///
/// Authors without usable posts or without a match get no reply.
pub fn respond<R: Rng + ?Sized>(
    model: &Model,
    settings: &RespondSettings,
    inbox: &Inbox,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<Reply>, MatchError> {
    let targets = inbox::fresh_requests(&inbox.mentions, now, settings.fresh_window);
    if targets.is_empty() {
        info!("No new mentions");
        return Ok(Vec::new());
    }

    let batches: Vec<(ReplyTarget, Vec<String>)> = targets
        .into_iter()
        .filter_map(|target| {
            let timeline = inbox.timelines.get(&target.author);
            let docs = timeline
                .map(|t| inbox::select_documents(t, settings.max_batch))
                .unwrap_or_default();
            if docs.is_empty() {
                warn!(author = %target.author, "No usable posts for author");
                return None;
            }
            Some((target, docs))
        })
        .collect();

    let outcomes = recommend_all(model, settings.tokenizer, &batches)?;

    let mut replies = Vec::new();
    for (target, outcome) in outcomes {
        match outcome {
            Outcome::Matched { title, score } => {
                let link = model.link(&title);
                if link.is_none() {
                    warn!(%title, "No link for matched title");
                }
                debug!(author = %target.author, %title, score, "Matched");
                let body = settings.composer.compose(&target.author, &title, link, rng);
                replies.push(Reply {
                    author: target.author,
                    reply_to: target.reply_to,
                    title,
                    body,
                });
            }
            Outcome::NoMatch => {
                info!(author = %target.author, "No matching title");
            }
            Outcome::Skipped(err) => {
                warn!(author = %target.author, error = %err, "Skipping author");
            }
        }
    }

    Ok(replies)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::inbox::Mention;
    use crate::matching::{ReferenceCollection, Vocabulary, WeightTable};

    fn model() -> Model {
        let vocabulary = Vocabulary::new(vec!["a".to_string(), "b".to_string()]).unwrap();
        let weights =
            WeightTable::new(HashMap::from([("a".to_string(), 1.0), ("b".to_string(), 2.0)]))
                .unwrap();
        let references =
            ReferenceCollection::from_pairs(vec![("X", vec![1.0, 0.0]), ("Y", vec![0.0, 1.0])])
                .unwrap();
        let links = HashMap::from([("Y".to_string(), "https://example.com/y".to_string())]);
        Model::new(vocabulary, weights, references, links).unwrap()
    }

    #[test]
    fn test_recommend_outcomes() {
        let m = model();
        let t = Tokenizer::default();
        assert_eq!(recommend(&m, t, &["ab"]).unwrap().title(), Some("Y"));
        assert_eq!(recommend(&m, t, &["aa"]).unwrap().title(), Some("X"));
        assert!(matches!(
            recommend(&m, t, &["zz"]).unwrap(),
            Outcome::Skipped(EmbedError::NoVocabularyOverlap { .. })
        ));
    }

    #[test]
    fn test_recommend_all_keeps_order() {
        let m = model();
        let batches: Vec<(u32, Vec<&str>)> = (0..64)
            .map(|i| (i, vec![if i % 2 == 0 { "a" } else { "b" }]))
            .collect();
        let outcomes = recommend_all(&m, Tokenizer::default(), &batches).unwrap();
        assert_eq!(outcomes.len(), 64);
        for (i, (key, outcome)) in outcomes.iter().enumerate() {
            assert_eq!(*key as usize, i);
            let expected = if i % 2 == 0 { "X" } else { "Y" };
            assert_eq!(outcome.title(), Some(expected));
        }
    }

    #[test]
    fn test_recommend_all_propagates_dimension_mismatch() {
        let mut m = model();
        m.references =
            ReferenceCollection::from_pairs(vec![("bad", vec![1.0, 0.0, 0.0])]).unwrap();
        let batches = vec![("u", vec!["a"])];
        assert!(matches!(
            recommend_all(&m, Tokenizer::default(), &batches),
            Err(MatchError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_respond_end_to_end() {
        let m = model();
        let now: DateTime<Utc> = "2024-05-01T12:10:00Z".parse().unwrap();
        let inbox = Inbox {
            mentions: vec![
                Mention {
                    id: 11,
                    author: "fan".to_string(),
                    text: "@bot pick one".to_string(),
                    created_at: "2024-05-01T12:08:00Z".parse().unwrap(),
                    in_reply_to: None,
                },
                Mention {
                    id: 12,
                    author: "quiet".to_string(),
                    text: "@bot hello".to_string(),
                    created_at: "2024-05-01T12:09:00Z".parse().unwrap(),
                    in_reply_to: None,
                },
            ],
            timelines: HashMap::from([
                ("fan".to_string(), vec!["@someone a".to_string(), "bbb".to_string()]),
                ("quiet".to_string(), vec!["zzz".to_string()]),
            ]),
        };
        let settings = RespondSettings {
            composer: ReplyComposer::new(vec!["Listen".to_string()]).unwrap(),
            ..RespondSettings::default()
        };

        let replies = respond(&m, &settings, &inbox, now, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].author, "fan");
        assert_eq!(replies[0].reply_to, 11);
        assert_eq!(replies[0].body, "@fan Listen\nY\nhttps://example.com/y");
    }
}
