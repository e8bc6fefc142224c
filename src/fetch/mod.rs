// src/fetch/mod.rs
pub mod discussion;
pub mod news;

use std::collections::HashMap;

use async_trait::async_trait;

/// Per-topic plain-text summaries. Keys are exactly the request's topics;
/// an empty string means "no usable content" for that topic.
pub type PerTopicText = HashMap<String, String>;

/// Outcome of one source fetch. Every variant carries a map covering all
/// requested topics, so the orchestrator consumes them identically; the
/// variant only drives logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Every topic produced real content.
    Complete(PerTopicText),
    /// One or more topics were substituted with empty/placeholder text.
    Degraded(PerTopicText),
    /// The source integration is absent or failed wholesale; every entry
    /// is a placeholder or empty.
    Unavailable(PerTopicText),
}

impl FetchOutcome {
    pub fn into_map(self) -> PerTopicText {
        match self {
            FetchOutcome::Complete(m) | FetchOutcome::Degraded(m) | FetchOutcome::Unavailable(m) => {
                m
            }
        }
    }

    pub fn map(&self) -> &PerTopicText {
        match self {
            FetchOutcome::Complete(m) | FetchOutcome::Degraded(m) | FetchOutcome::Unavailable(m) => {
                m
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Complete(_) => "complete",
            FetchOutcome::Degraded(_) => "degraded",
            FetchOutcome::Unavailable(_) => "unavailable",
        }
    }
}

/// One external content source. Implementations never error upward: a
/// per-topic failure becomes a substituted entry, a whole-source failure
/// becomes `Unavailable`.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, topics: &[String]) -> FetchOutcome;
    fn source(&self) -> &'static str;
}

/// Map every topic to the same substitute text, preserving key coverage.
pub(crate) fn uniform_map<F: Fn(&str) -> String>(topics: &[String], text: F) -> PerTopicText {
    topics.iter().map(|t| (t.clone(), text(t))).collect()
}
