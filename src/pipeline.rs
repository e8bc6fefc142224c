// src/pipeline.rs
//
// Request orchestrator: topics -> fetchers -> composer -> synthesizer,
// one way, with explicit stage tracking and no retries. Partial source
// failures are absorbed by the fetchers; only composition and synthesis
// failures are fatal for a request.

use std::sync::Arc;

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::compose::Composer;
use crate::config::Config;
use crate::fetch::discussion::DiscussionFetcher;
use crate::fetch::news::NewsFetcher;
use crate::fetch::{PerTopicText, SourceFetcher};
use crate::llm::OllamaClient;
use crate::pacing::FixedIntervalGate;
use crate::synth::{AudioArtifact, Synthesizer};

/// Which sources a request wants. Wire spellings match the inbound API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSelector {
    News,
    Reddit,
    Both,
}

impl SourceSelector {
    pub fn wants_news(self) -> bool {
        matches!(self, SourceSelector::News | SourceSelector::Both)
    }

    pub fn wants_discussion(self) -> bool {
        matches!(self, SourceSelector::Reddit | SourceSelector::Both)
    }
}

/// Per-request lifecycle. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Fetching,
    Composing,
    Synthesizing,
    Done,
    Failed,
}

/// Fatal request outcomes. Display strings are the caller-visible messages.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to generate news summary")]
    Generation,
    #[error("Failed to generate audio file")]
    Audio,
    #[error("Error: {0}")]
    Internal(String),
}

pub struct Pipeline {
    news: Arc<dyn SourceFetcher>,
    discussion: Arc<dyn SourceFetcher>,
    composer: Composer,
    synthesizer: Synthesizer,
    language: String,
}

impl Pipeline {
    /// Wire the real components from configuration. The generation client
    /// is shared between the news fetcher and the composer; each fetcher
    /// paces its own per-topic calls through its own gate.
    pub fn from_config(cfg: &Config) -> Self {
        let generation = Arc::new(OllamaClient::new(&cfg.generation));
        let news = NewsFetcher::new(
            cfg.proxy.clone(),
            generation.clone(),
            Arc::new(FixedIntervalGate::new(cfg.topic_pacing)),
        );
        let discussion = DiscussionFetcher::new(
            cfg.discussion.clone(),
            Arc::new(FixedIntervalGate::new(cfg.topic_pacing)),
        );
        Self {
            news: Arc::new(news),
            discussion: Arc::new(discussion),
            composer: Composer::new(generation),
            synthesizer: Synthesizer::new(&cfg.tts, cfg.audio_dir.clone()),
            language: cfg.tts.language.clone(),
        }
    }

    /// Fully injected variant for tests.
    pub fn new(
        news: Arc<dyn SourceFetcher>,
        discussion: Arc<dyn SourceFetcher>,
        composer: Composer,
        synthesizer: Synthesizer,
        language: String,
    ) -> Self {
        Self {
            news,
            discussion,
            composer,
            synthesizer,
            language,
        }
    }

    /// Run one request start to finish. Cancellation is caller-driven:
    /// dropping the future abandons whatever external call is in flight.
    pub async fn run(
        &self,
        topics: &[String],
        selector: SourceSelector,
    ) -> Result<AudioArtifact, PipelineError> {
        let t0 = std::time::Instant::now();
        let mut stage = Stage::Init;

        advance(&mut stage, Stage::Fetching);
        let news_map = self.fetch_if(selector.wants_news(), &*self.news, topics).await;
        let discussion_map = self
            .fetch_if(selector.wants_discussion(), &*self.discussion, topics)
            .await;

        advance(&mut stage, Stage::Composing);
        let script = match self.composer.compose(&news_map, &discussion_map, topics).await {
            Ok(s) if !s.trim().is_empty() => s,
            Ok(_) => {
                warn!("composer returned an empty script");
                return fail(&mut stage, t0, PipelineError::Generation);
            }
            Err(err) => {
                warn!(error = %err, "composition failed");
                return fail(&mut stage, t0, PipelineError::Generation);
            }
        };

        advance(&mut stage, Stage::Synthesizing);
        let Some(artifact) = self.synthesizer.synthesize(&script, &self.language).await else {
            return fail(&mut stage, t0, PipelineError::Audio);
        };

        advance(&mut stage, Stage::Done);
        counter!("pipeline_requests_total", "outcome" => "done").increment(1);
        histogram!("pipeline_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(artifact)
    }

    /// Run the fetcher when the selector asks for it; an unselected source
    /// contributes an empty map, which the composer treats as "no data".
    async fn fetch_if(
        &self,
        wanted: bool,
        fetcher: &dyn SourceFetcher,
        topics: &[String],
    ) -> PerTopicText {
        if !wanted {
            return PerTopicText::new();
        }
        let outcome = fetcher.fetch(topics).await;
        info!(
            source = fetcher.source(),
            outcome = outcome.label(),
            topics = topics.len(),
            "source fetch finished"
        );
        counter!(
            "fetch_outcomes_total",
            "source" => fetcher.source(),
            "outcome" => outcome.label()
        )
        .increment(1);
        outcome.into_map()
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    let from = *stage;
    info!(from = ?from, to = ?next, "pipeline stage");
    *stage = next;
}

fn fail(
    stage: &mut Stage,
    t0: std::time::Instant,
    err: PipelineError,
) -> Result<AudioArtifact, PipelineError> {
    advance(stage, Stage::Failed);
    counter!("pipeline_requests_total", "outcome" => "failed").increment(1);
    histogram!("pipeline_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Err(err)
}
