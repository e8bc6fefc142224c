// tests/pipeline_e2e.rs
//
// End-to-end pipeline tests with the external collaborators faked at the
// trait seams: per-topic degradation, terminal outcomes, and the exact
// caller-visible failure messages.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use newsreel::compose::{Composer, EMPTY_CONTENT_SENTINEL};
use newsreel::fetch::discussion::DiscussionFetcher;
use newsreel::fetch::news::{NewsFetcher, PageFetcher};
use newsreel::fetch::{FetchOutcome, PerTopicText, SourceFetcher};
use newsreel::llm::{GenerationClient, GenerationOptions};
use newsreel::pacing::FixedIntervalGate;
use newsreel::pipeline::{Pipeline, PipelineError, SourceSelector};
use newsreel::synth::{SpeechEngine, Synthesizer};

struct RecordingGeneration {
    calls: AtomicUsize,
    reply: Option<String>,
}

impl RecordingGeneration {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reply: Some(reply.to_string()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reply: None,
        })
    }
}

#[async_trait]
impl GenerationClient for RecordingGeneration {
    async fn generate(&self, _prompt: &str, _options: GenerationOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(r) => Ok(r.clone()),
            None => bail!("generation endpoint unreachable"),
        }
    }
    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Serves a headline page for every topic except the ones it is told to
/// fail on.
struct FlakyPages {
    fail_for: Vec<String>,
}

#[async_trait]
impl PageFetcher for FlakyPages {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        for bad in &self.fail_for {
            if url.contains(&urlencoding::encode(bad).to_string()) {
                bail!("proxy returned 502");
            }
        }
        Ok("<div>Big headline</div><a>More</a>".to_string())
    }
}

struct FixedEngine {
    bytes: Vec<u8>,
}

#[async_trait]
impl SpeechEngine for FixedEngine {
    async fn speak(&self, _text: &str, _language: &str) -> Result<Vec<u8>> {
        if self.bytes.is_empty() {
            bail!("engine offline");
        }
        Ok(self.bytes.clone())
    }
}

struct MapFetcher {
    map: PerTopicText,
}

#[async_trait]
impl SourceFetcher for MapFetcher {
    async fn fetch(&self, _topics: &[String]) -> FetchOutcome {
        FetchOutcome::Complete(self.map.clone())
    }
    fn source(&self) -> &'static str {
        "map"
    }
}

fn gate() -> Arc<FixedIntervalGate> {
    Arc::new(FixedIntervalGate::new(Duration::ZERO))
}

fn topics(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn map_of(entries: &[(&str, &str)]) -> PerTopicText {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn one_failing_topic_still_covers_all_keys_and_request_completes() {
    let generation = RecordingGeneration::replying("A fine evening broadcast.");
    let news = NewsFetcher::with_page_fetcher(
        Arc::new(FlakyPages {
            fail_for: vec!["beta".to_string()],
        }),
        generation.clone(),
        gate(),
    );
    let three = topics(&["alpha", "beta", "gamma"]);

    // Fetcher level: the failing topic is present but empty.
    let outcome = news.fetch(&three).await;
    assert!(matches!(outcome, FetchOutcome::Degraded(_)));
    let fetched = outcome.map();
    assert_eq!(fetched.len(), 3);
    assert!(fetched["beta"].is_empty());
    assert!(!fetched["alpha"].is_empty());
    assert!(!fetched["gamma"].is_empty());

    // Orchestrator level: the request still reaches composition and
    // finishes, the degraded topic contributing nothing.
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        Arc::new(news),
        Arc::new(DiscussionFetcher::new(None, gate())),
        Composer::new(generation.clone()),
        Synthesizer::with_engine(
            Arc::new(FixedEngine { bytes: vec![1] }),
            dir.path().to_path_buf(),
        ),
        "en".to_string(),
    );
    let artifact = pipeline.run(&three, SourceSelector::News).await.unwrap();
    assert!(!artifact.bytes.is_empty());
    assert!(generation.calls.load(Ordering::SeqCst) >= 3); // per-topic summaries + final compose
}

#[tokio::test]
async fn both_sources_mocked_reach_done_with_an_artifact() {
    let generation = RecordingGeneration::replying("Here is the news.");
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        Arc::new(MapFetcher {
            map: map_of(&[("Topic", "A news item.")]),
        }),
        Arc::new(MapFetcher {
            map: map_of(&[("Topic", "A lively thread.")]),
        }),
        Composer::new(generation),
        Synthesizer::with_engine(
            Arc::new(FixedEngine { bytes: vec![9, 9] }),
            dir.path().to_path_buf(),
        ),
        "en".to_string(),
    );

    let artifact = pipeline
        .run(&topics(&["Topic"]), SourceSelector::Both)
        .await
        .unwrap();
    assert_eq!(artifact.content_type, "audio/mpeg");
    assert_eq!(artifact.bytes, vec![9, 9]);
    assert!(artifact.path.exists());
}

#[tokio::test]
async fn generation_failure_reports_the_exact_summary_message() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        Arc::new(MapFetcher {
            map: map_of(&[("Topic", "A news item.")]),
        }),
        Arc::new(MapFetcher {
            map: PerTopicText::new(),
        }),
        Composer::new(RecordingGeneration::failing()),
        Synthesizer::with_engine(
            Arc::new(FixedEngine { bytes: vec![1] }),
            dir.path().to_path_buf(),
        ),
        "en".to_string(),
    );

    let err = pipeline
        .run(&topics(&["Topic"]), SourceSelector::Both)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Generation));
    assert_eq!(err.to_string(), "Failed to generate news summary");
}

#[tokio::test]
async fn no_content_narrates_the_sentinel_without_generation() {
    let generation = RecordingGeneration::replying("must not be called");
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        Arc::new(MapFetcher {
            map: map_of(&[("Topic", "")]),
        }),
        Arc::new(MapFetcher {
            map: PerTopicText::new(),
        }),
        Composer::new(generation.clone()),
        Synthesizer::with_engine(
            Arc::new(FixedEngine { bytes: vec![5] }),
            dir.path().to_path_buf(),
        ),
        "en".to_string(),
    );

    // The sentinel is a valid script, so the request still produces audio;
    // the generation endpoint is never consulted.
    let artifact = pipeline
        .run(&topics(&["Topic"]), SourceSelector::Both)
        .await
        .unwrap();
    assert!(!artifact.bytes.is_empty());
    assert_eq!(generation.calls.load(Ordering::SeqCst), 0);
    assert!(!EMPTY_CONTENT_SENTINEL.is_empty());
}

#[tokio::test]
async fn synthesis_failure_reports_the_exact_audio_message() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        Arc::new(MapFetcher {
            map: map_of(&[("Topic", "A news item.")]),
        }),
        Arc::new(MapFetcher {
            map: PerTopicText::new(),
        }),
        Composer::new(RecordingGeneration::replying("Here is the news.")),
        Synthesizer::with_engine(
            Arc::new(FixedEngine { bytes: vec![] }),
            dir.path().to_path_buf(),
        ),
        "en".to_string(),
    );

    let err = pipeline
        .run(&topics(&["Topic"]), SourceSelector::Both)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Audio));
    assert_eq!(err.to_string(), "Failed to generate audio file");
}

#[tokio::test]
async fn selector_limits_which_sources_contribute() {
    let generation = RecordingGeneration::replying("News only tonight.");
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        Arc::new(MapFetcher {
            map: map_of(&[("Topic", "A news item.")]),
        }),
        Arc::new(MapFetcher {
            map: map_of(&[("Topic", "A lively thread.")]),
        }),
        Composer::new(generation.clone()),
        Synthesizer::with_engine(
            Arc::new(FixedEngine { bytes: vec![1] }),
            dir.path().to_path_buf(),
        ),
        "en".to_string(),
    );

    // "reddit" selector must not consult the news map: with an empty
    // discussion map it would sentinel, with content it composes.
    let artifact = pipeline
        .run(&topics(&["Topic"]), SourceSelector::Reddit)
        .await
        .unwrap();
    assert!(!artifact.bytes.is_empty());
    assert_eq!(generation.calls.load(Ordering::SeqCst), 1);
}
