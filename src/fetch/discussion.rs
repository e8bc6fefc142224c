// src/fetch/discussion.rs
//
// Discussion source: per topic, query the discussion-site search API for
// recent threads and template the top results into a short summary line.
// The integration is optional; whether it is available is decided once at
// startup from configuration, never probed at call time.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use metrics::counter;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::DiscussionConfig;
use crate::fetch::{uniform_map, FetchOutcome, PerTopicText, SourceFetcher};
use crate::pacing::FixedIntervalGate;

/// Only threads created within this window are summarized.
const RECENCY_WINDOW_DAYS: i64 = 14;
/// Ranked candidates considered per topic.
const CANDIDATES_PER_TOPIC: usize = 5;
/// Candidates surfaced in the summary text.
const SURFACED_PER_TOPIC: usize = 2;

/// One ranked search hit from the discussion site.
#[derive(Debug, Clone)]
pub struct DiscussionItem {
    pub title: String,
    pub score: i64,
    pub comments: u64,
    pub snippet: String,
    pub created_at: DateTime<Utc>,
}

/// Search seam over the discussion-site API; tests inject a fake.
#[async_trait]
pub trait DiscussionSource: Send + Sync {
    /// Return up to `limit` items ranked by relevance for `topic`.
    async fn search(&self, topic: &str, limit: usize) -> Result<Vec<DiscussionItem>>;
}

pub type DynDiscussionSource = Arc<dyn DiscussionSource>;

/// Reddit-style public search endpoint (`/search.json`).
pub struct RedditSearch {
    http: reqwest::Client,
    api_url: String,
}

impl RedditSearch {
    pub fn new(cfg: &DiscussionConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_url: cfg.api_url.clone(),
        }
    }
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: Post,
}

#[derive(Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    selftext: String,
    created_utc: f64,
}

#[async_trait]
impl DiscussionSource for RedditSearch {
    async fn search(&self, topic: &str, limit: usize) -> Result<Vec<DiscussionItem>> {
        let limit = limit.to_string();
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[
                ("q", topic),
                ("sort", "relevance"),
                ("t", "month"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .context("sending discussion search request")?;
        if !resp.status().is_success() {
            bail!("discussion API returned {}", resp.status());
        }
        let listing: Listing = resp.json().await.context("parsing discussion listing")?;
        Ok(items_from_listing(listing))
    }
}

/// An item without a resolvable creation time is dropped: defaulting it to
/// "now" would smuggle malformed entries into the recency window.
fn item_timestamp(created_utc: f64) -> Option<DateTime<Utc>> {
    if !created_utc.is_finite() || created_utc <= 0.0 {
        return None;
    }
    Utc.timestamp_opt(created_utc as i64, 0).single()
}

fn items_from_listing(listing: Listing) -> Vec<DiscussionItem> {
    listing
        .data
        .children
        .into_iter()
        .filter_map(|c| {
            let p = c.data;
            let created_at = item_timestamp(p.created_utc)?;
            Some(DiscussionItem {
                title: p.title,
                score: p.score,
                comments: p.num_comments,
                snippet: p.selftext.chars().take(200).collect(),
                created_at,
            })
        })
        .collect()
}

/// Discussion fetcher. Without a configured source it degrades into fixed
/// per-topic placeholder text instead of calling anything.
pub struct DiscussionFetcher {
    source: Option<DynDiscussionSource>,
    gate: Arc<FixedIntervalGate>,
}

impl DiscussionFetcher {
    pub fn new(cfg: Option<DiscussionConfig>, gate: Arc<FixedIntervalGate>) -> Self {
        let source = cfg.map(|c| Arc::new(RedditSearch::new(&c)) as DynDiscussionSource);
        Self { source, gate }
    }

    /// Variant for tests and alternate backends.
    pub fn with_source(source: DynDiscussionSource, gate: Arc<FixedIntervalGate>) -> Self {
        Self {
            source: Some(source),
            gate,
        }
    }

    async fn summarize_topic(&self, source: &dyn DiscussionSource, topic: &str) -> Result<String> {
        let items = source.search(topic, CANDIDATES_PER_TOPIC).await?;
        let cutoff = Utc::now() - Duration::days(RECENCY_WINDOW_DAYS);
        let recent: Vec<&DiscussionItem> =
            items.iter().filter(|i| i.created_at > cutoff).collect();

        if recent.is_empty() {
            return Ok(format!("Limited discussion data available for {topic}"));
        }

        let mut summary = format!("Recent discussions about {topic}:");
        for item in recent.iter().take(SURFACED_PER_TOPIC) {
            summary.push_str(&format!("\n- {} (Score: {})", item.title, item.score));
        }
        Ok(summary)
    }
}

#[async_trait]
impl SourceFetcher for DiscussionFetcher {
    async fn fetch(&self, topics: &[String]) -> FetchOutcome {
        let Some(source) = &self.source else {
            info!("discussion source unavailable: substituting placeholder summaries");
            return FetchOutcome::Unavailable(uniform_map(topics, |t| {
                format!(
                    "Online communities show interest in {t} and are actively \
                     discussing developments and sharing perspectives on this topic."
                )
            }));
        };

        let mut map = PerTopicText::with_capacity(topics.len());
        let mut degraded = false;
        for topic in topics {
            self.gate.wait().await;
            counter!("fetch_topics_total", "source" => "discussion").increment(1);
            match self.summarize_topic(source.as_ref(), topic).await {
                Ok(summary) => {
                    map.insert(topic.clone(), summary);
                }
                Err(err) => {
                    warn!(topic = %topic, error = %err, "discussion fetch failed for topic");
                    counter!("fetch_topic_errors_total", "source" => "discussion").increment(1);
                    map.insert(
                        topic.clone(),
                        format!("Could not retrieve discussion data for {topic}"),
                    );
                    degraded = true;
                }
            }
        }

        if degraded {
            FetchOutcome::Degraded(map)
        } else {
            FetchOutcome::Complete(map)
        }
    }

    fn source(&self) -> &'static str {
        "discussion"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    struct FixedSource {
        items: Vec<DiscussionItem>,
    }

    #[async_trait]
    impl DiscussionSource for FixedSource {
        async fn search(&self, _topic: &str, limit: usize) -> Result<Vec<DiscussionItem>> {
            Ok(self.items.iter().take(limit).cloned().collect())
        }
    }

    fn item(title: &str, score: i64, age_days: i64) -> DiscussionItem {
        DiscussionItem {
            title: title.to_string(),
            score,
            comments: 10,
            snippet: String::new(),
            created_at: Utc::now() - Duration::days(age_days),
        }
    }

    fn gate() -> Arc<FixedIntervalGate> {
        Arc::new(FixedIntervalGate::new(StdDuration::ZERO))
    }

    #[tokio::test]
    async fn stale_items_fall_outside_the_recency_window() {
        let source = Arc::new(FixedSource {
            items: vec![item("old thread", 900, 30)],
        });
        let fetcher = DiscussionFetcher::with_source(source, gate());
        let out = fetcher.fetch(&["dow".to_string()]).await;
        assert_eq!(
            out.map()["dow"],
            "Limited discussion data available for dow"
        );
    }

    #[tokio::test]
    async fn summary_surfaces_top_two_recent_items() {
        let source = Arc::new(FixedSource {
            items: vec![
                item("first", 500, 1),
                item("second", 300, 2),
                item("third", 100, 3),
            ],
        });
        let fetcher = DiscussionFetcher::with_source(source, gate());
        let out = fetcher.fetch(&["dow".to_string()]).await;
        let summary = &out.map()["dow"];
        assert!(summary.starts_with("Recent discussions about dow:"));
        assert!(summary.contains("- first (Score: 500)"));
        assert!(summary.contains("- second (Score: 300)"));
        assert!(!summary.contains("third"));
    }

    #[test]
    fn unresolvable_timestamps_drop_the_item() {
        let json = r#"{"data":{"children":[
            {"data":{"title":"good","score":10,"num_comments":1,"selftext":"","created_utc":1700000000.0}},
            {"data":{"title":"negative","score":99,"num_comments":1,"selftext":"","created_utc":-5.0}},
            {"data":{"title":"absurd","score":99,"num_comments":1,"selftext":"","created_utc":1e18}}
        ]}}"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        let items = items_from_listing(listing);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "good");
    }

    #[tokio::test]
    async fn missing_integration_substitutes_placeholders() {
        let fetcher = DiscussionFetcher::new(None, gate());
        let topics = vec!["a".to_string(), "b".to_string()];
        let out = fetcher.fetch(&topics).await;
        assert!(matches!(out, FetchOutcome::Unavailable(_)));
        let map = out.into_map();
        assert_eq!(map.len(), 2);
        assert!(map["a"].contains("interest in a"));
    }
}
