// src/fetch/news.rs
//
// News source: per topic, fetch a recency-sorted news search page through
// the scraping proxy, reduce it to headlines, and have the generation
// endpoint turn the headlines into a short speech-ready summary.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde_json::json;
use tracing::warn;

use crate::config::ProxyConfig;
use crate::fetch::{uniform_map, FetchOutcome, PerTopicText, SourceFetcher};
use crate::headlines::{clean_html_to_text, extract_headlines};
use crate::llm::{DynGenerationClient, GenerationOptions};
use crate::pacing::FixedIntervalGate;

const NEWS_SEARCH_TEMPLATE: &str = "https://news.google.com/search?q={query}&tbs=sbd:1";

const NEWS_EDITOR_PROMPT: &str = "You are my personal news editor. Summarize these headlines \
into a TV news script for me, focus on important headlines and remember that this text will \
be converted to audio: so no extra stuff other than text which the newscaster should read, \
no special symbols or extra information in between and of course no preamble please.";

/// Deterministic per-topic search URL, sorted by recency.
pub fn news_search_url(topic: &str) -> String {
    NEWS_SEARCH_TEMPLATE.replace("{query}", &urlencoding::encode(topic))
}

/// Raw page transport. Real traffic goes through a scraping proxy; tests
/// inject a fake.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

pub type DynPageFetcher = Arc<dyn PageFetcher>;

/// Web-unlocker style scraping proxy: POST the target URL, get raw markup.
pub struct ProxyPageFetcher {
    http: reqwest::Client,
    cfg: ProxyConfig,
}

impl ProxyPageFetcher {
    pub fn new(cfg: ProxyConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsreel/0.1")
            .build()
            .expect("reqwest client");
        Self { http, cfg }
    }
}

#[async_trait]
impl PageFetcher for ProxyPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let payload = json!({
            "zone": self.cfg.zone,
            "url": url,
            "format": "raw",
        });
        let resp = self
            .http
            .post(&self.cfg.api_url)
            .bearer_auth(&self.cfg.api_key)
            .json(&payload)
            .send()
            .await
            .context("sending proxy fetch request")?;
        if !resp.status().is_success() {
            bail!("proxy returned {}", resp.status());
        }
        resp.text().await.context("reading proxied page body")
    }
}

/// News fetcher. Constructed without a page fetcher when proxy credentials
/// are absent; every fetch is then `Unavailable` with empty entries.
pub struct NewsFetcher {
    pages: Option<DynPageFetcher>,
    generation: DynGenerationClient,
    gate: Arc<FixedIntervalGate>,
}

impl NewsFetcher {
    pub fn new(
        proxy: Option<ProxyConfig>,
        generation: DynGenerationClient,
        gate: Arc<FixedIntervalGate>,
    ) -> Self {
        let pages = proxy.map(|cfg| Arc::new(ProxyPageFetcher::new(cfg)) as DynPageFetcher);
        Self {
            pages,
            generation,
            gate,
        }
    }

    /// Variant for tests and alternate transports.
    pub fn with_page_fetcher(
        pages: DynPageFetcher,
        generation: DynGenerationClient,
        gate: Arc<FixedIntervalGate>,
    ) -> Self {
        Self {
            pages: Some(pages),
            generation,
            gate,
        }
    }

    async fn summarize_topic(&self, pages: &dyn PageFetcher, topic: &str) -> Result<String> {
        let url = news_search_url(topic);
        let markup = pages.fetch_page(&url).await?;
        let headlines = extract_headlines(&clean_html_to_text(&markup));
        if headlines.is_empty() {
            bail!("no headlines extracted for '{topic}'");
        }
        let prompt = format!("{NEWS_EDITOR_PROMPT}\n{headlines}\nNews Script:");
        let script = self
            .generation
            .generate(&prompt, GenerationOptions::default())
            .await?;
        Ok(script.trim().to_string())
    }
}

#[async_trait]
impl SourceFetcher for NewsFetcher {
    async fn fetch(&self, topics: &[String]) -> FetchOutcome {
        let Some(pages) = &self.pages else {
            warn!("news source unavailable: no proxy credentials configured");
            return FetchOutcome::Unavailable(uniform_map(topics, |_| String::new()));
        };

        let mut map = PerTopicText::with_capacity(topics.len());
        let mut degraded = false;
        for topic in topics {
            self.gate.wait().await;
            counter!("fetch_topics_total", "source" => "news").increment(1);
            match self.summarize_topic(pages.as_ref(), topic).await {
                Ok(summary) => {
                    map.insert(topic.clone(), summary);
                }
                Err(err) => {
                    warn!(topic = %topic, error = %err, "news fetch failed for topic");
                    counter!("fetch_topic_errors_total", "source" => "news").increment(1);
                    map.insert(topic.clone(), String::new());
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
        "news"
    }
}
