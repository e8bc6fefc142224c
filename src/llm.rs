// src/llm.rs
//
// Generation client: trait seam over the locally hosted language-model
// endpoint (Ollama-style `/api/generate`). Handlers and fetchers depend on
// the trait so tests can inject deterministic fakes.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;

/// Sampling knobs forwarded verbatim to the endpoint. `None` fields are
/// omitted from the wire body and the endpoint's defaults apply.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub num_predict: Option<u32>,
}

#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String>;
    /// Endpoint name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynGenerationClient = Arc<dyn GenerationClient>;

/// Real client for an Ollama host. One plain request/response per call,
/// `stream: false`, bounded by the configured timeout. No retries.
pub struct OllamaClient {
    http: reqwest::Client,
    host: String,
    model: String,
}

impl OllamaClient {
    pub fn new(cfg: &GenerationConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsreel/0.1")
            .timeout(cfg.timeout)
            .build()
            .expect("reqwest client");
        Self {
            http,
            host: cfg.host.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
        }
    }
}

#[derive(Serialize)]
struct GenerateReq<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOpts>,
}

#[derive(Serialize)]
struct GenerateOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct GenerateResp {
    response: String,
}

#[async_trait]
impl GenerationClient for OllamaClient {
    async fn generate(&self, prompt: &str, options: GenerationOptions) -> Result<String> {
        let t0 = std::time::Instant::now();

        let opts = if options == GenerationOptions::default() {
            None
        } else {
            Some(GenerateOpts {
                temperature: options.temperature,
                num_predict: options.num_predict,
            })
        };
        let body = GenerateReq {
            model: &self.model,
            prompt,
            stream: false,
            options: opts,
        };

        counter!("generation_requests_total").increment(1);
        let resp = self
            .http
            .post(format!("{}/api/generate", self.host))
            .json(&body)
            .send()
            .await
            .context("sending generation request")?;

        if !resp.status().is_success() {
            counter!("generation_errors_total").increment(1);
            bail!("generation endpoint returned {}", resp.status());
        }

        let parsed: GenerateResp = resp.json().await.context("parsing generation response")?;
        histogram!("generation_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(parsed.response)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_name_identifies_the_endpoint() {
        let client = OllamaClient::new(&GenerationConfig::default());
        assert_eq!(client.name(), "ollama");
    }
}

