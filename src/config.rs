// src/config.rs
//
// Process configuration, read from the environment exactly once at startup
// and passed into component constructors. Components never read env vars at
// call time, so tests can inject fakes without touching the process
// environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Scraping-proxy credentials for the news page fetch.
/// Absent credentials disable the news source (placeholder entries instead).
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub api_url: String,
    pub api_key: String,
    pub zone: String,
}

/// Generation endpoint (Ollama-style `/api/generate`).
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub host: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Text-to-speech endpoint.
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub endpoint: String,
    pub language: String,
}

/// Discussion-site search API. Wrapped in `Option` at the `Config` level:
/// the capability is resolved once here, never probed at call time.
#[derive(Debug, Clone)]
pub struct DiscussionConfig {
    pub api_url: String,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub proxy: Option<ProxyConfig>,
    pub generation: GenerationConfig,
    pub tts: TtsConfig,
    pub discussion: Option<DiscussionConfig>,
    /// Scratch directory for audio artifacts.
    pub audio_dir: PathBuf,
    /// Minimum spacing between per-topic calls to one external source.
    pub topic_pacing: Duration,
}

impl Config {
    /// Read configuration from the environment. Call `dotenvy::dotenv()`
    /// before this in local runs.
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("NEWSREEL_BIND_ADDR", "0.0.0.0:8000")
            .parse::<SocketAddr>()
            .context("parsing NEWSREEL_BIND_ADDR")?;

        let proxy = match std::env::var("BRIGHTDATA_API_KEY") {
            Ok(api_key) if !api_key.is_empty() => Some(ProxyConfig {
                api_url: env_or("BRIGHTDATA_API_URL", "https://api.brightdata.com/request"),
                api_key,
                zone: env_or("BRIGHTDATA_WEB_UNLOCKER_ZONE", "web_unlocker"),
            }),
            _ => None,
        };

        let generation = GenerationConfig {
            host: env_or("OLLAMA_HOST", "http://localhost:11434"),
            model: env_or("OLLAMA_MODEL", "llama3.2"),
            timeout: Duration::from_secs(env_u64("OLLAMA_TIMEOUT_SECS", 300)),
        };

        let tts = TtsConfig {
            endpoint: env_or("TTS_ENDPOINT", "http://localhost:5002/api/tts"),
            language: env_or("TTS_LANGUAGE", "en"),
        };

        let discussion = match std::env::var("DISCUSSION_API_URL") {
            Ok(api_url) if !api_url.is_empty() => Some(DiscussionConfig {
                api_url,
                user_agent: env_or("DISCUSSION_USER_AGENT", "newsreel/0.1"),
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            proxy,
            generation,
            tts,
            discussion,
            audio_dir: PathBuf::from(env_or("NEWSREEL_AUDIO_DIR", "audio")),
            topic_pacing: Duration::from_millis(env_u64("NEWSREEL_TOPIC_PACING_MS", 1000)),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
