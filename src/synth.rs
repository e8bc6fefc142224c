// src/synth.rs
//
// Narration synthesizer: hand the finished script to the text-to-speech
// engine and persist the returned bytes as a uniquely named scratch
// artifact. Failure is signaled by absence of output, never by an error.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use crate::config::TtsConfig;

/// One generated narration. Transient: written under the scratch directory
/// with no retention guarantee.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub path: PathBuf,
}

/// Byte production seam; tests inject a fake.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn speak(&self, text: &str, language: &str) -> Result<Vec<u8>>;
}

pub type DynSpeechEngine = Arc<dyn SpeechEngine>;

/// Real engine: POST `{text, language}` to the configured TTS endpoint and
/// read back the audio byte stream.
pub struct HttpSpeechEngine {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpSpeechEngine {
    pub fn new(cfg: &TtsConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsreel/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            endpoint: cfg.endpoint.clone(),
        }
    }
}

#[async_trait]
impl SpeechEngine for HttpSpeechEngine {
    async fn speak(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "text": text, "language": language }))
            .send()
            .await
            .context("sending TTS request")?;
        if !resp.status().is_success() {
            bail!("TTS engine returned {}", resp.status());
        }
        let bytes = resp.bytes().await.context("reading TTS audio stream")?;
        Ok(bytes.to_vec())
    }
}

pub struct Synthesizer {
    engine: DynSpeechEngine,
    audio_dir: PathBuf,
}

impl Synthesizer {
    pub fn new(cfg: &TtsConfig, audio_dir: PathBuf) -> Self {
        Self {
            engine: Arc::new(HttpSpeechEngine::new(cfg)),
            audio_dir,
        }
    }

    /// Variant for tests and alternate engines.
    pub fn with_engine(engine: DynSpeechEngine, audio_dir: PathBuf) -> Self {
        Self { engine, audio_dir }
    }

    /// Convert `script` to audio. Returns `None` on any failure; the caller
    /// decides what "no audio" means for the request.
    pub async fn synthesize(&self, script: &str, language: &str) -> Option<AudioArtifact> {
        if script.trim().is_empty() {
            warn!("refusing to synthesize an empty script");
            return None;
        }
        match self.synthesize_inner(script, language).await {
            Ok(artifact) => Some(artifact),
            Err(err) => {
                warn!(error = %err, "narration synthesis failed");
                None
            }
        }
    }

    async fn synthesize_inner(&self, script: &str, language: &str) -> Result<AudioArtifact> {
        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .context("creating audio scratch directory")?;

        let bytes = self.engine.speak(script, language).await?;
        if bytes.is_empty() {
            bail!("speech engine returned no audio");
        }

        // Timestamp plus sub-second nanos keeps concurrent artifacts from
        // colliding without any locking.
        let now = Utc::now();
        let name = format!(
            "tts_{}_{:09}.mp3",
            now.format("%Y%m%d_%H%M%S"),
            now.timestamp_subsec_nanos()
        );
        let path = self.audio_dir.join(name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("writing audio artifact to {}", path.display()))?;

        Ok(AudioArtifact {
            bytes,
            content_type: "audio/mpeg",
            path,
        })
    }
}
