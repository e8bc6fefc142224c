// src/compose.rs
//
// Broadcast composer: merge per-topic news and discussion text into one
// generation prompt, run the language model once, and scrub the returned
// script for speech safety.

use anyhow::Result;
use tracing::debug;

use crate::fetch::PerTopicText;
use crate::llm::{DynGenerationClient, GenerationOptions};

/// Terminal outcome when neither source produced content for any topic.
/// Returned without invoking generation.
pub const EMPTY_CONTENT_SENTINEL: &str = "No content available to generate news script.";

const BROADCAST_SYSTEM_PROMPT: &str = "\
You are a professional news anchor writing a broadcast script. Create a natural, engaging news report.

RULES:
- Write clear, conversational paragraphs as if speaking on air
- Remove all usernames and platform references
- Clean up any awkward formatting or special characters
- Make transitions smooth between topics
- Keep sentences short and punchy (good for speech)
- NO asterisks, hyphens, or formatting symbols
- NO introductions or preambles
- Just pure, readable news script

Each topic should sound natural when read aloud.";

/// Per-topic content blocks joined into the user-facing prompt body.
/// `None` means no topic had any content.
pub fn build_user_prompt(
    news: &PerTopicText,
    discussion: &PerTopicText,
    topics: &[String],
) -> Option<String> {
    let mut blocks = Vec::with_capacity(topics.len());
    for topic in topics {
        let news_content = news.get(topic).map(|s| s.trim()).unwrap_or("");
        let discussion_content = discussion.get(topic).map(|s| s.trim()).unwrap_or("");

        let mut parts = Vec::with_capacity(2);
        if !news_content.is_empty() {
            parts.push(format!("News: {news_content}"));
        }
        if !discussion_content.is_empty() {
            parts.push(format!("Discussion: {discussion_content}"));
        }
        if !parts.is_empty() {
            blocks.push(format!("Topic: {topic}\n{}", parts.join("\n")));
        }
    }

    if blocks.is_empty() {
        None
    } else {
        Some(format!(
            "Create a news broadcast script from this content:\n\n{}",
            blocks.join("\n\n")
        ))
    }
}

/// Shallow defense against model-introduced formatting: the model is told
/// not to emit markdown, but trim the script and strip emphasis markers
/// anyway before it reaches the speech engine.
pub fn scrub_script(raw: &str) -> String {
    raw.trim().replace("**", "").replace("##", "").replace("--", " ")
}

pub struct Composer {
    generation: DynGenerationClient,
}

impl Composer {
    pub fn new(generation: DynGenerationClient) -> Self {
        Self { generation }
    }

    /// Compose the broadcast script for `topics`. Generation-endpoint
    /// failures propagate; no retry.
    pub async fn compose(
        &self,
        news: &PerTopicText,
        discussion: &PerTopicText,
        topics: &[String],
    ) -> Result<String> {
        let Some(user_prompt) = build_user_prompt(news, discussion, topics) else {
            return Ok(EMPTY_CONTENT_SENTINEL.to_string());
        };

        let prompt = format!("{BROADCAST_SYSTEM_PROMPT}\n\n{user_prompt}");
        let raw = self
            .generation
            .generate(
                &prompt,
                GenerationOptions {
                    temperature: Some(0.3),
                    num_predict: Some(2000),
                },
            )
            .await?;
        debug!(
            client = self.generation.name(),
            chars = raw.len(),
            "broadcast script generated"
        );
        Ok(scrub_script(&raw))
    }
}
