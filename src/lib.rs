// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod compose;
pub mod config;
pub mod fetch;
pub mod headlines;
pub mod llm;
pub mod metrics;
pub mod pacing;
pub mod pipeline;
pub mod synth;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::Config;
pub use crate::pipeline::{Pipeline, PipelineError, SourceSelector, Stage};
pub use crate::synth::AudioArtifact;
