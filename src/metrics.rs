// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and register every series up front
    /// so they show up on /metrics before the first request.
    pub fn init() -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!(
            "fetch_topics_total",
            "Per-topic source fetch attempts, labeled by source."
        );
        describe_counter!(
            "fetch_topic_errors_total",
            "Per-topic fetch failures substituted with placeholder text."
        );
        describe_counter!(
            "fetch_outcomes_total",
            "Source fetch outcomes (complete/degraded/unavailable)."
        );
        describe_counter!("generation_requests_total", "Generation endpoint calls.");
        describe_counter!("generation_errors_total", "Generation endpoint failures.");
        describe_histogram!("generation_ms", "Generation endpoint latency in milliseconds.");
        describe_counter!(
            "pipeline_requests_total",
            "Finished pipeline requests, labeled by outcome."
        );
        describe_histogram!("pipeline_ms", "End-to-end request latency in milliseconds.");

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
