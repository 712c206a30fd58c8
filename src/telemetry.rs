// src/telemetry.rs
use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Holds the process-wide Prometheus recorder handle. Install once at
/// startup, before the pipeline records its first counter.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    pub fn init() -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        Self { handle }
    }

    /// Router serving the exposition text on `/metrics`, for merging into
    /// the main app router.
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
