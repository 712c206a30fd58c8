//! Beacon Resources — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the storage/geocoding clients,
//! the ingestion pipeline, and the metrics exporter.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use beacon_resources::api::{create_router, AppState};
use beacon_resources::config;
use beacon_resources::geocode::GeocodeCache;
use beacon_resources::telemetry::Metrics;
use beacon_resources::pipeline::Pipeline;
use beacon_resources::storage::{GcsObjectStore, GoogleMapsGeocoder};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("beacon_resources=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default().context("loading configuration")?;
    let api_key =
        std::env::var("GOOGLE_MAPS_API_KEY").context("GOOGLE_MAPS_API_KEY is not set")?;
    let gcs_token = std::env::var("GCS_ACCESS_TOKEN").ok();

    let http = reqwest::Client::new();
    let store = Arc::new(GcsObjectStore::new(http.clone(), cfg.bucket.clone(), gcs_token));
    let geocoder = Arc::new(GoogleMapsGeocoder::new(http, api_key));

    let cache = Arc::new(GeocodeCache::new(
        store.clone(),
        geocoder,
        cfg.region_qualifier(),
        cfg.geocode_timeout(),
    ));
    let pipeline = Arc::new(Pipeline::new(store, cache, cfg.events_key.clone()));

    let metrics = Metrics::init();
    let router = create_router(AppState { pipeline }).merge(metrics.router());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "serving");
    axum::serve(listener, router).await.context("serving")?;

    Ok(())
}
