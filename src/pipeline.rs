// src/pipeline.rs
//
// Batch ingestion: raw feed -> extraction -> geocode resolution -> complete
// resources. Drop-and-continue throughout; nothing here raises past the
// pipeline boundary.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::extract::{extract, RawEvent, Resource};
use crate::geocode::{GeocodeCache, ObjectStore, Resolution};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Raw events read from the feed.");
        describe_counter!(
            "ingest_resources_total",
            "Resources emitted with resolved coordinates."
        );
        describe_counter!(
            "ingest_skipped_no_address_total",
            "Events dropped for an empty address."
        );
        describe_counter!(
            "ingest_skipped_unresolved_total",
            "Events dropped because geocoding found nothing."
        );
        describe_counter!("ingest_read_errors_total", "Feed read/parse failures.");
        describe_gauge!(
            "ingest_last_run_ts",
            "Unix ts when the ingestion pipeline last ran."
        );
    });
}

pub struct Pipeline {
    store: Arc<dyn ObjectStore>,
    cache: Arc<GeocodeCache>,
    events_key: String,
}

impl Pipeline {
    pub fn new(store: Arc<dyn ObjectStore>, cache: Arc<GeocodeCache>, events_key: String) -> Self {
        Self {
            store,
            cache,
            events_key,
        }
    }

    /// Read the raw feed and produce the complete resources, in feed order.
    /// A feed that cannot be read or parsed degrades to an empty batch;
    /// callers tell "no data" from "nothing matched" via logs only.
    pub async fn ingest(&self) -> Vec<Resource> {
        ensure_metrics_described();
        gauge!("ingest_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

        let raw = match self.fetch_raw().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = ?e, key = %self.events_key, "reading raw event feed failed");
                counter!("ingest_read_errors_total").increment(1);
                return Vec::new();
            }
        };

        self.ingest_events(raw).await
    }

    /// Core loop over an already-fetched batch. Stable filter: output order
    /// follows input order, minus skipped entries.
    pub async fn ingest_events(&self, raw: Vec<RawEvent>) -> Vec<Resource> {
        ensure_metrics_described();
        counter!("ingest_events_total").increment(raw.len() as u64);

        let mut out = Vec::with_capacity(raw.len());
        for event in &raw {
            let mut resource = extract(event);

            if resource.address.is_empty() {
                tracing::info!(id = ?resource.id, "skipping event without address");
                counter!("ingest_skipped_no_address_total").increment(1);
                continue;
            }

            match self.cache.resolve(&resource.address).await {
                Resolution::Found(coords) => {
                    resource.lat = Some(coords.lat);
                    resource.lng = Some(coords.lng);
                    out.push(resource);
                }
                Resolution::NotFound => {
                    tracing::warn!(address = %resource.address, "could not geocode address");
                    counter!("ingest_skipped_unresolved_total").increment(1);
                }
                Resolution::StoreError => {
                    tracing::warn!(address = %resource.address, "geocode store unavailable");
                    counter!("ingest_skipped_unresolved_total").increment(1);
                }
            }
        }

        counter!("ingest_resources_total").increment(out.len() as u64);
        out
    }

    /// The feed object is either a single event or an array of events.
    async fn fetch_raw(&self) -> Result<Vec<RawEvent>> {
        let bytes = self
            .store
            .get(&self.events_key)
            .await
            .with_context(|| format!("fetching {}", self.events_key))?;

        let value: serde_json::Value =
            serde_json::from_slice(&bytes).context("parsing raw event feed")?;

        let raw = match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|v| serde_json::from_value::<RawEvent>(v).ok())
                .collect(),
            obj @ serde_json::Value::Object(_) => {
                vec![serde_json::from_value::<RawEvent>(obj).context("parsing raw event")?]
            }
            other => anyhow::bail!("unexpected feed payload: {other}"),
        };

        Ok(raw)
    }
}
