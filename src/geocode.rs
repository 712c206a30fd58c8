// src/geocode.rs
//
// Cache-aside geocoding. The persistent KV store is checked first; only on a
// miss is the external provider called, and only successful results are
// written back (first-writer-wins, misses are never cached).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Key prefix the original store layout uses for cached resolutions.
const KEY_PREFIX: &str = "geocoding/";
const KEY_SUFFIX: &str = ".json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One candidate from the geocoding provider. Mirrors the provider's
/// `geometry.location` nesting so responses deserialize directly.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    pub location: Coordinates,
}

/// Persistent object/KV store capability (bucket-shaped: exists/get/put).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool>;
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()>;
}

/// External geocoding capability. An empty candidate list signals NotFound.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Vec<Candidate>>;
    fn name(&self) -> &'static str;
}

/// Outcome of one resolution. Store trouble is reported as its own variant
/// so the pipeline can log it apart from an ordinary miss; both drop the
/// resource, neither ever surfaces as an error to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Found(Coordinates),
    NotFound,
    StoreError,
}

/// Region disambiguation: queries that do not already mention the region
/// (by any alias) get `", <name>"` appended before hitting the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionQualifier {
    pub name: String,
    pub aliases: Vec<String>,
}

impl RegionQualifier {
    pub fn qualify(&self, address: &str) -> String {
        if self.aliases.iter().any(|a| address.contains(a.as_str())) {
            address.to_string()
        } else {
            format!("{}, {}", address, self.name)
        }
    }
}

pub struct GeocodeCache {
    store: Arc<dyn ObjectStore>,
    geocoder: Arc<dyn Geocoder>,
    region: RegionQualifier,
    provider_timeout: Duration,
    // Single-flight: at most one in-flight provider call per address.
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GeocodeCache {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        geocoder: Arc<dyn Geocoder>,
        region: RegionQualifier,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            store,
            geocoder,
            region,
            provider_timeout,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// The cache key is the verbatim address: case- and whitespace-sensitive.
    /// Trivially different spellings of the same street address are distinct
    /// entries on purpose; normalizing here would silently change hit rates.
    pub fn cache_key(address: &str) -> String {
        format!("{KEY_PREFIX}{address}{KEY_SUFFIX}")
    }

    /// Resolve an address to coordinates: store first, provider on miss,
    /// write-back on success only. Never returns an error; store I/O
    /// trouble degrades to `StoreError`, provider trouble to `NotFound`.
    pub async fn resolve(&self, address: &str) -> Resolution {
        let lock = {
            let mut map = self.inflight.lock().await;
            map.entry(address.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _held = lock.lock().await;

        let out = self.resolve_inner(address).await;

        let mut map = self.inflight.lock().await;
        map.remove(address);
        out
    }

    async fn resolve_inner(&self, address: &str) -> Resolution {
        let key = Self::cache_key(address);

        match self.store.exists(&key).await {
            Ok(true) => match self.read_entry(&key).await {
                Ok(coords) => {
                    counter!("geocode_cache_hits_total").increment(1);
                    return Resolution::Found(coords);
                }
                Err(e) => {
                    tracing::warn!(error = ?e, %address, "reading cached geocode entry failed");
                    counter!("geocode_store_errors_total").increment(1);
                    return Resolution::StoreError;
                }
            },
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = ?e, %address, "geocode cache lookup failed");
                counter!("geocode_store_errors_total").increment(1);
                return Resolution::StoreError;
            }
        }

        let query = self.region.qualify(address);
        counter!("geocode_provider_calls_total").increment(1);

        let candidates =
            match tokio::time::timeout(self.provider_timeout, self.geocoder.geocode(&query)).await
            {
                Ok(Ok(candidates)) => candidates,
                Ok(Err(e)) => {
                    tracing::warn!(error = ?e, %query, provider = self.geocoder.name(), "geocoding failed");
                    counter!("geocode_provider_errors_total").increment(1);
                    return Resolution::NotFound;
                }
                Err(_) => {
                    tracing::warn!(%query, provider = self.geocoder.name(), "geocoding timed out");
                    counter!("geocode_provider_errors_total").increment(1);
                    return Resolution::NotFound;
                }
            };

        let Some(first) = candidates.first() else {
            tracing::info!(%query, "no geocoding candidates");
            return Resolution::NotFound;
        };
        let coords = first.geometry.location;

        // Write-back is best-effort: a failed put still returns the
        // coordinates and a later run retries the write.
        if let Err(e) = self.write_entry(&key, coords).await {
            tracing::warn!(error = ?e, %address, "caching geocode result failed");
            counter!("geocode_store_errors_total").increment(1);
        }

        Resolution::Found(coords)
    }

    async fn read_entry(&self, key: &str) -> Result<Coordinates> {
        let bytes = self.store.get(key).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_entry(&self, key: &str, coords: Coordinates) -> Result<()> {
        let bytes = serde_json::to_vec(&coords)?;
        self.store.put(key, bytes).await
    }
}
