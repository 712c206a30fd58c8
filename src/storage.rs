// src/storage.rs
//
// Remote implementations of the store and geocoder capabilities: the Google
// Cloud Storage JSON API and the Google Maps Geocoding API. Both clients are
// constructed once at startup and injected wherever the capability is needed.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use crate::geocode::{Candidate, Geocoder, ObjectStore};

const GCS_BASE: &str = "https://storage.googleapis.com";
const MAPS_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

pub struct GcsObjectStore {
    client: Client,
    bucket: String,
    /// OAuth bearer token for writes; public-bucket reads work without one.
    auth_token: Option<String>,
}

impl GcsObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            auth_token,
        }
    }

    // Object names carry slashes and spaces; push them as one encoded
    // path segment.
    fn object_url(&self, key: &str, media: bool) -> Result<Url> {
        let mut url = Url::parse(GCS_BASE)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("bad base url"))?
            .extend(["storage", "v1", "b", self.bucket.as_str(), "o"])
            .push(key);
        if media {
            url.query_pairs_mut().append_pair("alt", "media");
        }
        Ok(url)
    }

    fn upload_url(&self, key: &str) -> Result<Url> {
        let mut url = Url::parse(GCS_BASE)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("bad base url"))?
            .extend(["upload", "storage", "v1", "b", self.bucket.as_str(), "o"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", key);
        Ok(url)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let url = self.object_url(key, false)?;
        let resp = self
            .authorized(self.client.get(url))
            .send()
            .await
            .with_context(|| format!("HEAD-equivalent for {key}"))?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => bail!("object metadata for {key} returned {s}"),
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let url = self.object_url(key, true)?;
        let resp = self
            .authorized(self.client.get(url))
            .send()
            .await
            .with_context(|| format!("downloading {key}"))?
            .error_for_status()
            .with_context(|| format!("downloading {key}"))?;
        Ok(resp.bytes().await.context("reading object body")?.to_vec())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let url = self.upload_url(key)?;
        self.authorized(self.client.post(url))
            .header("content-type", "application/json")
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("uploading {key}"))?
            .error_for_status()
            .with_context(|| format!("uploading {key}"))?;
        Ok(())
    }
}

pub struct GoogleMapsGeocoder {
    client: Client,
    api_key: String,
}

impl GoogleMapsGeocoder {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<Candidate>,
}

#[async_trait]
impl Geocoder for GoogleMapsGeocoder {
    async fn geocode(&self, query: &str) -> Result<Vec<Candidate>> {
        let resp = self
            .client
            .get(MAPS_GEOCODE_URL)
            .query(&[("address", query), ("key", self.api_key.as_str())])
            .send()
            .await
            .context("geocode request")?
            .error_for_status()
            .context("geocode request")?;

        let body: GeocodeResponse = resp.json().await.context("parsing geocode response")?;
        match body.status.as_str() {
            // ZERO_RESULTS is an ordinary miss, not an error.
            "OK" | "ZERO_RESULTS" => Ok(body.results),
            other => bail!("geocode provider returned status {other}"),
        }
    }

    fn name(&self) -> &'static str {
        "GoogleMaps"
    }
}
