// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::geocode::RegionQualifier;

const ENV_PATH: &str = "BEACON_CONFIG_PATH";

/// Runtime configuration. Secrets (the Maps API key) stay in the
/// environment; everything else lives in a small TOML or JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Storage bucket holding both the raw feed and the geocode cache.
    pub bucket: String,
    /// Object key of the raw calendar feed.
    pub events_key: String,
    /// Region appended to unqualified addresses before geocoding.
    pub region: String,
    /// Spellings that count as "already qualified".
    pub region_aliases: Vec<String>,
    /// Upper bound on one provider call, in seconds.
    pub geocode_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bucket: "beacon-database".to_string(),
            events_key: "calendar_events.json".to_string(),
            region: "Connecticut".to_string(),
            region_aliases: vec!["CT".to_string(), "Connecticut".to_string()],
            geocode_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn region_qualifier(&self) -> RegionQualifier {
        RegionQualifier {
            name: self.region.clone(),
            aliases: self.region_aliases.clone(),
        }
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }
}

/// Load configuration from an explicit path. Supports TOML or JSON.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load configuration using env var + fallbacks:
/// 1) $BEACON_CONFIG_PATH
/// 2) config/beacon.toml
/// 3) config/beacon.json
/// 4) built-in defaults
pub fn load_default() -> Result<AppConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("BEACON_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/beacon.toml");
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from("config/beacon.json");
    if json_p.exists() {
        return load_from(&json_p);
    }
    Ok(AppConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<AppConfig> {
    if hint_ext == "json" || s.trim_start().starts_with('{') {
        return serde_json::from_str(s).context("parsing JSON config");
    }
    toml::from_str(s).context("parsing TOML config")
}
