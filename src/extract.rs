// src/extract.rs
//
// Field extraction: turn one raw calendar event into a normalized Resource.
// Pure and infallible; anything that does not parse degrades to an empty field.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One raw event as published in the calendar feed. Fields the feed
/// sometimes omits default to empty; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// A normalized, geocodable record describing one service/event location.
/// `lat`/`lng` stay `None` until the geocode cache resolves the address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub time: String,
    pub county: String,
    pub schedule: String,
    pub description: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Resource {
    /// Complete means: has an address and both coordinates resolved.
    pub fn is_complete(&self) -> bool {
        !self.address.is_empty() && self.lat.is_some() && self.lng.is_some()
    }
}

fn re_time() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\d{1,2}:\d{2}[AP]M-\d{1,2}:\d{2}[AP]M").unwrap())
}

fn re_bold() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<b[^>]*>(.*?)</b>").unwrap())
}

fn re_county() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    // The non-capturing prefix keeps the match from starting mid-token
    // (e.g. the "PM" tail of "5:00PM").
    RE.get_or_init(|| Regex::new(r"(?:^|[^A-Z0-9])([A-Z]+(?:\s+[A-Z]+)*\s+COUNTY)").unwrap())
}

fn re_schedule() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"Every \d+ weeks? on [A-Za-z]+").unwrap())
}

/// Strip markup from rich text: decode HTML entities, drop tags,
/// collapse whitespace runs, trim.
pub fn strip_markup(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// The schedule time window lives inside an emphasized (`<b>`) span; take
/// the first span whose text carries a 12-hour range like `9:00AM-5:00PM`.
fn extract_time(description: &str) -> String {
    for caps in re_bold().captures_iter(description) {
        let inner = strip_markup(&caps[1]);
        if let Some(m) = re_time().find(&inner) {
            return m.as_str().to_string();
        }
    }
    String::new()
}

/// Residual description: the plain text minus the already-extracted fields,
/// with comma/whitespace runs normalized and stray separators trimmed.
fn residual_description(plain: &str, extracted: &[&str]) -> String {
    let mut out = plain.to_string();
    for needle in extracted {
        if !needle.is_empty() {
            out = out.replace(needle, "");
        }
    }

    static RE_COMMA: OnceCell<Regex> = OnceCell::new();
    let re_comma = RE_COMMA.get_or_init(|| Regex::new(r"\s*,\s*").unwrap());
    out = re_comma.replace_all(&out, ", ").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim_matches([' ', ',']).to_string()
}

/// Best-effort field population for one raw event. Never fails: absent or
/// unparsable fields yield empty strings / `None`.
pub fn extract(event: &RawEvent) -> Resource {
    let name = event.summary.trim().to_string();
    let address = event.location.trim().to_string();

    let (time, county, schedule, description) = if event.description.is_empty() {
        (String::new(), String::new(), String::new(), String::new())
    } else {
        let time = extract_time(&event.description);
        let plain = strip_markup(&event.description);

        let county = re_county()
            .captures(&plain)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let schedule = re_schedule()
            .find(&plain)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let description =
            residual_description(&plain, &[time.as_str(), schedule.as_str(), county.as_str()]);
        (time, county, schedule, description)
    };

    Resource {
        id: event.id.clone(),
        name,
        address,
        time,
        county,
        schedule,
        description,
        lat: event.lat,
        lng: event.lng,
    }
}
