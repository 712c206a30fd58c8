// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod extract;
pub mod format;
pub mod geocode;
pub mod pipeline;
pub mod storage;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::extract::{extract, RawEvent, Resource};
pub use crate::geocode::{Coordinates, GeocodeCache, Geocoder, ObjectStore, Resolution};
pub use crate::pipeline::Pipeline;
