/// climate_api: read-only JSON API over Honolulu climate observations.
///
/// # Module structure
///
/// ```text
/// climate_api
/// ├── model     — record types mirroring the station and measurement tables
/// ├── config    — service settings (climate_api.toml, DATABASE_PATH, defaults)
/// ├── db        — read-only data file access and startup schema validation
/// ├── query     — latest date, 12-month window scans, station listing,
/// │               per-date temperature summaries
/// ├── endpoint  — routing, JSON bodies, tiny_http server + worker pool
/// ├── error     — request-time error type
/// └── fixtures (test only) — small sample data files
/// ```

/// Public modules
pub mod config;
pub mod db;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod query;

#[cfg(test)]
pub(crate) mod fixtures;
