//! Typed failures for the listing pipeline.
//!
//! Extraction and enrichment failures are caught at the per-post boundary and
//! turned into data; only settings errors end a run.

use thiserror::Error;

/// Reasons a post could not be turned into listing fields
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    /// Transport error talking to the language model
    #[error("language model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("language model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("language model response had no message content")]
    EmptyContent,

    #[error("language model returned malformed JSON: {0}")]
    MalformedJson(String),

    /// Valid JSON, but no location, city, rent or room count in it
    #[error("language model reply had no listing fields")]
    NoListingFields,

    #[error("language model gave no yes/no answer: {0}")]
    UnclearAnswer(String),

    /// Heuristics found nothing usable
    #[error("no listing fields recognised in text")]
    NothingRecognised,

    /// Both strategies were tried
    #[error("{fallback} (remote inference also failed: {remote})")]
    Exhausted { remote: String, fallback: String },
}

impl From<serde_json::Error> for ExtractionFailure {
    fn from(err: serde_json::Error) -> Self {
        ExtractionFailure::MalformedJson(err.to_string())
    }
}

/// Geocoding or routing call that produced no usable result
#[derive(Debug, Error)]
pub enum EnrichmentFailure {
    #[error("mapping request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    #[error("no geocoding results for '{address}'")]
    NoResults { address: String },

    #[error("route unavailable: {0}")]
    RouteUnavailable(String),
}

/// Fatal configuration problems
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{key} must be a number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be true or false, got '{value}'")]
    InvalidBool { key: &'static str, value: String },

    #[error("{key} out of range: {value}")]
    OutOfRange { key: &'static str, value: f64 },

    #[error("OFFICE_LATITUDE and OFFICE_LONGITUDE must be set together")]
    PartialReferencePoint,
}
