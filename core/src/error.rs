//! Error types

use thiserror::Error;

/// Failures of the external IP lookup and weather calls
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Provider returned HTTP {0}")]
    Status(u16),

    #[error("Unexpected payload: {0}")]
    Payload(String),

    #[error("IP lookup failed: {0}")]
    LookupFailed(String),

    #[error("Weather API key missing (set {0})")]
    MissingApiKey(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SequencerError {
    #[error("A speed test is already running")]
    AlreadyRunning,

    #[error("Speed test cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache store error: {0}")]
    Store(String),

    #[error("Corrupt cache entry for {key}: {reason}")]
    Corrupt { key: String, reason: String },
}
