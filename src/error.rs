use std::time::Duration;

use thiserror::Error;

/// Failures of a single fetch / persist / render cycle.
///
/// Components return these; the scheduler decides once whether a failure
/// stops the process or only the current cycle.
#[derive(Debug, Error)]
pub enum GasWatchError {
    #[error("gas price request failed: {0}")]
    Network(String),
    #[error("could not decode gas price response: {0}")]
    Decode(String),
    #[error("no api key stored under name {0}")]
    NotFound(String),
    #[error("could not persist gas price sample: {0}")]
    Write(String),
    #[error("database query failed: {0}")]
    Query(String),
    #[error("could not connect to database: {0}")]
    Connection(String),
    #[error("cycle aborted: {0}")]
    Panicked(String),
    #[error("cycle did not complete within {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for GasWatchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for GasWatchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
