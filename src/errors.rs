//! Error types shared across the roster pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to reach a remote endpoint at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("request to {url} timed out after {seconds} seconds")]
    Timeout { url: String, seconds: u64 },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Why a structurally valid species row could not be read.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowDefect {
    #[error("name cell has no anchor")]
    MissingAnchor,
    #[error("name cell anchor has no href")]
    MissingHref,
    #[error("href {0:?} carries no avibaseid")]
    MissingIdentifier(String),
}

/// The synonym batch failed more requests than it was allowed to.
#[derive(Debug, Error)]
#[error("{failed} of {total} requests failed, above the allowed proportion of {allowed}")]
pub struct BatchFailure {
    pub failed: usize,
    pub total: usize,
    pub allowed: f64,
    pub last_error: Option<String>,
}

/// Reading or writing a memoized output failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("memo store I/O failure at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("memo entry {} is not valid output JSON: {source}", .path.display())]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("request failed: {status} {status_text} ({url})")]
    Status {
        url: String,
        status: u16,
        status_text: String,
    },
    #[error("parse document failed for {url}: {reason}")]
    Parse { url: String, reason: String },
    #[error("region {region}, row {row}: {defect}")]
    Extraction {
        region: String,
        row: usize,
        #[source]
        defect: RowDefect,
    },
    #[error("error during synonym lookup: {0}")]
    BatchFailure(#[source] BatchFailure),
    #[error("memoization failed: {0}")]
    Persistence(#[from] StoreError),
}

impl RosterError {
    /// Whether the error still left a usable output behind.
    pub fn is_warning(&self) -> bool {
        matches!(self, RosterError::Persistence(_))
    }
}
