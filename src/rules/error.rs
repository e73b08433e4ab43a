use std::time::Duration;

use thiserror::Error;

use crate::core::{FilingStatus, UsState};

/// Failure to load the compiled-in rule bundle.
#[derive(Debug, Error)]
pub enum RuleDataError {
    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("manifest has no checksum for {0}")]
    MissingChecksum(String),
    #[error("checksum mismatch for {file}: manifest {expected}, content {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },
    #[error("embedded rules are invalid: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rule payload is not well-formed: {0}")]
    Malformed(String),
    #[error("rule payload has an empty version")]
    EmptyVersion,
    #[error("federal brackets missing for {}", .0.as_str())]
    MissingFederalSchedule(FilingStatus),
    #[error("social security rate must be positive")]
    NonPositiveSocialSecurityRate,
    #[error("rule payload has no states")]
    NoStates,
    #[error("rule payload is missing jurisdictions: {}", state_codes(.0))]
    MissingStates(Vec<UsState>),
    #[error("{section} is for tax year {found}, expected {expected}")]
    YearMismatch {
        section: &'static str,
        expected: u32,
        found: u32,
    },
}

fn state_codes(states: &[UsState]) -> String {
    states.iter().map(|s| s.code()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache metadata unreadable: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("cache checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: String, computed: String },
    #[error("cached payload rejected: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned status {0}")]
    Status(u16),
    #[error("invalid remote url: {0}")]
    Url(String),
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("network failure: {0}")]
    Network(#[from] RemoteError),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("validation failure: {0}")]
    Validation(#[from] ValidationError),
}
