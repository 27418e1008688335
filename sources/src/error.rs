//! Module for all source-related errors
//!

use thiserror::Error;

/// Enumerate all errors the different site clients can raise.
///
#[derive(Debug, Error)]
pub enum SourceError {
    /// Remote end answered with a non-success status
    #[error("HTTP error {status} on {url}")]
    Http { status: u16, url: String },
    /// Site not present in `sources.hcl`
    #[error("unknown site {0}")]
    UnknownSite(String),
    /// Named route not declared for the site
    #[error("no route {0} for site {1}")]
    NoRoute(String, String),
    /// No harbor matched the given pattern
    #[error("no harbor matching {0}")]
    HarborNotFound(String),
    /// No zone matched, list what the index offers
    #[error("no zone matching {0}, available: {1}")]
    ZoneNotFound(String, String),
    /// Mutually exclusive or missing parameters
    #[error("bad parameter: {0}")]
    BadParam(String),
    /// Payload did not parse as what we expected
    #[error("bad payload from {0}: {1}")]
    BadPayload(String, String),
}
