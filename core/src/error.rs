//! Error types for the countries pipeline.
//!
//! # Design
//! The taxonomy is flat. `ParseError` belongs to the parser alone;
//! `ServiceError` is what the fetch service and the view-model expose, and a
//! parse failure converts into `ServiceError::DecodingFailure` without losing
//! its kind. `ServiceError` is `Clone` so it can sit inside an observable
//! value and be handed to every observer; the transport cause is therefore
//! kept behind an `Arc`.

use std::sync::Arc;

use thiserror::Error;

/// Errors returned by `CountriesParser::parse`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The payload was not JSON, or did not match the country schema.
    #[error("failed to decode countries payload")]
    DecodingFailure,
}

/// Errors returned by `FetchCountries::fetch_countries`.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// The configured endpoint is not an absolute URL. Raised before any I/O.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The transport itself failed (DNS, TLS, timeout, bad status, ...).
    #[error("Network error: {0}")]
    Failure(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// Malformed request or a scripted transport with nothing to return.
    #[error("Received invalid data")]
    InvalidData,

    /// The response body could not be decoded into countries.
    #[error("Failed to decode response")]
    DecodingFailure,

    /// A payload was received but flagged as logically empty.
    #[error("Received empty response")]
    EmptyResponse,
}

impl ServiceError {
    /// Wrap an arbitrary transport error.
    pub fn failure(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ServiceError::Failure(Arc::from(cause.into()))
    }
}

impl From<ParseError> for ServiceError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::DecodingFailure => ServiceError::DecodingFailure,
        }
    }
}
