//! HTTP boundary of the fetch service.
//!
//! # Design
//! The service never talks to the network directly. It hands a URL to a
//! `Transport` and gets back an `HttpResponse` described as plain data. This
//! keeps the service deterministic under test: swap in a scripted transport and
//! every failure mode can be reproduced without a socket.
//!
//! All fields use owned types (`String`, `Vec`) so responses can be moved
//! across threads and FFI boundaries without lifetime concerns.

use std::future::Future;

pub use ureq::http::Uri;

/// Any error a transport raises. The fetch service inspects it: errors that
/// already are a `ServiceError` pass through, everything else is wrapped in
/// `ServiceError::Failure`.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// An HTTP response described as plain data.
///
/// `body` is `None` when the transport produced no payload at all, which is
/// different from an empty payload.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }
}

/// Performs one GET request/response cycle.
///
/// Implementations own timeout and status-code policy; the caller adds none.
pub trait Transport: Send + Sync {
    fn fetch(&self, url: &Uri) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
