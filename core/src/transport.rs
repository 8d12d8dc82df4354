//! `Transport` implementations: the production `ureq` client and a scripted
//! transport for tests and native test harnesses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::{debug, trace};

use crate::error::ServiceError;
use crate::http::{HttpResponse, Transport, TransportError, Uri};

/// Blocking `ureq` agent driven from Tokio's blocking pool.
///
/// Non-2xx statuses surface as transport errors (the agent's default), and
/// the agent's default timeouts apply.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    async fn fetch(&self, url: &Uri) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        let url = url.clone();
        tokio::task::spawn_blocking(move || get(&agent, url)).await?
    }
}

fn get(agent: &ureq::Agent, url: Uri) -> Result<HttpResponse, TransportError> {
    debug!(%url, "GET");
    let mut response = agent.get(url).call()?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    let body = response.body_mut().read_to_vec()?;
    trace!(status, bytes = body.len(), "response received");

    Ok(HttpResponse {
        status,
        headers,
        body: Some(body),
    })
}

/// One canned outcome of a `ScriptedTransport` call.
#[derive(Debug, Clone)]
pub enum Script {
    /// Respond 200 with this body.
    Body(Vec<u8>),
    /// Respond 200 with no body at all.
    NoBody,
    /// Fail like a network error would; the service wraps it in `Failure`.
    NetworkError(String),
    /// Fail with a specific service error kind, which the service passes
    /// through unchanged. Used to force `EmptyResponse` or `InvalidData`.
    Reject(ServiceError),
}

impl Script {
    fn play(&self) -> Result<HttpResponse, TransportError> {
        match self {
            Script::Body(body) => Ok(HttpResponse::ok(body.clone())),
            Script::NoBody => Ok(HttpResponse {
                status: 200,
                ..HttpResponse::default()
            }),
            Script::NetworkError(message) => Err(message.clone().into()),
            Script::Reject(err) => Err(Box::new(err.clone())),
        }
    }
}

/// A transport that replays canned outcomes instead of touching the network.
///
/// Outcomes are consumed in order; the last one repeats once the queue is
/// down to a single entry. With no script at all every call fails with
/// `ServiceError::InvalidData`.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Self {
        Self::sequence([script])
    }

    pub fn sequence(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into_iter().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn body(body: impl Into<Vec<u8>>) -> Self {
        Self::new(Script::Body(body.into()))
    }

    /// Number of `fetch` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Option<Script> {
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        if scripts.len() > 1 {
            scripts.pop_front()
        } else {
            scripts.front().cloned()
        }
    }
}

impl Transport for ScriptedTransport {
    async fn fetch(&self, url: &Uri) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        trace!(%url, "scripted fetch");
        match self.next() {
            Some(script) => script.play(),
            None => Err(Box::new(ServiceError::InvalidData)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Uri {
        Uri::from_static("https://mock.url/countries.json")
    }

    #[tokio::test]
    async fn body_script_returns_payload() {
        let transport = ScriptedTransport::body("[]");
        let response = transport.fetch(&url()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_deref(), Some(&b"[]"[..]));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn no_body_script_returns_absent_payload() {
        let transport = ScriptedTransport::new(Script::NoBody);
        let response = transport.fetch(&url()).await.unwrap();
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn unscripted_transport_fails_with_invalid_data() {
        let transport = ScriptedTransport::default();
        let err = transport.fetch(&url()).await.unwrap_err();
        let err = err.downcast::<ServiceError>().unwrap();
        assert!(matches!(*err, ServiceError::InvalidData));
    }

    #[tokio::test]
    async fn sequence_plays_in_order_then_repeats_last() {
        let transport = ScriptedTransport::sequence([
            Script::Body(b"first".to_vec()),
            Script::NetworkError("offline".to_string()),
        ]);
        assert!(transport.fetch(&url()).await.is_ok());
        assert!(transport.fetch(&url()).await.is_err());
        let err = transport.fetch(&url()).await.unwrap_err();
        assert_eq!(err.to_string(), "offline");
        assert_eq!(transport.calls(), 3);
    }
}
