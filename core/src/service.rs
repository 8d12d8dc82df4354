//! The fetch service: one endpoint, one request per call.
//!
//! # Design
//! `CountriesService` holds the endpoint string, a transport, and a parser,
//! and carries no mutable state between calls, so one instance can serve any
//! number of concurrent fetches. Both collaborators are injected through the
//! constructor; that is the only test seam. There is no retry and no
//! caching: each `fetch_countries` call is exactly one transport round-trip.

use std::future::Future;

use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::{ParseError, ServiceError};
use crate::http::{Transport, TransportError, Uri};
use crate::parser::{CountriesParser, JsonCountriesParser};
use crate::transport::UreqTransport;
use crate::types::Country;

/// Anything that can produce the current list of countries.
///
/// The view-model depends on this trait rather than on `CountriesService`
/// so it can be driven by a test double.
pub trait FetchCountries: Send + Sync {
    fn fetch_countries(&self) -> impl Future<Output = Result<Vec<Country>, ServiceError>> + Send;
}

pub struct CountriesService<T, P> {
    endpoint: String,
    transport: T,
    parser: P,
}

impl CountriesService<UreqTransport, JsonCountriesParser> {
    /// Production service for the configured endpoint.
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(&config.endpoint, UreqTransport::new(), JsonCountriesParser)
    }
}

impl<T: Transport, P: CountriesParser> CountriesService<T, P> {
    pub fn new(endpoint: &str, transport: T, parser: P) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            transport,
            parser,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn fetch_countries(&self) -> Result<Vec<Country>, ServiceError> {
        let url = parse_endpoint(&self.endpoint)?;
        debug!(%url, "fetching countries");

        let response = self.transport.fetch(&url).await.map_err(|e| {
            let err = classify(e);
            warn!(error = %err, "countries transport failed");
            err
        })?;

        let countries = self
            .parser
            .parse(response.body.as_deref())
            .inspect_err(|e| warn!(error = %e, status = response.status, "countries payload rejected"))?
            .unwrap_or_default();

        debug!(count = countries.len(), "countries fetched");
        Ok(countries)
    }
}

impl<T: Transport, P: CountriesParser> FetchCountries for CountriesService<T, P> {
    fn fetch_countries(&self) -> impl Future<Output = Result<Vec<Country>, ServiceError>> + Send {
        CountriesService::fetch_countries(self)
    }
}

/// Accept only absolute URLs: a scheme and an authority are both required.
fn parse_endpoint(endpoint: &str) -> Result<Uri, ServiceError> {
    let invalid = || ServiceError::InvalidUrl(endpoint.to_string());
    let url: Uri = endpoint.parse().map_err(|_| invalid())?;
    if url.scheme().is_none() || url.authority().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

/// Errors that already carry a pipeline kind pass through; anything else is a
/// transport failure.
fn classify(err: TransportError) -> ServiceError {
    let err = match err.downcast::<ServiceError>() {
        Ok(service) => return *service,
        Err(other) => other,
    };
    match err.downcast::<ParseError>() {
        Ok(parse) => (*parse).into(),
        Err(other) => ServiceError::Failure(other.into()),
    }
}
