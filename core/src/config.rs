//! Service configuration: the endpoint URL and nothing else.

/// Public JSON document listing every country.
pub const DEFAULT_ENDPOINT: &str = "https://gist.githubusercontent.com/peymano-wmt/32dcb892b06648910ddd40406e37fdab/raw/db25946fd77c5873b0303b858e861ce724e0dcd0/countries.json";

/// Environment variable that overrides the endpoint.
pub const ENDPOINT_ENV: &str = "COUNTRIES_ENDPOINT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub endpoint: String,
}

impl ServiceConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Read the endpoint from `COUNTRIES_ENDPOINT`, falling back to the
    /// default. The value is not validated here; the service rejects it with
    /// `InvalidUrl` on first fetch.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(ENDPOINT_ENV).filter(|value| !value.trim().is_empty()) {
            Some(endpoint) => Self::new(endpoint.trim()),
            None => Self::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}
