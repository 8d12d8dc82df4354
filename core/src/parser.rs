//! Decoding of the countries payload.
//!
//! # Design
//! The parser is a trait so the fetch service can be handed a scripted parser
//! in tests. The default implementation is a thin wrapper over `serde_json`.
//! An absent payload is a success with no list, which is deliberately distinct
//! from a present-but-empty JSON array.

use crate::error::ParseError;
use crate::types::Country;

/// Turns a raw response body into countries.
pub trait CountriesParser: Send + Sync {
    fn parse(&self, payload: Option<&[u8]>) -> Result<Option<Vec<Country>>, ParseError>;
}

/// Decodes a JSON array of country records. All-or-nothing: one bad record
/// fails the whole payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCountriesParser;

impl CountriesParser for JsonCountriesParser {
    fn parse(&self, payload: Option<&[u8]>) -> Result<Option<Vec<Country>>, ParseError> {
        let Some(bytes) = payload else {
            return Ok(None);
        };
        serde_json::from_slice(bytes).map(Some).map_err(|e| {
            tracing::debug!(error = %e, "countries payload rejected");
            ParseError::DecodingFailure
        })
    }
}

/// A parser that ignores its input and returns a canned result.
#[derive(Debug, Clone)]
pub struct ScriptedParser {
    result: Result<Option<Vec<Country>>, ParseError>,
}

impl ScriptedParser {
    pub fn returning(countries: Vec<Country>) -> Self {
        Self {
            result: Ok(Some(countries)),
        }
    }

    pub fn returning_nothing() -> Self {
        Self { result: Ok(None) }
    }

    pub fn failing() -> Self {
        Self {
            result: Err(ParseError::DecodingFailure),
        }
    }
}

impl CountriesParser for ScriptedParser {
    fn parse(&self, _payload: Option<&[u8]>) -> Result<Option<Vec<Country>>, ParseError> {
        self.result.clone()
    }
}
