//! Domain records for the countries feed.
//!
//! # Design
//! These types mirror the JSON document served by the countries endpoint.
//! Field names match the wire format exactly, so no serde renames are needed.
//! Every field is required: a record missing any of them fails to decode.
//! The mock-server crate defines its own copies; integration tests catch any
//! schema drift between the two.

use serde::{Deserialize, Serialize};

/// A single country as listed by the remote feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Country {
    pub name: String,
    pub capital: String,
    pub code: String,
    pub region: String,
    pub flag: String,
    pub currency: Currency,
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Language {
    pub code: String,
    pub name: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn country(name: &str, capital: &str, code: &str) -> Country {
        Country {
            name: name.to_string(),
            capital: capital.to_string(),
            code: code.to_string(),
            region: "EU".to_string(),
            flag: String::new(),
            currency: Currency {
                code: "EUR".to_string(),
                name: "Euro".to_string(),
                symbol: "€".to_string(),
            },
            language: Language {
                code: code.to_lowercase(),
                name: String::new(),
            },
        }
    }

    pub fn germany() -> Country {
        country("Germany", "Berlin", "DE")
    }

    pub fn france() -> Country {
        country("France", "Paris", "FR")
    }
}
