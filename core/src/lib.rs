//! Data pipeline behind the countries list screen.
//!
//! # Overview
//! Fetches a JSON array of countries from one configured endpoint, decodes it,
//! and publishes the result into observable state that a presentation layer
//! subscribes to. The presentation layer itself lives outside this crate.
//!
//! # Design
//! - `CountriesParser` decodes bytes; `JsonCountriesParser` is the default.
//! - `CountriesService` performs one transport call per fetch and folds every
//!   failure into `ServiceError`. Transport and parser are injected, which is
//!   how tests force empty results, failures, and malformed payloads.
//! - `CountriesViewModel` owns `countries` and `last_error` as `Observable`
//!   values, hands out read-only `ObservableRef`s to them, and exposes a
//!   fire-and-forget `refresh_countries`. All writes go through one
//!   `SerialDispatcher`.
//! - Types use owned `String` / `Vec` fields to keep the FFI mapping simple.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod http;
pub mod observable;
pub mod parser;
pub mod service;
pub mod transport;
pub mod types;
pub mod view_model;

pub use config::ServiceConfig;
pub use dispatch::{Dispatcher, SerialDispatcher};
pub use error::{ParseError, ServiceError};
pub use filter::filter_countries;
pub use http::{HttpResponse, Transport, TransportError, Uri};
pub use observable::{Observable, ObservableRef, Subscription};
pub use parser::{CountriesParser, JsonCountriesParser, ScriptedParser};
pub use service::{CountriesService, FetchCountries};
pub use transport::{Script, ScriptedTransport, UreqTransport};
pub use types::{Country, Currency, Language};
pub use view_model::CountriesViewModel;
