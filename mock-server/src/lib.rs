use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    pub capital: String,
    pub code: String,
    pub region: String,
    pub flag: String,
    pub currency: Currency,
    pub language: Language,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

pub type Db = Arc<RwLock<Vec<Country>>>;

pub const MALFORMED_BODY: &str = r#"[{"name": "Atlantis", "capital": "#;

fn country(name: &str, capital: &str, code: &str, flag: &str, language: (&str, &str)) -> Country {
    Country {
        name: name.to_string(),
        capital: capital.to_string(),
        code: code.to_string(),
        region: "EU".to_string(),
        flag: flag.to_string(),
        currency: Currency {
            code: "EUR".to_string(),
            name: "Euro".to_string(),
            symbol: "€".to_string(),
        },
        language: Language {
            code: language.0.to_string(),
            name: language.1.to_string(),
        },
    }
}

/// Built-in countries served until a test replaces them.
pub fn fixture() -> Vec<Country> {
    vec![
        country("Germany", "Berlin", "DE", "🇩🇪", ("de", "German")),
        country("France", "Paris", "FR", "🇫🇷", ("fr", "French")),
        country("Spain", "Madrid", "ES", "🇪🇸", ("es", "Spanish")),
        country("Italy", "Rome", "IT", "🇮🇹", ("it", "Italian")),
    ]
}

pub fn app() -> Router {
    app_with(fixture())
}

pub fn app_with(countries: Vec<Country>) -> Router {
    let db: Db = Arc::new(RwLock::new(countries));
    Router::new()
        .route("/countries.json", get(list_countries).put(replace_countries))
        .route("/empty.json", get(empty))
        .route("/malformed.json", get(malformed))
        .route("/unavailable", get(unavailable))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_countries(State(db): State<Db>) -> Json<Vec<Country>> {
    let countries = db.read().await;
    tracing::debug!(count = countries.len(), "serving countries");
    Json(countries.clone())
}

async fn replace_countries(State(db): State<Db>, Json(input): Json<Vec<Country>>) -> StatusCode {
    tracing::debug!(count = input.len(), "replacing countries");
    *db.write().await = input;
    StatusCode::NO_CONTENT
}

async fn empty() -> Json<Vec<Country>> {
    Json(Vec::new())
}

async fn malformed() -> ([(axum::http::HeaderName, &'static str); 1], &'static str) {
    ([(axum::http::header::CONTENT_TYPE, "application/json")], MALFORMED_BODY)
}

async fn unavailable() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}
