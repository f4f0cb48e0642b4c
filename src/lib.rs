pub mod api;
pub mod db;
pub mod env;
pub mod seed;

use axum::{http::StatusCode, response::IntoResponse};
use db::Database;
use serde::Deserialize;
use std::{path::PathBuf, sync::Arc};

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub enum Error {
    /// Malformed or missing input. The caller's fault; never retried.
    Validation(String),
    /// A referenced id does not exist.
    NotFound(String),
    /// The operation would violate an invariant: a duplicate license
    /// plate, a second active subscription on a vehicle, or deletion of a
    /// still-referenced record.
    Conflict(String),
    /// The underlying store failed. Surfaced verbatim, not interpreted.
    Database(sea_orm::error::DbErr),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Self::Internal(error)
    }
}

impl From<sea_orm::error::DbErr> for Error {
    fn from(error: sea_orm::error::DbErr) -> Self {
        Self::Database(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Internal(error.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (code, message) = match self {
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message),
            Error::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Error::Conflict(message) => (StatusCode::CONFLICT, message),
            Error::Database(error) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", &error))
            }
            Error::Internal(error) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{}", &error))
            }
        };
        log::error!("HTTP error {}: {}", code, &message);
        (code, message).into_response()
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Validation(message) => write!(f, "Validation({message:?})"),
            Error::NotFound(message) => write!(f, "NotFound({message:?})"),
            Error::Conflict(message) => write!(f, "Conflict({message:?})"),
            Error::Database(error) => error.fmt(f),
            Error::Internal(error) => error.fmt(f),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Validation(message)
            | Error::NotFound(message)
            | Error::Conflict(message) => message.fmt(f),
            Error::Database(error) => error.fmt(f),
            Error::Internal(error) => error.fmt(f),
        }
    }
}

impl std::error::Error for Error {}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub http_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub migrations_path: Option<PathBuf>,
    pub seed_path: Option<PathBuf>,
    pub rust_log: Option<String>,
    pub log_json: Option<bool>,
}

#[derive(Deserialize)]
pub struct MigrateConfig {
    pub database_url: String,
    pub migrations_path: Option<PathBuf>,
}

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let mut db_options = db::ConnectOptions::new(config.database_url.clone());
        db_options.max_connections(config.database_max_connections);
        let db = Database::new(db_options).await?;

        let this = Self {
            db: Arc::new(db),
            config,
        };
        Ok(Arc::new(this))
    }
}
