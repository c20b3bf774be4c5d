//! Fixture server error types

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::{process_error, ProcessId, SharedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("HTTP server startup failed on {addr}: {source}")]
    ServerStartupFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read resource {}: {source}", .path.display())]
    ResourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FixtureError {
    pub fn startup(addr: SocketAddr, source: std::io::Error) -> Self {
        Self::ServerStartupFailed {
            addr: addr.to_string(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }
}

impl IntoResponse for FixtureError {
    fn into_response(self) -> Response {
        process_error!(ProcessId::current(), "❌ Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

pub type FixtureResult<T> = Result<T, FixtureError>;
