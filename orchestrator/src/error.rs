//! Orchestrator-specific error types
//!
//! One variant per pipeline stage; all of them are terminal.

use shared::SharedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Fixture server failed to start: {message}")]
    ServerStartError { message: String },

    #[error("Compilation failed: {message}")]
    CompileError { message: String },

    #[error("Bundling failed: {message}")]
    BundleError { message: String },

    #[error("Test run failed: {message}")]
    TestRunError { message: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrchestratorError {
    pub fn server_start(message: impl Into<String>) -> Self {
        Self::ServerStartError {
            message: message.into(),
        }
    }

    pub fn compile(message: impl Into<String>) -> Self {
        Self::CompileError {
            message: message.into(),
        }
    }

    pub fn bundle(message: impl Into<String>) -> Self {
        Self::BundleError {
            message: message.into(),
        }
    }

    pub fn test_run(message: impl Into<String>) -> Self {
        Self::TestRunError {
            message: message.into(),
        }
    }

    pub fn config(field: impl Into<String>) -> Self {
        Self::ConfigurationError { field: field.into() }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
