//! Shared error types for the test harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Serialization failed: {message}")]
    SerializationError { message: String },

    #[error("Deserialization failed: {message}")]
    DeserializationError { message: String },

    #[error("Message protocol error: {message}")]
    ProtocolError { message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type SharedResult<T> = Result<T, SharedError>;
