//! Shared types for the browser test harness
//!
//! Contains only what both processes need: process identity, logging
//! bootstrap and the readiness handshake between the orchestrator and
//! the fixture server.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

// Re-export the readiness handshake
pub use messages::{read_message, send_message, ReadinessMessage, ServerInfo};
