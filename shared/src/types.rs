//! Core types used by every harness process

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Global process ID singleton - set once at startup
static PROCESS_ID: OnceLock<ProcessId> = OnceLock::new();

/// Reported by `ProcessId::current()` before any `init_*` call (unit tests, tools)
static UNREGISTERED: ProcessId = ProcessId::Unregistered;

/// Process identifier for any component in the harness
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessId {
    /// Pipeline orchestrator (singleton)
    Orchestrator,
    /// Fixture HTTP server spawned by the orchestrator
    FixtureServer,
    /// No identity assigned yet
    Unregistered,
}

impl ProcessId {
    /// Initialize the global process ID for the orchestrator
    pub fn init_orchestrator() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Orchestrator)
    }

    /// Initialize the global process ID for the fixture server
    pub fn init_fixture_server() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::FixtureServer)
    }

    /// Get the global process ID, `Unregistered` until one of the `init_*` calls ran
    pub fn current() -> &'static ProcessId {
        PROCESS_ID.get().unwrap_or(&UNREGISTERED)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Orchestrator => write!(f, "orchestrator"),
            ProcessId::FixtureServer => write!(f, "fixture_server"),
            ProcessId::Unregistered => write!(f, "unregistered"),
        }
    }
}
