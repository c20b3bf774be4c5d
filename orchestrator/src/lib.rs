//! Orchestrator library for the browser test harness
//!
//! Launches the fixture server, runs the compile and bundle tools and the
//! headless test runner strictly one after another, and guarantees every
//! spawned child is terminated before the process exits.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logger;
pub mod pipeline;
pub mod process;
pub mod registry;
pub mod stages;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use lifecycle::{Lifecycle, ShutdownReason, TerminationSignals};
pub use logger::{LogLevel, LogSink, PipelineLogger, RecordingSink};
pub use pipeline::Pipeline;
pub use registry::{ProcessRegistry, ProcessTerminator};
pub use stages::{Stage, StageContext, StageKind};
