//! Pipeline stages
//!
//! A stage launches one child process and resolves once that child reached
//! its terminal event. Stages never run concurrently.

pub mod build;
pub mod server;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::PipelineConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::logger::PipelineLogger;
use crate::registry::ProcessRegistry;

pub use build::BuildStage;
pub use server::{FixtureServerStage, ReadinessListener};

/// The fixed steps of the pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    StartFixtureServer,
    CompileSources,
    CompileTests,
    BundleSources,
    BundleTests,
    RunTests,
}

impl StageKind {
    /// Every stage in pipeline order
    pub const ALL: [StageKind; 6] = [
        StageKind::StartFixtureServer,
        StageKind::CompileSources,
        StageKind::CompileTests,
        StageKind::BundleSources,
        StageKind::BundleTests,
        StageKind::RunTests,
    ];

    /// Wrap `message` in the error variant belonging to this stage
    pub fn error(&self, message: impl Into<String>) -> OrchestratorError {
        match self {
            StageKind::StartFixtureServer => OrchestratorError::server_start(message),
            StageKind::CompileSources | StageKind::CompileTests => OrchestratorError::compile(message),
            StageKind::BundleSources | StageKind::BundleTests => OrchestratorError::bundle(message),
            StageKind::RunTests => OrchestratorError::test_run(message),
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::StartFixtureServer => "fixture-server",
            StageKind::CompileSources => "compile-sources",
            StageKind::CompileTests => "compile-tests",
            StageKind::BundleSources => "bundle-sources",
            StageKind::BundleTests => "bundle-tests",
            StageKind::RunTests => "run-tests",
        };
        f.write_str(name)
    }
}

/// Everything a stage needs while running
#[derive(Clone)]
pub struct StageContext {
    pub config: Arc<PipelineConfig>,
    pub registry: Arc<ProcessRegistry>,
    pub logger: PipelineLogger,
}

impl StageContext {
    pub fn new(config: PipelineConfig, registry: Arc<ProcessRegistry>, logger: PipelineLogger) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            logger,
        }
    }
}

/// One asynchronous step of the pipeline
#[mockall::automock]
#[async_trait]
pub trait Stage: Send + Sync {
    /// Which pipeline step this is
    fn kind(&self) -> StageKind;

    /// Run the step to completion
    async fn run(&self, ctx: &StageContext) -> OrchestratorResult<()>;
}
