//! The fixed, strictly sequential stage pipeline

use crate::error::OrchestratorResult;
use crate::stages::{BuildStage, FixtureServerStage, Stage, StageContext, StageKind};
use shared::{process_debug, ProcessId};

/// Ordered list of stages; the first failure stops the run
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixture server, two compiles, two bundles, then the browser test run
    pub fn standard() -> Self {
        Self::new()
            .with_stage(FixtureServerStage::new())
            .with_stage(BuildStage::compile_sources())
            .with_stage(BuildStage::compile_tests())
            .with_stage(BuildStage::bundle_sources())
            .with_stage(BuildStage::bundle_tests())
            .with_stage(BuildStage::run_tests())
    }

    /// Append a stage (fluent API)
    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Stage kinds in execution order
    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|stage| stage.kind()).collect()
    }

    /// Run every stage in order; a stage only starts once its predecessor succeeded
    pub async fn run(&self, ctx: &StageContext) -> OrchestratorResult<()> {
        for (index, stage) in self.stages.iter().enumerate() {
            process_debug!(
                ProcessId::current(),
                "📋 Stage {}/{}: {}",
                index + 1,
                self.stages.len(),
                stage.kind()
            );
            stage.run(ctx).await?;
        }
        Ok(())
    }
}
