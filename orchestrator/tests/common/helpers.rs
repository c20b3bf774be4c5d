//! Fake project builder for stage tests

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use orchestrator::stages::BuildStage;
use orchestrator::{Pipeline, PipelineConfig, PipelineLogger, ProcessRegistry, RecordingSink, StageContext};
use tempfile::TempDir;

use super::fixtures::TestFixtures;

/// A throwaway project root whose tools append their argv to `calls.log`
pub struct FakeProject {
    root: TempDir,
}

#[allow(dead_code)]
impl FakeProject {
    /// Project with every tool succeeding and two spec files
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        for dir in ["src", "dist", "test/specs", "test/resources"] {
            std::fs::create_dir_all(root.path().join(dir)).unwrap();
        }
        for spec in TestFixtures::SPECS {
            std::fs::write(root.path().join("test/specs").join(spec), "").unwrap();
        }

        let project = Self { root };
        for tool in [
            TestFixtures::COMPILER,
            TestFixtures::BUNDLER,
            TestFixtures::TEST_RUNNER,
            TestFixtures::BROWSER,
        ] {
            project.with_tool(tool, TestFixtures::SUCCEED);
        }
        project
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Replace the tool at `relative` with a script running `body` after logging its call
    pub fn with_tool(&self, relative: &str, body: &str) -> &Self {
        let path = self.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        let script = format!(
            "#!/bin/sh\necho \"$(basename \"$0\") $*\" >> \"{}\"\n{}\n",
            self.calls_log().display(),
            body
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        self
    }

    /// Fake fixture server: re-runs this test binary's `fake_fixture_server`
    /// test with the readiness address it was given and the frame to send
    pub fn with_fixture_server(&self, event: &str, payload: &str) -> PathBuf {
        let relative = "fake-fixture-server";
        let body = format!(
            r#"while [ $# -gt 0 ]; do
  case "$1" in --orchestrator-addr) ADDR="$2"; shift ;; esac
  shift
done
export FAKE_READINESS_ADDR="$ADDR" FAKE_READINESS_EVENT="{event}" FAKE_READINESS_PAYLOAD="{payload}"
exec "{binary}" --exact fake_fixture_server --ignored --nocapture --test-threads=1"#,
            binary = std::env::current_exe().unwrap().display()
        );
        self.with_tool(relative, &body);
        self.path().join(relative)
    }

    pub fn remove_tool(&self, relative: &str) {
        std::fs::remove_file(self.path().join(relative)).unwrap();
    }

    pub fn calls_log(&self) -> PathBuf {
        self.path().join("calls.log")
    }

    /// Recorded tool invocations, one per line
    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.calls_log())
            .map(|log| log.lines().map(String::from).collect())
            .unwrap_or_default()
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::new(self.path())
    }

    /// Stage context writing to a recording sink
    pub fn context(&self, config: PipelineConfig) -> (StageContext, Arc<RecordingSink>) {
        let sink = RecordingSink::new();
        let ctx = StageContext::new(
            config,
            Arc::new(ProcessRegistry::new()),
            PipelineLogger::new(sink.clone()),
        );
        (ctx, sink)
    }
}

/// The standard pipeline without the fixture server
#[allow(dead_code)]
pub fn build_pipeline() -> Pipeline {
    Pipeline::new()
        .with_stage(BuildStage::compile_sources())
        .with_stage(BuildStage::compile_tests())
        .with_stage(BuildStage::bundle_sources())
        .with_stage(BuildStage::bundle_tests())
        .with_stage(BuildStage::run_tests())
}
