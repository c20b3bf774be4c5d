//! Build and test stages: compiler, bundler and headless test runner runs

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use super::{Stage, StageContext, StageKind};
use crate::config::PipelineConfig;
use crate::error::OrchestratorResult;
use crate::process::{spawn_tracked, OutputMode};
use shared::{process_warn, ProcessId};

/// A fully resolved tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub output: OutputMode,
}

impl Invocation {
    fn new<I, S>(program: &Path, args: I, output: OutputMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.to_path_buf(),
            args: args.into_iter().map(Into::into).collect(),
            output,
        }
    }
}

/// One external tool run that must exit with status 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStage {
    kind: StageKind,
}

impl BuildStage {
    pub fn compile_sources() -> Self {
        Self { kind: StageKind::CompileSources }
    }

    pub fn compile_tests() -> Self {
        Self { kind: StageKind::CompileTests }
    }

    pub fn bundle_sources() -> Self {
        Self { kind: StageKind::BundleSources }
    }

    pub fn bundle_tests() -> Self {
        Self { kind: StageKind::BundleTests }
    }

    pub fn run_tests() -> Self {
        Self { kind: StageKind::RunTests }
    }

    fn success_message(&self) -> &'static str {
        match self.kind {
            StageKind::CompileSources => "Finished compiling source files",
            StageKind::CompileTests => "Finished compiling test files",
            StageKind::BundleSources => "Finished bundling source files successfully",
            StageKind::BundleTests => "Finished bundling test files successfully",
            StageKind::RunTests => "Finished testing successfully",
            StageKind::StartFixtureServer => "Fixture server started",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self.kind {
            StageKind::CompileSources => "Failed compiling source files",
            StageKind::CompileTests => "Failed compiling test files",
            StageKind::BundleSources => "Bundling source files failed",
            StageKind::BundleTests => "Bundling test files failed",
            StageKind::RunTests => "Tests failed",
            StageKind::StartFixtureServer => "Fixture server failed",
        }
    }

    /// Resolve program and arguments for this stage
    pub async fn invocation(&self, config: &PipelineConfig) -> OrchestratorResult<Invocation> {
        let invocation = match self.kind {
            StageKind::CompileSources => Invocation::new(
                &config.compiler,
                ["src", "--out-dir", "dist", "--source-maps", "--presets", "latest"],
                OutputMode::Logged,
            ),
            StageKind::CompileTests => Invocation::new(
                &config.compiler,
                ["test/specs", "--out-dir", "test", "--presets", "es2015"],
                OutputMode::Logged,
            ),
            StageKind::BundleSources => {
                let mut args: Vec<OsString> = vec![config.library_dist_path().into_os_string()];
                args.extend(["--outfile", "test/bundle.js", "-s"].map(OsString::from));
                args.push(OsString::from(&config.library_name));
                Invocation::new(&config.bundler, args, OutputMode::Logged)
            }
            StageKind::BundleTests => {
                let inputs = spec_bundle_inputs(&config.specs_dir).await.map_err(|e| {
                    self.kind.error(format!(
                        "cannot read specs directory {}: {e}",
                        config.specs_dir.display()
                    ))
                })?;
                if inputs.is_empty() {
                    process_warn!(
                        ProcessId::current(),
                        "⚠️ No spec files found in {}",
                        config.specs_dir.display()
                    );
                }

                let mut args: Vec<OsString> = inputs.into_iter().map(PathBuf::into_os_string).collect();
                args.extend(["--outfile", "test/spec.bundle.js"].map(OsString::from));
                Invocation::new(&config.bundler, args, OutputMode::Logged)
            }
            StageKind::RunTests => Invocation::new(
                &config.test_runner,
                [
                    config.harness_page.as_os_str(),
                    OsStr::new("-p"),
                    config.browser_binary.as_os_str(),
                ],
                OutputMode::Raw,
            ),
            StageKind::StartFixtureServer => {
                return Err(self.kind.error("the fixture server is not a build tool"));
            }
        };
        Ok(invocation)
    }
}

/// Compiled spec files, one `test/<name>` per entry of the specs directory, sorted
pub async fn spec_bundle_inputs(specs_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(specs_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            names.push(entry.file_name());
        }
    }
    names.sort();

    Ok(names.into_iter().map(|name| Path::new("test").join(name)).collect())
}

#[async_trait]
impl Stage for BuildStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, ctx: &StageContext) -> OrchestratorResult<()> {
        let invocation = self.invocation(&ctx.config).await?;

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).current_dir(&ctx.config.project_root);

        let mut child = spawn_tracked(command, &self.kind.to_string(), &ctx.registry)
            .await
            .map_err(|e| {
                self.kind.error(format!(
                    "{}: failed to spawn {}: {e}",
                    self.failure_message(),
                    invocation.program.display()
                ))
            })?;

        let forwarders = child.forward_output(&ctx.logger, invocation.output);
        let exit = child.wait_closed(forwarders).await;

        if !exit.success() {
            return Err(self.kind.error(format!("{} ({exit})", self.failure_message())));
        }

        ctx.logger.success(self.success_message());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(invocation: &Invocation) -> Vec<String> {
        invocation
            .args
            .iter()
            .map(|arg| arg.to_string_lossy().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_compile_invocations() {
        let config = PipelineConfig::new("/p");

        let sources = BuildStage::compile_sources().invocation(&config).await.unwrap();
        assert_eq!(sources.program, PathBuf::from("/p/node_modules/.bin/babel"));
        assert_eq!(
            args(&sources),
            vec!["src", "--out-dir", "dist", "--source-maps", "--presets", "latest"]
        );

        let tests = BuildStage::compile_tests().invocation(&config).await.unwrap();
        assert_eq!(args(&tests), vec!["test/specs", "--out-dir", "test", "--presets", "es2015"]);
    }

    #[tokio::test]
    async fn test_bundle_sources_invocation() {
        let config = PipelineConfig::new("/p").with_library("lib.js", "MyLib");

        let invocation = BuildStage::bundle_sources().invocation(&config).await.unwrap();

        assert_eq!(invocation.program, PathBuf::from("/p/node_modules/.bin/browserify"));
        assert_eq!(
            args(&invocation),
            vec!["dist/lib.js", "--outfile", "test/bundle.js", "-s", "MyLib"]
        );
    }

    #[tokio::test]
    async fn test_bundle_tests_lists_specs_sorted() {
        let root = tempfile::tempdir().unwrap();
        let specs = root.path().join("test").join("specs");
        std::fs::create_dir_all(specs.join("nested")).unwrap();
        std::fs::write(specs.join("b.spec.js"), "").unwrap();
        std::fs::write(specs.join("a.spec.js"), "").unwrap();

        let config = PipelineConfig::new(root.path());
        let invocation = BuildStage::bundle_tests().invocation(&config).await.unwrap();

        assert_eq!(
            args(&invocation),
            vec!["test/a.spec.js", "test/b.spec.js", "--outfile", "test/spec.bundle.js"]
        );
    }

    #[tokio::test]
    async fn test_bundle_tests_missing_specs_is_bundle_error() {
        let root = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(root.path());

        let err = BuildStage::bundle_tests().invocation(&config).await.unwrap_err();

        assert!(matches!(err, crate::error::OrchestratorError::BundleError { .. }));
    }

    #[tokio::test]
    async fn test_run_tests_invocation_is_raw() {
        let config = PipelineConfig::new("/p");

        let invocation = BuildStage::run_tests().invocation(&config).await.unwrap();

        assert_eq!(invocation.output, OutputMode::Raw);
        assert_eq!(
            args(&invocation),
            vec![
                "/p/test/testRunner.html",
                "-p",
                "/p/node_modules/phantomjs-prebuilt/bin/phantomjs"
            ]
        );
    }
}
