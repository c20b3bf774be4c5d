//! Pipeline configuration
//!
//! Every path the pipeline touches is derived from the project root, so a
//! default configuration only needs to know where the project lives.

use std::path::{Path, PathBuf};

use crate::error::{OrchestratorError, OrchestratorResult};

/// Default port of the fixture HTTP server
pub const DEFAULT_FIXTURE_PORT: u16 = 8080;

/// Library entry file bundled from `dist/`
pub const DEFAULT_LIBRARY_ENTRY: &str = "example.js";

/// Global name the bundled library is exposed under in the browser
pub const DEFAULT_LIBRARY_NAME: &str = "Example";

/// Paths and names used by the fixed pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Working directory of every tool invocation
    pub project_root: PathBuf,
    /// Transpiler executable
    pub compiler: PathBuf,
    /// Bundler executable
    pub bundler: PathBuf,
    /// Headless-browser test runner executable
    pub test_runner: PathBuf,
    /// Browser binary handed to the test runner
    pub browser_binary: PathBuf,
    /// HTML page that hosts the test bundles
    pub harness_page: PathBuf,
    /// Test specs enumerated by the test bundling stage
    pub specs_dir: PathBuf,
    /// Directory holding the fixture image
    pub resources_dir: PathBuf,
    /// Library main file, relative to `dist/`
    pub library_entry: String,
    /// Global name the library bundle registers
    pub library_name: String,
    /// Fixture server executable
    pub fixture_server_bin: PathBuf,
    /// Fixture server listening port
    pub fixture_port: u16,
    /// Log level handed to the fixture server
    pub log_level: String,
}

impl PipelineConfig {
    /// Create configuration with the standard project layout under `project_root`
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let module_dir = project_root.join("node_modules");
        let bin_dir = module_dir.join(".bin");
        let test_dir = project_root.join("test");

        Self {
            compiler: bin_dir.join("babel"),
            bundler: bin_dir.join("browserify"),
            test_runner: bin_dir.join("mocha-phantomjs"),
            browser_binary: module_dir.join("phantomjs-prebuilt").join("bin").join("phantomjs"),
            harness_page: test_dir.join("testRunner.html"),
            specs_dir: test_dir.join("specs"),
            resources_dir: test_dir.join("resources"),
            library_entry: DEFAULT_LIBRARY_ENTRY.to_string(),
            library_name: DEFAULT_LIBRARY_NAME.to_string(),
            fixture_server_bin: default_fixture_server_bin(),
            fixture_port: DEFAULT_FIXTURE_PORT,
            log_level: "info".to_string(),
            project_root,
        }
    }

    /// Configure library entry file and global name (fluent API)
    pub fn with_library(mut self, entry: impl Into<String>, name: impl Into<String>) -> Self {
        self.library_entry = entry.into();
        self.library_name = name.into();
        self
    }

    /// Configure transpiler executable (fluent API)
    pub fn with_compiler(mut self, compiler: impl Into<PathBuf>) -> Self {
        self.compiler = compiler.into();
        self
    }

    /// Configure bundler executable (fluent API)
    pub fn with_bundler(mut self, bundler: impl Into<PathBuf>) -> Self {
        self.bundler = bundler.into();
        self
    }

    /// Configure test runner and the browser it drives (fluent API)
    pub fn with_test_runner(mut self, runner: impl Into<PathBuf>, browser: impl Into<PathBuf>) -> Self {
        self.test_runner = runner.into();
        self.browser_binary = browser.into();
        self
    }

    /// Configure fixture server executable (fluent API)
    pub fn with_fixture_server_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.fixture_server_bin = bin.into();
        self
    }

    /// Configure fixture server port (fluent API)
    pub fn with_fixture_port(mut self, port: u16) -> Self {
        self.fixture_port = port;
        self
    }

    /// Configure log level passed to child processes (fluent API)
    pub fn with_log_level(mut self, log_level: impl Into<String>) -> Self {
        self.log_level = log_level.into();
        self
    }

    /// Path of the library entry inside `dist/`, relative to the project root
    pub fn library_dist_path(&self) -> PathBuf {
        Path::new("dist").join(&self.library_entry)
    }

    /// Reject configurations the pipeline cannot possibly run with
    pub fn validate(&self) -> OrchestratorResult<()> {
        if !self.project_root.is_dir() {
            return Err(OrchestratorError::config(format!(
                "project root {} is not a directory",
                self.project_root.display()
            )));
        }
        if self.library_entry.trim().is_empty() {
            return Err(OrchestratorError::config("library entry must not be empty"));
        }
        if self.library_name.trim().is_empty() {
            return Err(OrchestratorError::config("library name must not be empty"));
        }
        if self.fixture_port == 0 {
            return Err(OrchestratorError::config("fixture port must not be 0"));
        }
        Ok(())
    }
}

/// The fixture server binary is built next to the orchestrator binary
fn default_fixture_server_bin() -> PathBuf {
    std::env::current_exe()
        .map(|exe| exe.with_file_name(fixture_server_file_name()))
        .unwrap_or_else(|_| PathBuf::from(fixture_server_file_name()))
}

fn fixture_server_file_name() -> String {
    format!("fixture-server{}", std::env::consts::EXE_SUFFIX)
}
