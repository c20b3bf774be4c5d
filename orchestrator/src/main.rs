//! Main entry point for the orchestrator binary
//!
//! Runs the fixed harness pipeline from the project root and exits with 0 on
//! success (or when interrupted) and 1 when any stage failed.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use orchestrator::{
    Lifecycle, Pipeline, PipelineConfig, PipelineLogger, ProcessRegistry, ShutdownReason, StageContext,
    TerminationSignals,
};
use shared::{logging, ProcessId};

/// Browser test harness orchestrator
#[derive(Parser, Debug)]
#[command(name = "orchestrator")]
#[command(about = "Starts the fixture server, builds sources and specs, and runs the browser tests")]
pub struct Args {
    /// Project root containing src/, test/ and node_modules/ (defaults to the current directory)
    #[arg(long, env = "HARNESS_PROJECT_ROOT")]
    pub project_root: Option<PathBuf>,

    /// Library main file inside dist/ to bundle for the tests
    #[arg(long, env = "HARNESS_LIBRARY_ENTRY", default_value = "example.js")]
    pub library_entry: String,

    /// Global name the library bundle is registered under in the browser
    #[arg(long, env = "HARNESS_LIBRARY_NAME", default_value = "Example")]
    pub library_name: String,

    /// Fixture server port
    #[arg(long, env = "HARNESS_FIXTURE_PORT", default_value = "8080")]
    pub fixture_port: u16,

    /// Fixture server executable (defaults to the one next to this binary)
    #[arg(long, env = "HARNESS_FIXTURE_SERVER_BIN")]
    pub fixture_server_bin: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    fn into_config(self) -> std::io::Result<PipelineConfig> {
        let project_root = match self.project_root {
            Some(root) => root,
            None => std::env::current_dir()?,
        };

        let mut config = PipelineConfig::new(project_root)
            .with_library(self.library_entry, self.library_name)
            .with_fixture_port(self.fixture_port)
            .with_log_level(self.log_level);
        if let Some(bin) = self.fixture_server_bin {
            config = config.with_fixture_server_bin(bin);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Environment overrides first so clap sees them
    let _ = dotenv::dotenv();
    let args = Args::parse();

    // Initialize process ID singleton for orchestrator
    ProcessId::init_orchestrator();
    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup(ProcessId::current(), "browser test harness");

    let logger = PipelineLogger::tracing();
    let registry = Arc::new(ProcessRegistry::new());
    let lifecycle = Lifecycle::new(registry.clone(), logger.clone());

    let config = match args.into_config() {
        Ok(config) => config,
        Err(e) => {
            logging::log_error(ProcessId::current(), "Resolving project root", &e);
            return ExitCode::from(ShutdownReason::Failed.exit_code());
        }
    };
    if let Err(e) = config.validate() {
        logger.error(e.to_string());
        return ExitCode::from(ShutdownReason::Failed.exit_code());
    }

    let mut signals = match TerminationSignals::install() {
        Ok(signals) => signals,
        Err(e) => {
            logging::log_error(ProcessId::current(), "Signal handling", &e);
            return ExitCode::from(ShutdownReason::Failed.exit_code());
        }
    };

    let ctx = StageContext::new(config, registry, logger.clone());
    let pipeline = Pipeline::standard();

    let reason = lifecycle.run(&pipeline, &ctx, signals.recv()).await;
    ExitCode::from(reason.exit_code())
}
