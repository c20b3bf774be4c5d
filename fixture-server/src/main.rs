//! Fixture server child process entry point
//!
//! Started by the orchestrator with `--orchestrator-addr`; runs standalone
//! without it.

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use shared::{logging, process_info, ProcessId};
use tokio::signal;

use fixture_server::{FixtureError, FixtureResult, FixtureServer, FixtureState, ReadinessNotifier};

/// Command line arguments passed by the orchestrator
#[derive(Parser, Debug)]
#[command(name = "fixture-server")]
#[command(about = "Static HTTP fixtures for browser tests")]
struct Args {
    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port for HTTP server
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Directory holding image.png
    #[arg(long, default_value = "./resources")]
    resources_dir: String,

    /// Orchestrator readiness address (if not provided, runs in standalone mode)
    #[arg(long)]
    orchestrator_addr: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn http_addr(&self) -> FixtureResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| FixtureError::config(format!("Invalid host or port: {e}")))
    }

    fn notifier(&self) -> FixtureResult<ReadinessNotifier> {
        let parent = self
            .orchestrator_addr
            .as_deref()
            .map(str::parse::<SocketAddr>)
            .transpose()
            .map_err(|e| FixtureError::config(format!("Invalid orchestrator address: {e}")))?;
        Ok(ReadinessNotifier::new(parent))
    }
}

async fn start(args: Args) -> FixtureResult<()> {
    let http_addr = args.http_addr()?;
    let notifier = args.notifier()?;

    if notifier.is_standalone() {
        process_info!(ProcessId::current(), "🔧 Starting in standalone mode (no orchestrator connection)");
    }

    let server = FixtureServer::new(http_addr, FixtureState::new(&args.resources_dir));

    fixture_server::run(server, notifier, async {
        match signal::ctrl_c().await {
            Ok(()) => logging::log_shutdown(ProcessId::current(), "Received Ctrl+C signal"),
            Err(err) => logging::log_error(ProcessId::current(), "Signal handling", &err),
        }
    })
    .await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize process ID singleton for the fixture server
    ProcessId::init_fixture_server();
    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup(ProcessId::current(), &format!("fixture server on port {}", args.port));

    match start(args).await {
        Ok(()) => {
            logging::log_success(ProcessId::current(), "Fixture server stopped gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            logging::log_error(ProcessId::current(), "Fixture server", &e);
            ExitCode::FAILURE
        }
    }
}
