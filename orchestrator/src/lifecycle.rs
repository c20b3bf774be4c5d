//! Process lifecycle: termination signals and the one-time teardown
//!
//! The controller owns a handle to the process registry. Whatever ends the
//! run (success, failure or a signal) funnels into `Lifecycle::shutdown`,
//! which drains the registry and terminates every child exactly once.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::OrchestratorResult;
use crate::logger::PipelineLogger;
use crate::pipeline::Pipeline;
use crate::registry::ProcessRegistry;
use crate::stages::StageContext;
use shared::{logging, ProcessId};

/// Why the orchestrator is shutting down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Every stage succeeded
    Completed,
    /// A stage failed
    Failed,
    /// SIGINT or SIGTERM arrived
    Interrupted,
}

impl ShutdownReason {
    pub fn exit_code(self) -> u8 {
        match self {
            ShutdownReason::Failed => 1,
            ShutdownReason::Completed | ShutdownReason::Interrupted => 0,
        }
    }
}

/// Owns teardown of every process the pipeline spawned
pub struct Lifecycle {
    registry: Arc<ProcessRegistry>,
    logger: PipelineLogger,
    shut_down: AtomicBool,
}

impl Lifecycle {
    pub fn new(registry: Arc<ProcessRegistry>, logger: PipelineLogger) -> Self {
        Self {
            registry,
            logger,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Run `pipeline` until it settles or `interrupt` resolves, then tear down
    ///
    /// `interrupt` yields the name of the signal; the running stage is
    /// abandoned when it fires.
    pub async fn run<F>(&self, pipeline: &Pipeline, ctx: &StageContext, interrupt: F) -> ShutdownReason
    where
        F: Future<Output = &'static str>,
    {
        let reason = tokio::select! {
            result = pipeline.run(ctx) => match result {
                Ok(()) => ShutdownReason::Completed,
                Err(e) => {
                    self.logger.error(e.to_string());
                    ShutdownReason::Failed
                }
            },
            signal = interrupt => {
                logging::log_shutdown(ProcessId::current(), &format!("Received {signal}"));
                ShutdownReason::Interrupted
            }
        };

        self.shutdown(reason).await;
        reason
    }

    /// Drain the registry and terminate every process; later calls do nothing
    ///
    /// Returns how many processes were terminated by this call.
    pub async fn shutdown(&self, reason: ShutdownReason) -> usize {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return 0;
        }

        let mut processes = self.registry.drain().await;
        let count = processes.len();

        match reason {
            ShutdownReason::Failed => {
                self.logger
                    .error(format!("Stopping tests, killing {count} child processes"));
            }
            ShutdownReason::Completed | ShutdownReason::Interrupted => {
                self.logger
                    .success(format!("Cleaning up, killing {count} child processes"));
            }
        }

        for process in processes.iter_mut() {
            process.terminate().await;
        }

        count
    }
}

/// SIGINT / SIGTERM listener, installed before the pipeline starts
#[cfg(unix)]
pub struct TerminationSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    pub fn install() -> OrchestratorResult<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Resolve with the name of the first signal received
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

/// Ctrl-C listener on platforms without unix signals
#[cfg(not(unix))]
pub struct TerminationSignals;

#[cfg(not(unix))]
impl TerminationSignals {
    pub fn install() -> OrchestratorResult<Self> {
        Ok(Self)
    }

    pub async fn recv(&mut self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "Ctrl+C"
    }
}
