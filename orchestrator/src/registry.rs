//! Registry of every child process the pipeline spawned
//!
//! Stages append to the registry as they spawn; the lifecycle controller
//! drains it exactly once during teardown and terminates each member.

use async_trait::async_trait;
use tokio::sync::{oneshot, watch, Mutex};

use crate::error::OrchestratorResult;
use crate::process::ProcessExit;
use shared::{process_debug, process_warn, ProcessId};

/// Termination handle for one registered process
#[mockall::automock]
#[async_trait]
pub trait ProcessTerminator: Send {
    /// Request termination and wait until the process is gone
    ///
    /// Must be a no-op for a process that already exited.
    async fn terminate(&mut self) -> OrchestratorResult<()>;
}

/// Terminator for a child owned by a supervisor task (see `process::spawn_tracked`)
pub struct ChildTerminator {
    kill_tx: Option<oneshot::Sender<()>>,
    exit: watch::Receiver<Option<ProcessExit>>,
}

impl ChildTerminator {
    pub fn new(kill_tx: oneshot::Sender<()>, exit: watch::Receiver<Option<ProcessExit>>) -> Self {
        Self {
            kill_tx: Some(kill_tx),
            exit,
        }
    }
}

#[async_trait]
impl ProcessTerminator for ChildTerminator {
    async fn terminate(&mut self) -> OrchestratorResult<()> {
        // A closed channel means the supervisor already reaped the child
        if let Some(kill_tx) = self.kill_tx.take() {
            let _ = kill_tx.send(());
        }

        // Errors only when the supervisor is gone, which also means the child is
        let _ = self.exit.wait_for(Option::is_some).await;
        Ok(())
    }
}

/// One entry of the registry
pub struct RegisteredProcess {
    pub name: String,
    pub pid: Option<u32>,
    terminator: Box<dyn ProcessTerminator>,
}

impl RegisteredProcess {
    pub fn new(name: impl Into<String>, pid: Option<u32>, terminator: impl ProcessTerminator + 'static) -> Self {
        Self {
            name: name.into(),
            pid,
            terminator: Box::new(terminator),
        }
    }

    /// Terminate the process, logging instead of failing
    pub async fn terminate(&mut self) {
        match self.terminator.terminate().await {
            Ok(()) => {
                process_debug!(
                    ProcessId::current(),
                    "🛑 Stopped {} (PID: {})",
                    self.name,
                    self.pid.map(|pid| pid.to_string()).unwrap_or_else(|| "unknown".to_string())
                );
            }
            Err(e) => {
                process_warn!(ProcessId::current(), "⚠️ Failed to stop {}: {}", self.name, e);
            }
        }
    }
}

/// Ordered, append-only collection of spawned processes
#[derive(Default)]
pub struct ProcessRegistry {
    processes: Mutex<Vec<RegisteredProcess>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly spawned process
    pub async fn register(&self, process: RegisteredProcess) {
        process_debug!(
            ProcessId::current(),
            "📋 Tracking {} (PID: {:?})",
            process.name,
            process.pid
        );
        self.processes.lock().await.push(process);
    }

    /// Number of processes currently tracked
    pub async fn len(&self) -> usize {
        self.processes.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.processes.lock().await.is_empty()
    }

    /// Names of tracked processes in spawn order
    pub async fn names(&self) -> Vec<String> {
        self.processes
            .lock()
            .await
            .iter()
            .map(|process| process.name.clone())
            .collect()
    }

    /// Take every tracked process out of the registry, leaving it empty
    pub async fn drain(&self) -> Vec<RegisteredProcess> {
        std::mem::take(&mut *self.processes.lock().await)
    }
}
