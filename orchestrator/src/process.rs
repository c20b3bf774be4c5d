//! Spawning and supervising child processes
//!
//! Each child is owned by a supervisor task. The task waits for the child to
//! exit, or for a kill request from the registry, and publishes the final
//! `ProcessExit` on a watch channel. Stages wait on that channel; the
//! registry's terminator sends the kill request. Only the supervisor ever
//! touches the OS handle, so a reaped PID is never signalled.

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::logger::PipelineLogger;
use crate::registry::{ChildTerminator, ProcessRegistry, RegisteredProcess};
use shared::{process_debug, process_warn, ProcessId};

/// Time a child gets to exit after SIGTERM before it is killed outright
pub const TERMINATION_GRACE: Duration = Duration::from_secs(5);

/// Terminal state of a child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Exited normally with a status code
    Code(i32),
    /// Terminated by a signal
    Signalled,
    /// Exit status could not be collected
    Unknown,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        matches!(self, ProcessExit::Code(0))
    }
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => ProcessExit::Code(code),
            None => ProcessExit::Signalled,
        }
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessExit::Code(code) => write!(f, "exit code {code}"),
            ProcessExit::Signalled => write!(f, "terminated by signal"),
            ProcessExit::Unknown => write!(f, "unknown exit status"),
        }
    }
}

/// How a child's stdout is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Through the logger's info channel
    Logged,
    /// Verbatim to stdout
    Raw,
}

/// A spawned, registered child process
pub struct TrackedChild {
    name: String,
    pid: Option<u32>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    exit: watch::Receiver<Option<ProcessExit>>,
}

impl TrackedChild {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the child to exit
    pub async fn wait(&mut self) -> ProcessExit {
        match self.exit.wait_for(Option::is_some).await {
            Ok(exit) => (*exit).unwrap_or(ProcessExit::Unknown),
            Err(_) => ProcessExit::Unknown,
        }
    }

    /// Forward stdout/stderr line by line; stderr always goes to the error channel
    ///
    /// Returns the forwarder tasks; they finish when the streams close.
    pub fn forward_output(&mut self, logger: &PipelineLogger, mode: OutputMode) -> Vec<JoinHandle<()>> {
        let mut forwarders = Vec::with_capacity(2);

        if let Some(stdout) = self.stdout.take() {
            let logger = logger.clone();
            forwarders.push(spawn_line_reader(stdout, move |line| match mode {
                OutputMode::Logged => logger.info(line),
                OutputMode::Raw => logger.raw(line),
            }));
        }

        if let Some(stderr) = self.stderr.take() {
            let logger = logger.clone();
            forwarders.push(spawn_line_reader(stderr, move |line| logger.error(line)));
        }

        forwarders
    }

    /// Wait until the child exited and both output streams closed
    pub async fn wait_closed(&mut self, forwarders: Vec<JoinHandle<()>>) -> ProcessExit {
        let exit = self.wait().await;
        for forwarder in forwarders {
            let _ = forwarder.await;
        }
        exit
    }
}

/// Spawn `command` with piped output and register it for teardown
pub async fn spawn_tracked(
    mut command: Command,
    name: &str,
    registry: &ProcessRegistry,
) -> std::io::Result<TrackedChild> {
    // Configure stdio
    command.stdout(Stdio::piped()).stderr(Stdio::piped()).stdin(Stdio::null());

    let mut child = command.spawn()?;
    let pid = child.id();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (exit_tx, exit_rx) = watch::channel(None);
    let (kill_tx, kill_rx) = oneshot::channel();

    tokio::spawn(supervise(child, name.to_string(), kill_rx, exit_tx));

    registry
        .register(RegisteredProcess::new(
            name,
            pid,
            ChildTerminator::new(kill_tx, exit_rx.clone()),
        ))
        .await;

    process_debug!(
        ProcessId::current(),
        "🚀 Spawned {} (PID: {})",
        name,
        pid.map(|pid| pid.to_string()).unwrap_or_else(|| "unknown".to_string())
    );

    Ok(TrackedChild {
        name: name.to_string(),
        pid,
        stdout,
        stderr,
        exit: exit_rx,
    })
}

/// Own the child until it exits or a kill request arrives
async fn supervise(
    mut child: Child,
    name: String,
    kill_rx: oneshot::Receiver<()>,
    exit_tx: watch::Sender<Option<ProcessExit>>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        Ok(()) = kill_rx => terminate_gracefully(&mut child, &name).await,
    };

    let exit = match status {
        Ok(status) => ProcessExit::from(status),
        Err(e) => {
            process_warn!(ProcessId::current(), "⚠️ Failed to collect exit status of {}: {}", name, e);
            ProcessExit::Unknown
        }
    };

    process_debug!(ProcessId::current(), "{} finished: {}", name, exit);
    let _ = exit_tx.send(Some(exit));
}

/// SIGTERM first, SIGKILL if the child outlives the grace period
async fn terminate_gracefully(child: &mut Child, name: &str) -> std::io::Result<ExitStatus> {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        match signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) => {
                if let Ok(status) = tokio::time::timeout(TERMINATION_GRACE, child.wait()).await {
                    return status;
                }
                process_warn!(
                    ProcessId::current(),
                    "⚠️ {} (PID: {}) ignored SIGTERM, sending SIGKILL",
                    name,
                    pid
                );
            }
            Err(e) => {
                process_debug!(ProcessId::current(), "SIGTERM to {} (PID: {}) failed: {}", name, pid, e);
            }
        }
    }

    #[cfg(not(unix))]
    process_debug!(ProcessId::current(), "Killing {}", name);

    child.kill().await?;
    child.wait().await
}

/// Forward `stream` line by line until EOF
///
/// Lines are decoded lossily. The stream is always drained to EOF so the
/// child never writes into a closed pipe.
fn spawn_line_reader<R, F>(stream: R, mut on_line: F) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    F: FnMut(&str) + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => on_line(&decode_line(&buf)),
                Err(e) => {
                    process_debug!(ProcessId::current(), "Output stream read failed, discarding the rest: {}", e);
                    let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
                    break;
                }
            }
        }
    })
}

/// Strip the line terminator and replace invalid UTF-8
fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
