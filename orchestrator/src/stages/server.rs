//! Fixture server startup
//!
//! The orchestrator binds a loopback listener, passes its address to the
//! fixture server and waits for the one readiness frame the server sends
//! after binding its own socket.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::process::Command;

use super::{Stage, StageContext, StageKind};
use crate::error::OrchestratorResult;
use crate::process::{spawn_tracked, OutputMode};
use shared::{process_debug, read_message, ProcessId, ReadinessMessage};

/// Loopback listener receiving the fixture server's readiness frame
pub struct ReadinessListener {
    listener: TcpListener,
}

impl ReadinessListener {
    /// Bind on an ephemeral loopback port
    pub async fn bind() -> OrchestratorResult<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> OrchestratorResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept one connection and read its single message
    pub async fn recv(&self) -> OrchestratorResult<ReadinessMessage> {
        let (mut stream, peer) = self.listener.accept().await?;
        process_debug!(ProcessId::current(), "📨 Readiness connection from {}", peer);
        Ok(read_message(&mut stream).await?)
    }
}

/// Launches the fixture server and waits for it to report readiness
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureServerStage;

impl FixtureServerStage {
    pub fn new() -> Self {
        Self
    }

    fn command(&self, ctx: &StageContext, readiness_addr: SocketAddr) -> Command {
        let config = &ctx.config;
        let mut cmd = Command::new(&config.fixture_server_bin);
        cmd.arg("--port")
            .arg(config.fixture_port.to_string())
            .arg("--resources-dir")
            .arg(&config.resources_dir)
            .arg("--orchestrator-addr")
            .arg(readiness_addr.to_string())
            .arg("--log-level")
            .arg(&config.log_level)
            .current_dir(&config.project_root);
        cmd
    }
}

#[async_trait]
impl Stage for FixtureServerStage {
    fn kind(&self) -> StageKind {
        StageKind::StartFixtureServer
    }

    async fn run(&self, ctx: &StageContext) -> OrchestratorResult<()> {
        let kind = self.kind();
        let listener = ReadinessListener::bind()
            .await
            .map_err(|e| kind.error(format!("readiness listener unavailable: {e}")))?;
        let readiness_addr = listener.local_addr()?;

        let command = self.command(ctx, readiness_addr);
        let mut child = spawn_tracked(command, &kind.to_string(), &ctx.registry)
            .await
            .map_err(|e| {
                kind.error(format!(
                    "failed to spawn {}: {e}",
                    ctx.config.fixture_server_bin.display()
                ))
            })?;

        // Forwarders live as long as the server does
        let _ = child.forward_output(&ctx.logger, OutputMode::Logged);

        let outcome = tokio::select! {
            message = listener.recv() => match message {
                Ok(ReadinessMessage::Ready { server }) => {
                    ctx.logger.info(format!("Test server listening at {}", server.url));
                    Ok(())
                }
                Ok(ReadinessMessage::Failed { message }) => Err(kind.error(message)),
                Err(e) => Err(kind.error(format!("invalid readiness message: {e}"))),
            },
            exit = child.wait() => Err(kind.error(format!(
                "fixture server exited before signalling readiness ({exit})"
            ))),
        };

        if outcome.is_ok() {
            tokio::spawn(async move {
                let exit = child.wait().await;
                process_debug!(ProcessId::current(), "Fixture server finished: {}", exit);
            });
        }

        outcome
    }
}
