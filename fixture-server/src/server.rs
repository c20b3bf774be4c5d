//! Fixture server lifecycle: bind, announce readiness, serve
//!
//! Readiness is reported only once the listening socket is bound, so the
//! parent can issue requests as soon as it receives the `ready` frame.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::{TcpListener, TcpStream};

use crate::error::{FixtureError, FixtureResult};
use crate::routes::{router, FixtureState};
use shared::{process_info, send_message, ProcessId, ReadinessMessage};

/// Name reported in the readiness message
pub const SERVER_NAME: &str = "test-server";

/// Unbound fixture server
pub struct FixtureServer {
    addr: SocketAddr,
    state: FixtureState,
}

impl FixtureServer {
    pub fn new(addr: SocketAddr, state: FixtureState) -> Self {
        Self { addr, state }
    }

    /// Bind the listening socket
    pub async fn bind(self) -> FixtureResult<BoundServer> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| FixtureError::startup(self.addr, e))?;
        let local_addr = listener.local_addr()?;

        Ok(BoundServer {
            listener,
            local_addr,
            router: router(self.state),
        })
    }
}

/// A fixture server whose socket is bound and accepting connections
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// The `ready` message describing this server
    pub fn ready_message(&self) -> ReadinessMessage {
        ReadinessMessage::ready(SERVER_NAME, self.url())
    }

    /// Serve requests until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> FixtureResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        process_info!(ProcessId::current(), "🌐 Fixture server listening on {}", self.url());
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Sends the one readiness frame to the parent process, if there is one
#[derive(Debug, Clone, Copy)]
pub struct ReadinessNotifier {
    parent: Option<SocketAddr>,
}

impl ReadinessNotifier {
    pub fn new(parent: Option<SocketAddr>) -> Self {
        Self { parent }
    }

    /// Without a parent address the announcement is only logged
    pub fn standalone() -> Self {
        Self { parent: None }
    }

    pub fn is_standalone(&self) -> bool {
        self.parent.is_none()
    }

    pub async fn announce(&self, message: &ReadinessMessage) -> FixtureResult<()> {
        let Some(parent) = self.parent else {
            process_info!(ProcessId::current(), "📣 Standalone mode, readiness: {:?}", message);
            return Ok(());
        };

        let mut stream = TcpStream::connect(parent).await?;
        send_message(&mut stream, message).await?;
        Ok(())
    }
}

/// Bind, report the outcome to the parent, then serve until `shutdown`
pub async fn run<F>(server: FixtureServer, notifier: ReadinessNotifier, shutdown: F) -> FixtureResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bound = match server.bind().await {
        Ok(bound) => bound,
        Err(e) => {
            // Best effort; the bind error is what gets returned
            let _ = notifier.announce(&ReadinessMessage::failed(e.to_string())).await;
            return Err(e);
        }
    };

    notifier.announce(&bound.ready_message()).await?;
    bound.serve(shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bound_server_reports_url() {
        let server = FixtureServer::new(SocketAddr::from(([127, 0, 0, 1], 0)), FixtureState::new("."));
        let bound = server.bind().await.unwrap();

        assert_ne!(bound.local_addr().port(), 0);
        assert_eq!(bound.url(), format!("http://127.0.0.1:{}", bound.local_addr().port()));
        assert_eq!(
            bound.ready_message(),
            ReadinessMessage::ready("test-server", bound.url())
        );
    }

    #[tokio::test]
    async fn test_bind_conflict_is_startup_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let result = FixtureServer::new(addr, FixtureState::new(".")).bind().await;

        assert!(matches!(result, Err(FixtureError::ServerStartupFailed { .. })));
    }

    #[tokio::test]
    async fn test_standalone_announce_is_ok() {
        let notifier = ReadinessNotifier::standalone();
        assert!(notifier.is_standalone());
        assert!(notifier.announce(&ReadinessMessage::failed("x")).await.is_ok());
    }
}
