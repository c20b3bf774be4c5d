//! Live-socket tests for the readiness announcement

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::sync::oneshot;

use fixture_server::{run, FixtureServer, FixtureState, ReadinessNotifier};
use shared::{read_message, ReadinessMessage};

fn loopback() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 0))
}

async fn parent_listener() -> (TcpListener, ReadinessNotifier) {
    let listener = TcpListener::bind(loopback()).await.unwrap();
    let notifier = ReadinessNotifier::new(Some(listener.local_addr().unwrap()));
    (listener, notifier)
}

async fn receive(listener: &TcpListener) -> ReadinessMessage {
    let (mut stream, _) = listener.accept().await.unwrap();
    read_message(&mut stream).await.unwrap()
}

#[tokio::test]
async fn test_ready_then_requests_succeed() {
    let (listener, notifier) = parent_listener().await;
    let resources = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(run(
        FixtureServer::new(loopback(), FixtureState::new(resources)),
        notifier,
        async {
            let _ = stop_rx.await;
        },
    ));

    let ReadinessMessage::Ready { server: info } = receive(&listener).await else {
        panic!("expected a ready message");
    };
    assert_eq!(info.name, "test-server");
    assert!(info.url.starts_with("http://127.0.0.1:"));

    // The socket is already bound when the frame arrives
    let body = reqwest::get(format!("{}/text", info.url))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "Lorem ipsum dolor sit amet.");

    let json: serde_json::Value = reqwest::get(format!("{}/json", info.url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json, serde_json::json!({"foo": "bar", "test": true}));

    stop_tx.send(()).unwrap();
    assert!(server.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_bind_failure_announces_failed() {
    let (listener, notifier) = parent_listener().await;
    let taken = TcpListener::bind(loopback()).await.unwrap();
    let addr = taken.local_addr().unwrap();

    let server = tokio::spawn(run(
        FixtureServer::new(addr, FixtureState::new(".")),
        notifier,
        std::future::pending(),
    ));

    let message = receive(&listener).await;
    assert!(matches!(message, ReadinessMessage::Failed { .. }));
    assert!(server.await.unwrap().is_err());
}
