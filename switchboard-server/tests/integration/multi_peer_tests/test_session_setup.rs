use std::sync::Arc;
use std::time::Duration;
use switchboard_core::{RoomId, Signal, SignalKind, SignalingEnvelope};
use switchboard_server::{ServerConfig, SignalingMode, SignalingService};

use crate::integration::{TestServer, init_tracing, wait_until};
use crate::utils::{CountingNames, MockForwarder, SERVER_CANDIDATE, TestClient};

fn sfu_config() -> ServerConfig {
    ServerConfig {
        mode: SignalingMode::Sfu,
        ..ServerConfig::default()
    }
}

async fn start_sfu(forwarder: &MockForwarder, names: Arc<CountingNames>) -> TestServer {
    TestServer::start_with(
        SignalingService::builder(sfu_config())
            .forwarder(Arc::new(forwarder.clone()))
            .peer_names(names),
    )
    .await
}

fn offer(sdp: &str) -> SignalingEnvelope {
    SignalingEnvelope {
        signal: Some(Signal::offer(sdp)),
        ..SignalingEnvelope::default()
    }
}

#[tokio::test]
async fn test_client_leaving_during_stalled_setup_is_cleaned_up() {
    init_tracing();

    let forwarder = MockForwarder::new().stall_sessions_in("stuck");
    let names = Arc::new(CountingNames::peers());
    let server = start_sfu(&forwarder, names.clone()).await;
    let room = RoomId::from("stuck");

    let client = TestClient::connect(&server.ws_url(Some("stuck")))
        .await
        .expect("Handshake should not wait for the media session");
    let peer_id = client.peer_id.clone();

    let service = server.service.clone();
    assert!(wait_until(2000, || forwarder.sessions_created() == 1).await);
    assert!(service.connections().contains(&peer_id));

    client.close().await.expect("Failed to close client");

    assert!(
        wait_until(2000, || service.connections().is_empty() && !service.rooms().exists(&room))
            .await,
        "stalled connection should be torn down once the client leaves"
    );
    assert!(wait_until(1000, || names.in_use() == 0).await);

    // Other rooms are unaffected by the stalled one.
    let mut other = TestClient::connect(&server.ws_url(Some("open")))
        .await
        .expect("Failed to connect to a healthy room");
    let candidate = other.recv(2000).await.expect("Missing server candidate");
    assert_eq!(
        candidate.signal.and_then(|s| s.candidate).as_deref(),
        Some(SERVER_CANDIDATE)
    );
}

#[tokio::test]
async fn test_offer_sent_during_setup_is_answered() {
    init_tracing();

    let forwarder = MockForwarder::new().with_join_delay(Duration::from_millis(300));
    let server = start_sfu(&forwarder, Arc::new(CountingNames::peers())).await;

    let mut client = TestClient::connect(&server.ws_url(Some("slow")))
        .await
        .expect("Failed to connect");
    client
        .send(&offer("v=0 early"))
        .await
        .expect("Failed to send offer");

    let mut kinds = Vec::new();
    let mut answer = None;
    for _ in 0..2 {
        let envelope = client.recv(3000).await.expect("Missing envelope");
        kinds.push(envelope.kind());
        if envelope.kind() == Some(SignalKind::Answer) {
            answer = envelope.signal.and_then(|s| s.sdp);
        }
    }

    assert!(kinds.contains(&Some(SignalKind::Candidate)));
    assert_eq!(answer.as_deref(), Some("answer:v=0 early"));
    assert_eq!(forwarder.joined().await, vec![client.peer_id.clone()]);
}

#[tokio::test]
async fn test_shutdown_during_stalled_setup_closes_socket() {
    init_tracing();

    let forwarder = MockForwarder::new().stall_sessions_in("stuck");
    let server = start_sfu(&forwarder, Arc::new(CountingNames::peers())).await;

    let mut client = TestClient::connect(&server.ws_url(Some("stuck")))
        .await
        .expect("Failed to connect");

    server.service.shutdown();
    client
        .wait_closed(2000)
        .await
        .expect("Server should close the socket");

    let service = server.service.clone();
    assert!(wait_until(2000, || service.connections().is_empty() && service.rooms().is_empty()).await);
}
