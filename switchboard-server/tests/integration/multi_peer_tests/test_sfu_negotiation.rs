use std::sync::Arc;
use std::time::Duration;
use switchboard_core::{RoomId, Signal, SignalKind, SignalingEnvelope};
use switchboard_server::{ServerConfig, SignalingMode, SignalingService, StaticIceProvider};

use crate::integration::{TestServer, init_tracing, wait_until};
use crate::utils::{MockForwarder, SERVER_CANDIDATE, TestClient};

fn sfu_config() -> ServerConfig {
    ServerConfig {
        mode: SignalingMode::Sfu,
        ice_ttl: Duration::from_secs(600),
        ..ServerConfig::default()
    }
}

async fn start_sfu(forwarder: &MockForwarder) -> TestServer {
    TestServer::start_with(
        SignalingService::builder(sfu_config())
            .forwarder(Arc::new(forwarder.clone()))
            .ice_provider(Arc::new(StaticIceProvider::stun(["stun:sfu.test:3478"]))),
    )
    .await
}

#[tokio::test]
async fn test_sfu_offer_is_answered_by_session() {
    init_tracing();

    let forwarder = MockForwarder::new();
    let server = start_sfu(&forwarder).await;
    let mut alice = TestClient::connect(&server.ws_url(Some("stage")))
        .await
        .expect("Failed to connect alice");

    // The session announces its own candidate right after the join.
    let candidate = alice.recv(2000).await.expect("Missing server candidate");
    assert_eq!(candidate.to, Some(alice.peer_id.clone()));
    assert_eq!(candidate.from, None);
    assert_eq!(candidate.kind(), Some(SignalKind::Candidate));
    let signal = candidate.signal.expect("candidate signal");
    assert_eq!(signal.candidate.as_deref(), Some(SERVER_CANDIDATE));
    assert_eq!(signal.sdp_mid.as_deref(), Some("0"));
    assert_eq!(signal.sdp_m_line_index, Some(0));

    // `to` is irrelevant in SFU mode.
    let offer = SignalingEnvelope {
        signal: Some(Signal::offer("v=0 alice")),
        ..SignalingEnvelope::default()
    };
    alice.send(&offer).await.expect("Failed to send offer");

    let answer = alice.recv(2000).await.expect("Missing answer");
    assert_eq!(answer.to, Some(alice.peer_id.clone()));
    assert_eq!(answer.room, Some(RoomId::from("stage")));
    assert_eq!(answer.kind(), Some(SignalKind::Answer));
    assert_eq!(
        answer.signal.and_then(|s| s.sdp).as_deref(),
        Some("answer:v=0 alice")
    );

    let trickle = SignalingEnvelope {
        signal: Some(Signal::candidate("candidate:browser", Some("0".to_owned()), Some(0))),
        ..SignalingEnvelope::default()
    };
    alice.send(&trickle).await.expect("Failed to send candidate");
    let renegotiated = SignalingEnvelope {
        signal: Some(Signal::answer("v=0 renegotiated")),
        ..SignalingEnvelope::default()
    };
    alice.send(&renegotiated).await.expect("Failed to send answer");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while forwarder.remote_answers().await.is_empty() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(
        forwarder.trickled().await,
        vec![(alice.peer_id.clone(), "candidate:browser".to_owned())]
    );
    assert_eq!(
        forwarder.remote_answers().await,
        vec![(alice.peer_id.clone(), "v=0 renegotiated".to_owned())]
    );

    let ice = forwarder.ice_configs().await;
    assert_eq!(ice.len(), 1);
    assert_eq!(ice[0].ttl, Some(600));
    assert_eq!(ice[0].ice_servers[0].urls, vec!["stun:sfu.test:3478".to_owned()]);
}

#[tokio::test]
async fn test_sfu_room_shares_one_session() {
    init_tracing();

    let forwarder = MockForwarder::new();
    let server = start_sfu(&forwarder).await;
    let url = server.ws_url(Some("hall"));

    let mut clients = Vec::new();
    for _ in 0..3 {
        let mut client = TestClient::connect(&url).await.expect("Failed to connect");
        // The server candidate arrives once the media session has taken the peer in.
        client.recv(2000).await.expect("Missing server candidate");
        clients.push(client);
    }

    assert_eq!(forwarder.sessions_created(), 1);
    assert_eq!(forwarder.sessions_closed(), 0);

    for client in clients {
        client.close().await.expect("Failed to close client");
    }

    let service = server.service.clone();
    let room = RoomId::from("hall");
    assert!(wait_until(3000, || !service.rooms().exists(&room)).await);
    assert!(wait_until(1000, || forwarder.sessions_closed() == 1).await);
    assert_eq!(forwarder.sessions_created(), 1);
    assert_eq!(forwarder.joined().await.len(), 3);
}
