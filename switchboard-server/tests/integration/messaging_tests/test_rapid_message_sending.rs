use switchboard_core::Signal;

use crate::integration::{TestServer, init_tracing, relay_config};
use crate::utils::TestClient;

#[tokio::test]
async fn test_rapid_message_sending() {
    init_tracing();

    let server = TestServer::start(relay_config()).await;
    let mut alice = TestClient::connect(&server.ws_url(Some("burst")))
        .await
        .expect("Failed to connect alice");
    let mut bob = TestClient::connect(&server.ws_url(Some("burst")))
        .await
        .expect("Failed to connect bob");

    // Stays well below the outbound queue capacity.
    let message_count = 40;
    for i in 0..message_count {
        let candidate = format!("candidate:{i} 1 udp 1 192.0.2.1 {} typ host", 10000 + i);
        alice
            .send_signal(&bob.peer_id, Signal::candidate(candidate, None, None))
            .await
            .expect("Failed to send candidate");
    }

    for i in 0..message_count {
        let envelope = bob.recv(2000).await.expect("Missing candidate");
        let candidate = envelope
            .signal
            .and_then(|s| s.candidate)
            .expect("Envelope without candidate");
        assert!(
            candidate.starts_with(&format!("candidate:{i} ")),
            "Candidate {i} arrived out of order: {candidate}"
        );
    }
}
