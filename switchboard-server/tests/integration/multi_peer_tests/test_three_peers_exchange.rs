use switchboard_core::{Signal, SignalKind};

use crate::integration::{TestServer, init_tracing, relay_config};
use crate::utils::TestClient;

#[tokio::test]
async fn test_three_peers_exchange() {
    init_tracing();

    let server = TestServer::start(relay_config()).await;
    let url = server.ws_url(Some("mesh"));

    let mut peers = Vec::new();
    for _ in 0..3 {
        peers.push(TestClient::connect(&url).await.expect("Failed to connect"));
    }
    let ids: Vec<_> = peers.iter().map(|p| p.peer_id.clone()).collect();

    // Everybody offers to everybody else.
    for (i, peer) in peers.iter_mut().enumerate() {
        for (j, id) in ids.iter().enumerate() {
            if i != j {
                peer.send_signal(id, Signal::offer(format!("v=0 {i}->{j}")))
                    .await
                    .expect("Failed to send offer");
            }
        }
    }

    for (j, peer) in peers.iter_mut().enumerate() {
        let mut senders = Vec::new();
        for _ in 0..2 {
            let envelope = peer.recv(2000).await.expect("Missing offer");
            assert_eq!(envelope.kind(), Some(SignalKind::Offer));
            assert_eq!(envelope.to.as_ref(), Some(&ids[j]));

            let from = envelope.from.expect("Offer without origin");
            let i = ids.iter().position(|id| *id == from).expect("Unknown origin");
            assert_eq!(
                envelope.signal.and_then(|s| s.sdp),
                Some(format!("v=0 {i}->{j}"))
            );
            senders.push(i);
        }
        senders.sort();
        let expected: Vec<_> = (0..3).filter(|i| *i != j).collect();
        assert_eq!(senders, expected);
        peer.expect_silence(100).await.expect("No extra envelopes");
    }
}
