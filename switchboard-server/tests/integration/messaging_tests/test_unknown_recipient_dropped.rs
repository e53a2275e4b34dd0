use switchboard_core::{PeerId, Signal};

use crate::integration::{TestServer, init_tracing, relay_config};
use crate::utils::TestClient;

#[tokio::test]
async fn test_unknown_recipient_dropped() {
    init_tracing();

    let server = TestServer::start(relay_config()).await;
    let mut alice = TestClient::connect(&server.ws_url(Some("R")))
        .await
        .expect("Failed to connect alice");
    let mut bob = TestClient::connect(&server.ws_url(Some("R")))
        .await
        .expect("Failed to connect bob");

    alice
        .send_signal(&PeerId::from("ghost"), Signal::offer("v=0"))
        .await
        .expect("Failed to send");

    alice.expect_silence(200).await.expect("nothing for alice");
    bob.expect_silence(200).await.expect("nothing for bob");

    // The sender's connection survives the dropped envelope.
    alice
        .send_signal(&bob.peer_id, Signal::offer("v=0 retry"))
        .await
        .expect("Failed to send");
    let delivered = bob.recv(2000).await.expect("bob should get the retry");
    assert_eq!(delivered.from, Some(alice.peer_id.clone()));
}
