use crate::integration::{TestServer, init_tracing, relay_config, wait_until};
use crate::utils::TestClient;

#[tokio::test]
async fn test_shutdown_closes_connections() {
    init_tracing();

    let server = TestServer::start(relay_config()).await;
    let mut alice = TestClient::connect(&server.ws_url(Some("a")))
        .await
        .expect("Failed to connect alice");
    let mut bob = TestClient::connect(&server.ws_url(Some("b")))
        .await
        .expect("Failed to connect bob");

    server.service.shutdown();

    alice.wait_closed(2000).await.expect("alice should be closed");
    bob.wait_closed(2000).await.expect("bob should be closed");

    let service = server.service.clone();
    assert!(
        wait_until(2000, || service.connections().is_empty() && service.rooms().is_empty())
            .await
    );
}
