use crate::session::IceCandidate;
use async_trait::async_trait;

/// Where server-originated signals for one connection go (SDP offers and answers, ICE).
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_offer(&self, sdp: String);

    async fn send_answer(&self, sdp: String);

    async fn send_ice(&self, candidate: IceCandidate);
}
