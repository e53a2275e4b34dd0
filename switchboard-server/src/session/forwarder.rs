use crate::error::SessionError;
use crate::session::{IceCandidate, SessionEvent};
use async_trait::async_trait;
use std::sync::Arc;
use switchboard_core::{IceConfig, PeerId, RoomId};
use tokio::sync::mpsc;

/// Creates media sessions, one per room.
#[async_trait]
pub trait SessionForwarder: Send + Sync {
    async fn create_session(
        &self,
        room_id: &RoomId,
        ice: IceConfig,
    ) -> Result<Arc<dyn MediaSession>, SessionError>;
}

/// A room's media session.
#[async_trait]
pub trait MediaSession: Send + Sync {
    fn room_id(&self) -> &RoomId;

    /// Adds `peer_id` to the session. Session events for that peer are pushed into `events`.
    async fn join(
        &self,
        peer_id: &PeerId,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn SessionPeer>, SessionError>;

    /// Closes every peer of the session. Called once, when the room is destroyed.
    async fn close(&self);
}

/// One peer's side of a media session.
#[async_trait]
pub trait SessionPeer: Send + Sync {
    /// Applies a remote offer and returns the local answer SDP.
    async fn answer(&self, offer: String) -> Result<String, SessionError>;

    async fn trickle(&self, candidate: IceCandidate) -> Result<(), SessionError>;

    /// Applies a remote answer to an offer the session sent earlier.
    async fn set_remote_description(&self, answer: String) -> Result<(), SessionError>;

    async fn close(&self);
}
