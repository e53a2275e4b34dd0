use crate::error::DeliveryError;
use crate::session::IceCandidate;
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use switchboard_core::{PeerId, RoomId, Signal, SignalingEnvelope};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

/// Cheap, cloneable reference to a live connection: enough to queue envelopes for it
/// or to ask it to shut down. The pump owns the connection itself.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    conn_id: Uuid,
    peer_id: PeerId,
    room_id: RoomId,
    outbound: mpsc::Sender<SignalingEnvelope>,
    cancel_token: CancellationToken,
}

impl ConnectionHandle {
    pub fn new(
        peer_id: PeerId,
        room_id: RoomId,
        outbound: mpsc::Sender<SignalingEnvelope>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            peer_id,
            room_id,
            outbound,
            cancel_token,
        }
    }

    /// Distinguishes connections that were handed the same recycled name.
    pub fn conn_id(&self) -> Uuid {
        self.conn_id
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Queues `envelope` without waiting. A full queue drops the new envelope.
    pub fn try_deliver(&self, envelope: SignalingEnvelope) -> Result<(), DeliveryError> {
        self.outbound.try_send(envelope).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::QueueFull,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    fn send_to_self(&self, signal: Signal) {
        let envelope =
            SignalingEnvelope::to_peer(self.peer_id.clone(), Some(self.room_id.clone()), signal);
        if let Err(e) = self.try_deliver(envelope) {
            warn!(peer = %self.peer_id, "Dropped session signal: {}", e);
        }
    }
}

#[async_trait]
impl SignalingOutput for ConnectionHandle {
    async fn send_offer(&self, sdp: String) {
        self.send_to_self(Signal::offer(sdp));
    }

    async fn send_answer(&self, sdp: String) {
        self.send_to_self(Signal::answer(sdp));
    }

    async fn send_ice(&self, candidate: IceCandidate) {
        self.send_to_self(candidate.into_signal());
    }
}
