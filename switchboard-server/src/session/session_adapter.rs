use crate::error::SessionError;
use crate::session::{IceCandidate, MediaSession, SessionEvent, SessionPeer};
use crate::signaling::SignalingOutput;
use std::sync::Arc;
use switchboard_core::{PeerId, RoomId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const SESSION_EVENT_BUFFER: usize = 64;

/// A connection's membership in its room's media session.
pub struct SessionAdapter {
    room_id: RoomId,
    peer_id: PeerId,
    peer: Arc<dyn SessionPeer>,
    event_task: JoinHandle<()>,
}

impl SessionAdapter {
    /// Joins `peer_id` to `session`; offers and candidates raised by the session are
    /// written to `output` until the adapter is closed.
    pub async fn join(
        session: &Arc<dyn MediaSession>,
        peer_id: PeerId,
        output: Arc<dyn SignalingOutput>,
    ) -> Result<Self, SessionError> {
        let room_id = session.room_id().clone();
        let (events_tx, events_rx) = mpsc::channel(SESSION_EVENT_BUFFER);

        let peer = session.join(&peer_id, events_tx).await?;
        info!(room = %room_id, peer = %peer_id, "Joined media session");

        let event_task = tokio::spawn(forward_events(events_rx, peer_id.clone(), output));

        Ok(Self {
            room_id,
            peer_id,
            peer,
            event_task,
        })
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub async fn answer(&self, offer: String) -> Result<String, SessionError> {
        debug!(peer = %self.peer_id, "Answering offer");
        self.peer.answer(offer).await
    }

    pub async fn trickle(&self, candidate: IceCandidate) -> Result<(), SessionError> {
        self.peer.trickle(candidate).await
    }

    pub async fn set_remote_description(&self, answer: String) -> Result<(), SessionError> {
        debug!(peer = %self.peer_id, "Applying remote answer");
        self.peer.set_remote_description(answer).await
    }

    /// Leaves the session. No events are delivered afterwards.
    pub async fn close(&self) {
        self.event_task.abort();
        self.peer.close().await;
        debug!(room = %self.room_id, peer = %self.peer_id, "Left media session");
    }
}

impl Drop for SessionAdapter {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

async fn forward_events(
    mut events: mpsc::Receiver<SessionEvent>,
    peer_id: PeerId,
    output: Arc<dyn SignalingOutput>,
) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Offer(sdp) => {
                debug!(peer = %peer_id, "Session renegotiation offer");
                output.send_offer(sdp).await;
            }
            SessionEvent::IceCandidate(candidate) => output.send_ice(candidate).await,
        }
    }
}
