use crate::config::SignalingMode;
use crate::session::SessionAdapter;
use crate::signaling::{ConnectionHandle, SignalingService};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use switchboard_core::{PeerId, RoomId};
use tracing::{debug, info, warn};

/// Server-side state of one signaling connection, owned by its pump.
pub struct Connection {
    handle: ConnectionHandle,
    mode: SignalingMode,
    session: OnceLock<SessionAdapter>,
    closed: AtomicBool,
}

impl Connection {
    pub fn new(handle: ConnectionHandle, mode: SignalingMode) -> Self {
        Self {
            handle,
            mode,
            session: OnceLock::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn peer_id(&self) -> &PeerId {
        self.handle.peer_id()
    }

    pub fn room_id(&self) -> &RoomId {
        self.handle.room_id()
    }

    pub fn mode(&self) -> SignalingMode {
        self.mode
    }

    pub fn session(&self) -> Option<&SessionAdapter> {
        self.session.get()
    }

    /// Binds the media session this connection negotiates with. Only the first call wins.
    pub fn attach_session(&self, adapter: SessionAdapter) -> bool {
        match self.session.set(adapter) {
            Ok(()) => true,
            Err(_) => {
                warn!(peer = %self.peer_id(), "Connection already has a media session");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Releases everything the connection holds: stops both pump loops, unregisters the
    /// identity, leaves the room and gives the name back. Only the first call does
    /// anything; it returns `true`.
    pub async fn teardown(&self, service: &SignalingService) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!(peer = %self.peer_id(), "Teardown already done");
            return false;
        }

        // The writer closes the transport once it observes cancellation.
        self.handle.cancel();

        if !service.connections().remove_connection(&self.handle) {
            debug!(peer = %self.peer_id(), "Connection was not registered");
        }

        if let Some(session) = self.session.get() {
            session.close().await;
        }

        service.rooms().leave(self.room_id(), self.peer_id()).await;
        service.release_peer_id(self.peer_id());

        info!(peer = %self.peer_id(), room = %self.room_id(), "Client disconnected");
        true
    }
}
