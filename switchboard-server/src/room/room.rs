use crate::session::MediaSession;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use switchboard_core::{PeerId, RoomId};
use tokio::sync::OnceCell;

pub(crate) type SessionSlot = Arc<OnceCell<Arc<dyn MediaSession>>>;

/// Registry-owned state of a live room.
pub(crate) struct RoomState {
    pub(crate) members: HashSet<PeerId>,
    /// Filled by the first SFU-mode joiner; later joiners wait on the same cell.
    pub(crate) session: SessionSlot,
}

impl RoomState {
    pub(crate) fn new() -> Self {
        Self {
            members: HashSet::new(),
            session: Arc::new(OnceCell::new()),
        }
    }

    /// Closes the media session, if one was ever opened.
    pub(crate) async fn destroy(self) {
        if let Some(session) = self.session.get() {
            session.close().await;
        }
    }
}

/// What a joiner gets back from [`RoomRegistry::join_or_create`](crate::RoomRegistry::join_or_create).
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    created: bool,
    session: Option<Arc<dyn MediaSession>>,
}

impl RoomHandle {
    pub(crate) fn new(
        room_id: RoomId,
        created: bool,
        session: Option<Arc<dyn MediaSession>>,
    ) -> Self {
        Self {
            room_id,
            created,
            session,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Whether this join brought the room into existence.
    pub fn created(&self) -> bool {
        self.created
    }

    /// The room's media session. Always `None` in relay mode.
    pub fn session(&self) -> Option<&Arc<dyn MediaSession>> {
        self.session.as_ref()
    }
}

impl fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomHandle")
            .field("room_id", &self.room_id)
            .field("created", &self.created)
            .field("has_session", &self.session.is_some())
            .finish()
    }
}
