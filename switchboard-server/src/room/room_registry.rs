use crate::error::SessionError;
use crate::ice::IceCredentialProvider;
use crate::naming::NameAllocator;
use crate::room::{RoomHandle, RoomState};
use crate::session::{MediaSession, SessionForwarder};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use switchboard_core::{IceConfig, PeerId, RoomId};
use tracing::{debug, error, info, warn};

struct SessionFactory {
    ice: Arc<dyn IceCredentialProvider>,
    forwarder: Arc<dyn SessionForwarder>,
    ice_ttl: Duration,
}

struct RoomRegistryInner {
    rooms: DashMap<RoomId, RoomState>,
    sessions: Option<SessionFactory>,
    room_names: Arc<dyn NameAllocator>,
}

/// Live rooms and their members.
///
/// A room is present exactly while it has at least one member. Membership changes and
/// the empty-check-then-remove on leave happen under the room's map entry lock, so a
/// join racing with the last leave either lands in the old room before it is removed
/// or creates a fresh one.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<RoomRegistryInner>,
}

impl RoomRegistry {
    /// Registry for relay mode: rooms only track membership.
    pub fn new(room_names: Arc<dyn NameAllocator>) -> Self {
        Self::build(room_names, None)
    }

    /// Registry for SFU mode: the first join of a room fetches ICE servers and opens a
    /// media session for it.
    pub fn with_sessions(
        room_names: Arc<dyn NameAllocator>,
        ice: Arc<dyn IceCredentialProvider>,
        forwarder: Arc<dyn SessionForwarder>,
        ice_ttl: Duration,
    ) -> Self {
        Self::build(
            room_names,
            Some(SessionFactory {
                ice,
                forwarder,
                ice_ttl,
            }),
        )
    }

    fn build(room_names: Arc<dyn NameAllocator>, sessions: Option<SessionFactory>) -> Self {
        Self {
            inner: Arc::new(RoomRegistryInner {
                rooms: DashMap::new(),
                sessions,
                room_names,
            }),
        }
    }

    /// A name for a room the client did not pick itself.
    pub fn allocate_room_id(&self) -> RoomId {
        loop {
            let room_id = RoomId::from(self.inner.room_names.allocate());
            // A client may have opened a room under this name directly. The name stays
            // reserved until that room is destroyed.
            if !self.exists(&room_id) {
                return room_id;
            }
        }
    }

    /// Returns a generated name that never became a room.
    pub(crate) fn release_room_id(&self, room_id: &RoomId) {
        if !self.exists(room_id) {
            self.inner.room_names.release(room_id.as_str());
        }
    }

    /// Adds `member` to `room_id`, creating the room if needed.
    ///
    /// Membership is recorded before the media session is opened; if this returns an
    /// error (or the future is dropped) the caller still owes a [`leave`](Self::leave).
    pub async fn join_or_create(
        &self,
        room_id: &RoomId,
        member: &PeerId,
    ) -> Result<RoomHandle, SessionError> {
        let mut created = false;
        let session_slot = {
            let mut room = self
                .inner
                .rooms
                .entry(room_id.clone())
                .or_insert_with(|| {
                    created = true;
                    RoomState::new()
                });
            if !room.members.insert(member.clone()) {
                warn!(room = %room_id, peer = %member, "Peer joined a room it is already in");
            }
            room.session.clone()
        };

        if created {
            info!(room = %room_id, "Created new room");
        }
        debug!(room = %room_id, peer = %member, "Connected to room");

        let Some(factory) = &self.inner.sessions else {
            return Ok(RoomHandle::new(room_id.clone(), created, None));
        };

        let session = session_slot
            .get_or_try_init(|| open_session(factory, room_id))
            .await?
            .clone();

        Ok(RoomHandle::new(room_id.clone(), created, Some(session)))
    }

    /// Removes `member`; the last member out destroys the room and closes its session.
    /// Returns `true` if this call destroyed the room.
    pub async fn leave(&self, room_id: &RoomId, member: &PeerId) -> bool {
        let destroyed = match self.inner.rooms.entry(room_id.clone()) {
            Entry::Occupied(mut room) => {
                if !room.get_mut().members.remove(member) {
                    debug!(room = %room_id, peer = %member, "Leave from non-member ignored");
                }
                if room.get().members.is_empty() {
                    Some(room.remove())
                } else {
                    None
                }
            }
            Entry::Vacant(_) => {
                debug!(room = %room_id, peer = %member, "Leave from unknown room ignored");
                None
            }
        };

        let Some(state) = destroyed else {
            return false;
        };

        state.destroy().await;
        self.inner.room_names.release(room_id.as_str());
        info!(room = %room_id, "Removed empty room");
        true
    }

    /// Snapshot of the room's members. Stale as soon as it is returned; diagnostics only.
    pub fn members_of(&self, room_id: &RoomId) -> Option<HashSet<PeerId>> {
        self.inner
            .rooms
            .get(room_id)
            .map(|room| room.members.clone())
    }

    pub fn exists(&self, room_id: &RoomId) -> bool {
        self.inner.rooms.contains_key(room_id)
    }

    pub fn len(&self) -> usize {
        self.inner.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.rooms.is_empty()
    }
}

async fn open_session(
    factory: &SessionFactory,
    room_id: &RoomId,
) -> Result<Arc<dyn MediaSession>, SessionError> {
    let ice = match factory.ice.fetch(factory.ice_ttl).await {
        Ok(ice) => ice,
        Err(e) => {
            error!(room = %room_id, "Error when fetching ICE config: {}", e);
            IceConfig::empty()
        }
    };

    factory.forwarder.create_session(room_id, ice).await
}
