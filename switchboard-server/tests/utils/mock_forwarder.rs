use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use switchboard_core::{IceConfig, PeerId, RoomId};
use switchboard_server::{
    IceCandidate, MediaSession, SessionError, SessionEvent, SessionForwarder, SessionPeer,
};
use tokio::sync::{Mutex, mpsc};

/// Candidate every mock session announces to a peer as soon as it joins.
pub const SERVER_CANDIDATE: &str = "candidate:1 1 udp 2130706431 10.0.0.1 50000 typ host";

#[derive(Default)]
struct ForwarderState {
    created: AtomicUsize,
    closed: AtomicUsize,
    ice: Mutex<Vec<IceConfig>>,
    joined: Mutex<Vec<PeerId>>,
    trickled: Mutex<Vec<(PeerId, String)>>,
    remote_answers: Mutex<Vec<(PeerId, String)>>,
    /// Rooms whose session never finishes opening.
    stalled_rooms: StdMutex<HashSet<RoomId>>,
    /// Rooms whose session refuses every peer.
    refusing_rooms: StdMutex<HashSet<RoomId>>,
    join_delay: StdMutex<Duration>,
}

/// In-memory media service: answers offers with `answer:<offer>` and records every
/// call it receives.
#[derive(Clone, Default)]
pub struct MockForwarder {
    state: Arc<ForwarderState>,
}

impl MockForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opening a session for `room` never completes.
    pub fn stall_sessions_in(self, room: &str) -> Self {
        insert(&self.state.stalled_rooms, room);
        self
    }

    /// Peers joining the session of `room` are refused.
    pub fn refuse_joins_in(self, room: &str) -> Self {
        insert(&self.state.refusing_rooms, room);
        self
    }

    /// Every peer join takes `delay` before it completes.
    pub fn with_join_delay(self, delay: Duration) -> Self {
        if let Ok(mut join_delay) = self.state.join_delay.lock() {
            *join_delay = delay;
        }
        self
    }

    pub fn sessions_created(&self) -> usize {
        self.state.created.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    pub async fn ice_configs(&self) -> Vec<IceConfig> {
        self.state.ice.lock().await.clone()
    }

    pub async fn joined(&self) -> Vec<PeerId> {
        self.state.joined.lock().await.clone()
    }

    pub async fn trickled(&self) -> Vec<(PeerId, String)> {
        self.state.trickled.lock().await.clone()
    }

    pub async fn remote_answers(&self) -> Vec<(PeerId, String)> {
        self.state.remote_answers.lock().await.clone()
    }
}

#[async_trait]
impl SessionForwarder for MockForwarder {
    async fn create_session(
        &self,
        room_id: &RoomId,
        ice: IceConfig,
    ) -> Result<Arc<dyn MediaSession>, SessionError> {
        self.state.created.fetch_add(1, Ordering::SeqCst);
        self.state.ice.lock().await.push(ice);
        if contains(&self.state.stalled_rooms, room_id) {
            std::future::pending::<()>().await;
        }
        Ok(Arc::new(MockSession {
            room_id: room_id.clone(),
            state: self.state.clone(),
        }))
    }
}

struct MockSession {
    room_id: RoomId,
    state: Arc<ForwarderState>,
}

#[async_trait]
impl MediaSession for MockSession {
    fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    async fn join(
        &self,
        peer_id: &PeerId,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn SessionPeer>, SessionError> {
        let delay = self.state.join_delay.lock().map(|d| *d).unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if contains(&self.state.refusing_rooms, &self.room_id) {
            return Err(SessionError::join(format!("{} refused {}", self.room_id, peer_id)));
        }
        self.state.joined.lock().await.push(peer_id.clone());

        let candidate = IceCandidate {
            candidate: SERVER_CANDIDATE.to_owned(),
            sdp_mid: Some("0".to_owned()),
            sdp_m_line_index: Some(0),
        };
        events
            .send(SessionEvent::IceCandidate(candidate))
            .await
            .map_err(SessionError::join)?;

        Ok(Arc::new(MockPeer {
            peer_id: peer_id.clone(),
            state: self.state.clone(),
        }))
    }

    async fn close(&self) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockPeer {
    peer_id: PeerId,
    state: Arc<ForwarderState>,
}

#[async_trait]
impl SessionPeer for MockPeer {
    async fn answer(&self, offer: String) -> Result<String, SessionError> {
        Ok(format!("answer:{offer}"))
    }

    async fn trickle(&self, candidate: IceCandidate) -> Result<(), SessionError> {
        self.state
            .trickled
            .lock()
            .await
            .push((self.peer_id.clone(), candidate.candidate));
        Ok(())
    }

    async fn set_remote_description(&self, answer: String) -> Result<(), SessionError> {
        self.state
            .remote_answers
            .lock()
            .await
            .push((self.peer_id.clone(), answer));
        Ok(())
    }

    async fn close(&self) {}
}

fn insert(rooms: &StdMutex<HashSet<RoomId>>, room: &str) {
    if let Ok(mut rooms) = rooms.lock() {
        rooms.insert(RoomId::from(room));
    }
}

fn contains(rooms: &StdMutex<HashSet<RoomId>>, room: &RoomId) -> bool {
    rooms.lock().is_ok_and(|rooms| rooms.contains(room))
}
