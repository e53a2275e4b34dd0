use crate::config::{ServerConfig, SignalingMode};
use crate::error::{PumpError, SessionError};
use crate::ice::{CloudflareTurnClient, IceCredentialProvider, StaticIceProvider, effective_ttl};
use crate::naming::{NameAllocator, WordListAllocator};
use crate::room::RoomRegistry;
use crate::session::{SessionAdapter, SessionForwarder, WebRtcForwarder};
use crate::signaling::{
    Connection, ConnectionHandle, ConnectionRegistry, SignalingRouter, read_loop, write_loop,
};
use axum::extract::ws::Message;
use futures::{Sink, Stream, StreamExt};
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use switchboard_core::{IceConfig, PeerId, RoomId, SignalingEnvelope};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

struct SignalingInner {
    config: ServerConfig,
    connections: ConnectionRegistry,
    rooms: RoomRegistry,
    router: SignalingRouter,
    peer_names: Arc<dyn NameAllocator>,
    ice: Arc<dyn IceCredentialProvider>,
    shutdown: CancellationToken,
}

/// Shared state of the signaling server. Cheap to clone; every clone sees the same
/// registries.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

/// Overrides for the collaborators a [`SignalingService`] is built from. Anything left
/// unset is derived from the [`ServerConfig`].
#[derive(Default)]
pub struct SignalingServiceBuilder {
    config: ServerConfig,
    ice: Option<Arc<dyn IceCredentialProvider>>,
    forwarder: Option<Arc<dyn SessionForwarder>>,
    peer_names: Option<Arc<dyn NameAllocator>>,
    room_names: Option<Arc<dyn NameAllocator>>,
    shutdown: Option<CancellationToken>,
}

impl SignalingServiceBuilder {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn ice_provider(mut self, ice: Arc<dyn IceCredentialProvider>) -> Self {
        self.ice = Some(ice);
        self
    }

    pub fn forwarder(mut self, forwarder: Arc<dyn SessionForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    pub fn peer_names(mut self, names: Arc<dyn NameAllocator>) -> Self {
        self.peer_names = Some(names);
        self
    }

    pub fn room_names(mut self, names: Arc<dyn NameAllocator>) -> Self {
        self.room_names = Some(names);
        self
    }

    /// Token whose cancellation tears down every connection.
    pub fn shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    pub fn build(self) -> SignalingService {
        let mut config = self.config;
        if config.outbound_queue_capacity == 0 {
            warn!("Outbound queue capacity must be positive, using 1");
            config.outbound_queue_capacity = 1;
        }

        let ice = self.ice.unwrap_or_else(|| match &config.turn {
            Some(turn) => Arc::new(CloudflareTurnClient::new(
                turn.key_id.clone(),
                turn.api_token.clone(),
            )),
            None => Arc::new(StaticIceProvider::stun(config.stun_urls.clone())),
        });
        let room_names = self
            .room_names
            .unwrap_or_else(|| Arc::new(WordListAllocator::rooms()));
        let peer_names = self
            .peer_names
            .unwrap_or_else(|| Arc::new(WordListAllocator::peers()));

        let rooms = match config.mode {
            SignalingMode::Relay => RoomRegistry::new(room_names),
            SignalingMode::Sfu => RoomRegistry::with_sessions(
                room_names,
                ice.clone(),
                self.forwarder
                    .unwrap_or_else(|| Arc::new(WebRtcForwarder)),
                config.ice_ttl,
            ),
        };

        let connections = ConnectionRegistry::new();
        let router = SignalingRouter::new(connections.clone());

        SignalingService {
            inner: Arc::new(SignalingInner {
                config,
                connections,
                rooms,
                router,
                peer_names,
                ice,
                shutdown: self.shutdown.unwrap_or_default(),
            }),
        }
    }
}

impl SignalingService {
    pub fn new(config: ServerConfig) -> Self {
        SignalingServiceBuilder::new(config).build()
    }

    pub fn builder(config: ServerConfig) -> SignalingServiceBuilder {
        SignalingServiceBuilder::new(config)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.inner.connections
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.inner.rooms
    }

    pub fn router(&self) -> &SignalingRouter {
        &self.inner.router
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    /// Cancels every live connection. New connections are closed right away.
    pub fn shutdown(&self) {
        info!(connections = self.inner.connections.len(), "Shutting down signaling");
        self.inner.shutdown.cancel();
    }

    pub(crate) fn release_peer_id(&self, peer_id: &PeerId) {
        self.inner.peer_names.release(peer_id.as_str());
    }

    /// ICE servers for browsers. A failing provider yields an empty list rather than
    /// an error.
    pub async fn ice_config(&self) -> IceConfig {
        let ttl = self.inner.config.ice_ttl;
        match self.inner.ice.fetch(ttl).await {
            Ok(config) => config,
            Err(e) => {
                error!("Error when fetching ICE config: {}", e);
                IceConfig {
                    ice_servers: Vec::new(),
                    ttl: Some(effective_ttl(ttl)),
                }
            }
        }
    }

    pub fn room_members(&self, room_id: &RoomId) -> Option<HashSet<PeerId>> {
        self.inner.rooms.members_of(room_id)
    }

    /// Asks the connection registered as `peer_id` to close. Its pump tears it down.
    pub fn disconnect(&self, peer_id: &PeerId) -> bool {
        match self.inner.connections.lookup(peer_id) {
            Ok(handle) => {
                handle.cancel();
                true
            }
            Err(_) => false,
        }
    }

    /// Runs one signaling connection to completion.
    ///
    /// The client gets a fresh identity and joins `requested_room`, or a generated
    /// room when none was asked for. Returns once the connection is torn down.
    pub async fn serve_connection<S, R, E>(
        &self,
        sink: S,
        stream: R,
        requested_room: Option<RoomId>,
    ) where
        S: Sink<Message> + Unpin + Send + 'static,
        S::Error: Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let peer_id = PeerId::from(self.inner.peer_names.allocate());
        let (room_id, generated_room) = match requested_room {
            Some(room_id) => (room_id, false),
            None => (self.inner.rooms.allocate_room_id(), true),
        };

        let cancel = self.inner.shutdown.child_token();
        let (outbound_tx, outbound_rx) = mpsc::channel(self.inner.config.outbound_queue_capacity);

        // Queued before the identity becomes routable, so it is always the first frame.
        let handshake = SignalingEnvelope::handshake(peer_id.clone(), room_id.clone());
        if let Err(e) = outbound_tx.try_send(handshake) {
            warn!(peer = %peer_id, "Failed to queue handshake: {}", e);
        }

        let handle = ConnectionHandle::new(peer_id.clone(), room_id.clone(), outbound_tx, cancel);

        let span = info_span!("connection", conn_id = %handle.conn_id(), peer = %peer_id);

        async move {
            if let Err(e) = self.inner.connections.register(handle.clone()) {
                // The name belongs to the live connection; only the room name is ours.
                error!("Rejecting connection: {}", e);
                if generated_room {
                    self.inner.rooms.release_room_id(&room_id);
                }
                return;
            }

            let connection = Connection::new(handle.clone(), self.inner.config.mode);
            let writer = tokio::spawn(
                write_loop(sink, outbound_rx, handle.cancel_token().clone()).in_current_span(),
            );

            info!(room = %room_id, "Client connected");
            match self.run(&connection, stream).await {
                Ok(()) => debug!("Connection finished"),
                Err(e) => warn!("Connection closed with error: {}", e),
            }

            connection.teardown(self).await;
            if let Err(e) = writer.await {
                error!("Writer task failed: {}", e);
            }
        }
        .instrument(span)
        .await;
    }

    async fn run<R, E>(&self, connection: &Connection, mut stream: R) -> Result<(), PumpError>
    where
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let handle = connection.handle();
        let cancel = handle.cancel_token();
        let mut early = Vec::new();

        let joined = self.inner.rooms.join_or_create(handle.room_id(), handle.peer_id());
        let Some(room) = until_ready(joined, &mut stream, &mut early, cancel).await? else {
            return Ok(());
        };

        if connection.mode() == SignalingMode::Sfu {
            let Some(session) = room.session() else {
                return Err(SessionError::NotJoined.into());
            };
            let joined =
                SessionAdapter::join(session, handle.peer_id().clone(), Arc::new(handle.clone()));
            let Some(adapter) = until_ready(joined, &mut stream, &mut early, cancel).await? else {
                return Ok(());
            };
            connection.attach_session(adapter);
        }

        if !early.is_empty() {
            debug!(frames = early.len(), "Replaying frames received while joining");
        }
        let replayed = futures::stream::iter(early.into_iter().map(Ok));
        read_loop(replayed.chain(stream), connection, &self.inner.router).await
    }
}

/// Most frames held back while a connection is still joining its room.
const EARLY_FRAME_LIMIT: usize = 64;

/// Drives a join step while watching the transport.
///
/// Returns `None` if the token is cancelled or the peer goes away before `step`
/// finishes. Frames that arrive in the meantime are kept in `early` for the reader.
async fn until_ready<F, T, R, E>(
    step: F,
    stream: &mut R,
    early: &mut Vec<Message>,
    cancel: &CancellationToken,
) -> Result<Option<T>, PumpError>
where
    F: Future<Output = Result<T, SessionError>>,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    tokio::pin!(step);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(None),
            done = &mut step => return Ok(Some(done?)),
            frame = stream.next() => match frame {
                None | Some(Ok(Message::Close(_))) => {
                    debug!("Peer left before joining completed");
                    return Ok(None);
                }
                Some(Err(e)) => return Err(PumpError::Transport(e.to_string())),
                Some(Ok(message)) if early.len() < EARLY_FRAME_LIMIT => early.push(message),
                Some(Ok(_)) => warn!("Dropping frame received before the session was ready"),
            },
        }
    }
}
