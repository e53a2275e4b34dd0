use crate::error::SessionError;
use crate::session::{IceCandidate, MediaSession, SessionEvent, SessionForwarder, SessionPeer};
use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use switchboard_core::{IceConfig, PeerId, RoomId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::API;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// Media sessions backed by `webrtc-rs`: one `RTCPeerConnection` per joined peer.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebRtcForwarder;

#[async_trait]
impl SessionForwarder for WebRtcForwarder {
    async fn create_session(
        &self,
        room_id: &RoomId,
        ice: IceConfig,
    ) -> Result<Arc<dyn MediaSession>, SessionError> {
        let session = WebRtcSession::new(room_id.clone(), ice).map_err(SessionError::create)?;
        info!(room = %room_id, "Created media session");
        Ok(Arc::new(session))
    }
}

type PeerConnections = Arc<DashMap<PeerId, Arc<RTCPeerConnection>>>;

struct WebRtcSession {
    room_id: RoomId,
    api: API,
    rtc_config: RTCConfiguration,
    peers: PeerConnections,
}

impl WebRtcSession {
    fn new(room_id: RoomId, ice: IceConfig) -> Result<Self> {
        // Codecs are registered even though no media is decoded here; SDP answers need them.
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = ice
            .ice_servers
            .into_iter()
            .map(|server| RTCIceServer {
                urls: server.urls,
                username: server.username.unwrap_or_default(),
                credential: server.credential.unwrap_or_default(),
                ..Default::default()
            })
            .collect();

        Ok(Self {
            room_id,
            api,
            rtc_config: RTCConfiguration {
                ice_servers,
                ..Default::default()
            },
            peers: Arc::new(DashMap::new()),
        })
    }

    async fn connect(
        &self,
        peer_id: &PeerId,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<RTCPeerConnection>> {
        let peer_connection = Arc::new(
            self.api
                .new_peer_connection(self.rtc_config.clone())
                .await
                .context("Failed to create peer connection")?,
        );

        let uid_state = peer_id.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let uid = uid_state.clone();
                Box::pin(async move {
                    debug!(peer = %uid, state = ?s, "Peer connection state changed");
                })
            },
        ));

        let ice_tx = events.clone();
        let uid_ice = peer_id.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();
            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                };
                if let Err(e) = tx.send(SessionEvent::IceCandidate(candidate)).await {
                    debug!(peer = %uid, "Dropping server candidate: {}", e);
                }
            })
        }));

        let weak_pc: Weak<RTCPeerConnection> = Arc::downgrade(&peer_connection);
        let uid_offer = peer_id.clone();
        peer_connection.on_negotiation_needed(Box::new(move || {
            let weak_pc = weak_pc.clone();
            let tx = events.clone();
            let uid = uid_offer.clone();
            Box::pin(async move {
                let Some(pc) = weak_pc.upgrade() else { return };
                match renegotiate(&pc).await {
                    Ok(sdp) => {
                        if let Err(e) = tx.send(SessionEvent::Offer(sdp)).await {
                            debug!(peer = %uid, "Dropping renegotiation offer: {}", e);
                        }
                    }
                    Err(e) => warn!(peer = %uid, "Renegotiation failed: {:?}", e),
                }
            })
        }));

        Ok(peer_connection)
    }

    async fn close_all(&self) {
        let peers: Vec<_> = self
            .peers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.peers.clear();

        for pc in peers {
            if let Err(e) = pc.close().await {
                debug!(room = %self.room_id, "Error closing peer connection: {:?}", e);
            }
        }
    }
}

async fn renegotiate(pc: &RTCPeerConnection) -> Result<String> {
    let offer = pc.create_offer(None).await?;
    pc.set_local_description(offer.clone()).await?;
    Ok(offer.sdp)
}

#[async_trait]
impl MediaSession for WebRtcSession {
    fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    async fn join(
        &self,
        peer_id: &PeerId,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Arc<dyn SessionPeer>, SessionError> {
        let peer_connection = self
            .connect(peer_id, events)
            .await
            .map_err(SessionError::join)?;

        if let Some(stale) = self
            .peers
            .insert(peer_id.clone(), peer_connection.clone())
        {
            warn!(room = %self.room_id, peer = %peer_id, "Replacing stale peer connection");
            if let Err(e) = stale.close().await {
                debug!(peer = %peer_id, "Error closing stale peer connection: {:?}", e);
            }
        }

        Ok(Arc::new(WebRtcPeer {
            peer_id: peer_id.clone(),
            peer_connection,
            peers: self.peers.clone(),
        }))
    }

    async fn close(&self) {
        self.close_all().await;
        info!(room = %self.room_id, "Closed media session");
    }
}

struct WebRtcPeer {
    peer_id: PeerId,
    peer_connection: Arc<RTCPeerConnection>,
    peers: PeerConnections,
}

impl WebRtcPeer {
    async fn apply_offer(&self, sdp: String) -> Result<String> {
        let offer = RTCSessionDescription::offer(sdp)?;
        self.peer_connection.set_remote_description(offer).await?;

        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn apply_answer(&self, sdp: String) -> Result<()> {
        let answer = RTCSessionDescription::answer(sdp)?;
        self.peer_connection.set_remote_description(answer).await?;
        Ok(())
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionPeer for WebRtcPeer {
    async fn answer(&self, offer: String) -> Result<String, SessionError> {
        self.apply_offer(offer)
            .await
            .map_err(SessionError::negotiation)
    }

    async fn trickle(&self, candidate: IceCandidate) -> Result<(), SessionError> {
        self.add_candidate(candidate)
            .await
            .map_err(SessionError::negotiation)
    }

    async fn set_remote_description(&self, answer: String) -> Result<(), SessionError> {
        self.apply_answer(answer)
            .await
            .map_err(SessionError::negotiation)
    }

    async fn close(&self) {
        // Only drop the map entry if a rejoin has not replaced it already.
        self.peers
            .remove_if(&self.peer_id, |_, pc| Arc::ptr_eq(pc, &self.peer_connection));
        if let Err(e) = self.peer_connection.close().await {
            debug!(peer = %self.peer_id, "Error closing peer connection: {:?}", e);
        }
    }
}
