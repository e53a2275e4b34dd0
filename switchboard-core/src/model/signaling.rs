use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a signaling payload. Anything the server does not understand decodes
/// to [`SignalKind::Unknown`] so that a single odd message never kills a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Candidate => "candidate",
            SignalKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// SDP or ICE payload carried inside an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,
    #[serde(rename = "sdpMid", default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u16>,
}

impl Signal {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self::description(SignalKind::Offer, sdp)
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self::description(SignalKind::Answer, sdp)
    }

    pub fn candidate(
        candidate: impl Into<String>,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    ) -> Self {
        Self {
            kind: SignalKind::Candidate,
            sdp: None,
            candidate: Some(candidate.into()),
            sdp_mid,
            sdp_m_line_index,
        }
    }

    fn description(kind: SignalKind, sdp: impl Into<String>) -> Self {
        Self {
            kind,
            sdp: Some(sdp.into()),
            candidate: None,
            sdp_mid: None,
            sdp_m_line_index: None,
        }
    }
}

/// One JSON text frame on the signaling socket.
///
/// `from` is whatever the sender claims on the way in; the server overwrites it with
/// the authenticated sender before anything is forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalingEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<Signal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PeerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<PeerId>,
}

impl SignalingEnvelope {
    /// First frame a client receives: its own identity and the room it was placed in.
    pub fn handshake(peer_id: PeerId, room: RoomId) -> Self {
        Self {
            room: Some(room),
            signal: None,
            to: None,
            from: Some(peer_id),
        }
    }

    /// Server-originated envelope addressed to `peer_id`.
    pub fn to_peer(peer_id: PeerId, room: Option<RoomId>, signal: Signal) -> Self {
        Self {
            room,
            signal: Some(signal),
            to: Some(peer_id),
            from: None,
        }
    }

    /// Returns the envelope with `from` replaced by the authenticated sender.
    pub fn stamped(self, origin: PeerId) -> Self {
        Self {
            from: Some(origin),
            ..self
        }
    }

    pub fn kind(&self) -> Option<SignalKind> {
        self.signal.as_ref().map(|s| s.kind)
    }
}
