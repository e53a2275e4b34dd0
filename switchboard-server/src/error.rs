//! Error types for the signaling server.
//!
//! Only [`SessionError`] on join and [`PumpError`] end a connection. Everything else is
//! logged by the pump and the connection keeps running.

use switchboard_core::PeerId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two live connections were handed the same identity.
    #[error("identity {0} is already registered")]
    DuplicateIdentity(PeerId),

    #[error("no connection registered for {0}")]
    NotFound(PeerId),
}

/// Why an outbound envelope could not be queued.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// Outbound queue is at capacity; the envelope was dropped.
    #[error("outbound queue full")]
    QueueFull,

    /// The connection's writer is gone.
    #[error("connection closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("recipient {0} is unavailable")]
    RecipientUnavailable(PeerId),

    #[error("outbound queue of {0} is full, envelope dropped")]
    Backpressure(PeerId),

    #[error("envelope has no recipient")]
    MissingRecipient,

    #[error("envelope carries no signal")]
    MissingSignal,

    #[error("unsupported signal type")]
    UnsupportedKind,

    #[error("{kind} signal without payload")]
    MissingPayload { kind: &'static str },

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("failed to create media session: {0}")]
    Create(String),

    #[error("failed to join media session: {0}")]
    Join(String),

    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("peer has not joined a media session")]
    NotJoined,
}

impl SessionError {
    pub fn create(err: impl std::fmt::Display) -> Self {
        Self::Create(err.to_string())
    }

    pub fn join(err: impl std::fmt::Display) -> Self {
        Self::Join(err.to_string())
    }

    pub fn negotiation(err: impl std::fmt::Display) -> Self {
        Self::Negotiation(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum IceError {
    #[error("ICE credential request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ICE credential service answered {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Error)]
pub enum PumpError {
    #[error("failed to decode envelope: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Join(#[from] SessionError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown signaling mode '{0}', expected 'relay' or 'sfu'")]
    UnknownMode(String),
}
