use crate::error::ConfigError;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use switchboard_core::DEFAULT_ICE_TTL_SECS;

/// How offers, answers and candidates are handled. Chosen once per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalingMode {
    /// Envelopes are forwarded to the peer named in `to`.
    Relay,
    /// Every connection negotiates with a server-side media session of its room.
    #[default]
    Sfu,
}

impl FromStr for SignalingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relay" | "p2p" => Ok(Self::Relay),
            "sfu" => Ok(Self::Sfu),
            other => Err(ConfigError::UnknownMode(other.to_owned())),
        }
    }
}

impl fmt::Display for SignalingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relay => f.write_str("relay"),
            Self::Sfu => f.write_str("sfu"),
        }
    }
}

/// Credentials for the Cloudflare TURN key API.
#[derive(Clone)]
pub struct TurnCredentials {
    pub key_id: String,
    pub api_token: String,
}

impl fmt::Debug for TurnCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnCredentials")
            .field("key_id", &self.key_id)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub mode: SignalingMode,
    /// Origins allowed to open the signaling socket. Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// When set, ICE servers are issued by the TURN key API instead of `stun_urls`.
    pub turn: Option<TurnCredentials>,
    pub stun_urls: Vec<String>,
    pub ice_ttl: Duration,
    /// Capacity of each connection's outbound queue. Envelopes beyond it are dropped.
    pub outbound_queue_capacity: usize,
}

impl ServerConfig {
    pub fn is_origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        match origin {
            Some(origin) => self.allowed_origins.iter().any(|allowed| allowed == origin),
            None => false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            mode: SignalingMode::default(),
            allowed_origins: Vec::new(),
            turn: None,
            stun_urls: vec!["stun:stun.l.google.com:19302".to_owned()],
            ice_ttl: Duration::from_secs(DEFAULT_ICE_TTL_SECS),
            outbound_queue_capacity: 64,
        }
    }
}
