use serde::{Deserialize, Serialize};

/// Lifetime requested for ICE credentials when the caller does not ask for a positive one.
pub const DEFAULT_ICE_TTL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// A set of ICE servers together with the lifetime their credentials were granted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceConfig {
    #[serde(default)]
    pub ice_servers: Vec<IceServerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl IceConfig {
    /// Degraded configuration used when credentials could not be obtained.
    pub fn empty() -> Self {
        Self {
            ice_servers: Vec::new(),
            ttl: None,
        }
    }
}

impl Default for IceConfig {
    fn default() -> Self {
        Self::empty()
    }
}
