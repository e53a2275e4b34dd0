use crate::error::IceError;
use async_trait::async_trait;
use std::time::Duration;
use switchboard_core::{DEFAULT_ICE_TTL_SECS, IceConfig, IceServerConfig};

/// Source of time-limited ICE server lists.
#[async_trait]
pub trait IceCredentialProvider: Send + Sync {
    async fn fetch(&self, ttl: Duration) -> Result<IceConfig, IceError>;
}

/// Lifetime in seconds to request; zero falls back to one hour.
pub fn effective_ttl(ttl: Duration) -> u64 {
    match ttl.as_secs() {
        0 => DEFAULT_ICE_TTL_SECS,
        secs => secs,
    }
}

/// Serves a fixed list of STUN servers. Never fails.
#[derive(Debug, Clone, Default)]
pub struct StaticIceProvider {
    servers: Vec<IceServerConfig>,
}

impl StaticIceProvider {
    pub fn new(servers: Vec<IceServerConfig>) -> Self {
        Self { servers }
    }

    pub fn stun<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(urls.into_iter().map(IceServerConfig::stun).collect())
    }
}

#[async_trait]
impl IceCredentialProvider for StaticIceProvider {
    async fn fetch(&self, ttl: Duration) -> Result<IceConfig, IceError> {
        Ok(IceConfig {
            ice_servers: self.servers.clone(),
            ttl: Some(effective_ttl(ttl)),
        })
    }
}
