use async_trait::async_trait;
use std::time::Duration;
use switchboard_core::IceConfig;
use switchboard_server::{IceCredentialProvider, IceError};

/// ICE provider whose upstream is always down.
pub struct FailingIceProvider;

#[async_trait]
impl IceCredentialProvider for FailingIceProvider {
    async fn fetch(&self, _ttl: Duration) -> Result<IceConfig, IceError> {
        Err(IceError::Status(reqwest::StatusCode::BAD_GATEWAY))
    }
}
