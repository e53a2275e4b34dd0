use crate::error::IceError;
use crate::ice::{IceCredentialProvider, effective_ttl};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use switchboard_core::{IceConfig, IceServerConfig};
use tracing::{debug, error};

pub const CLOUDFLARE_TURN_URL: &str = "https://rtc.live.cloudflare.com/v1/turn/keys";

/// Upper bound on a credential request, connect time included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct GenerateRequest {
    ttl: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    ice_servers: Vec<IceServerConfig>,
}

/// Client for the Cloudflare TURN key API (`generate-ice-servers`).
#[derive(Debug, Clone)]
pub struct CloudflareTurnClient {
    base_url: String,
    key_id: String,
    api_token: String,
    http: reqwest::Client,
}

impl CloudflareTurnClient {
    pub fn new(key_id: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self::with_base_url(CLOUDFLARE_TURN_URL, key_id, api_token)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            key_id: key_id.into(),
            api_token: api_token.into(),
            http: http_client(REQUEST_TIMEOUT),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = http_client(timeout);
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/credentials/generate-ice-servers",
            self.base_url, self.key_id
        )
    }
}

fn http_client(timeout: Duration) -> reqwest::Client {
    match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build TURN HTTP client, requests will not time out: {}", e);
            reqwest::Client::new()
        }
    }
}

#[async_trait]
impl IceCredentialProvider for CloudflareTurnClient {
    async fn fetch(&self, ttl: Duration) -> Result<IceConfig, IceError> {
        let ttl = effective_ttl(ttl);
        debug!(ttl, "Requesting TURN credentials");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_token)
            .json(&GenerateRequest { ttl })
            .send()
            .await
            .inspect_err(|e| error!("Error requesting TURN credentials: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            error!("TURN credential service answered {}", status);
            return Err(IceError::Status(status));
        }

        let body = response
            .json::<GenerateResponse>()
            .await
            .inspect_err(|e| error!("Error decoding TURN credentials: {}", e))?;

        Ok(IceConfig {
            ice_servers: body.ice_servers,
            ttl: Some(ttl),
        })
    }
}
