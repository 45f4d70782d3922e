//! Device Transport
//!
//! The seam between the engine and the wire. Everything above this trait is
//! transport-agnostic; the HTTP implementation speaks plain unauthenticated
//! GET requests to device firmware.

use async_trait::async_trait;
use std::time::Duration;
use tessera_core::ProbeError;

/// Issues a single GET request and returns the body of a success response.
///
/// Implementations do not enforce deadlines; [`super::probe::Prober`] races
/// every call against its own timer and drops the losing future.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProbeError>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DeviceTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProbeError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProbeError::Unreachable {
                url: url.to_string(),
                reason: format!("status {status}"),
            });
        }

        let body = resp.bytes().await.map_err(|e| ProbeError::Unreachable {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(body.to_vec())
    }
}
