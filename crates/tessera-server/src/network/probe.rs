//! Liveness Prober
//!
//! Bounded-time device operations. Each call races the transport against a
//! timer; when the timer wins the in-flight request future is dropped and its
//! eventual result is never observed. No retries happen at this layer.

use super::config::GridConfig;
use super::transport::DeviceTransport;
use crate::observability::metrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tessera_core::wire::{decode_grid, decode_identity};
use tessera_core::{Directive, Endpoint, ModuleDescriptor, ProbeError, Query};
use tracing::trace;

/// Identity reported by a device during a probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub endpoint: Endpoint,
    /// Raw reported address, not yet range-checked
    pub address: i64,
}

/// Timeout-bounded access to device operations
#[derive(Clone)]
pub struct Prober {
    transport: Arc<dyn DeviceTransport>,
    timeout: Duration,
    device_port: u16,
}

impl Prober {
    pub fn new(transport: Arc<dyn DeviceTransport>, config: &GridConfig) -> Self {
        Self {
            transport,
            timeout: config.probe_timeout,
            device_port: config.device_port,
        }
    }

    /// Probe `endpoint + path` for an identity payload within `timeout`
    pub async fn probe(
        &self,
        endpoint: &Endpoint,
        path: &str,
        timeout: Duration,
    ) -> Result<Identity, ProbeError> {
        let operation = operation_label(path);
        let body = self.request(endpoint, path, &operation, timeout).await?;
        let address = decode_identity(&body)?;
        Ok(Identity {
            endpoint: endpoint.clone(),
            address,
        })
    }

    /// Identify a device with the configured timeout
    pub async fn identify(&self, endpoint: &Endpoint) -> Result<Identity, ProbeError> {
        self.probe(endpoint, Query::GetId.path(), self.timeout).await
    }

    /// Retrieve the governed layout from a master, addresses unchecked
    pub async fn get_grid(&self, endpoint: &Endpoint) -> Result<Vec<ModuleDescriptor>, ProbeError> {
        let body = self
            .request(endpoint, Query::GetGrid.path(), "get_grid", self.timeout)
            .await?;
        decode_grid(&body)
    }

    /// Issue a directive and return the device's acknowledgement text
    pub async fn command(
        &self,
        endpoint: &Endpoint,
        directive: Directive,
    ) -> Result<String, ProbeError> {
        let operation = directive.to_string();
        let body = self
            .request(endpoint, &directive.path(), &operation, self.timeout)
            .await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Issue a one-way directive.
    ///
    /// Callers on the fire-and-forget paths log and discard the `Err`.
    pub async fn send(&self, endpoint: &Endpoint, directive: Directive) -> Result<(), ProbeError> {
        self.command(endpoint, directive).await.map(|_| ())
    }

    async fn request(
        &self,
        endpoint: &Endpoint,
        path: &str,
        operation: &str,
        timeout: Duration,
    ) -> Result<Vec<u8>, ProbeError> {
        let url = endpoint.url(self.device_port, path);
        let started = Instant::now();

        let result = match tokio::time::timeout(timeout, self.transport.get(&url)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout {
                url: url.clone(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        trace!(url = %url, operation = operation, outcome = outcome, "Device request settled");
        metrics::record_probe(operation, outcome, started.elapsed());

        result
    }
}

/// Label for metrics and traces: the query name for a known query path,
/// otherwise the path without its leading `/` and query string.
fn operation_label(path: &str) -> String {
    [Query::GetId, Query::GetGrid]
        .into_iter()
        .find(|query| query.path() == path)
        .map(|query| query.to_string())
        .unwrap_or_else(|| {
            path.trim_start_matches('/')
                .split('?')
                .next()
                .unwrap_or_default()
                .to_string()
        })
}
