//! Error taxonomy for device probing and command routing.

use crate::models::Address;
use thiserror::Error;

/// Failure of a single bounded device operation.
///
/// Every variant is recoverable per device: callers log it and move on, or
/// surface it for the one command that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The operation did not settle before its deadline
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// Transport failure or non-success response
    #[error("{url} unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    /// Identity or layout payload could not be decoded
    #[error("malformed {payload} payload: {reason}")]
    MalformedResponse {
        payload: &'static str,
        reason: String,
    },
}

impl ProbeError {
    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Timeout { .. } => "timeout",
            ProbeError::Unreachable { .. } => "unreachable",
            ProbeError::MalformedResponse { .. } => "malformed",
        }
    }
}

/// Routing resolution failure.
///
/// The router never returns this to its callers; it is the internal signal
/// for taking the default endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no island claims or follows address {address}")]
    NoIslandFound { address: Address },
}
