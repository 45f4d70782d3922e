//! Topology Discovery & Command Routing
//!
//! This module contains:
//! - `config`: Grid configuration with environment overrides
//! - `transport`: Device transport seam and its HTTP implementation
//! - `probe`: Timeout-bounded device operations
//! - `candidates`: Sources of candidate endpoints for a scan
//! - `scan`: Concurrent scan producing the device registry
//! - `roles`: Master/slave role negotiation
//! - `formation`: Island formation and the formation run state machine
//! - `router`: Routing index and per-module command dispatch

pub mod candidates;
pub mod config;
pub mod formation;
pub mod probe;
pub mod roles;
pub mod router;
pub mod scan;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use candidates::CandidateSource;
pub use config::{CandidateConfig, GridConfig, IslandPolicy};
pub use formation::{FormationController, FormationState, Topology};
pub use probe::{Identity, Prober};
pub use roles::RoleReport;
pub use router::{CommandOutcome, RouteDecision, RoutingIndex};
pub use scan::DeviceRegistry;
pub use transport::{DeviceTransport, HttpTransport};
