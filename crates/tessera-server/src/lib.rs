//! Tessera Server Library
//!
//! Topology discovery and command routing for grids of networked actuator
//! modules: scan the network, negotiate master/slave roles, form islands from
//! master-reported layouts, and route per-module commands.

pub mod api;
pub mod network;
pub mod observability;
pub mod version;
