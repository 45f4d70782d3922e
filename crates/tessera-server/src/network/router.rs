//! Command Router
//!
//! Resolves a module address to the master endpoint that should receive its
//! commands. The lookup walks claimed addresses upward from 0 and settles on
//! the first claim at or beyond the target address, so an address can resolve
//! to a master whose island does not list it. Addresses with no claim at or
//! after them fall back to the configured default endpoint.

use super::formation::Topology;
use super::probe::Prober;
use crate::observability::{events, metrics};
use serde::Serialize;
use std::collections::BTreeMap;
use tessera_core::{Address, Directive, Endpoint, ProbeError, RouteError};
use tracing::debug;

/// Module address → island position, derived from one formation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoutingIndex(BTreeMap<Address, usize>);

impl RoutingIndex {
    /// Claim `address` for the island at `position`. The first claim wins.
    pub fn claim(&mut self, address: Address, position: usize) -> bool {
        match self.0.entry(address) {
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(position);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, address: Address) -> Option<usize> {
        self.0.get(&address).copied()
    }

    pub fn contains(&self, address: Address) -> bool {
        self.0.contains_key(&address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Address, usize)> + '_ {
        self.0.iter().map(|(address, position)| (*address, *position))
    }
}

/// Outcome of routing one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDecision {
    pub address: Address,
    pub endpoint: Endpoint,
    /// True when no island resolved the address and the default was used
    pub fallback: bool,
}

impl Topology {
    /// Master endpoint for `address`, or `NoIslandFound`.
    pub fn resolve(&self, address: Address) -> Result<&Endpoint, RouteError> {
        for i in 0..self.capacity {
            let candidate = self
                .index
                .get(i)
                .and_then(|position| self.islands.get(position))
                .map(|island| &island.master_endpoint)
                .filter(|endpoint| !endpoint.is_empty());

            if let Some(endpoint) = candidate {
                if i >= address {
                    return Ok(endpoint);
                }
            }
        }

        Err(RouteError::NoIslandFound { address })
    }

    /// Route `address`, falling back to the default endpoint. Never fails.
    pub fn decide(&self, address: Address) -> RouteDecision {
        match self.resolve(address) {
            Ok(endpoint) => RouteDecision {
                address,
                endpoint: endpoint.clone(),
                fallback: false,
            },
            Err(e) => {
                events::route_fallback(address, self.default_endpoint.as_str(), &e);
                metrics::record_route_fallback();
                RouteDecision {
                    address,
                    endpoint: self.default_endpoint.clone(),
                    fallback: true,
                }
            }
        }
    }

    pub fn route(&self, address: Address) -> Endpoint {
        self.decide(address).endpoint
    }
}

/// Result of a per-module command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    #[serde(flatten)]
    pub route: RouteDecision,
    /// Acknowledgement text returned by the device
    pub response: String,
}

/// Route a height command for `address` and deliver it.
///
/// Routing itself cannot fail; a transport failure on the resolved endpoint is
/// returned to the caller for this one command.
pub async fn set_height(
    prober: &Prober,
    topology: &Topology,
    address: Address,
    height: u32,
) -> Result<CommandOutcome, ProbeError> {
    let route = topology.decide(address);
    debug!(
        address = address,
        height = height,
        endpoint = %route.endpoint,
        fallback = route.fallback,
        "Dispatching height command"
    );

    let result = prober
        .command(
            &route.endpoint,
            Directive::SetHeight {
                module: address,
                height,
            },
        )
        .await;

    metrics::record_command(if result.is_ok() { "ok" } else { "failed" });

    match result {
        Ok(response) => {
            events::command_sent(address, height, route.endpoint.as_str(), route.fallback);
            Ok(CommandOutcome { route, response })
        }
        Err(e) => Err(e),
    }
}
