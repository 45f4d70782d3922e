//! Formation Session
//!
//! Working state owned by exactly one formation run, and the immutable
//! `Topology` it is frozen into once the run completes.

use super::super::config::GridConfig;
use super::super::roles::RoleReport;
use super::super::router::RoutingIndex;
use super::super::scan::DeviceRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tessera_core::{Address, Endpoint, Island};
use uuid::Uuid;

/// Mutable registry/islands/index triple for a single run.
///
/// Passed by reference through the pipeline; nothing outside the run can
/// observe it until [`FormationSession::into_topology`].
#[derive(Debug)]
pub struct FormationSession {
    run_id: Uuid,
    capacity: Address,
    registry: DeviceRegistry,
    roles: RoleReport,
    islands: Vec<Island>,
    index: RoutingIndex,
}

impl FormationSession {
    pub fn new(run_id: Uuid, capacity: Address, registry: DeviceRegistry) -> Self {
        Self {
            run_id,
            capacity,
            registry,
            roles: RoleReport::default(),
            islands: Vec::new(),
            index: RoutingIndex::default(),
        }
    }

    pub fn capacity(&self) -> Address {
        self.capacity
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    pub fn index(&self) -> &RoutingIndex {
        &self.index
    }

    pub fn set_roles(&mut self, roles: RoleReport) {
        self.roles = roles;
    }

    pub fn is_claimed(&self, address: Address) -> bool {
        self.index.contains(address)
    }

    /// Append an island and claim every module address it lists.
    ///
    /// Callers filter out already-claimed addresses first; a module that still
    /// collides keeps its earlier claim. Returns the island's position.
    pub fn record_island(&mut self, island: Island) -> usize {
        let position = self.islands.len();
        for address in island.addresses() {
            self.index.claim(address, position);
        }
        self.islands.push(island);
        position
    }

    pub fn into_topology(self, default_endpoint: Endpoint) -> Topology {
        Topology {
            run_id: Some(self.run_id),
            formed_at: Some(Utc::now()),
            capacity: self.capacity,
            registry: self.registry,
            roles: self.roles,
            islands: self.islands,
            index: self.index,
            default_endpoint,
        }
    }
}

/// Published result of a formation run. Replaced wholesale by the next run.
#[derive(Debug, Clone, Serialize)]
pub struct Topology {
    /// `None` before the first run completes
    pub run_id: Option<Uuid>,
    pub formed_at: Option<DateTime<Utc>>,
    pub capacity: Address,
    pub registry: DeviceRegistry,
    pub roles: RoleReport,
    pub islands: Vec<Island>,
    pub index: RoutingIndex,
    pub default_endpoint: Endpoint,
}

impl Topology {
    /// Topology with no devices; every route falls back to the default endpoint
    pub fn empty(config: &GridConfig) -> Self {
        Self {
            run_id: None,
            formed_at: None,
            capacity: config.grid_capacity,
            registry: DeviceRegistry::default(),
            roles: RoleReport::default(),
            islands: Vec::new(),
            index: RoutingIndex::default(),
            default_endpoint: config.default_endpoint.clone(),
        }
    }

    pub fn is_formed(&self) -> bool {
        self.run_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Module;

    fn module(addr: Address) -> Module {
        Module {
            addr,
            x: addr as i32,
            y: 0,
            rotation: 0,
            is_placed: true,
        }
    }

    #[test]
    fn test_record_island_claims_module_addresses() {
        let mut session = FormationSession::new(Uuid::new_v4(), 25, DeviceRegistry::default());
        let mut island = Island::new(Endpoint::from("10.0.0.2"));
        island.modules = vec![module(1), module(2)];

        let position = session.record_island(island);

        assert_eq!(position, 0);
        assert!(session.is_claimed(1));
        assert!(session.is_claimed(2));
        assert!(!session.is_claimed(3));
        assert_eq!(session.index().get(2), Some(0));
    }

    #[test]
    fn test_empty_topology() {
        let topology = Topology::empty(&GridConfig::default());
        assert!(!topology.is_formed());
        assert!(topology.islands.is_empty());
        assert_eq!(topology.capacity, 25);
    }
}
