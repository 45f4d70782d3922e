//! Formation Controller
//!
//! Orchestrates the scan → roles → islands state machine for one run and
//! freezes the result into a `Topology`.

use super::super::candidates::CandidateSource;
use super::super::config::GridConfig;
use super::super::probe::Prober;
use super::super::roles::assign_roles;
use super::super::scan::{scan, DeviceRegistry};
use super::phases::IslandFormation;
use super::session::{FormationSession, Topology};
use crate::observability::{events, metrics};
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use strum::Display;
use tessera_core::Endpoint;
use tracing::{info, Instrument};
use uuid::Uuid;

/// Formation controller state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FormationState {
    /// No run in progress
    Idle,
    /// Probing candidates
    Scanning,
    /// Sending master/slave directives
    AssigningRoles,
    /// Querying masters for their layout
    FormingIslands,
    /// Last run finished and was published
    Complete,
}

/// Runs formation passes. Runs are strictly sequential: `run` takes
/// `&mut self`, so the owner serializes them.
pub struct FormationController {
    config: GridConfig,
    prober: Prober,
    candidates: Arc<dyn CandidateSource>,
    state: FormationState,
}

impl FormationController {
    pub fn new(config: GridConfig, prober: Prober, candidates: Arc<dyn CandidateSource>) -> Self {
        Self {
            config,
            prober,
            candidates,
            state: FormationState::Idle,
        }
    }

    pub fn state(&self) -> FormationState {
        self.state
    }

    pub fn prober(&self) -> &Prober {
        &self.prober
    }

    async fn enumerate(&self) -> Result<Vec<Endpoint>> {
        self.candidates
            .candidates()
            .await
            .context("failed to enumerate scan candidates")
    }

    /// Scan only, without touching device roles
    pub async fn scan(&mut self) -> Result<DeviceRegistry> {
        let candidates = self.enumerate().await?;
        self.state = FormationState::Scanning;
        let registry = scan(&self.prober, &candidates, self.config.grid_capacity).await;
        self.state = FormationState::Idle;
        Ok(registry)
    }

    /// Enumerate candidates and run a complete formation.
    ///
    /// The only hard failure is being unable to produce candidates; every
    /// device-level failure is absorbed by the phases.
    pub async fn run(&mut self) -> Result<Topology> {
        let candidates = self.enumerate().await?;
        Ok(self.run_with_candidates(&candidates).await)
    }

    /// Run a complete formation against a given candidate list
    pub async fn run_with_candidates(&mut self, candidates: &[Endpoint]) -> Topology {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("formation", run_id = %run_id);
        self.run_phases(run_id, candidates).instrument(span).await
    }

    async fn run_phases(&mut self, run_id: Uuid, candidates: &[Endpoint]) -> Topology {
        let started = Instant::now();

        // Phase 1: Scan
        info!("Formation: Phase 1 - Scan");
        self.state = FormationState::Scanning;
        let registry = scan(&self.prober, candidates, self.config.grid_capacity).await;
        let mut session = FormationSession::new(run_id, self.config.grid_capacity, registry);

        // Phase 2: Roles
        info!("Formation: Phase 2 - Role assignment");
        self.state = FormationState::AssigningRoles;
        let roles = assign_roles(&self.prober, session.registry(), self.config.root_address).await;
        session.set_roles(roles);

        // Phase 3: Islands
        info!("Formation: Phase 3 - Island formation");
        self.state = FormationState::FormingIslands;
        IslandFormation::new(&self.prober, &self.config)
            .form_islands(&mut session)
            .await;

        let topology = session.into_topology(self.config.default_endpoint.clone());
        self.state = FormationState::Complete;

        events::formation_completed(
            &run_id.to_string(),
            topology.registry.len(),
            topology.islands.len(),
            topology.index.len(),
            started.elapsed().as_millis() as u64,
        );
        metrics::record_formation(&topology);

        topology
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::candidates::StaticCandidates;
    use crate::network::testing::{MockTransport, Reply};

    fn controller(transport: &MockTransport, candidates: &[&str]) -> FormationController {
        let config = GridConfig::default();
        let prober = Prober::new(Arc::new(transport.clone()), &config);
        let candidates = StaticCandidates(candidates.iter().map(|c| Endpoint::from(*c)).collect());
        FormationController::new(config, prober, Arc::new(candidates))
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_device_scenario() {
        let transport = MockTransport::new()
            .on("http://10.0.0.2:80/getID", Reply::json("[1]"))
            .on("http://10.0.0.2:80/becomeMaster", Reply::json("ok"))
            .on("http://10.0.0.2:80/beginGrid", Reply::json("ok"))
            .on(
                "http://10.0.0.2:80/getGrid",
                Reply::json(r#"[{"addr":1,"x":0,"y":0,"rotation":0,"is_placed":true},
                               {"addr":2,"x":1,"y":0,"rotation":0,"is_placed":true}]"#),
            );
        let mut controller = controller(&transport, &["10.0.0.2", "10.0.0.50"]);
        assert_eq!(controller.state(), FormationState::Idle);

        let topology = controller.run().await.unwrap();

        assert_eq!(controller.state(), FormationState::Complete);
        assert!(topology.is_formed());
        assert_eq!(topology.registry.len(), 1);
        assert_eq!(topology.roles.master, Some(1));
        assert_eq!(topology.islands.len(), 1);
        assert_eq!(topology.islands[0].master_endpoint, Endpoint::from("10.0.0.2"));
        assert_eq!(topology.islands[0].modules.len(), 2);
        assert_eq!(topology.index.iter().collect::<Vec<_>>(), vec![(1, 0), (2, 0)]);
        assert_eq!(topology.route(2), Endpoint::from("10.0.0.2"));
        assert_eq!(topology.route(10), Endpoint::from("172.20.10.3"));

        // Scan, then roles, then islands
        assert_eq!(
            transport.calls().iter().filter(|u| u.starts_with("http://10.0.0.2")).collect::<Vec<_>>(),
            vec![
                "http://10.0.0.2:80/getID",
                "http://10.0.0.2:80/becomeMaster",
                "http://10.0.0.2:80/beginGrid",
                "http://10.0.0.2:80/getGrid",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_island_modules_are_all_indexed() {
        let transport = MockTransport::new()
            .on("http://10.0.0.2:80/getID", Reply::json("[1]"))
            .on("http://10.0.0.3:80/getID", Reply::json("[3]"))
            .on(
                "http://10.0.0.2:80/getGrid",
                Reply::json(r#"[{"addr":1,"x":0,"y":0,"rotation":0,"is_placed":true},
                               {"addr":3,"x":0,"y":1,"rotation":270,"is_placed":true},
                               {"addr":4,"x":1,"y":1,"rotation":0,"is_placed":false}]"#),
            );
        let mut controller = controller(&transport, &["10.0.0.2", "10.0.0.3"]);

        let topology = controller.run().await.unwrap();

        for (position, island) in topology.islands.iter().enumerate() {
            for address in island.addresses() {
                assert_eq!(topology.index.get(address), Some(position));
            }
        }
        assert_eq!(topology.index.len(), 3);
    }

    #[tokio::test]
    async fn test_nothing_discovered() {
        let transport = MockTransport::new();
        let mut controller = controller(&transport, &["10.0.0.2"]);

        let topology = controller.run().await.unwrap();

        assert!(topology.registry.is_empty());
        assert!(topology.islands.is_empty());
        assert_eq!(topology.route(0), Endpoint::from("172.20.10.3"));
    }

    #[tokio::test]
    async fn test_scan_only_leaves_roles_untouched() {
        let transport = MockTransport::new().on("http://10.0.0.2:80/getID", Reply::json("[1]"));
        let mut controller = controller(&transport, &["10.0.0.2"]);

        let registry = controller.scan().await.unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(transport.calls(), vec!["http://10.0.0.2:80/getID"]);
        assert_eq!(controller.state(), FormationState::Idle);
    }
}
