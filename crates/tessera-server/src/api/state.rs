//! Application State
//!
//! Shared state passed to all API handlers.

use crate::network::{CandidateSource, FormationController, GridConfig, Prober, Topology};
use crate::observability::MetricsState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Serializes scans and formation runs
    pub controller: Arc<Mutex<FormationController>>,
    /// Latest published topology; replaced wholesale after each run
    pub topology: Arc<RwLock<Arc<Topology>>>,
    pub prober: Prober,
    /// Set once the first formation run has been published
    pub readiness: Arc<AtomicBool>,
    pub metrics_state: Option<MetricsState>,
}

impl AppState {
    pub fn new(
        config: GridConfig,
        prober: Prober,
        candidates: Arc<dyn CandidateSource>,
        metrics_state: Option<MetricsState>,
    ) -> Self {
        let topology = Arc::new(Topology::empty(&config));
        let controller = FormationController::new(config, prober.clone(), candidates);
        Self {
            controller: Arc::new(Mutex::new(controller)),
            topology: Arc::new(RwLock::new(topology)),
            prober,
            readiness: Arc::new(AtomicBool::new(false)),
            metrics_state,
        }
    }

    /// Current topology snapshot. The lock is released before returning.
    pub async fn snapshot(&self) -> Arc<Topology> {
        self.topology.read().await.clone()
    }

    /// Replace the published topology and mark the server ready
    pub async fn publish(&self, topology: Topology) -> Arc<Topology> {
        let topology = Arc::new(topology);
        *self.topology.write().await = topology.clone();
        self.readiness.store(true, Ordering::Release);
        topology
    }

    /// Run a full formation and publish its topology
    pub async fn form(&self) -> anyhow::Result<Arc<Topology>> {
        let topology = {
            let mut controller = self.controller.lock().await;
            controller.run().await?
        };
        Ok(self.publish(topology).await)
    }
}
