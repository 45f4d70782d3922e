//! Island Formation Protocol
//!
//! For each address in ascending order: tell the device to begin grid
//! discovery, let it settle, then pull its governed layout and claim every
//! module it reports. The run ends after the first recorded island unless the
//! `all` island policy is configured.

use super::super::config::{GridConfig, IslandPolicy};
use super::super::probe::Prober;
use super::session::FormationSession;
use crate::observability::events;
use std::collections::HashSet;
use tessera_core::{Address, Directive, Endpoint, Island, ModuleDescriptor};
use tracing::{debug, info, warn};

/// Drives the begin/settle/retrieve sequence against candidate masters
pub struct IslandFormation<'a> {
    prober: &'a Prober,
    config: &'a GridConfig,
}

impl<'a> IslandFormation<'a> {
    pub fn new(prober: &'a Prober, config: &'a GridConfig) -> Self {
        Self { prober, config }
    }

    /// Form islands into `session`. Returns the number of islands recorded.
    pub async fn form_islands(&self, session: &mut FormationSession) -> usize {
        let mut formed = 0;

        for address in 0..session.capacity() {
            let Some(endpoint) = session.registry().get(address).cloned() else {
                continue;
            };
            if session.is_claimed(address) {
                debug!(address = address, "Skipping claimed address");
                continue;
            }

            let island = self.form_island(session, address, &endpoint).await;
            let module_count = island.modules.len();
            let position = session.record_island(island);
            formed += 1;

            events::island_formed(position, address, endpoint.as_str(), module_count);

            if self.config.island_policy == IslandPolicy::First {
                break;
            }
        }

        if formed == 0 {
            info!("No unclaimed device available, no islands formed");
        }
        formed
    }

    /// Begin, settle and retrieve for one candidate master.
    ///
    /// Never fails: an uncooperative master yields an island with whatever
    /// modules could be claimed, possibly none.
    async fn form_island(
        &self,
        session: &FormationSession,
        address: Address,
        endpoint: &Endpoint,
    ) -> Island {
        info!(address = address, endpoint = %endpoint, "Forming island");

        if let Err(e) = self.prober.send(endpoint, Directive::BeginGrid).await {
            warn!(
                address = address,
                endpoint = %endpoint,
                error = %e,
                "beginGrid failed, retrieving layout anyway"
            );
        }

        tokio::time::sleep(self.config.settle_delay).await;

        let reported = self.retrieve_layout(endpoint).await;

        let mut island = Island::new(endpoint.clone());
        let mut taken = HashSet::new();
        for descriptor in reported {
            let module = match descriptor.module() {
                Some(module) if self.config.in_range(descriptor.addr) => module,
                _ => {
                    warn!(
                        master = address,
                        module = descriptor.addr,
                        capacity = self.config.grid_capacity,
                        "Dropping module outside grid range"
                    );
                    continue;
                }
            };
            if session.is_claimed(module.addr) || !taken.insert(module.addr) {
                warn!(master = address, module = module.addr, "Dropping already claimed module");
                continue;
            }
            island.modules.push(module);
        }

        island
    }

    /// getGrid with a fixed attempt budget, retrying while the layout is
    /// empty. Errors count as an empty layout.
    async fn retrieve_layout(&self, endpoint: &Endpoint) -> Vec<ModuleDescriptor> {
        let attempts = self.config.grid_attempts.max(1);

        for attempt in 1..=attempts {
            match self.prober.get_grid(endpoint).await {
                Ok(modules) if !modules.is_empty() => {
                    debug!(
                        endpoint = %endpoint,
                        attempt = attempt,
                        module_count = modules.len(),
                        "Layout retrieved"
                    );
                    return modules;
                }
                Ok(_) => {
                    debug!(endpoint = %endpoint, attempt = attempt, "Layout empty");
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, attempt = attempt, error = %e, "Layout retrieval failed");
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.config.grid_retry_delay).await;
            }
        }

        warn!(endpoint = %endpoint, attempts = attempts, "Layout retrieval budget exhausted");
        Vec::new()
    }
}
