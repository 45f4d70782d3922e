//! Device Registry construction
//!
//! Probes every candidate concurrently, waits for every probe to settle, and
//! keeps the successes whose reported address fits the grid.

use super::probe::{Identity, Prober};
use crate::observability::{events, metrics};
use futures::future::join_all;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use tessera_core::{Address, Device, Endpoint};
use tracing::{debug, info};

/// Address → endpoint mapping produced by one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeviceRegistry {
    devices: BTreeMap<Address, Endpoint>,
}

impl DeviceRegistry {
    pub fn get(&self, address: Address) -> Option<&Endpoint> {
        self.devices.get(&address)
    }

    pub fn contains(&self, address: Address) -> bool {
        self.devices.contains_key(&address)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Entries in ascending address order
    pub fn iter(&self) -> impl Iterator<Item = (Address, &Endpoint)> {
        self.devices.iter().map(|(address, endpoint)| (*address, endpoint))
    }

    pub fn devices(&self) -> Vec<Device> {
        self.iter()
            .map(|(id, endpoint)| Device {
                endpoint: endpoint.clone(),
                id,
            })
            .collect()
    }
}

impl FromIterator<(Address, Endpoint)> for DeviceRegistry {
    fn from_iter<T: IntoIterator<Item = (Address, Endpoint)>>(iter: T) -> Self {
        Self {
            devices: iter.into_iter().collect(),
        }
    }
}

/// Probe all candidates and build a fresh registry.
///
/// Fan-out/fan-in: every probe settles (success, failure or timeout) before
/// the registry is assembled. Two endpoints reporting the same address leave
/// one entry: outcomes are applied in ascending endpoint order and the first
/// endpoint keeps the address.
pub async fn scan(prober: &Prober, candidates: &[Endpoint], capacity: Address) -> DeviceRegistry {
    let mut seen = HashSet::new();
    let unique: Vec<&Endpoint> = candidates.iter().filter(|e| seen.insert(*e)).collect();

    info!(candidate_count = unique.len(), "Scanning candidates");

    let outcomes = join_all(unique.iter().map(|endpoint| prober.identify(endpoint))).await;

    let mut identities: Vec<Identity> = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!(error = %e, kind = e.kind(), "Candidate did not identify");
                None
            }
        })
        .collect();
    identities.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));

    let mut devices = BTreeMap::new();
    for identity in identities {
        let address = match Address::try_from(identity.address) {
            Ok(address) if address < capacity => address,
            _ => {
                debug!(
                    endpoint = %identity.endpoint,
                    reported = identity.address,
                    capacity = capacity,
                    "Discarding device outside grid range"
                );
                continue;
            }
        };

        match devices.entry(address) {
            Entry::Vacant(entry) => {
                events::device_discovered(address, identity.endpoint.as_str());
                entry.insert(identity.endpoint);
            }
            Entry::Occupied(entry) => {
                events::address_collision(address, entry.get().as_str(), identity.endpoint.as_str());
            }
        }
    }

    let registry = DeviceRegistry { devices };
    metrics::set_devices_discovered(registry.len());
    info!(device_count = registry.len(), "Scan complete");
    registry
}
