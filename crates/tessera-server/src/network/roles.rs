//! Role Negotiator
//!
//! One directive per registered device: the root address is told to become
//! master, every other device to become slave. Directives are one-way; whether
//! a device adopted its role only shows later, when formation queries it.

use super::probe::Prober;
use super::scan::DeviceRegistry;
use crate::observability::events;
use serde::Serialize;
use tessera_core::{Address, ProbeError, Role};
use tracing::{debug, info, warn};

/// What the negotiator attempted. Failures are informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleReport {
    pub master: Option<Address>,
    pub slaves: Vec<Address>,
    pub failed: Vec<Address>,
}

/// Issue role directives in ascending address order.
///
/// Each directive yields a `Result<(), ProbeError>` that is logged and
/// dropped here; an unreachable device keeps whatever role it had.
pub async fn assign_roles(prober: &Prober, registry: &DeviceRegistry, root: Address) -> RoleReport {
    let mut report = RoleReport::default();

    if !registry.contains(root) {
        warn!(root = root, "Root address not discovered, no master directive issued");
    }

    for (address, endpoint) in registry.iter() {
        let role = if address == root {
            Role::Master
        } else {
            Role::Slave
        };

        let outcome: Result<(), ProbeError> = prober.send(endpoint, role.directive()).await;
        match outcome {
            Ok(()) => {
                debug!(address = address, endpoint = %endpoint, role = %role, "Role directive delivered");
            }
            Err(e) => {
                events::role_directive_failed(address, endpoint.as_str(), &role.to_string(), &e);
                report.failed.push(address);
            }
        }

        match role {
            Role::Master => report.master = Some(address),
            Role::Slave => report.slaves.push(address),
        }
    }

    info!(
        master = ?report.master,
        slaves = report.slaves.len(),
        failed = report.failed.len(),
        "Role assignment complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::config::GridConfig;
    use crate::network::testing::{MockTransport, Reply};
    use std::sync::Arc;
    use tessera_core::Endpoint;

    fn registry(entries: &[(Address, &str)]) -> DeviceRegistry {
        entries
            .iter()
            .map(|(address, endpoint)| (*address, Endpoint::from(*endpoint)))
            .collect()
    }

    #[tokio::test]
    async fn test_one_directive_per_device() {
        let transport = MockTransport::new()
            .on("http://10.0.0.1:80/becomeSlave", Reply::json("ok"))
            .on("http://10.0.0.2:80/becomeMaster", Reply::json("ok"))
            .on("http://10.0.0.3:80/becomeSlave", Reply::json("ok"));
        let prober = Prober::new(Arc::new(transport.clone()), &GridConfig::default());
        let registry = registry(&[(0, "10.0.0.1"), (1, "10.0.0.2"), (2, "10.0.0.3")]);

        let report = assign_roles(&prober, &registry, 1).await;

        assert_eq!(
            transport.calls(),
            vec![
                "http://10.0.0.1:80/becomeSlave",
                "http://10.0.0.2:80/becomeMaster",
                "http://10.0.0.3:80/becomeSlave",
            ]
        );
        assert_eq!(transport.calls_ending_with("/becomeMaster").len(), 1);
        assert_eq!(report.master, Some(1));
        assert_eq!(report.slaves, vec![0, 2]);
        assert!(report.failed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_swallowed() {
        let transport = MockTransport::new()
            .on("http://10.0.0.2:80/becomeMaster", Reply::json("ok"))
            .on("http://10.0.0.3:80/becomeSlave", Reply::Hang);
        let prober = Prober::new(Arc::new(transport.clone()), &GridConfig::default());
        let registry = registry(&[(1, "10.0.0.2"), (2, "10.0.0.3"), (3, "10.0.0.4")]);

        let report = assign_roles(&prober, &registry, 1).await;

        assert_eq!(transport.calls().len(), 3);
        assert_eq!(report.failed, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_missing_root_gets_no_master_directive() {
        let transport = MockTransport::new();
        let prober = Prober::new(Arc::new(transport.clone()), &GridConfig::default());
        let registry = registry(&[(4, "10.0.0.5")]);

        let report = assign_roles(&prober, &registry, 1).await;

        assert!(transport.calls_ending_with("/becomeMaster").is_empty());
        assert_eq!(transport.calls_ending_with("/becomeSlave").len(), 1);
        assert_eq!(report.master, None);
    }
}
