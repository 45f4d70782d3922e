//! Candidate Sources
//!
//! Producers of candidate endpoints for a scan. The engine only needs "a list
//! of addresses to probe"; how that list is obtained (static configuration, a
//! subnet sweep, or the OS ARP table) is interchangeable.

use super::config::CandidateConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::process::Stdio;
use std::sync::Arc;
use tessera_core::Endpoint;
use tokio::process::Command;
use tracing::{debug, info};

#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn candidates(&self) -> Result<Vec<Endpoint>>;
}

/// Build the configured candidate source
pub fn from_config(config: &CandidateConfig) -> Arc<dyn CandidateSource> {
    match config {
        CandidateConfig::Static(endpoints) => Arc::new(StaticCandidates(endpoints.clone())),
        CandidateConfig::Subnet(prefix) => Arc::new(SubnetSweep::new(prefix.clone())),
        CandidateConfig::Arp { broadcast } => Arc::new(ArpTable::new(broadcast.clone())),
    }
}

/// Fixed endpoint list
#[derive(Debug, Clone)]
pub struct StaticCandidates(pub Vec<Endpoint>);

#[async_trait]
impl CandidateSource for StaticCandidates {
    async fn candidates(&self) -> Result<Vec<Endpoint>> {
        Ok(self.0.clone())
    }
}

/// Every host address `<prefix>.1` through `<prefix>.254` of a /24
#[derive(Debug, Clone)]
pub struct SubnetSweep {
    prefix: String,
}

impl SubnetSweep {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl CandidateSource for SubnetSweep {
    async fn candidates(&self) -> Result<Vec<Endpoint>> {
        let base: Ipv4Addr = format!("{}.0", self.prefix)
            .parse()
            .with_context(|| format!("invalid subnet prefix {:?}", self.prefix))?;
        let [a, b, c, _] = base.octets();

        Ok((1..=254u8)
            .map(|host| Endpoint::from(Ipv4Addr::new(a, b, c, host).to_string()))
            .collect())
    }
}

/// Reads the OS neighbour table via `arp -a`.
///
/// A broadcast ping is fired first (not awaited) so that devices which have
/// not talked to this host yet get a chance to appear in the table. Priming is
/// best-effort: hosts that refuse broadcast pings still get whatever the
/// table already holds.
#[derive(Debug, Clone)]
pub struct ArpTable {
    broadcast: String,
}

impl ArpTable {
    pub fn new(broadcast: impl Into<String>) -> Self {
        Self {
            broadcast: broadcast.into(),
        }
    }

    fn prime(&self) {
        let spawned = Command::new("ping")
            .args(broadcast_ping_args(&self.broadcast))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        if let Err(e) = spawned {
            debug!(broadcast = %self.broadcast, error = %e, "Broadcast ping unavailable");
        }
    }
}

#[async_trait]
impl CandidateSource for ArpTable {
    async fn candidates(&self) -> Result<Vec<Endpoint>> {
        self.prime();

        let output = Command::new("arp")
            .arg("-a")
            .output()
            .await
            .context("failed to run arp -a")?;

        if !output.status.success() {
            return Err(anyhow!(
                "arp -a exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let addrs = parse_arp_output(&String::from_utf8_lossy(&output.stdout));
        info!(candidate_count = addrs.len(), "Read candidates from ARP table");

        Ok(addrs
            .into_iter()
            .map(|ip| Endpoint::from(ip.to_string()))
            .collect())
    }
}

/// `ping` arguments for a single broadcast echo. Linux needs `-b` to allow
/// broadcast targets; BSD-derived `ping` (macOS) treats `-b` as an interface
/// binding and accepts broadcast destinations without it.
fn broadcast_ping_args(broadcast: &str) -> Vec<&str> {
    if cfg!(target_os = "linux") {
        vec!["-c", "1", "-b", broadcast]
    } else if cfg!(windows) {
        vec!["-n", "1", broadcast]
    } else {
        vec!["-c", "1", broadcast]
    }
}

/// Extract every distinct IPv4 address from `arp -a` output, in order of
/// appearance. Handles both the BSD/Linux `? (a.b.c.d) at ...` and the
/// Windows tabular layout.
pub fn parse_arp_output(output: &str) -> Vec<Ipv4Addr> {
    let mut seen = HashSet::new();
    output
        .split_whitespace()
        .map(|token| token.trim_matches(|c| c == '(' || c == ')'))
        .filter_map(|token| token.parse::<Ipv4Addr>().ok())
        .filter(|ip| seen.insert(*ip))
        .collect()
}
