//! Grid Configuration
//!
//! Centralized configuration for discovery, formation and routing with
//! environment variable overrides. Invalid override values are ignored and the
//! default is kept.

use std::str::FromStr;
use std::time::Duration;
use strum::{Display, EnumString};
use tessera_core::{Address, Endpoint};

/// How many islands a formation run records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum IslandPolicy {
    /// Stop after the first recorded island (observed device protocol)
    #[default]
    First,
    /// Keep forming islands for every unclaimed master. Opt-in extension;
    /// devices running the stock firmware only ever populate one island.
    All,
}

/// Where scan candidates come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateConfig {
    /// Fixed list of endpoints (env: TESSERA_CANDIDATES, comma-separated)
    Static(Vec<Endpoint>),
    /// Sweep `<prefix>.1` to `<prefix>.254` (env: TESSERA_SUBNET, e.g. `192.168.0`)
    Subnet(String),
    /// Read the OS ARP table after a broadcast ping (env: TESSERA_BROADCAST)
    Arp { broadcast: String },
}

impl Default for CandidateConfig {
    fn default() -> Self {
        CandidateConfig::Arp {
            broadcast: "192.168.0.255".to_string(),
        }
    }
}

/// Grid configuration with sensible defaults
#[derive(Debug, Clone)]
pub struct GridConfig {
    // Addressing
    /// Grid capacity N; valid addresses are `[0, N)` (env: TESSERA_GRID_CAPACITY)
    pub grid_capacity: Address,

    /// Address that receives the master directive (env: TESSERA_ROOT_ADDRESS)
    pub root_address: Address,

    // Device transport
    /// Port used for endpoints without an explicit port (env: TESSERA_DEVICE_PORT)
    pub device_port: u16,

    /// Per-operation deadline for every device request (env: TESSERA_PROBE_TIMEOUT_MS)
    pub probe_timeout: Duration,

    // Island formation
    /// Pause between beginGrid and the first getGrid (env: TESSERA_SETTLE_DELAY_MS)
    pub settle_delay: Duration,

    /// getGrid attempts while the layout comes back empty (env: TESSERA_GRID_ATTEMPTS)
    pub grid_attempts: u32,

    /// Pause between getGrid attempts (env: TESSERA_GRID_RETRY_DELAY_MS)
    pub grid_retry_delay: Duration,

    /// Single or multi island formation (env: TESSERA_ISLAND_POLICY)
    pub island_policy: IslandPolicy,

    // Routing
    /// Endpoint used when no island resolves an address (env: TESSERA_DEFAULT_ENDPOINT)
    pub default_endpoint: Endpoint,

    // Discovery
    pub candidates: CandidateConfig,

    // Server
    /// HTTP bind address for the helper and control API (env: BIND_ADDR)
    pub bind_addr: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_capacity: 25,
            root_address: 1,

            device_port: 80,
            probe_timeout: Duration::from_millis(2000),

            settle_delay: Duration::from_secs(2),
            grid_attempts: 5,
            grid_retry_delay: Duration::from_millis(500),
            island_policy: IslandPolicy::First,

            default_endpoint: Endpoint::from("172.20.10.3"),

            candidates: CandidateConfig::default(),

            bind_addr: "0.0.0.0:5050".to_string(),
        }
    }
}

impl GridConfig {
    /// Create configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(capacity) = parse(&lookup, "TESSERA_GRID_CAPACITY") {
            config.grid_capacity = capacity;
        }
        if let Some(root) = parse(&lookup, "TESSERA_ROOT_ADDRESS") {
            config.root_address = root;
        }
        if let Some(port) = parse(&lookup, "TESSERA_DEVICE_PORT") {
            config.device_port = port;
        }
        if let Some(ms) = parse(&lookup, "TESSERA_PROBE_TIMEOUT_MS") {
            config.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(&lookup, "TESSERA_SETTLE_DELAY_MS") {
            config.settle_delay = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse::<u32>(&lookup, "TESSERA_GRID_ATTEMPTS") {
            config.grid_attempts = attempts.max(1);
        }
        if let Some(ms) = parse(&lookup, "TESSERA_GRID_RETRY_DELAY_MS") {
            config.grid_retry_delay = Duration::from_millis(ms);
        }
        if let Some(policy) = parse(&lookup, "TESSERA_ISLAND_POLICY") {
            config.island_policy = policy;
        }
        if let Some(endpoint) = lookup("TESSERA_DEFAULT_ENDPOINT").filter(|v| !v.trim().is_empty()) {
            config.default_endpoint = Endpoint::new(endpoint.trim());
        }

        if let Some(list) = lookup("TESSERA_CANDIDATES") {
            let endpoints: Vec<Endpoint> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Endpoint::from)
                .collect();
            if !endpoints.is_empty() {
                config.candidates = CandidateConfig::Static(endpoints);
            }
        } else if let Some(prefix) = lookup("TESSERA_SUBNET").filter(|v| !v.trim().is_empty()) {
            config.candidates = CandidateConfig::Subnet(prefix.trim().trim_end_matches('.').to_string());
        } else if let Some(broadcast) = lookup("TESSERA_BROADCAST") {
            config.candidates = CandidateConfig::Arp { broadcast };
        }

        if let Some(bind_addr) = lookup("BIND_ADDR") {
            config.bind_addr = bind_addr;
        }

        config
    }

    /// True if `address` lies in the configured grid range
    pub fn in_range(&self, address: i64) -> bool {
        address >= 0 && address < i64::from(self.grid_capacity)
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse::<T>().ok())
}
