//! Structured Events
//!
//! One function per event type so field names stay consistent across the
//! engine. Every event carries an `event_type` field.
//!
//! Event types:
//! - `device_discovered` - a candidate identified itself within grid range
//! - `address_collision` - two endpoints reported the same address
//! - `role_directive_failed` - a master/slave directive did not reach its device
//! - `island_formed` - an island was recorded during formation
//! - `route_fallback` - no island resolved an address
//! - `command_sent` - a per-module command was delivered
//! - `formation_completed` - a formation run was published

use tessera_core::{Address, ProbeError, RouteError};
use tracing::{debug, info, warn};

/// Emit a device discovered event
pub fn device_discovered(address: Address, endpoint: &str) {
    debug!(
        event_type = "device_discovered",
        address = address,
        endpoint = %endpoint,
        "Device discovered"
    );
}

/// Emit an address collision event
pub fn address_collision(address: Address, kept_endpoint: &str, ignored_endpoint: &str) {
    warn!(
        event_type = "address_collision",
        address = address,
        kept_endpoint = %kept_endpoint,
        ignored_endpoint = %ignored_endpoint,
        "Duplicate device address"
    );
}

/// Emit a role directive failed event
pub fn role_directive_failed(address: Address, endpoint: &str, role: &str, error: &ProbeError) {
    warn!(
        event_type = "role_directive_failed",
        address = address,
        endpoint = %endpoint,
        role = %role,
        error_kind = error.kind(),
        error = %error,
        "Role directive failed"
    );
}

/// Emit an island formed event
pub fn island_formed(position: usize, master_address: Address, master_endpoint: &str, module_count: usize) {
    info!(
        event_type = "island_formed",
        island = position,
        master_address = master_address,
        master_endpoint = %master_endpoint,
        module_count = module_count,
        "Island formed"
    );
}

/// Emit a route fallback event
pub fn route_fallback(address: Address, default_endpoint: &str, reason: &RouteError) {
    info!(
        event_type = "route_fallback",
        address = address,
        default_endpoint = %default_endpoint,
        reason = %reason,
        "Routing to default endpoint"
    );
}

/// Emit a command sent event
pub fn command_sent(address: Address, height: u32, endpoint: &str, fallback: bool) {
    info!(
        event_type = "command_sent",
        address = address,
        height = height,
        endpoint = %endpoint,
        fallback = fallback,
        "Command sent"
    );
}

/// Emit a formation completed event
pub fn formation_completed(
    run_id: &str,
    device_count: usize,
    island_count: usize,
    claimed_count: usize,
    duration_ms: u64,
) {
    info!(
        event_type = "formation_completed",
        run_id = %run_id,
        device_count = device_count,
        island_count = island_count,
        claimed_count = claimed_count,
        duration_ms = duration_ms,
        "Formation completed"
    );
}
