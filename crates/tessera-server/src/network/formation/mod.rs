//! Formation Run
//!
//! One complete pass over the grid, in three phases:
//! 1. Scan - probe candidates and build the device registry
//! 2. Roles - master directive to the root address, slave to the rest
//! 3. Islands - query masters for their layout and build the routing index

mod controller;
mod phases;
mod session;

pub use controller::{FormationController, FormationState};
pub use phases::IslandFormation;
pub use session::{FormationSession, Topology};
