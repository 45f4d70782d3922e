//! Core shared types for tessera
//!
//! Data model for grid topology (devices, modules, islands), the device wire
//! vocabulary, and the error taxonomy shared by the discovery and routing
//! engine.

pub mod error;
pub mod models;
pub mod wire;

pub use error::{ProbeError, RouteError};
pub use models::{Address, Device, Endpoint, Island, Module};
pub use wire::{Directive, ModuleDescriptor, Query, Role};
