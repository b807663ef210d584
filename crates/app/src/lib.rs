//! # vdev-app
//!
//! Application layer — device engines and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RecordStore` — persistence for per-device records
//!   - `VariableClient` — read/write host-controller variables
//!   - `GarageBackend` — field-level access to a door controller
//!   - `StatusSink` — outbound status, reports and notices
//! - Run the **device engines**: timed switches, level devices, the
//!   temperature converter and the garage reconciler
//! - Hold the **device registry** that builds engines from specs and routes
//!   commands and poll ticks to them
//! - Provide **in-process infrastructure** (status bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `vdev-domain` only (plus `tokio` for sync and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod engine;
pub mod ports;
pub mod registry;
pub mod status_bus;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;
