//! # vdev-adapter-isy
//!
//! REST adapter for the ISY host controller's variable tables.
//!
//! ## Responsibilities
//! - Implement the [`VariableClient`](vdev_app::ports::VariableClient) port
//!   against the controller's `/rest/vars` API
//! - Address the state (`2`) and integer (`1`) tables, current and init
//!   values
//! - Parse the controller's XML variable envelopes
//!
//! ## Dependency rule
//! Depends on `vdev-app` (for port traits) and `vdev-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod client;

pub use client::IsyClient;
