//! # vdev-adapter-ratgdo
//!
//! REST adapter for ratgdo-flashed ESPHome garage-door controllers.
//!
//! ## Responsibilities
//! - Implement the [`GarageBackend`](vdev_app::ports::GarageBackend) port
//!   against the controller's native HTTP API
//! - Map the vendor's entity states (`OPEN`/`CLOSED`, `OPENING`/`CLOSING`,
//!   `ON`/`OFF`, `LOCKED`/`UNLOCKED`) into the canonical door model
//! - Probe controller availability before a device goes live
//!
//! ## Dependency rule
//! Depends on `vdev-app` (for port traits) and `vdev-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod client;

pub use client::RatgdoClient;
