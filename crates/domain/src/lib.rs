//! # vdev-domain
//!
//! Pure domain model for the vdev virtual-device daemon.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **device specifications** (validated per-type parameter bundles)
//! - Define **status values** (switch/toggle driver states, dimmer levels)
//! - Define the canonical **garage state** and its variable encodings
//! - Define the **temperature record** and its conversion/statistics rules
//! - Define **commands** (inbound) and **status events** (outbound)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod command;
pub mod device;
pub mod event;
pub mod garage;
pub mod record;
pub mod status;
pub mod temperature;
pub mod variable;
