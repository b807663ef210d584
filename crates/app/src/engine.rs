//! Device engines — one per device family.
//!
//! Each engine owns the full lifecycle of its devices: load the persisted
//! record on start, serialize transitions through a per-device mutex, write
//! the stable collapse of every state change back to the store, and emit
//! status through the sink.

pub mod garage;
pub mod level;
pub mod switch;
pub mod temperature;

pub use garage::{GarageReconciler, GarageVariables};
pub use level::LevelEngine;
pub use switch::{SwitchVariant, TimedSwitch};
pub use temperature::TemperatureConverter;
