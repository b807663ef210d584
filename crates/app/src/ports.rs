//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the engine layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod garage;
pub mod status;
pub mod storage;
pub mod variables;

pub use garage::GarageBackend;
pub use status::StatusSink;
pub use storage::RecordStore;
pub use variables::VariableClient;
