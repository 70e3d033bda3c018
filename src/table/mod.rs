//! Per-room serialization layer over the core engine.
//!
//! Each table runs in its own Tokio task with an mpsc inbox; every
//! mutating operation on a room goes through that one task, which is the
//! exclusive-access discipline the engine requires. The [`Registry`]
//! spawns and looks up table actors by room id.

pub mod actor;
pub mod messages;
pub mod registry;

pub use actor::{DEFAULT_RESET_DELAY, RoomClosed, TableActor, TableHandle};
pub use messages::TableMessage;
pub use registry::{Registry, RegistryError};
