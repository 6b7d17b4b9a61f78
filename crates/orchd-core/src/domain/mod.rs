//! Domain types for admission and lock lifecycle.
//!
//! These are plain data carriers shared by the runtime adapters and the CLI.
//! None of them perform I/O.

mod load;
mod peer;
mod state;

pub use load::LoadSnapshot;
pub use peer::{OrchestratorDescriptor, PeerPid};
pub use state::{LockState, StateRecord};
