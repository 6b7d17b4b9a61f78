//! Single-instance lock for orchestrator processes.
//!
//! `LockManager` combines the stale sweep, peer detection, optional force
//! takeover and the atomic claim of the lock triplet.
//!
//! Lifecycle: `Unlocked -> Locked` on a successful acquire, `Locked ->
//! Released` on release. `Released` is terminal.

mod error;
mod manager;

pub use error::AcquireError;
pub use manager::LockManager;
