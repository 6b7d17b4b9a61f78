//! Lock triplet management for single-instance orchestrators.
//!
//! Provides exclusive-create claiming, owner-checked teardown and stale
//! cleanup of the `lock`, `pid` and `state` files for one port.
//!
//! # Safety guarantees
//! - `lock` is claimed with `O_CREAT | O_EXCL`; mirrors are written after it
//! - Mirrors are written via temp file + rename and removed before `lock`
//! - Stale removal re-checks the owner, so a freshly won lock is never deleted

mod io;
mod sweep;

pub use io::{LockStamp, StateFileError, StateFiles};
pub use sweep::{MALFORMED_GRACE, SweepReport, is_live_owner, sweep_stale};
