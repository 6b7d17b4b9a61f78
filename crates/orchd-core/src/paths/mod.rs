//! Path utilities for the lock directory and lock triplet files.
//!
//! All orchestrators on a host must agree on these paths without any
//! coordination, so they are a pure function of the lock directory and the
//! port.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - The lock directory defaults to the system temp dir and can be
//!   overridden with `ORCHD_LOCK_DIR`

mod error;
mod lock;

// Error type
pub use error::PathError;

// Lock directory and triplet names
pub use lock::{LOCK_DIR_ENV, LockPaths, default_lock_dir, ensure_lock_dir};
