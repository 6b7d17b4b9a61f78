//! Command handlers.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub [async] fn execute(settings: &GuardSettings, ...) -> Result<()>`
//! - Thin wrappers that:
//!   1. Build the runtime adapters from settings
//!   2. Call the lock manager or the detector
//!   3. Format output for the terminal (stdout; logs go to stderr)
//!
//! Handlers should NOT contain lock or admission logic.

pub mod acquire;
pub mod check;
pub mod clean;
pub mod release;
pub mod status;
