//! Fork-bomb detection for prospective child spawns.
//!
//! `ForkBombDetector` admits or denies each spawn based on an absolute
//! process ceiling and a sliding-window rate cap, and throttles callers
//! while the host process table grows quickly.

mod detector;
mod error;
mod window;

pub use detector::{ForkBombDetector, GROWTH_ALERT_THRESHOLD};
pub use error::AdmissionError;
pub use window::SpawnWindow;
