//! Port definitions (trait abstractions) for host capabilities.
//!
//! Ports define the interfaces that the admission controller expects from the
//! host. They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `nix`, `sysinfo` or `/proc` types in any signature
//! - Probes are best-effort and never return errors; failures fold into the
//!   conservative answer documented on each method
//! - Implementations live in `orchd-runtime`; tests supply fakes

pub mod load_sampler;
pub mod process_probe;

pub use load_sampler::LoadSampler;
pub use process_probe::{ORCHESTRATOR_MARKER, ProcessProbe, cmdline_marks_orchestrator};
