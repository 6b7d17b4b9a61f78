//! Load sampler port.

use crate::domain::LoadSnapshot;

/// Port for sampling host load on the admission hot path.
///
/// `snapshot` must return in well under a second, must not spawn processes
/// and must not hold locks across calls. It takes `&mut self` because real
/// samplers keep refresh state between calls (CPU usage is a delta).
pub trait LoadSampler: Send {
    fn snapshot(&mut self) -> LoadSnapshot;
}

impl<S: LoadSampler + ?Sized> LoadSampler for Box<S> {
    fn snapshot(&mut self) -> LoadSnapshot {
        (**self).snapshot()
    }
}
