//! Sliding window of admitted spawns.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Timestamps of admitted spawns, oldest first.
#[derive(Debug, Clone)]
pub struct SpawnWindow {
    window: Duration,
    events: VecDeque<Instant>,
}

impl SpawnWindow {
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            events: VecDeque::with_capacity(capacity),
        }
    }

    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Drop events older than `now - window`.
    pub fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.events.front() {
            if now.saturating_duration_since(*oldest) <= self.window {
                break;
            }
            self.events.pop_front();
        }
    }

    pub fn record(&mut self, now: Instant) {
        self.events.push_back(now);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events per second across the retained events.
    ///
    /// A zero span (a single event, or all events at the same instant)
    /// reports the event count itself.
    #[allow(clippy::cast_precision_loss)]
    pub fn rate(&self) -> f64 {
        let (Some(first), Some(last)) = (self.events.front(), self.events.back()) else {
            return 0.0;
        };
        let count = self.events.len() as f64;
        let span = last.saturating_duration_since(*first).as_secs_f64();
        if span <= 0.0 { count } else { count / span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn prune_drops_only_expired_events() {
        let mut events = SpawnWindow::new(WINDOW, 4);
        let start = Instant::now();
        events.record(start);
        events.record(start + Duration::from_secs(5));

        events.prune(start + WINDOW);
        assert_eq!(events.len(), 2);

        events.prune(start + WINDOW + Duration::from_millis(1));
        assert_eq!(events.len(), 1);

        events.prune(start + Duration::from_secs(30));
        assert!(events.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn prune_with_earlier_now_keeps_everything() {
        let mut events = SpawnWindow::new(WINDOW, 4);
        let start = Instant::now() + Duration::from_secs(60);
        events.record(start);
        events.prune(start - Duration::from_secs(30));
        assert_eq!(events.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_edge_cases() {
        let mut events = SpawnWindow::new(WINDOW, 4);
        assert!(events.rate().abs() < f64::EPSILON);

        let start = Instant::now();
        events.record(start);
        events.record(start);
        events.record(start);
        assert!((events.rate() - 3.0).abs() < f64::EPSILON);

        events.record(start + Duration::from_secs(2));
        assert!((events.rate() - 2.0).abs() < f64::EPSILON);
    }
}
