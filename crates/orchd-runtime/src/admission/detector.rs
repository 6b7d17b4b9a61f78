//! Sliding-window rate limiter with an absolute process ceiling.

use std::time::Duration;

use orchd_core::ports::LoadSampler;
use orchd_core::settings::{GuardSettings, SettingsError, validate_admission_settings};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use super::error::AdmissionError;
use super::window::SpawnWindow;

/// Processes appearing between two checks above which callers are slowed.
pub const GROWTH_ALERT_THRESHOLD: i64 = 10;

/// Admits or denies prospective child spawns.
///
/// Call `record_start` (or `admit`) immediately before every spawn. A
/// denial never counts against later admissions.
#[derive(Debug)]
pub struct ForkBombDetector<S: LoadSampler> {
    sampler: S,
    threshold: usize,
    window: SpawnWindow,
    system_process_limit: usize,
    system_warning_limit: usize,
    growth_cooldown: Duration,
    initial_process_count: usize,
    last_process_count: usize,
}

impl<S: LoadSampler> ForkBombDetector<S> {
    /// Build a detector; takes one snapshot to record the baseline.
    ///
    /// Rejects a zero threshold or window, which would deny every spawn, and
    /// a warning limit above the ceiling.
    pub fn new(mut sampler: S, settings: &GuardSettings) -> Result<Self, SettingsError> {
        validate_admission_settings(settings)?;
        let initial_process_count = sampler.snapshot().process_count;
        debug!(
            processes = initial_process_count,
            threshold = settings.spawn_threshold,
            window_secs = settings.spawn_window_secs,
            "Fork-bomb detector initialised"
        );
        Ok(Self {
            sampler,
            threshold: settings.spawn_threshold,
            window: SpawnWindow::new(settings.spawn_window(), settings.spawn_threshold),
            system_process_limit: settings.system_process_limit,
            system_warning_limit: settings.system_warning_limit,
            growth_cooldown: settings.growth_cooldown(),
            initial_process_count,
            last_process_count: initial_process_count,
        })
    }

    /// Decide on one prospective spawn.
    ///
    /// # Steps
    /// 1. Deny above the absolute process ceiling
    /// 2. Sleep for the growth cooldown if more than
    ///    `GROWTH_ALERT_THRESHOLD` processes appeared since the last check
    /// 3. Drop expired events; deny if the window is full, else record
    pub async fn admit(&mut self) -> Result<(), AdmissionError> {
        let snapshot = self.sampler.snapshot();
        let count = snapshot.process_count;

        if count > self.system_process_limit {
            warn!(
                processes = count,
                limit = self.system_process_limit,
                "Spawn denied: system process ceiling reached"
            );
            return Err(AdmissionError::SystemCeiling {
                process_count: count,
                limit: self.system_process_limit,
            });
        }

        let delta = signed(count).saturating_sub(signed(self.last_process_count));
        if delta > GROWTH_ALERT_THRESHOLD {
            warn!(
                delta = delta,
                processes = count,
                cooldown_ms = self.growth_cooldown.as_millis(),
                "Process table growing quickly, cooling down"
            );
            sleep(self.growth_cooldown).await;
        }
        if count > self.system_warning_limit {
            warn!(
                processes = count,
                warning_limit = self.system_warning_limit,
                "Process count above warning limit"
            );
        }
        self.last_process_count = count;

        let now = Instant::now();
        self.window.prune(now);
        if self.window.len() >= self.threshold {
            warn!(
                admitted = self.window.len(),
                threshold = self.threshold,
                window_secs = self.window.window().as_secs(),
                "Spawn denied: rate limit exceeded"
            );
            return Err(AdmissionError::RateExceeded {
                admitted: self.window.len(),
                threshold: self.threshold,
                window_secs: self.window.window().as_secs(),
            });
        }
        self.window.record(now);
        debug!(admitted = self.window.len(), load = %snapshot, "Spawn admitted");
        Ok(())
    }

    /// Decide on one prospective spawn; `false` means deny.
    pub async fn record_start(&mut self) -> bool {
        self.admit().await.is_ok()
    }

    /// Admitted spawns per second over the retained window. Observability only.
    pub fn rate(&self) -> f64 {
        self.window.rate()
    }

    /// Admitted spawns currently retained in the window.
    pub fn event_count(&self) -> usize {
        self.window.len()
    }

    pub const fn initial_process_count(&self) -> usize {
        self.initial_process_count
    }

    pub const fn last_process_count(&self) -> usize {
        self.last_process_count
    }

    pub const fn sampler(&self) -> &S {
        &self.sampler
    }
}

fn signed(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
