//! Lock state record and lock manager lifecycle.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Contents of the `state` mirror file.
///
/// Written as a JSON object with exactly these keys. Readers ignore any
/// additional keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub pid: u32,
    pub port: u16,
    /// Seconds since the Unix epoch, with sub-second precision.
    pub start_time: f64,
    pub cmdline: String,
}

impl StateRecord {
    /// Record stamped with the current wall-clock time.
    pub fn now(pid: u32, port: u16, cmdline: impl Into<String>) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let start_time = Utc::now().timestamp_millis() as f64 / 1000.0;
        Self {
            pid,
            port,
            start_time,
            cmdline: cmdline.into(),
        }
    }

    /// `start_time` as a timestamp, if it is representable.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        if !self.start_time.is_finite() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let millis = (self.start_time * 1000.0).round() as i64;
        Utc.timestamp_millis_opt(millis).single()
    }
}

/// Lifecycle of a single `LockManager` instance.
///
/// `Unlocked -> Locked` on a successful acquire, `Locked -> Released` on
/// release. `Released` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    #[default]
    Unlocked,
    Locked,
    Released,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_ignore_extra_keys() {
        let json = r#"{"pid":12,"port":9500,"start_time":1700000000.5,"cmdline":"orchestrator run","host":"x"}"#;
        let record: StateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.pid, 12);
        assert_eq!(record.port, 9500);
        assert_eq!(record.cmdline, "orchestrator run");
    }

    #[test]
    fn written_keys_are_exactly_the_documented_ones() {
        let record = StateRecord::now(1, 9500, "orchestrator");
        let value = serde_json::to_value(&record).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["cmdline", "pid", "port", "start_time"]);
    }

    #[test]
    fn start_time_is_close_to_now() {
        let record = StateRecord::now(1, 9500, "orchestrator");
        let started = record.started_at().unwrap();
        let drift = (Utc::now() - started).num_milliseconds().abs();
        assert!(drift < 2000, "drift was {drift}ms");
    }

    #[test]
    fn non_finite_start_time_has_no_timestamp() {
        let record = StateRecord {
            pid: 1,
            port: 1,
            start_time: f64::NAN,
            cmdline: String::new(),
        };
        assert!(record.started_at().is_none());
    }
}
