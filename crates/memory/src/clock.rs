//! Strictly increasing timestamps for a single-writer log.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

/// Hands out wall-clock timestamps that never repeat or go backwards.
///
/// When the clock has not advanced since the previous stamp (or has stepped
/// back), the previous stamp plus one microsecond is returned instead.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start after an existing stamp, e.g. the newest row already on disk.
    pub fn starting_after(last: Option<DateTime<Utc>>) -> Self {
        Self {
            last: Mutex::new(last.map(truncate_micros)),
        }
    }

    pub async fn next(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().await;
        let now = truncate_micros(Utc::now());
        let stamp = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }
}

/// Drop sub-microsecond precision so stamps survive a text round-trip unchanged.
fn truncate_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    let micros = ts.timestamp_micros();
    DateTime::from_timestamp_micros(micros).unwrap_or(ts)
}

/// Fixed-width RFC 3339 text, so lexical order equals chronological order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Parse a stored timestamp. Accepts our own format and SQLite's
/// `CURRENT_TIMESTAMP` form (`YYYY-MM-DD HH:MM:SS`).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
