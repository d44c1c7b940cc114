//! Wall-clock helpers.
//!
//! The engine only ever sees epoch milliseconds handed in by its caller;
//! these helpers turn them into display labels. [`now_ms`] is the one place
//! that reads the system clock.

use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn local(timestamp_ms: u64) -> DateTime<Local> {
    match Local.timestamp_millis_opt(timestamp_ms as i64).single() {
        Some(t) => t,
        None => utc(timestamp_ms).with_timezone(&Local),
    }
}

fn utc(timestamp_ms: u64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(timestamp_ms as i64)
        .single()
        .unwrap_or_default()
}

/// `HH:MM:SS` in local time, used for log entries.
pub fn wall_clock_label(timestamp_ms: u64) -> String {
    local(timestamp_ms).format("%H:%M:%S").to_string()
}

/// `MM:SS` in local time, used for history samples.
pub fn chart_label(timestamp_ms: u64) -> String {
    local(timestamp_ms).format("%M:%S").to_string()
}

/// RFC 3339 UTC with milliseconds, used for export documents.
pub fn iso_timestamp(timestamp_ms: u64) -> String {
    utc(timestamp_ms).to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_timestamp() {
        assert_eq!(iso_timestamp(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_timestamp(1_706_745_600_123), "2024-02-01T00:00:00.123Z");
    }

    #[test]
    fn test_label_shapes() {
        let label = wall_clock_label(1_706_745_600_000);
        assert_eq!(label.len(), 8);
        assert_eq!(label.matches(':').count(), 2);

        let chart = chart_label(1_706_745_600_000);
        assert_eq!(chart.len(), 5);
        assert!(label.ends_with(&chart));
    }

    #[test]
    fn test_now_is_after_2024() {
        assert!(now_ms() > 1_704_067_200_000);
    }
}
