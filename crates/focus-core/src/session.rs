//! Completed focus sessions.

use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One completed (or manually stopped) interval of focused time.
///
/// Records are created only by [`complete_session`] and never mutated after
/// they are appended to the [`History`](crate::History).
///
/// `elapsed_seconds` is authoritative for accounting. `end_time - start_time`
/// can be larger because it may span paused gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Creation timestamp in epoch milliseconds, kept strictly increasing by the history.
    pub id: i64,
    pub tag: String,
    /// Planned duration in minutes; `None` for open-ended sessions.
    #[serde(default, alias = "duration")]
    pub planned_minutes: Option<f64>,
    #[serde(with = "ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub end_time: DateTime<Utc>,
    #[serde(alias = "elapsed")]
    pub elapsed_seconds: u32,
}

/// Builds the record for a finished run.
///
/// `end_time` is `now`. `start_time` is the run's start timestamp when known,
/// otherwise it is back-dated from `now` by the elapsed seconds (a run stopped
/// while paused has no live start timestamp).
pub fn complete_session(
    tag: &str,
    planned_seconds: Option<u32>,
    elapsed_seconds: u32,
    start_timestamp: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SessionRecord {
    let start_time =
        start_timestamp.unwrap_or_else(|| now - Duration::seconds(i64::from(elapsed_seconds)));

    SessionRecord {
        id: now.timestamp_millis(),
        tag: tag.to_string(),
        planned_minutes: planned_seconds.map(|secs| f64::from(secs) / 60.0),
        start_time,
        end_time: now,
        elapsed_seconds,
    }
}
