//! Human-readable durations.

/// Formats aggregated minutes for the stats view.
///
/// `"<m> мин"` under an hour, `"<h> ч <m> мин"` otherwise.
pub fn format_minutes(minutes: u32) -> String {
    if minutes == 0 {
        return "0 мин".to_string();
    }
    let hours = minutes / 60;
    let rem = minutes % 60;
    if hours > 0 {
        format!("{hours} ч {rem} мин")
    } else {
        format!("{minutes} мин")
    }
}

/// Formats a session length for the completion summary.
///
/// Seconds are shown only under a minute; zero hour or minute parts are dropped.
pub fn format_session_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds} сек");
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let mut parts = Vec::with_capacity(2);
    if hours > 0 {
        parts.push(format!("{hours} ч"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes} мин"));
    }
    parts.join(" ")
}

/// Formats a clock face as `MM:SS`. Minutes are not wrapped at the hour.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
