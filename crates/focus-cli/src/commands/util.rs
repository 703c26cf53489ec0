//! Shared utilities for CLI commands.

use std::io::Write;

use anyhow::{Context, Result};
use focus_core::SessionRecord;
use focus_core::format::format_session_duration;
use focus_db::Database;

use crate::Config;

/// Opens the configured database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("failed to create database directory {}", parent.display())
        })?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = (value / max).clamp(0.0, 1.0);
    let filled = if ratio < 0.05 && value > 0.0 {
        1
    } else {
        (ratio * 10.0).round() as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// Describes a planned duration, or the open-ended mode.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn plan_label(planned_minutes: Option<f64>) -> String {
    planned_minutes.map_or_else(
        || "без лимита".to_string(),
        |minutes| format_session_duration((minutes * 60.0).round() as u64),
    )
}

/// Mode line shared by status and run.
pub const fn mode_label(countdown: bool) -> &'static str {
    if countdown {
        "Обратный отсчёт"
    } else {
        "Накопление времени"
    }
}

/// Writes the session summary shown when a run ends.
pub fn write_completion<W: Write>(
    writer: &mut W,
    record: &SessionRecord,
    total_tag_seconds: u64,
) -> Result<()> {
    writeln!(writer, "Сессия завершена!")?;
    writeln!(writer, "Задача: {}", record.tag)?;
    writeln!(
        writer,
        "Время сессии: {}",
        format_session_duration(u64::from(record.elapsed_seconds))
    )?;
    writeln!(
        writer,
        "Общее время на задачу: {}",
        format_session_duration(total_tag_seconds)
    )?;
    Ok(())
}
