//! History command: recorded sessions, most recent first.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use chrono::{Local, TimeZone};
use focus_core::format::format_session_duration;
use focus_core::{History, KeyValueStore, SessionRecord, TimerEngine};

use super::util::plan_label;

pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    store: S,
    json: bool,
    limit: Option<usize>,
) -> Result<()> {
    let engine = TimerEngine::restore(store);
    let records = newest(engine.history(), limit);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&records)?)?;
        return Ok(());
    }
    write_history(writer, &records, &Local)
}

fn newest(history: &History, limit: Option<usize>) -> Vec<&SessionRecord> {
    history
        .newest_first()
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Writes one line per session with times shown in `tz`.
pub fn write_history<W: Write, Tz: TimeZone>(
    writer: &mut W,
    records: &[&SessionRecord],
    tz: &Tz,
) -> Result<()>
where
    Tz::Offset: Display,
{
    if records.is_empty() {
        writeln!(writer, "История пуста.")?;
        return Ok(());
    }

    let width = records
        .iter()
        .map(|r| r.tag.chars().count())
        .max()
        .unwrap_or(0);

    for record in records {
        let start = record.start_time.with_timezone(tz);
        let end = record.end_time.with_timezone(tz);
        writeln!(
            writer,
            "{} - {}  {:<width$}  {:<12}  план: {}",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%H:%M"),
            record.tag,
            format_session_duration(u64::from(record.elapsed_seconds)),
            plan_label(record.planned_minutes),
        )?;
    }
    Ok(())
}
