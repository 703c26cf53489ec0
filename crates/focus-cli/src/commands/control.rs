//! Commands that change the timer without running it: configure, stop, reset.

use std::io::Write;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use focus_core::{KeyValueStore, SessionRecord, TimerEngine};

use super::util::{plan_label, write_completion};

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigureSource {
    /// Explicit tag and optional planned minutes.
    Explicit {
        tag: String,
        minutes: Option<f64>,
    },
    /// The latest session recorded for a tag.
    FromHistory(String),
}

pub fn configure<W: Write, S: KeyValueStore>(
    writer: &mut W,
    store: S,
    source: ConfigureSource,
) -> Result<()> {
    let mut engine = TimerEngine::restore(store);

    let (tag, minutes) = match source {
        ConfigureSource::Explicit { tag, minutes } => (tag, minutes),
        ConfigureSource::FromHistory(tag) => {
            let Some(suggestion) = engine.history().suggestion_for(tag.trim()) else {
                bail!("no sessions recorded for {tag}");
            };
            (suggestion.tag, suggestion.planned_minutes)
        }
    };

    engine.configure(&tag, minutes)?;
    let planned_minutes = engine.state().planned_seconds().map(|s| f64::from(s) / 60.0);
    writeln!(
        writer,
        "Задача: {} ({})",
        engine.state().tag(),
        plan_label(planned_minutes)
    )?;
    Ok(())
}

/// Records the current run, if any time elapsed, and returns to idle.
pub fn stop<W: Write, S: KeyValueStore>(
    writer: &mut W,
    store: S,
    now: DateTime<Utc>,
) -> Result<Option<SessionRecord>> {
    let mut engine = TimerEngine::restore(store);
    let record = engine.stop(now);

    match &record {
        Some(record) => {
            let total = engine.history().total_seconds_for_tag(&record.tag);
            write_completion(writer, record, total)?;
        }
        None => writeln!(writer, "Нет активной сессии.")?,
    }
    Ok(record)
}

/// Discards progress without recording a session.
pub fn reset<W: Write, S: KeyValueStore>(writer: &mut W, store: S) -> Result<()> {
    let mut engine = TimerEngine::restore(store);
    engine.reset();
    writeln!(writer, "Таймер сброшен.")?;
    Ok(())
}
