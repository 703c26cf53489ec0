//! Tags command: tags used so far with the duration a new run would reuse.

use std::io::Write;

use anyhow::Result;
use focus_core::{KeyValueStore, TimerEngine};

use super::util::plan_label;

pub fn run<W: Write, S: KeyValueStore>(writer: &mut W, store: S) -> Result<()> {
    let engine = TimerEngine::restore(store);
    let history = engine.history();
    let tags = history.known_tags();

    if tags.is_empty() {
        writeln!(writer, "Тегов пока нет.")?;
        return Ok(());
    }

    let width = tags.iter().map(|t| t.chars().count()).max().unwrap_or(0);
    for tag in tags {
        let planned = history
            .suggestion_for(tag)
            .and_then(|suggestion| suggestion.planned_minutes);
        writeln!(writer, "{tag:<width$}  {}", plan_label(planned))?;
    }
    Ok(())
}
