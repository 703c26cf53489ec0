//! Status command for showing the timer.

use std::io::Write;

use anyhow::Result;
use focus_core::format::format_clock;
use focus_core::{KeyValueStore, TimerEngine, TimerStatus};
use serde::Serialize;

use super::util::{mode_label, progress_bar};

#[derive(Debug, Serialize)]
struct StatusJson<'a> {
    tag: &'a str,
    status: TimerStatus,
    planned_seconds: Option<u32>,
    elapsed_seconds: u32,
    display_seconds: u32,
    progress_percent: f64,
    mode: &'static str,
    sessions: usize,
}

const fn status_label(status: TimerStatus) -> &'static str {
    match status {
        TimerStatus::Idle => "ожидание",
        TimerStatus::Running => "идёт",
        TimerStatus::Paused => "пауза",
    }
}

pub fn run<W: Write, S: KeyValueStore>(writer: &mut W, store: S, json: bool) -> Result<()> {
    let engine = TimerEngine::restore(store);
    let state = engine.state();
    let countdown = state.planned_seconds().is_some();

    if json {
        let status = StatusJson {
            tag: state.tag(),
            status: state.status(),
            planned_seconds: state.planned_seconds(),
            elapsed_seconds: state.elapsed_seconds(),
            display_seconds: state.display_seconds(),
            progress_percent: state.progress_percent(),
            mode: if countdown { "countdown" } else { "open_ended" },
            sessions: engine.history().len(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&status)?)?;
        return Ok(());
    }

    if state.tag().is_empty() {
        writeln!(writer, "Задача: не выбрана")?;
    } else {
        writeln!(writer, "Задача: {}", state.tag())?;
    }
    writeln!(writer, "Состояние: {}", status_label(state.status()))?;

    if countdown {
        writeln!(writer, "Осталось: {}", format_clock(state.display_seconds()))?;
        writeln!(
            writer,
            "Прогресс: {} {:.0}%",
            progress_bar(state.progress_percent(), 100.0),
            state.progress_percent()
        )?;
    } else {
        writeln!(writer, "Прошло: {}", format_clock(state.display_seconds()))?;
    }

    writeln!(
        writer,
        "Режим: {} | Сессий в истории: {}",
        mode_label(countdown),
        engine.history().len()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone, Utc};
    use focus_db::Database;
    use insta::assert_snapshot;

    fn render(db: &mut Database, json: bool) -> String {
        let mut output = Vec::new();
        run(&mut output, db, json).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn status_of_fresh_timer() {
        let mut db = Database::open_in_memory().unwrap();

        assert_snapshot!(render(&mut db, false), @r"
        Задача: не выбрана
        Состояние: ожидание
        Прошло: 00:00
        Режим: Накопление времени | Сессий в истории: 0
        ");
    }

    #[test]
    fn status_of_paused_countdown() {
        let temp = tempfile::tempdir().unwrap();
        let mut db = Database::open(&temp.path().join("focus.db")).unwrap();
        let t0 = Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).unwrap();

        {
            let mut engine = TimerEngine::new(&mut db);
            engine.configure("Writing", Some(25.0)).unwrap();
            engine.start(t0).unwrap();
            engine.pause(t0 + Duration::seconds(600));
        }

        assert_snapshot!(render(&mut db, false), @r"
        Задача: Writing
        Состояние: пауза
        Осталось: 15:00
        Прогресс: ████░░░░░░ 40%
        Режим: Обратный отсчёт | Сессий в истории: 0
        ");
    }

    #[test]
    fn status_json() {
        let mut db = Database::open_in_memory().unwrap();
        let t0 = Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).unwrap();

        {
            let mut engine = TimerEngine::new(&mut db);
            engine.configure("Reading", None).unwrap();
            engine.start(t0).unwrap();
            engine.stop(t0 + Duration::seconds(90));
        }

        assert_snapshot!(render(&mut db, true), @r#"
        {
          "tag": "Reading",
          "status": "idle",
          "planned_seconds": null,
          "elapsed_seconds": 0,
          "display_seconds": 0,
          "progress_percent": 0.0,
          "mode": "open_ended",
          "sessions": 1
        }
        "#);
    }
}
