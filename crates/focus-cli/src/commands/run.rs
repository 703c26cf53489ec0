//! Foreground timer: drives ticks until completion or Ctrl-C.

use std::cell::RefCell;
use std::future::Future;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use focus_core::format::format_clock;
use focus_core::{KeyValueStore, SessionRecord, TimerEngine, TimerEvent, TimerStatus};
use tokio::time::MissedTickBehavior;

use super::util::{mode_label, plan_label, progress_bar, write_completion};

/// How a foreground run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The countdown reached its plan and was recorded.
    Completed(SessionRecord),
    /// Interrupted; the run is paused and can be resumed.
    Paused { elapsed_seconds: u32 },
}

/// Configures the timer if asked, then runs it until it completes or Ctrl-C.
pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    store: S,
    tag: Option<&str>,
    minutes: Option<f64>,
    interval: Duration,
) -> Result<RunOutcome> {
    let mut engine = TimerEngine::restore(store);
    prepare(writer, &mut engine, tag, minutes)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(drive(
        writer,
        &mut engine,
        interval,
        tokio::signal::ctrl_c(),
        Utc::now,
    ))
}

/// Applies `--tag`/`--minutes` to the restored state.
///
/// A paused run keeps its progress under a new tag, so the switch is announced.
pub fn prepare<W: Write, S: KeyValueStore>(
    writer: &mut W,
    engine: &mut TimerEngine<S>,
    tag: Option<&str>,
    minutes: Option<f64>,
) -> Result<()> {
    if tag.is_none() && minutes.is_none() {
        return Ok(());
    }

    let previous = engine.state().tag().to_string();
    let tag = tag.map_or_else(|| previous.clone(), str::to_string);
    engine.configure(&tag, minutes)?;

    let state = engine.state();
    if state.status() == TimerStatus::Paused && state.tag() != previous {
        writeln!(
            writer,
            "Пауза на {}: продолжаем как «{}» вместо «{previous}». `focus reset` начнёт заново.",
            format_clock(state.elapsed_seconds()),
            state.tag(),
        )?;
    }
    Ok(())
}

/// Starts the engine and ticks it every `interval` until a countdown
/// completes or `shutdown` resolves, in which case the run is paused.
///
/// `clock` supplies the wall-clock instant passed to every transition.
pub async fn drive<W, S, F, C>(
    writer: &mut W,
    engine: &mut TimerEngine<S>,
    interval: Duration,
    shutdown: F,
    clock: C,
) -> Result<RunOutcome>
where
    W: Write,
    S: KeyValueStore,
    F: Future<Output = io::Result<()>>,
    C: Fn() -> DateTime<Utc>,
{
    let events: Rc<RefCell<Vec<TimerEvent>>> = Rc::default();
    let sink = Rc::clone(&events);
    engine.subscribe(move |event: &TimerEvent| sink.borrow_mut().push(event.clone()));

    let resuming = engine.state().status() == TimerStatus::Paused;
    engine.start(clock())?;

    let planned_minutes = engine.state().planned_seconds().map(|s| f64::from(s) / 60.0);
    writeln!(
        writer,
        "{} {}: {} ({})",
        if resuming { "Продолжаем" } else { "Старт" },
        engine.state().tag(),
        plan_label(planned_minutes),
        mode_label(planned_minutes.is_some()),
    )?;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let completed = engine.tick(clock());
                render_events(writer, &events, engine.state().tag())?;
                if let Some(record) = completed {
                    return Ok(RunOutcome::Completed(record));
                }
            }
            signal = &mut shutdown => {
                signal.context("failed to listen for Ctrl-C")?;
                engine.pause(clock());
                writeln!(writer)?;
                render_events(writer, &events, engine.state().tag())?;

                if engine.state().status() == TimerStatus::Idle {
                    if let Some(record) = engine.history().newest_first().next() {
                        return Ok(RunOutcome::Completed(record.clone()));
                    }
                }
                let elapsed_seconds = engine.state().elapsed_seconds();
                writeln!(
                    writer,
                    "Пауза на {}. `focus run` продолжит, `focus stop` сохранит сессию.",
                    format_clock(elapsed_seconds)
                )?;
                return Ok(RunOutcome::Paused { elapsed_seconds });
            }
        }
    }
}

fn render_events<W: Write>(
    writer: &mut W,
    events: &RefCell<Vec<TimerEvent>>,
    tag: &str,
) -> Result<()> {
    let pending: Vec<TimerEvent> = events.borrow_mut().drain(..).collect();
    for event in pending {
        match event {
            TimerEvent::Tick {
                display_seconds,
                progress_percent,
            } => {
                write!(writer, "\r{} {tag}", format_clock(display_seconds))?;
                if progress_percent > 0.0 {
                    write!(
                        writer,
                        " {} {progress_percent:.0}%",
                        progress_bar(progress_percent, 100.0)
                    )?;
                }
                writer.flush()?;
            }
            TimerEvent::SessionCompleted {
                record,
                total_tag_seconds,
                ..
            } => {
                writeln!(writer)?;
                write_completion(writer, &record, total_tag_seconds)?;
            }
            TimerEvent::ValidationFailed(error) => {
                tracing::debug!(%error, "validation failed during run");
            }
        }
    }
    Ok(())
}
