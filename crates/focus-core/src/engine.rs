//! The timer engine: state machine, session accounting and persistence.
//!
//! [`TimerEngine`] is the single owner of the timer and the history. Whatever
//! drives the periodic tick and whatever renders the timer hold a reference
//! to one engine; there is no global instance.
//!
//! Every mutation is persisted immediately through the [`KeyValueStore`].
//! Persistence is best-effort: failures are logged and the in-memory state
//! stays authoritative, so a lost write never interrupts a running session.

use chrono::{DateTime, Utc};

use crate::store::{self, HISTORY_KEY, KeyValueStore, TIMER_STATE_KEY};
use crate::timer::FinishedRun;
use crate::{
    CompletionKind, History, PeriodStats, SessionRecord, TimerState, ValidationError,
    complete_session, compute_stats,
};

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    /// Emitted on every tick while running.
    Tick {
        display_seconds: u32,
        progress_percent: f64,
    },
    /// A session was appended to the history.
    SessionCompleted {
        record: SessionRecord,
        /// Seconds spent on the tag across all history, including this session.
        total_tag_seconds: u64,
        kind: CompletionKind,
    },
    /// A user action was rejected.
    ValidationFailed(ValidationError),
}

/// Receives [`TimerEvent`]s.
pub trait TimerObserver {
    fn notify(&mut self, event: &TimerEvent);
}

impl<F: FnMut(&TimerEvent)> TimerObserver for F {
    fn notify(&mut self, event: &TimerEvent) {
        self(event);
    }
}

/// Owns the active timer and the session history.
pub struct TimerEngine<S> {
    state: TimerState,
    history: History,
    store: S,
    observers: Vec<Box<dyn TimerObserver>>,
}

impl<S: KeyValueStore> TimerEngine<S> {
    /// Creates an engine with default state, ignoring anything stored.
    pub fn new(store: S) -> Self {
        Self {
            state: TimerState::new(),
            history: History::new(),
            store,
            observers: Vec::new(),
        }
    }

    /// Creates an engine from the stored timer snapshot and history.
    ///
    /// Missing or corrupt blobs fall back to defaults. A snapshot that was
    /// running comes back paused.
    pub fn restore(store: S) -> Self {
        let state = match store::load_json(&store, TIMER_STATE_KEY) {
            Ok(Some(saved)) => TimerState::recover(saved),
            Ok(None) => TimerState::new(),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable timer state");
                TimerState::new()
            }
        };
        let history = match store::load_json(&store, HISTORY_KEY) {
            Ok(Some(history)) => history,
            Ok(None) => History::new(),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable history");
                History::new()
            }
        };

        tracing::debug!(
            status = %state.status(),
            elapsed = state.elapsed_seconds(),
            sessions = history.len(),
            "restored timer"
        );

        Self {
            state,
            history,
            store,
            observers: Vec::new(),
        }
    }

    /// Registers an observer for timer events.
    pub fn subscribe(&mut self, observer: impl TimerObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub const fn state(&self) -> &TimerState {
        &self.state
    }

    pub const fn history(&self) -> &History {
        &self.history
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Aggregates the history as of `now`.
    pub fn stats(&self, now: DateTime<Utc>) -> PeriodStats {
        compute_stats(self.history.records(), now)
    }

    /// Sets the tag and planned minutes. Rejected while running.
    pub fn configure(
        &mut self,
        tag: &str,
        planned_minutes: Option<f64>,
    ) -> Result<(), ValidationError> {
        let result = self.state.configure(tag, planned_minutes);
        self.after_action(result, "configure")
    }

    /// Starts a fresh run or resumes a paused one.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let result = self.state.start(now);
        self.after_action(result, "start")
    }

    /// Pauses a running timer. No-op otherwise.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if !self.state.is_running() {
            return;
        }
        let finished = self.state.pause(now);
        tracing::debug!(elapsed = self.state.elapsed_seconds(), "timer paused");
        self.persist_state();
        if let Some(run) = finished {
            self.record(run, now);
        }
    }

    /// Advances a running timer to `now`.
    ///
    /// Returns the session recorded when a countdown completes.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<SessionRecord> {
        if !self.state.is_running() {
            return None;
        }
        let finished = self.state.tick(now);
        self.persist_state();
        self.emit(&TimerEvent::Tick {
            display_seconds: self.state.display_seconds(),
            progress_percent: self.state.progress_percent(),
        });

        let run = finished?;
        tracing::debug!(tag = %run.tag, elapsed = run.elapsed_seconds, "countdown completed");
        self.record(run, now)
    }

    /// Stops the current run, recording it if any time elapsed.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<SessionRecord> {
        let finished = self.state.stop(now);
        tracing::debug!(recorded = finished.is_some(), "timer stopped");
        self.persist_state();
        self.record(finished?, now)
    }

    /// Discards progress without recording a session.
    pub fn reset(&mut self) {
        self.state.reset();
        tracing::debug!("timer reset");
        self.persist_state();
    }

    fn after_action(
        &mut self,
        result: Result<(), ValidationError>,
        action: &'static str,
    ) -> Result<(), ValidationError> {
        match &result {
            Ok(()) => {
                tracing::debug!(action, status = %self.state.status(), tag = self.state.tag(), "timer updated");
                self.persist_state();
            }
            Err(e) => {
                tracing::debug!(action, error = %e, "timer action rejected");
                self.emit(&TimerEvent::ValidationFailed(e.clone()));
            }
        }
        result
    }

    /// Synthesizes and appends the session for a finished run.
    fn record(&mut self, run: FinishedRun, now: DateTime<Utc>) -> Option<SessionRecord> {
        let record = complete_session(
            &run.tag,
            run.planned_seconds,
            run.elapsed_seconds,
            run.start_timestamp,
            now,
        );
        let record = self.history.append(record)?.clone();
        self.persist_history();

        let total_tag_seconds = self.history.total_seconds_for_tag(&record.tag);
        tracing::info!(
            tag = %record.tag,
            elapsed = record.elapsed_seconds,
            kind = ?run.kind,
            "session recorded"
        );
        self.emit(&TimerEvent::SessionCompleted {
            record: record.clone(),
            total_tag_seconds,
            kind: run.kind,
        });
        Some(record)
    }

    fn persist_state(&mut self) {
        let snapshot = self.state.to_persisted();
        if let Err(e) = store::save_json(&mut self.store, TIMER_STATE_KEY, &snapshot) {
            tracing::warn!(error = %e, "failed to persist timer state");
        }
    }

    fn persist_history(&mut self) {
        if let Err(e) = store::save_json(&mut self.store, HISTORY_KEY, &self.history) {
            tracing::warn!(error = %e, "failed to persist history");
        }
    }

    fn emit(&mut self, event: &TimerEvent) {
        for observer in &mut self.observers {
            observer.notify(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    use chrono::{Duration, TimeZone};

    use crate::stats::compute_stats_in;
    use crate::{MemoryStore, StoreError, TimerStatus};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 9, 0, 0).unwrap()
    }

    fn after(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    fn recording_engine() -> (TimerEngine<MemoryStore>, Rc<RefCell<Vec<TimerEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut engine = TimerEngine::new(MemoryStore::new());
        engine.subscribe(move |event: &TimerEvent| sink.borrow_mut().push(event.clone()));
        (engine, events)
    }

    fn completions(events: &[TimerEvent]) -> Vec<&SessionRecord> {
        events
            .iter()
            .filter_map(|e| match e {
                TimerEvent::SessionCompleted { record, .. } => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Store whose writes always fail.
    #[derive(Default)]
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(None)
        }

        fn save(&mut self, key: &str, _value: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::write(key, std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn writing_session_end_to_end() {
        let (mut engine, events) = recording_engine();
        engine.configure("Writing", Some(25.0)).unwrap();
        engine.start(t0()).unwrap();

        for secs in (1..=1500).step_by(7) {
            assert!(engine.tick(after(secs)).is_none());
        }
        let record = engine.tick(after(1500)).unwrap();

        assert_eq!(record.tag, "Writing");
        assert_eq!(record.planned_minutes, Some(25.0));
        assert_eq!(record.elapsed_seconds, 1500);
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.state().status(), TimerStatus::Idle);

        let events = events.borrow();
        assert_eq!(completions(&events).len(), 1);

        let stats = compute_stats_in(engine.history().records(), &after(1600));
        assert_eq!(stats.today.per_tag_minutes.get("Writing"), Some(&25));
        assert_eq!(stats.today.total_minutes, 25);
    }

    #[test]
    fn completion_event_carries_tag_total() {
        let (mut engine, events) = recording_engine();
        engine.configure("Writing", None).unwrap();
        engine.start(t0()).unwrap();
        engine.stop(after(600));

        engine.configure("Writing", Some(1.0)).unwrap();
        engine.start(after(700)).unwrap();
        engine.tick(after(760));

        let events = events.borrow();
        let totals: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                TimerEvent::SessionCompleted {
                    total_tag_seconds,
                    kind,
                    ..
                } => Some((*total_tag_seconds, *kind)),
                _ => None,
            })
            .collect();
        assert_eq!(
            totals,
            vec![(600, CompletionKind::Manual), (660, CompletionKind::Natural)]
        );
    }

    #[test]
    fn tick_events_report_display_and_progress() {
        let (mut engine, events) = recording_engine();
        engine.configure("Writing", Some(10.0)).unwrap();
        engine.start(t0()).unwrap();
        engine.tick(after(150));

        assert_eq!(
            events.borrow().last(),
            Some(&TimerEvent::Tick {
                display_seconds: 450,
                progress_percent: 25.0,
            })
        );
    }

    #[test]
    fn start_with_empty_tag_is_rejected_and_reported() {
        let (mut engine, events) = recording_engine();
        let before = engine.state().clone();

        assert_eq!(engine.start(t0()), Err(ValidationError::EmptyTag));
        assert_eq!(engine.state(), &before);
        assert_eq!(engine.state().status(), TimerStatus::Idle);
        assert_eq!(
            events.borrow().as_slice(),
            &[TimerEvent::ValidationFailed(ValidationError::EmptyTag)]
        );
    }

    #[test]
    fn stop_and_reset_without_progress_record_nothing() {
        let (mut engine, events) = recording_engine();
        engine.configure("Writing", Some(25.0)).unwrap();

        assert!(engine.stop(t0()).is_none());
        engine.start(t0()).unwrap();
        engine.reset();
        assert!(engine.stop(after(30)).is_none());

        assert!(engine.history().is_empty());
        assert!(completions(&events.borrow()).is_empty());
        assert!(engine.store().get(HISTORY_KEY).is_none());
    }

    #[test]
    fn ticks_are_ignored_when_not_running() {
        let (mut engine, events) = recording_engine();
        engine.configure("Writing", Some(1.0)).unwrap();
        engine.start(t0()).unwrap();
        engine.pause(after(20));

        assert!(engine.tick(after(500)).is_none());
        assert_eq!(engine.state().elapsed_seconds(), 20);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn every_mutation_is_persisted() {
        let mut engine = TimerEngine::new(MemoryStore::new());
        engine.configure("Writing", Some(25.0)).unwrap();
        engine.start(t0()).unwrap();
        engine.tick(after(42));

        let saved: store::PersistedTimerState =
            store::load_json(engine.store(), TIMER_STATE_KEY).unwrap().unwrap();
        assert_eq!(saved.elapsed_seconds, 42);
        assert!(saved.running);
        assert_eq!(saved.start_timestamp, Some(t0()));
    }

    #[test]
    fn restart_while_running_recovers_paused() {
        let mut engine = TimerEngine::new(MemoryStore::new());
        engine.configure("Writing", Some(25.0)).unwrap();
        engine.start(t0()).unwrap();
        engine.tick(after(300));
        let store = engine.into_store();

        // Process was gone for an hour.
        let mut engine = TimerEngine::restore(store);
        assert_eq!(engine.state().status(), TimerStatus::Paused);
        assert_eq!(engine.state().elapsed_seconds(), 300);

        engine.start(after(3900)).unwrap();
        engine.tick(after(3901));
        assert_eq!(engine.state().elapsed_seconds(), 301);
    }

    #[test]
    fn shrinking_a_paused_plan_below_progress_is_rejected() {
        let (mut engine, events) = recording_engine();
        engine.configure("Writing", Some(25.0)).unwrap();
        engine.start(t0()).unwrap();
        engine.pause(after(200));

        let rejected = ValidationError::PlanNotAboveElapsed {
            planned_seconds: 60,
            elapsed_seconds: 200,
        };
        assert_eq!(engine.configure("Writing", Some(1.0)), Err(rejected.clone()));
        assert_eq!(
            events.borrow().as_slice(),
            &[TimerEvent::ValidationFailed(rejected)]
        );

        let mut engine = TimerEngine::restore(engine.into_store());
        assert_eq!(engine.state().status(), TimerStatus::Paused);
        assert_eq!(engine.state().elapsed_seconds(), 200);
        assert_eq!(engine.state().planned_seconds(), Some(1500));

        let record = engine.stop(after(300)).unwrap();
        assert_eq!(record.elapsed_seconds, 200);
    }

    #[test]
    fn restore_keeps_history_and_appends() {
        let mut engine = TimerEngine::new(MemoryStore::new());
        engine.configure("Reading", None).unwrap();
        engine.start(t0()).unwrap();
        engine.stop(after(120));

        let mut engine = TimerEngine::restore(engine.into_store());
        assert_eq!(engine.history().len(), 1);

        engine.start(after(200)).unwrap();
        engine.stop(after(260));
        assert_eq!(engine.history().len(), 2);
        assert!(engine.history().records()[1].id > engine.history().records()[0].id);
    }

    #[test]
    fn restore_falls_back_on_corrupt_blobs() {
        let mut store = MemoryStore::new();
        store.insert(TIMER_STATE_KEY, "garbage");
        store.insert(HISTORY_KEY, "[{\"id\":");

        let engine = TimerEngine::restore(store);
        assert_eq!(engine.state(), &TimerState::new());
        assert!(engine.history().is_empty());
    }

    #[test]
    fn write_failures_do_not_interrupt_the_session() {
        let mut engine = TimerEngine::new(BrokenStore);
        engine.configure("Writing", Some(1.0)).unwrap();
        engine.start(t0()).unwrap();
        engine.tick(after(30));
        assert_eq!(engine.state().elapsed_seconds(), 30);

        let record = engine.tick(after(60)).unwrap();
        assert_eq!(record.elapsed_seconds, 60);
        assert_eq!(engine.history().len(), 1);
    }

    #[test]
    fn paused_stop_backdates_start_time() {
        let mut engine = TimerEngine::new(MemoryStore::new());
        engine.configure("Reading", None).unwrap();
        engine.start(t0()).unwrap();
        engine.pause(after(90));

        let record = engine.stop(after(1000)).unwrap();
        assert_eq!(record.end_time, after(1000));
        assert_eq!(record.start_time, after(910));
        assert_eq!(record.elapsed_seconds, 90);
    }
}
