//! Timer state machine.
//!
//! # Time Derivation
//!
//! Elapsed time is never accumulated per tick. While running, the timer keeps
//! a `start_timestamp` that corresponds to `elapsed_seconds == 0` for the
//! current run, and every tick recomputes `elapsed = now - start_timestamp`.
//! Missed or throttled ticks therefore self-correct on the next one.
//!
//! Resuming shifts the anchor back by the already elapsed seconds
//! (`start_timestamp = now - elapsed`), so paused gaps never count.
//!
//! # States
//!
//! - `Idle`: no run in progress
//! - `Running`: anchored and ticking
//! - `Paused`: run suspended with `elapsed_seconds` frozen, resumable
//!
//! Paused countdowns never complete on their own; only an active tick can
//! finish a run.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ValidationError;
use crate::store::PersistedTimerState;

/// Upper bound for a planned countdown (16 hours).
pub const MAX_PLANNED_SECONDS: u32 = 16 * 3600;

/// Lifecycle state of the timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

impl TimerStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }
}

impl std::fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    /// A countdown reached its planned duration while ticking.
    Natural,
    /// The user stopped the run early.
    Manual,
}

/// Everything needed to synthesize a session record for a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FinishedRun {
    pub tag: String,
    pub planned_seconds: Option<u32>,
    pub elapsed_seconds: u32,
    pub start_timestamp: Option<DateTime<Utc>>,
    pub kind: CompletionKind,
}

/// The single active timer.
///
/// Fields are only changed through the transition methods, each of which
/// leaves the invariant `status == Running ⇒ start_timestamp.is_some()` intact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerState {
    tag: String,
    planned_seconds: Option<u32>,
    elapsed_seconds: u32,
    status: TimerStatus,
    start_timestamp: Option<DateTime<Utc>>,
}

/// Converts a planned duration in minutes to whole seconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn planned_seconds_from_minutes(minutes: f64) -> Result<u32, ValidationError> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(ValidationError::DurationNotPositive);
    }
    let seconds = (minutes * 60.0).round();
    if seconds > f64::from(MAX_PLANNED_SECONDS) {
        return Err(ValidationError::DurationTooLong { minutes });
    }
    if seconds < 1.0 {
        return Err(ValidationError::DurationNotPositive);
    }
    Ok(seconds as u32)
}

/// Whole seconds from `start` to `now`, clamped at zero if the clock went backwards.
fn seconds_between(start: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let secs = (now - start).num_seconds().max(0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub const fn planned_seconds(&self) -> Option<u32> {
        self.planned_seconds
    }

    pub const fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub const fn status(&self) -> TimerStatus {
        self.status
    }

    pub const fn start_timestamp(&self) -> Option<DateTime<Utc>> {
        self.start_timestamp
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Seconds to show: remaining for a countdown, elapsed otherwise.
    pub fn display_seconds(&self) -> u32 {
        self.planned_seconds
            .map_or(self.elapsed_seconds, |planned| {
                planned.saturating_sub(self.elapsed_seconds)
            })
    }

    /// Countdown progress in percent; 0 for open-ended runs.
    pub fn progress_percent(&self) -> f64 {
        match self.planned_seconds {
            Some(planned) if planned > 0 => {
                f64::from(self.elapsed_seconds) / f64::from(planned) * 100.0
            }
            _ => 0.0,
        }
    }

    /// Sets the tag and planned duration.
    ///
    /// Rejected while running. Elapsed progress and status are left alone so
    /// a paused run can be relabelled; its new plan must exceed that progress.
    pub fn configure(
        &mut self,
        tag: &str,
        planned_minutes: Option<f64>,
    ) -> Result<(), ValidationError> {
        if self.is_running() {
            return Err(ValidationError::TimerRunning);
        }
        let planned_seconds = planned_minutes
            .map(planned_seconds_from_minutes)
            .transpose()?;
        if let Some(planned) = planned_seconds
            .filter(|&p| self.status == TimerStatus::Paused && p <= self.elapsed_seconds)
        {
            return Err(ValidationError::PlanNotAboveElapsed {
                planned_seconds: planned,
                elapsed_seconds: self.elapsed_seconds,
            });
        }

        self.tag = tag.trim().to_string();
        self.planned_seconds = planned_seconds;
        Ok(())
    }

    /// Starts a fresh run from `Idle`, or resumes a `Paused` one.
    ///
    /// Already running is a no-op.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.is_running() {
            return Ok(());
        }
        if self.tag.trim().is_empty() {
            return Err(ValidationError::EmptyTag);
        }
        if self.status == TimerStatus::Idle {
            self.elapsed_seconds = 0;
        }
        self.start_timestamp = Some(now - Duration::seconds(i64::from(self.elapsed_seconds)));
        self.status = TimerStatus::Running;
        Ok(())
    }

    /// Recomputes elapsed time from the anchor. Returns the finished run when
    /// a countdown reaches its plan.
    ///
    /// Not running, or running without an anchor, is a no-op.
    pub(crate) fn tick(&mut self, now: DateTime<Utc>) -> Option<FinishedRun> {
        if !self.is_running() {
            return None;
        }
        let Some(start) = self.start_timestamp else {
            tracing::warn!("tick while running without a start timestamp");
            return None;
        };

        self.elapsed_seconds = seconds_between(start, now);
        match self.planned_seconds {
            Some(planned) if self.elapsed_seconds >= planned => {
                self.elapsed_seconds = planned;
                self.status = TimerStatus::Idle;
                self.start_timestamp = None;
                Some(FinishedRun {
                    tag: self.tag.clone(),
                    planned_seconds: Some(planned),
                    elapsed_seconds: planned,
                    start_timestamp: Some(start),
                    kind: CompletionKind::Natural,
                })
            }
            _ => None,
        }
    }

    /// Suspends a running timer, freezing elapsed time as of `now`.
    ///
    /// If the countdown already reached its plan the run completes instead.
    pub(crate) fn pause(&mut self, now: DateTime<Utc>) -> Option<FinishedRun> {
        if !self.is_running() {
            return None;
        }
        if let Some(finished) = self.tick(now) {
            return Some(finished);
        }
        self.status = TimerStatus::Paused;
        self.start_timestamp = None;
        None
    }

    /// Ends the current run early and returns to `Idle` with the plan cleared.
    ///
    /// Returns the run to record, or `None` when nothing elapsed.
    pub(crate) fn stop(&mut self, now: DateTime<Utc>) -> Option<FinishedRun> {
        if self.status == TimerStatus::Idle {
            return None;
        }
        if let Some(finished) = self.tick(now) {
            return Some(finished);
        }

        let run = FinishedRun {
            tag: self.tag.clone(),
            planned_seconds: self.planned_seconds,
            elapsed_seconds: self.elapsed_seconds,
            start_timestamp: self.start_timestamp,
            kind: CompletionKind::Manual,
        };

        self.status = TimerStatus::Idle;
        self.planned_seconds = None;
        self.elapsed_seconds = 0;
        self.start_timestamp = None;

        (run.elapsed_seconds > 0).then_some(run)
    }

    /// Discards progress without recording anything. The plan is kept so the
    /// display shows the full duration again.
    pub fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.elapsed_seconds = 0;
        self.start_timestamp = None;
    }

    /// Rebuilds the timer from a persisted snapshot.
    ///
    /// A snapshot is never resumed as running: the time the process was gone
    /// is unknown. A run with progress comes back `Paused` and needs an
    /// explicit start. A countdown that had already reached its plan comes
    /// back `Idle`.
    pub fn recover(saved: PersistedTimerState) -> Self {
        let planned_seconds = saved.resolved_planned_seconds();
        let elapsed_seconds = saved.elapsed_seconds;
        let completed = planned_seconds.is_some_and(|planned| elapsed_seconds >= planned);

        let status = match saved.status {
            _ if elapsed_seconds == 0 || completed => TimerStatus::Idle,
            Some(TimerStatus::Idle) if !saved.running => TimerStatus::Idle,
            _ => TimerStatus::Paused,
        };

        Self {
            tag: saved.tag.trim().to_string(),
            planned_seconds,
            elapsed_seconds: planned_seconds.map_or(elapsed_seconds, |p| elapsed_seconds.min(p)),
            status,
            start_timestamp: None,
        }
    }

    /// Snapshot for persistence.
    pub fn to_persisted(&self) -> PersistedTimerState {
        PersistedTimerState {
            tag: self.tag.clone(),
            planned_seconds: self.planned_seconds,
            elapsed_seconds: self.elapsed_seconds,
            start_timestamp: self.start_timestamp,
            running: self.is_running(),
            status: Some(self.status),
            ..PersistedTimerState::default()
        }
    }
}
