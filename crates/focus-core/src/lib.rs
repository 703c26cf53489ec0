//! Core domain logic for the focus timer.
//!
//! This crate contains the fundamental types and logic for:
//! - Timer: the start/pause/resume/stop/reset state machine, with elapsed time
//!   always derived from wall-clock timestamps
//! - Sessions: synthesis of immutable session records and the append-only history
//! - Stats: calendar-aligned aggregation of history into today/week/month/all buckets
//! - Store: the key-value persistence seam and the persisted schema

mod engine;
mod error;
pub mod format;
mod history;
mod session;
pub mod stats;
pub mod store;
mod timer;

pub use engine::{TimerEngine, TimerEvent, TimerObserver};
pub use error::{StoreError, ValidationError};
pub use history::{History, TagSuggestion};
pub use session::{SessionRecord, complete_session};
pub use stats::{Period, PeriodStats, PeriodTotals, StatsTable, compute_stats, compute_stats_in};
pub use store::{KeyValueStore, MemoryStore};
pub use timer::{CompletionKind, MAX_PLANNED_SECONDS, TimerState, TimerStatus};
