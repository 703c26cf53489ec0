//! Error types shared by the engine and the store seam.

use thiserror::Error;

/// A user action was rejected; the timer state is unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The task tag was empty or whitespace.
    #[error("tag cannot be empty")]
    EmptyTag,

    /// The planned duration was zero, negative, or not a number.
    #[error("planned duration must be greater than zero")]
    DurationNotPositive,

    /// The planned duration exceeded the 16 hour cap.
    #[error("planned duration of {minutes} minutes exceeds the 16 hour limit")]
    DurationTooLong { minutes: f64 },

    /// A paused run already has at least as much progress as the new plan.
    #[error(
        "planned duration of {planned_seconds}s must exceed the {elapsed_seconds}s already elapsed"
    )]
    PlanNotAboveElapsed {
        planned_seconds: u32,
        elapsed_seconds: u32,
    },

    /// The timer cannot be reconfigured while it is running.
    #[error("timer is running; pause or stop it first")]
    TimerRunning,
}

/// Errors crossing the key-value store seam.
///
/// The engine never propagates these: reads fall back to defaults and writes
/// are best-effort. They are returned by the store helpers so callers that do
/// care (the CLI theme command, tests) can see them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed to read a key.
    #[error("failed to read {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend failed to write a key.
    #[error("failed to write {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A stored blob could not be decoded.
    #[error("corrupt value for {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Wraps a backend read failure.
    pub fn read(key: &str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Read {
            key: key.to_string(),
            source: Box::new(source),
        }
    }

    /// Wraps a backend write failure.
    pub fn write(key: &str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Write {
            key: key.to_string(),
            source: Box::new(source),
        }
    }
}
