//! Key-value persistence seam and the persisted schema.
//!
//! The engine persists three independent blobs, each a JSON document:
//!
//! | key          | value                                   |
//! |--------------|-----------------------------------------|
//! | `timerState` | [`PersistedTimerState`]                 |
//! | `history`    | list of [`SessionRecord`](crate::SessionRecord) |
//! | `darkMode`   | `true`, `false`, or `null` (follow the system) |
//!
//! # Schema Evolution
//!
//! Blobs written by older versions of the timer used different
//! field names (`elapsedTime`, `isRunning`, `savedInitialTime`, a string
//! `durationInMinutes`). Those are still accepted on read; writes always use
//! the current names.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::StoreError;
use crate::timer::{MAX_PLANNED_SECONDS, TimerStatus};

/// Key of the active timer snapshot.
pub const TIMER_STATE_KEY: &str = "timerState";
/// Key of the session history.
pub const HISTORY_KEY: &str = "history";
/// Key of the theme preference.
pub const DARK_MODE_KEY: &str = "darkMode";

/// Synchronous byte-oriented key-value storage.
pub trait KeyValueStore {
    /// Returns the stored bytes, or `None` if the key was never written.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores bytes under a key, replacing any previous value.
    fn save(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).save(key, value)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).save(key, value)
    }
}

/// In-memory store, useful for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw bytes for a key.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Writes raw bytes directly, bypassing any engine.
    pub fn insert(&mut self, key: &str, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.to_string(), value.into());
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Loads and decodes a JSON value.
pub fn load_json<T: DeserializeOwned, S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(bytes) = store.load(key)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Decode {
            key: key.to_string(),
            source,
        })
}

/// Encodes and stores a JSON value.
pub fn save_json<T: Serialize + ?Sized, S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.save(key, &bytes)
}

/// Reads the theme preference. `None` means follow the system theme.
pub fn load_dark_mode<S: KeyValueStore + ?Sized>(store: &S) -> Result<Option<bool>, StoreError> {
    Ok(load_json::<Option<bool>, S>(store, DARK_MODE_KEY)?.flatten())
}

/// Writes the theme preference. `None` resets it to follow the system theme.
pub fn save_dark_mode<S: KeyValueStore + ?Sized>(
    store: &mut S,
    dark_mode: Option<bool>,
) -> Result<(), StoreError> {
    save_json(store, DARK_MODE_KEY, &dark_mode)
}

/// Snapshot of the timer as written under [`TIMER_STATE_KEY`].
///
/// `running` is written for compatibility but never trusted on load; see
/// [`TimerState::recover`](crate::TimerState::recover).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTimerState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,
    #[serde(default)]
    pub planned_seconds: Option<u32>,
    #[serde(default, alias = "elapsedTime", deserialize_with = "null_as_default")]
    pub elapsed_seconds: u32,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub start_timestamp: Option<DateTime<Utc>>,
    #[serde(default, alias = "isRunning", deserialize_with = "null_as_default")]
    pub running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TimerStatus>,
    /// Planned seconds of the run in progress, as written by the browser build.
    #[serde(default, skip_serializing)]
    pub(crate) saved_initial_time: Option<u32>,
    /// Minutes typed into the duration field, as written by the browser build.
    #[serde(default, skip_serializing, deserialize_with = "legacy_minutes")]
    pub(crate) duration_in_minutes: Option<f64>,
}

impl PersistedTimerState {
    /// Planned seconds, falling back to the legacy fields.
    ///
    /// Values outside `1..=16h` are discarded.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn resolved_planned_seconds(&self) -> Option<u32> {
        self.planned_seconds
            .or(self.saved_initial_time)
            .or_else(|| {
                self.duration_in_minutes
                    .filter(|m| m.is_finite() && *m > 0.0)
                    .map(|m| (m * 60.0).round().min(f64::from(u32::MAX)) as u32)
            })
            .filter(|secs| (1..=MAX_PLANNED_SECONDS).contains(secs))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MinutesField {
    Number(f64),
    Text(String),
}

fn legacy_minutes<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<MinutesField>::deserialize(deserializer)? {
        Some(MinutesField::Number(minutes)) => Some(minutes),
        Some(MinutesField::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}
