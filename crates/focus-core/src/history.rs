//! Append-only session history.

use serde::{Deserialize, Serialize};

use crate::SessionRecord;

/// Ordered list of completed sessions, oldest first.
///
/// The engine only ever appends. Aggregation does not depend on order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    records: Vec<SessionRecord>,
}

/// Pre-fill values for a tag picked from history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagSuggestion {
    pub tag: String,
    /// Minutes to plan, taken from the tag's most recent session.
    pub planned_minutes: Option<f64>,
}

impl History {
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub const fn from_records(records: Vec<SessionRecord>) -> Self {
        Self { records }
    }

    /// Appends a fully built record.
    ///
    /// Zero-length sessions are refused. The id is bumped past the previous
    /// record's id if two sessions finish within the same millisecond.
    pub fn append(&mut self, mut record: SessionRecord) -> Option<&SessionRecord> {
        if record.elapsed_seconds == 0 {
            tracing::warn!(tag = %record.tag, "refusing to record zero-length session");
            return None;
        }
        if let Some(last) = self.records.last() {
            if record.id <= last.id {
                record.id = last.id + 1;
            }
        }
        self.records.push(record);
        self.records.last()
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records for display, most recent first.
    pub fn newest_first(&self) -> impl Iterator<Item = &SessionRecord> {
        self.records.iter().rev()
    }

    /// Total accumulated seconds for a tag across the whole history.
    pub fn total_seconds_for_tag(&self, tag: &str) -> u64 {
        self.records
            .iter()
            .filter(|r| r.tag == tag)
            .map(|r| u64::from(r.elapsed_seconds))
            .sum()
    }

    /// Unique tags in the order they were first used.
    pub fn known_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for record in &self.records {
            if !tags.contains(&record.tag.as_str()) {
                tags.push(&record.tag);
            }
        }
        tags
    }

    /// Suggests a configuration for a tag based on its latest session.
    ///
    /// Countdown sessions suggest their planned minutes. Open-ended sessions
    /// suggest their whole elapsed minutes, or nothing if under a minute.
    pub fn suggestion_for(&self, tag: &str) -> Option<TagSuggestion> {
        let last = self.records.iter().rev().find(|r| r.tag == tag)?;
        let planned_minutes = last
            .planned_minutes
            .or_else(|| Some(f64::from(last.elapsed_seconds / 60)))
            .filter(|minutes| *minutes > 0.0);

        Some(TagSuggestion {
            tag: last.tag.clone(),
            planned_minutes,
        })
    }
}
