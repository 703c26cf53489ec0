//! Period statistics over the session history.
//!
//! Buckets are calendar-aligned in the caller's time zone, not rolling windows:
//!
//! - `today`: local midnight of the reference date
//! - `week`: local midnight of the Monday on or before the reference date
//! - `month`: local midnight of the 1st of the reference month
//! - `all`: no lower bound
//!
//! A session belongs to a bucket when its `start_time` is at or after the
//! boundary. Minutes are rounded per session before summing, so two sessions
//! of 90s and 30s count as 2 + 1 = 3 minutes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::SessionRecord;

/// Statistics bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Week,
    Month,
    All,
}

impl Period {
    /// All periods, narrowest first.
    pub const ALL: [Self; 4] = [Self::Today, Self::Week, Self::Month, Self::All];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        }
    }

    /// Heading shown above the period's totals.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Today => "Сегодня",
            Self::Week => "Неделя",
            Self::Month => "Месяц",
            Self::All => "Все время",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A period name that is not one of `today`, `week`, `month` or `all`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown period: {0} (expected today, week, month or all)")]
pub struct UnknownPeriod(String);

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" | "day" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            _ => Err(UnknownPeriod(s.to_string())),
        }
    }
}

/// Accumulated minutes for one period.
///
/// Tags whose rounded minutes sum to zero are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeriodTotals {
    pub per_tag_minutes: BTreeMap<String, u32>,
    pub total_minutes: u32,
}

/// One slice of the per-period pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub tag: String,
    pub minutes: u32,
    pub percent: f64,
}

impl PeriodTotals {
    /// Minutes for a tag, zero if absent.
    pub fn minutes_for(&self, tag: &str) -> u32 {
        self.per_tag_minutes.get(tag).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.per_tag_minutes.is_empty()
    }

    /// Chart slices ordered by minutes descending, then tag.
    pub fn shares(&self) -> Vec<ChartSlice> {
        let mut slices: Vec<ChartSlice> = self
            .per_tag_minutes
            .iter()
            .map(|(tag, &minutes)| ChartSlice {
                tag: tag.clone(),
                minutes,
                percent: if self.total_minutes == 0 {
                    0.0
                } else {
                    f64::from(minutes) / f64::from(self.total_minutes) * 100.0
                },
            })
            .collect();
        slices.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.tag.cmp(&b.tag)));
        slices
    }
}

/// Totals for every period at one reference instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeriodStats {
    pub today: PeriodTotals,
    pub week: PeriodTotals,
    pub month: PeriodTotals,
    pub all: PeriodTotals,
}

/// One row of the per-tag table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsRow {
    pub tag: String,
    pub today: u32,
    pub week: u32,
    pub month: u32,
    pub all: u32,
}

/// Per-tag table across all periods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsTable {
    pub rows: Vec<StatsRow>,
}

impl PeriodStats {
    pub const fn get(&self, period: Period) -> &PeriodTotals {
        match period {
            Period::Today => &self.today,
            Period::Week => &self.week,
            Period::Month => &self.month,
            Period::All => &self.all,
        }
    }

    /// Builds the table. The `all` period defines which tags appear; rows are
    /// ordered by all-time minutes descending, then tag.
    pub fn table(&self) -> StatsTable {
        let mut rows: Vec<StatsRow> = self
            .all
            .per_tag_minutes
            .iter()
            .map(|(tag, &all)| StatsRow {
                tag: tag.clone(),
                today: self.today.minutes_for(tag),
                week: self.week.minutes_for(tag),
                month: self.month.minutes_for(tag),
                all,
            })
            .collect();
        rows.sort_by(|a, b| b.all.cmp(&a.all).then_with(|| a.tag.cmp(&b.tag)));
        StatsTable { rows }
    }
}

/// Rounds a session to whole minutes, half up.
pub fn rounded_minutes(elapsed_seconds: u32) -> u32 {
    let minutes = (u64::from(elapsed_seconds) + 30) / 60;
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Converts a local date at midnight to UTC.
/// Handles DST ambiguity by picking the earlier time.
fn local_midnight_to_utc<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            // DST spring-forward gap at midnight; 1am is guaranteed to exist
            let one_am = date.and_hms_opt(1, 0, 0)?;
            tz.from_local_datetime(&one_am).earliest()
        })
        .map_or_else(|| midnight.and_utc(), |dt| dt.with_timezone(&Utc))
}

/// Start of a period containing `now`, or `None` for [`Period::All`].
pub fn period_start<Tz: TimeZone>(period: Period, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let tz = now.timezone();
    let today = now.date_naive();
    let date = match period {
        Period::Today => today,
        Period::Week => {
            let days_since_monday = today.weekday().num_days_from_monday();
            today - chrono::Duration::days(i64::from(days_since_monday))
        }
        Period::Month => today.with_day(1).unwrap_or(today),
        Period::All => return None,
    };
    Some(local_midnight_to_utc(&tz, date))
}

fn totals_since(history: &[SessionRecord], boundary: Option<DateTime<Utc>>) -> PeriodTotals {
    let mut per_tag_minutes: BTreeMap<String, u32> = BTreeMap::new();
    for record in history
        .iter()
        .filter(|r| boundary.is_none_or(|start| r.start_time >= start))
    {
        let entry = per_tag_minutes.entry(record.tag.clone()).or_insert(0);
        *entry = entry.saturating_add(rounded_minutes(record.elapsed_seconds));
    }
    per_tag_minutes.retain(|_, minutes| *minutes > 0);

    let total_minutes = per_tag_minutes
        .values()
        .fold(0u32, |acc, minutes| acc.saturating_add(*minutes));
    PeriodTotals {
        per_tag_minutes,
        total_minutes,
    }
}

/// Aggregates history with period boundaries in the system's local time zone.
pub fn compute_stats(history: &[SessionRecord], now: DateTime<Utc>) -> PeriodStats {
    compute_stats_in(history, &now.with_timezone(&Local))
}

/// Aggregates history with period boundaries in `now`'s time zone.
///
/// Pure: the same `(history, now)` always yields the same result.
pub fn compute_stats_in<Tz: TimeZone>(history: &[SessionRecord], now: &DateTime<Tz>) -> PeriodStats {
    let totals = |period| totals_since(history, period_start(period, now));
    PeriodStats {
        today: totals(Period::Today),
        week: totals(Period::Week),
        month: totals(Period::Month),
        all: totals(Period::All),
    }
}
