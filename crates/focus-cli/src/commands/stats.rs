//! Stats command: per-tag totals for today, this week, this month and all time.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use focus_core::format::format_minutes;
use focus_core::stats::ChartSlice;
use focus_core::{KeyValueStore, Period, PeriodStats, PeriodTotals, StatsTable, TimerEngine};
use serde::Serialize;

use super::util::progress_bar;

#[derive(Debug, Serialize)]
struct PeriodJson<'a> {
    period: Period,
    label: &'static str,
    total_minutes: u32,
    per_tag_minutes: &'a BTreeMap<String, u32>,
    shares: Vec<ChartSlice>,
}

#[derive(Debug, Serialize)]
struct StatsJson<'a> {
    generated_at: String,
    timezone: String,
    periods: Vec<PeriodJson<'a>>,
    table: StatsTable,
}

/// Shows every period, or only `period` when given.
pub fn run<W: Write, S: KeyValueStore>(
    writer: &mut W,
    store: S,
    json: bool,
    period: Option<Period>,
) -> Result<()> {
    let engine = TimerEngine::restore(store);
    let now = Utc::now();
    let stats = engine.stats(now);

    if json {
        let periods = period.as_ref().map_or(&Period::ALL[..], std::slice::from_ref);
        let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());
        writeln!(writer, "{}", format_stats_json(&stats, periods, now, timezone)?)?;
        return Ok(());
    }
    match period {
        Some(period) => write_period(writer, &stats, period),
        None => write_stats(writer, &stats),
    }
}

/// Formats stats as pretty JSON.
pub fn format_stats_json(
    stats: &PeriodStats,
    periods: &[Period],
    generated_at: DateTime<Utc>,
    timezone: String,
) -> Result<String> {
    let periods = periods
        .iter()
        .map(|&period| {
            let totals = stats.get(period);
            PeriodJson {
                period,
                label: period.label(),
                total_minutes: totals.total_minutes,
                per_tag_minutes: &totals.per_tag_minutes,
                shares: totals.shares(),
            }
        })
        .collect();

    let output = StatsJson {
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        timezone,
        periods,
        table: stats.table(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Writes summary totals, the per-tag table and chart shares.
pub fn write_stats<W: Write>(writer: &mut W, stats: &PeriodStats) -> Result<()> {
    for period in Period::ALL {
        writeln!(
            writer,
            "{}: {}",
            period.label(),
            format_minutes(stats.get(period).total_minutes)
        )?;
    }

    let table = stats.table();
    if table.rows.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Нет завершённых сессий.")?;
        return Ok(());
    }

    writeln!(writer)?;
    let mut lines = vec![
        std::iter::once("Тег".to_string())
            .chain(Period::ALL.iter().map(|p| p.label().to_string()))
            .collect::<Vec<_>>(),
    ];
    for row in &table.rows {
        lines.push(vec![
            row.tag.clone(),
            format_minutes(row.today),
            format_minutes(row.week),
            format_minutes(row.month),
            format_minutes(row.all),
        ]);
    }
    write_columns(writer, &lines)?;

    for period in Period::ALL {
        let totals = stats.get(period);
        if totals.is_empty() {
            continue;
        }
        writeln!(writer)?;
        writeln!(writer, "{}", period.label())?;
        write_chart(writer, totals)?;
    }
    Ok(())
}

/// Writes one period's total and its chart.
pub fn write_period<W: Write>(writer: &mut W, stats: &PeriodStats, period: Period) -> Result<()> {
    let totals = stats.get(period);
    writeln!(
        writer,
        "{}: {}",
        period.label(),
        format_minutes(totals.total_minutes)
    )?;
    writeln!(writer)?;
    if totals.is_empty() {
        writeln!(writer, "Нет завершённых сессий.")?;
        return Ok(());
    }
    write_chart(writer, totals)
}

fn write_chart<W: Write>(writer: &mut W, totals: &PeriodTotals) -> Result<()> {
    let slices: Vec<Vec<String>> = totals
        .shares()
        .into_iter()
        .map(|slice| {
            vec![
                slice.tag,
                progress_bar(slice.percent, 100.0),
                format!("{:.0}%", slice.percent),
                format_minutes(slice.minutes),
            ]
        })
        .collect();
    write_columns(writer, &slices)
}

/// Left-aligns cells into columns separated by two spaces.
fn write_columns<W: Write>(writer: &mut W, lines: &[Vec<String>]) -> Result<()> {
    let columns = lines.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            lines
                .iter()
                .filter_map(|cells| cells.get(i))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    for cells in lines {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(writer, "{}", line.trim_end())?;
    }
    Ok(())
}
