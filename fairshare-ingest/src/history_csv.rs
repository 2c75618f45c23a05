//! Parse completion-history CSV exports into history entries.
//!
//! Expected header:
//! date,member_id,task_id,category,weight,completed
//!
//! `date` is RFC 3339 or `YYYY-MM-DD` (midnight UTC). `completed` is
//! optional and accepts true/false, 1/0, yes/no. Any malformed row aborts
//! the whole import with its line number.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use fairshare_core::{HistoricalLoadEntry, TaskCategory};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct HistoryRow {
    date: String,
    member_id: String,
    task_id: String,
    category: String,
    weight: String,
    #[serde(default)]
    completed: Option<String>,
}

pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("unrecognized date {raw:?}"))?;
    day.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| anyhow!("unrecognized date {raw:?}"))
}

fn parse_completed(raw: Option<&str>) -> Result<bool> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") => Ok(true),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => bail!("invalid completed flag {other:?}"),
    }
}

fn row_to_entry(row: HistoryRow) -> Result<HistoricalLoadEntry> {
    let date = parse_date(&row.date)?;
    let weight: f64 = row
        .weight
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid weight {:?}", row.weight))?;
    let mut entry = HistoricalLoadEntry::new(
        date,
        row.member_id.trim(),
        row.task_id.trim(),
        TaskCategory::from_label(&row.category),
        weight,
    );
    entry.completed = parse_completed(row.completed.as_deref())?;
    entry.validate()?;
    Ok(entry)
}

/// Parse history rows from any reader. Fails on the first malformed row.
pub fn parse_history_reader<R: Read>(reader: R) -> Result<Vec<HistoricalLoadEntry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (i, result) in rdr.deserialize::<HistoryRow>().enumerate() {
        // Line 1 is the header.
        let line = i + 2;
        let row = result.with_context(|| format!("row {line}: unreadable record"))?;
        let entry = row_to_entry(row).with_context(|| format!("row {line}"))?;
        entries.push(entry);
    }
    debug!(rows = entries.len(), "history parsed");
    Ok(entries)
}

/// Parse a history CSV file.
pub fn parse_history_csv(path: impl AsRef<Path>) -> Result<Vec<HistoricalLoadEntry>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_history_reader(file).with_context(|| format!("parsing {}", path.display()))
}
