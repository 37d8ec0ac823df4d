//! Daily event export loading.
//!
//! The export has one row per (Date, Property, Platform, event_name) with
//! an `event_count`. Dates are ISO `YYYY-MM-DD`.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info};

use eventwatch_core::EventRow;

use crate::error::IngestError;

/// Event names containing parentheses, commas, `=`, digits or angle brackets
/// are tracking noise and never scanned.
const VALID_EVENT_NAME: &str = r"^[^(),=0-9<>]+$";

const DATE_COL: &str = "Date";
const PROPERTY_COL: &str = "Property";
const PLATFORM_COL: &str = "Platform";
const EVENT_NAME_COL: &str = "event_name";
const EVENT_COUNT_COL: &str = "event_count";

/// Load the export at `path`, keeping rows with a valid event name and,
/// when `check_date` is given, a date on or before it.
///
/// Any unparsable row fails the whole load.
pub fn load_event_rows(
    path: &Path,
    check_date: Option<NaiveDate>,
) -> Result<Vec<EventRow>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = parse_event_rows(BufReader::new(file))?;
    let total = rows.len();

    let mut rows = filter_valid_event_names(rows)?;
    let named = rows.len();
    if let Some(check_date) = check_date {
        rows.retain(|r| r.date <= check_date);
    }

    info!(
        path = %path.display(),
        total,
        invalid_names = total - named,
        kept = rows.len(),
        "loaded event rows"
    );
    Ok(rows)
}

/// Parse every row of an event export, without filtering.
pub fn parse_event_rows<R: Read>(reader: R) -> Result<Vec<EventRow>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(IngestError::MissingColumn(name))
    };
    let date_idx = column(DATE_COL)?;
    let property_idx = column(PROPERTY_COL)?;
    let platform_idx = column(PLATFORM_COL)?;
    let event_idx = column(EVENT_NAME_COL)?;
    let count_idx = column(EVENT_COUNT_COL)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        let date = NaiveDate::parse_from_str(field(date_idx), "%Y-%m-%d").map_err(|_| {
            IngestError::Parse {
                line,
                field: DATE_COL,
                value: field(date_idx).to_string(),
            }
        })?;
        let event_count = field(count_idx)
            .parse::<u64>()
            .map_err(|_| IngestError::Parse {
                line,
                field: EVENT_COUNT_COL,
                value: field(count_idx).to_string(),
            })?;

        rows.push(EventRow {
            date,
            property: field(property_idx).to_string(),
            platform: field(platform_idx).to_string(),
            event_name: field(event_idx).to_string(),
            event_count,
        });
    }

    debug!(rows = rows.len(), "parsed event export");
    Ok(rows)
}

/// Drop rows whose event name is not a plain tracked event.
pub fn filter_valid_event_names(rows: Vec<EventRow>) -> Result<Vec<EventRow>, IngestError> {
    let pattern = Regex::new(VALID_EVENT_NAME)?;
    Ok(rows
        .into_iter()
        .filter(|r| pattern.is_match(&r.event_name))
        .collect())
}

/// Distinct properties with at least one row dated exactly `check_date`.
pub fn properties_active_on(rows: &[EventRow], check_date: NaiveDate) -> BTreeSet<String> {
    rows.iter()
        .filter(|r| r.date == check_date)
        .map(|r| r.property.clone())
        .collect()
}

/// Newest date among `rows`.
pub fn latest_date(rows: &[EventRow]) -> Option<NaiveDate> {
    rows.iter().map(|r| r.date).max()
}
