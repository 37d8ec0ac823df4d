//! Per-property threshold sheet.
//!
//! Layout: a header row, then `property, percentage_threshold,
//! absolute_threshold` by position. Extra columns are ignored. The sheet
//! is read from a local file or fetched from an http(s) CSV export link.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use eventwatch_core::{ThresholdTable, Thresholds};

use crate::error::IngestError;

const PROPERTY_IDX: usize = 0;
const PERCENTAGE_IDX: usize = 1;
const ABSOLUTE_IDX: usize = 2;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Load the sheet from `source`: an `http://` or `https://` URL is fetched,
/// anything else is opened as a local path.
pub fn load_thresholds(source: &str) -> Result<ThresholdTable, IngestError> {
    let table = if is_url(source) {
        fetch_thresholds(source)?
    } else {
        read_thresholds_file(Path::new(source))?
    };
    info!(source, properties = table.len(), "loaded threshold sheet");
    Ok(table)
}

fn is_url(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn read_thresholds_file(path: &Path) -> Result<ThresholdTable, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_thresholds(BufReader::new(file))
}

/// GET a CSV export and parse it. Non-2xx responses are errors.
pub fn fetch_thresholds(url: &str) -> Result<ThresholdTable, IngestError> {
    let fetch_err = |source| IngestError::Fetch {
        url: url.to_string(),
        source,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(fetch_err)?;
    let body = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.bytes())
        .map_err(fetch_err)?;
    debug!(url, bytes = body.len(), "fetched threshold sheet");
    parse_thresholds(&body[..])
}

/// Parse a threshold sheet.
///
/// A row whose numeric cells do not parse is logged and left out, so that
/// property has no entry in the table.
pub fn parse_thresholds<R: Read>(reader: R) -> Result<ThresholdTable, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut table = ThresholdTable::new();
    for result in reader.records() {
        let record = result?;
        let property = record.get(PROPERTY_IDX).unwrap_or_default();
        if property.is_empty() {
            continue;
        }

        let percentage = record.get(PERCENTAGE_IDX).unwrap_or_default();
        let absolute = record.get(ABSOLUTE_IDX).unwrap_or_default();
        match (percentage.parse::<f64>(), absolute.parse::<f64>()) {
            (Ok(p), Ok(a)) => table.insert(property, Thresholds::new(p, a)),
            _ => warn!(
                property,
                percentage_threshold = percentage,
                absolute_threshold = absolute,
                "unparsable thresholds; property left out"
            ),
        }
    }
    Ok(table)
}
