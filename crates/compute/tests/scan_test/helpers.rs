use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};

use eventwatch_compute::detectors::decomposition::{Decomposer, Decomposition};
use eventwatch_core::config::{DetectionConfig, ScanConfig};
use eventwatch_core::{DetectError, EventRow, ThresholdTable, Thresholds};

/// First day of every generated history.
pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

pub fn day(offset: u64) -> NaiveDate {
    start_date().checked_add_days(Days::new(offset)).unwrap()
}

/// One row per day for a segment, taking counts oldest first.
pub fn history(property: &str, platform: &str, event: &str, counts: &[u64]) -> Vec<EventRow> {
    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| EventRow {
            date: day(i as u64),
            property: property.to_string(),
            platform: platform.to_string(),
            event_name: event.to_string(),
            event_count: count,
        })
        .collect()
}

/// `days` days at `base`, then one final day at `last`.
pub fn flat_then(days: usize, base: u64, last: u64) -> Vec<u64> {
    let mut counts = vec![base; days];
    counts.push(last);
    counts
}

pub fn eligible(props: &[&str]) -> BTreeSet<String> {
    props.iter().map(|p| p.to_string()).collect()
}

/// (10%, 300) for every listed property.
pub fn default_thresholds(props: &[&str]) -> ThresholdTable {
    props
        .iter()
        .map(|p| (p.to_string(), Thresholds::new(10.0, 300.0)))
        .collect()
}

pub fn scan_config(workers: usize) -> ScanConfig {
    ScanConfig {
        worker_threads: workers,
    }
}

pub fn detection_config() -> DetectionConfig {
    DetectionConfig::default()
}

/// Residual = value minus the series median; fails when the newest value
/// equals `fail_marker`.
pub struct MedianDecomposer {
    pub fail_marker: Option<f64>,
}

impl Decomposer for MedianDecomposer {
    fn decompose(
        &self,
        values: &[f64],
        _period: usize,
        _robust: bool,
    ) -> Result<Decomposition, DetectError> {
        if let (Some(marker), Some(&last)) = (self.fail_marker, values.last()) {
            if last == marker {
                return Err(DetectError::DecompositionFit("injected failure".into()));
            }
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = sorted[sorted.len() / 2];

        Ok(Decomposition {
            trend: vec![median; values.len()],
            seasonal: vec![0.0; values.len()],
            residual: values.iter().map(|v| v - median).collect(),
        })
    }
}
