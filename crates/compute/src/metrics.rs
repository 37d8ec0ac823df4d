use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Run counters for one scan, suitable for logs and telemetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanMetrics {
    /// Segments attempted (eligible segments present in the input).
    pub segments_scanned: usize,
    /// Segments that produced an anomaly record.
    pub anomalies_found: usize,
    /// Segments excluded from results because scoring failed.
    pub segments_failed: usize,
    /// Segments whose decomposition test could not be fitted.
    pub decomposition_failures: usize,
    /// Segments that ran without a relative-change test (no thresholds).
    pub threshold_misses: usize,
    /// Wall-clock duration of the scan in milliseconds.
    pub elapsed_ms: u64,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScanMetrics {
    /// Segments scanned that were neither anomalous nor failed.
    pub fn segments_clean(&self) -> usize {
        self.segments_scanned
            .saturating_sub(self.anomalies_found)
            .saturating_sub(self.segments_failed)
    }

    pub(crate) fn record_finish(&mut self, elapsed: Duration) {
        self.elapsed_ms = elapsed.as_millis() as u64;
        self.finished_at = Some(Utc::now());
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} segments scanned, {} anomalous, {} clean, {} failed ({} decomposition failures, {} without thresholds) in {}ms",
            self.segments_scanned,
            self.anomalies_found,
            self.segments_clean(),
            self.segments_failed,
            self.decomposition_failures,
            self.threshold_misses,
            self.elapsed_ms
        )
    }
}
