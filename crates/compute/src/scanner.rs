//! Per-segment orchestration.
//!
//! Groups raw rows into segments, builds each segment's dense series over the
//! run's full date range, runs the decomposition and relative-change tests
//! and collects an [`AnomalyRecord`] for every segment either test flags.
//!
//! Segments are scored in parallel on a rayon pool. Every segment reads only
//! shared immutable inputs and returns its own result; failures are logged
//! and counted per segment and never stop the scan.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use eventwatch_core::config::{DetectionConfig, ScanConfig};
use eventwatch_core::{AnomalyRecord, DetectError, EventRow, Segment, SegmentTask, ThresholdTable};

use crate::detectors::decomposition::{DecompositionAnomalyDetector, Decomposer, StlDecomposer};
use crate::detectors::relative_change::{ChangeSummary, RelativeChangeAnomalyDetector};
use crate::metrics::ScanMetrics;
use crate::series::SeriesBuilder;

/// Output of one scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub run_id: Uuid,
    /// Newest date in the input; `None` when the input was empty.
    pub check_date: Option<NaiveDate>,
    /// Anomalous segments, sorted by (property, platform, event_name).
    pub records: Vec<AnomalyRecord>,
    pub metrics: ScanMetrics,
}

impl ScanReport {
    fn empty(run_id: Uuid) -> Self {
        Self {
            run_id,
            check_date: None,
            records: Vec::new(),
            metrics: ScanMetrics::default(),
        }
    }

    pub fn summary_line(&self) -> String {
        match self.check_date {
            Some(date) => format!("[{}] {}", date, self.metrics.summary_line()),
            None => format!("[no data] {}", self.metrics.summary_line()),
        }
    }
}

/// What scoring one segment produced, besides a possible record.
#[derive(Debug)]
struct SegmentScore {
    record: Option<AnomalyRecord>,
    decomposition_failed: bool,
    threshold_missing: bool,
}

/// Runs both anomaly tests over every eligible segment.
pub struct SegmentScanner<D = StlDecomposer> {
    decomposition: DecompositionAnomalyDetector<D>,
    scan: ScanConfig,
}

impl SegmentScanner<StlDecomposer> {
    pub fn new(detection: DetectionConfig, scan: ScanConfig) -> Self {
        Self::with_decomposer(detection, scan, StlDecomposer)
    }
}

impl<D: Decomposer> SegmentScanner<D> {
    pub fn with_decomposer(detection: DetectionConfig, scan: ScanConfig, decomposer: D) -> Self {
        Self {
            decomposition: DecompositionAnomalyDetector::with_decomposer(detection, decomposer),
            scan,
        }
    }

    /// Build one [`SegmentTask`] per eligible segment present in `rows`.
    ///
    /// Every series spans the min..max date range of all rows, so series of
    /// different segments line up day for day.
    pub fn build_tasks(
        &self,
        rows: &[EventRow],
        eligible: &BTreeSet<String>,
    ) -> Result<Vec<SegmentTask>, DetectError> {
        let Some(builder) = range_builder(rows)? else {
            return Ok(Vec::new());
        };
        group_segments(rows, eligible)
            .into_iter()
            .map(|(segment, seg_rows)| build_task(&builder, segment, &seg_rows))
            .collect()
    }

    /// Scan all eligible segments and collect anomaly records.
    ///
    /// Properties not in `eligible` are skipped silently.
    pub fn scan(
        &self,
        rows: &[EventRow],
        eligible: &BTreeSet<String>,
        thresholds: &ThresholdTable,
    ) -> ScanReport {
        let run_id = Uuid::new_v4();
        let start = Instant::now();

        let builder = match range_builder(rows) {
            Ok(Some(builder)) => builder,
            Ok(None) => {
                info!(%run_id, "no input rows; nothing to scan");
                return ScanReport::empty(run_id);
            }
            Err(e) => {
                warn!(%run_id, error = %e, "cannot derive scan date range");
                return ScanReport::empty(run_id);
            }
        };
        let check_date = builder.max_date();

        let groups: Vec<(Segment, Vec<&EventRow>)> =
            group_segments(rows, eligible).into_iter().collect();

        info!(
            %run_id,
            segments = groups.len(),
            eligible_properties = eligible.len(),
            min_date = %builder.min_date(),
            max_date = %check_date,
            "segment scan starting"
        );

        let score_all = || -> Vec<(Segment, Result<SegmentScore, DetectError>)> {
            groups
                .par_iter()
                .map(|(segment, seg_rows)| {
                    let outcome = build_task(&builder, segment.clone(), seg_rows)
                        .and_then(|task| self.score_task(&task, check_date, thresholds));
                    (segment.clone(), outcome)
                })
                .collect()
        };

        let num_workers = self.scan.resolved_worker_threads();
        let scored = match rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .build()
        {
            Ok(pool) => pool.install(score_all),
            Err(e) => {
                warn!(error = %e, "failed to build scan thread pool; using the global pool");
                score_all()
            }
        };

        let mut metrics = ScanMetrics {
            segments_scanned: scored.len(),
            ..ScanMetrics::default()
        };
        let mut records = Vec::new();

        for (segment, outcome) in scored {
            match outcome {
                Ok(score) => {
                    if score.decomposition_failed {
                        metrics.decomposition_failures += 1;
                    }
                    if score.threshold_missing {
                        metrics.threshold_misses += 1;
                    }
                    if let Some(record) = score.record {
                        records.push(record);
                    }
                }
                Err(e) => {
                    let e = DetectError::SegmentProcessing {
                        segment: segment.to_string(),
                        reason: e.to_string(),
                    };
                    warn!(%run_id, error = %e, "segment excluded from results");
                    metrics.segments_failed += 1;
                }
            }
        }

        records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        metrics.anomalies_found = records.len();
        metrics.record_finish(start.elapsed());

        info!(
            %run_id,
            scanned = metrics.segments_scanned,
            anomalies = metrics.anomalies_found,
            failed = metrics.segments_failed,
            decomposition_failures = metrics.decomposition_failures,
            threshold_misses = metrics.threshold_misses,
            elapsed_ms = metrics.elapsed_ms,
            "segment scan completed"
        );

        ScanReport {
            run_id,
            check_date: Some(check_date),
            records,
            metrics,
        }
    }

    /// Score one segment. Decomposition and threshold problems are contained
    /// here; anything else is returned and excludes the segment.
    fn score_task(
        &self,
        task: &SegmentTask,
        check_date: NaiveDate,
        thresholds: &ThresholdTable,
    ) -> Result<SegmentScore, DetectError> {
        let SegmentTask { segment, series } = task;

        let (decomposition_flag, decomposition_failed) = match self.decomposition.detect(series) {
            Ok(verdict) => (verdict.is_last_day_anomalous(), false),
            Err(e) => {
                warn!(%segment, error = %e, "decomposition test skipped");
                (false, true)
            }
        };

        let changes = ChangeSummary::from_series(series)?;

        let (relative_flag, threshold_missing) = match thresholds.get(&segment.property) {
            Ok(t) => (RelativeChangeAnomalyDetector::new(t).is_anomalous(&changes), false),
            Err(e) => {
                warn!(%segment, error = %e, "relative-change test skipped");
                (false, true)
            }
        };

        let record = (decomposition_flag || relative_flag).then(|| {
            debug!(
                %segment,
                decomposition = decomposition_flag,
                relative_change = relative_flag,
                wow = changes.value_change_wow,
                wow_pct = changes.perc_change_wow,
                "anomaly detected"
            );
            AnomalyRecord {
                date: check_date,
                property: segment.property.clone(),
                platform: segment.platform.clone(),
                event_name: segment.event_name.clone(),
                value_change_wow: changes.value_change_wow,
                perc_change_wow: changes.perc_change_wow,
                value_change_dod: changes.value_change_dod,
                perc_change_dod: changes.perc_change_dod,
                is_anomalous: true,
            }
        });

        Ok(SegmentScore {
            record,
            decomposition_failed,
            threshold_missing,
        })
    }
}

/// Dense series for one segment's rows.
fn build_task(
    builder: &SeriesBuilder,
    segment: Segment,
    rows: &[&EventRow],
) -> Result<SegmentTask, DetectError> {
    let series = builder.build(rows.iter().copied())?;
    Ok(SegmentTask { segment, series })
}

/// Series builder over the min..max dates of all rows, or `None` if empty.
fn range_builder(rows: &[EventRow]) -> Result<Option<SeriesBuilder>, DetectError> {
    let min = rows.iter().map(|r| r.date).min();
    let max = rows.iter().map(|r| r.date).max();
    match (min, max) {
        (Some(min), Some(max)) => SeriesBuilder::new(min, max).map(Some),
        _ => Ok(None),
    }
}

/// Rows grouped by segment, restricted to eligible properties.
fn group_segments<'a>(
    rows: &'a [EventRow],
    eligible: &BTreeSet<String>,
) -> BTreeMap<Segment, Vec<&'a EventRow>> {
    let mut groups: BTreeMap<Segment, Vec<&EventRow>> = BTreeMap::new();
    for row in rows {
        if !eligible.contains(&row.property) {
            continue;
        }
        groups.entry(row.segment()).or_default().push(row);
    }
    groups
}
