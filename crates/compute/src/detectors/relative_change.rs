//! Week-over-week / day-over-day threshold test.

use serde::{Deserialize, Serialize};

use eventwatch_core::{DailySeries, DetectError, Thresholds};

/// Offset of the week-ago value in a newest-first series.
const WEEK_OFFSET: usize = 7;
/// Offset of the previous day.
const DAY_OFFSET: usize = 1;

/// Percentage change from `baseline` to `current`, rounded half-to-even.
///
/// A zero baseline is replaced by a fixed divisor of 1 with `current - 1`
/// as the change. The result is a sentinel: comparable against a threshold
/// but not a meaningful ratio next to segments with a nonzero baseline.
pub fn percent_change(current: u64, baseline: u64) -> i64 {
    let pct = if baseline == 0 {
        (current as f64 - 1.0) / 1.0 * 100.0
    } else {
        (current as f64 - baseline as f64) / baseline as f64 * 100.0
    };
    pct.round_ties_even() as i64
}

/// WoW and DoD changes of the newest day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub value_change_wow: i64,
    pub perc_change_wow: i64,
    pub value_change_dod: i64,
    pub perc_change_dod: i64,
}

impl ChangeSummary {
    /// Needs at least 8 days (offsets 0 through 7).
    pub fn from_series(series: &DailySeries) -> Result<Self, DetectError> {
        let current = series.value_at(0)?;
        let previous_day = series.value_at(DAY_OFFSET)?;
        let week_ago = series.value_at(WEEK_OFFSET)?;

        Ok(Self {
            value_change_wow: current as i64 - week_ago as i64,
            perc_change_wow: percent_change(current, week_ago),
            value_change_dod: current as i64 - previous_day as i64,
            perc_change_dod: percent_change(current, previous_day),
        })
    }
}

/// Result of the relative-change test for one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeChangeResult {
    pub changes: ChangeSummary,
    pub is_last_day_anomalous: bool,
}

/// Flags the newest day when its week-over-week move is large in both
/// relative and absolute terms.
#[derive(Debug, Clone, Copy)]
pub struct RelativeChangeAnomalyDetector {
    thresholds: Thresholds,
}

impl RelativeChangeAnomalyDetector {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Both `|perc WoW| > percentage_threshold` and
    /// `|value WoW| >= absolute_threshold` must hold.
    pub fn is_anomalous(&self, changes: &ChangeSummary) -> bool {
        let pct = changes.perc_change_wow.unsigned_abs() as f64;
        let abs = changes.value_change_wow.unsigned_abs() as f64;
        pct > self.thresholds.percentage_threshold && abs >= self.thresholds.absolute_threshold
    }

    pub fn check(&self, series: &DailySeries) -> Result<RelativeChangeResult, DetectError> {
        let changes = ChangeSummary::from_series(series)?;
        Ok(RelativeChangeResult {
            is_last_day_anomalous: self.is_anomalous(&changes),
            changes,
        })
    }
}
