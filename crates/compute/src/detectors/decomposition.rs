//! Seasonal-trend decomposition outlier test.
//!
//! The series is split additively into trend, seasonal and residual parts.
//! A day is anomalous when its residual leaves the band
//! `mean(residual) ± threshold`, where the threshold starts at
//! `std_parameter × std(residual)` and is widened for low-volume series.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use eventwatch_core::config::DetectionConfig;
use eventwatch_core::{DailySeries, DetectError};

use super::stats::{mean, sample_std_dev};

/// Additive components of a series, aligned with its input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
}

/// Abstracts the decomposition algorithm.
///
/// Implemented by [`StlDecomposer`] and test doubles.
pub trait Decomposer: Send + Sync {
    /// Decompose `values` (oldest first) with the given seasonal period.
    fn decompose(
        &self,
        values: &[f64],
        period: usize,
        robust: bool,
    ) -> Result<Decomposition, DetectError>;
}

/// Largest count an `f32` holds exactly.
const F32_EXACT_LIMIT: f64 = 16_777_216.0;

/// Smoothing windows and iteration counts for one STL fit.
///
/// Follows the classic defaults: a 7-day seasonal smoother, trend and
/// low-pass windows derived from the period, degree-1 LOESS everywhere,
/// no jump interpolation, and 2 inner / 15 outer passes when robust
/// (5 inner / 0 outer otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StlSettings {
    pub period: usize,
    pub seasonal_length: usize,
    pub trend_length: usize,
    pub low_pass_length: usize,
    pub inner_loops: usize,
    pub outer_loops: usize,
}

impl StlSettings {
    pub const SEASONAL_LENGTH: usize = 7;

    pub fn for_period(period: usize, robust: bool) -> Self {
        let seasonal = Self::SEASONAL_LENGTH as f64;
        let trend = (1.5 * period as f64 / (1.0 - 1.5 / seasonal)).ceil() as usize;
        Self {
            period,
            seasonal_length: Self::SEASONAL_LENGTH,
            trend_length: next_odd(trend),
            low_pass_length: next_odd(period + 1),
            inner_loops: if robust { 2 } else { 5 },
            outer_loops: if robust { 15 } else { 0 },
        }
    }
}

fn next_odd(n: usize) -> usize {
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}

/// LOESS-based STL decomposition.
///
/// The fit runs in `f32`; daily counts above 2^24 lose integer precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct StlDecomposer;

impl Decomposer for StlDecomposer {
    fn decompose(
        &self,
        values: &[f64],
        period: usize,
        robust: bool,
    ) -> Result<Decomposition, DetectError> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DetectError::DecompositionFit(
                "series contains non-finite values".to_string(),
            ));
        }
        if values.iter().any(|v| v.abs() > F32_EXACT_LIMIT) {
            debug!(limit = F32_EXACT_LIMIT, "counts exceed f32 precision; fit is approximate");
        }

        let settings = StlSettings::for_period(period, robust);
        let series: Vec<f32> = values.iter().map(|&v| v as f32).collect();
        let fit = stlrs::params()
            .seasonal_length(settings.seasonal_length)
            .trend_length(settings.trend_length)
            .low_pass_length(settings.low_pass_length)
            .seasonal_degree(1)
            .trend_degree(1)
            .low_pass_degree(1)
            .seasonal_jump(1)
            .trend_jump(1)
            .low_pass_jump(1)
            .inner_loops(settings.inner_loops)
            .outer_loops(settings.outer_loops)
            .robust(robust)
            .fit(&series, settings.period)
            .map_err(|e| DetectError::DecompositionFit(e.to_string()))?;

        let widen = |xs: &[f32]| xs.iter().map(|&x| x as f64).collect::<Vec<f64>>();
        Ok(Decomposition {
            trend: widen(fit.trend()),
            seasonal: widen(fit.seasonal()),
            residual: widen(fit.remainder()),
        })
    }
}

/// Full output of one decomposition check. Vectors are oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct DecompositionResult {
    pub dates: Vec<NaiveDate>,
    pub observed: Vec<f64>,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
    pub residual_mean: f64,
    pub residual_std: f64,
    /// Half-width of the band after dynamic adjustment.
    pub threshold: f64,
    pub lower_threshold: f64,
    pub upper_threshold: f64,
    /// Days whose residual fell outside the band, newest first.
    pub anomalous_dates: Vec<NaiveDate>,
    pub is_last_day_anomalous: bool,
}

impl DecompositionResult {
    /// Trend plus seasonal: the value the model expected on each day.
    pub fn expected(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(self.seasonal.iter())
            .map(|(t, s)| t + s)
            .collect()
    }
}

/// Outcome of running the decomposition test on one series.
#[derive(Debug, Clone, Serialize)]
pub enum DecompositionVerdict {
    /// Series too short to estimate seasonality; never anomalous.
    InsufficientHistory { len: usize, required: usize },
    Evaluated(DecompositionResult),
}

impl DecompositionVerdict {
    pub fn is_last_day_anomalous(&self) -> bool {
        match self {
            DecompositionVerdict::InsufficientHistory { .. } => false,
            DecompositionVerdict::Evaluated(result) => result.is_last_day_anomalous,
        }
    }

    pub fn result(&self) -> Option<&DecompositionResult> {
        match self {
            DecompositionVerdict::InsufficientHistory { .. } => None,
            DecompositionVerdict::Evaluated(result) => Some(result),
        }
    }
}

/// Half-width of the anomaly band for a residual standard deviation.
///
/// With `dynamic_threshold` on, a recent mean below `low_volume_mean` scales
/// the base threshold by `1 + (low_volume_mean - recent_mean) / low_volume_mean`,
/// and a result still under `threshold_floor` has the floor added to it.
pub fn band_half_width(residual_std: f64, recent_mean: f64, config: &DetectionConfig) -> f64 {
    let mut threshold = config.std_parameter * residual_std;
    if !config.dynamic_threshold {
        return threshold;
    }

    if recent_mean < config.low_volume_mean {
        threshold *= 1.0 + (config.low_volume_mean - recent_mean) / config.low_volume_mean;
    }
    if threshold < config.threshold_floor {
        threshold += config.threshold_floor;
    }
    threshold
}

/// Flags the newest day when its decomposition residual is an outlier.
pub struct DecompositionAnomalyDetector<D = StlDecomposer> {
    config: DetectionConfig,
    decomposer: D,
}

impl DecompositionAnomalyDetector<StlDecomposer> {
    pub fn new(config: DetectionConfig) -> Self {
        Self::with_decomposer(config, StlDecomposer)
    }
}

impl<D: Decomposer> DecompositionAnomalyDetector<D> {
    pub fn with_decomposer(config: DetectionConfig, decomposer: D) -> Self {
        Self { config, decomposer }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run the test on `series`.
    ///
    /// Series shorter than `min_history_days` short-circuit to
    /// [`DecompositionVerdict::InsufficientHistory`] without fitting.
    pub fn detect(&self, series: &DailySeries) -> Result<DecompositionVerdict, DetectError> {
        if series.len() < self.config.min_history_days {
            return Ok(DecompositionVerdict::InsufficientHistory {
                len: series.len(),
                required: self.config.min_history_days,
            });
        }

        let observed = series.chronological_values();
        let parts = self
            .decomposer
            .decompose(&observed, self.config.period, self.config.robust)?;

        if parts.residual.len() != observed.len()
            || parts.trend.len() != observed.len()
            || parts.seasonal.len() != observed.len()
        {
            return Err(DetectError::DecompositionFit(format!(
                "component length mismatch: expected {}, residual has {}",
                observed.len(),
                parts.residual.len()
            )));
        }
        if parts.residual.iter().any(|r| !r.is_finite()) {
            return Err(DetectError::DecompositionFit(
                "residual contains non-finite values".to_string(),
            ));
        }

        let residual_mean = mean(&parts.residual);
        let residual_std = sample_std_dev(&parts.residual, residual_mean);
        let recent_mean = series.recent_mean(self.config.recent_window_days);
        let threshold = band_half_width(residual_std, recent_mean, &self.config);
        let lower_threshold = residual_mean - threshold;
        let upper_threshold = residual_mean + threshold;

        let dates = series.chronological_dates();
        let mut anomalous_dates: Vec<NaiveDate> = dates
            .iter()
            .zip(parts.residual.iter())
            .filter(|(_, &r)| r < lower_threshold || r > upper_threshold)
            .map(|(&d, _)| d)
            .collect();
        anomalous_dates.reverse();

        let latest = series.latest_date();
        let is_last_day_anomalous = anomalous_dates.contains(&latest);

        debug!(
            days = series.len(),
            residual_mean,
            residual_std,
            recent_mean,
            threshold,
            outliers = anomalous_dates.len(),
            is_last_day_anomalous,
            "decomposition check complete"
        );

        Ok(DecompositionVerdict::Evaluated(DecompositionResult {
            dates,
            observed,
            trend: parts.trend,
            seasonal: parts.seasonal,
            residual: parts.residual,
            residual_mean,
            residual_std,
            threshold,
            lower_threshold,
            upper_threshold,
            anomalous_dates,
            is_last_day_anomalous,
        }))
    }
}
