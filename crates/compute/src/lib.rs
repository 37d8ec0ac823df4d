//! Anomaly detection over dense daily event counts.
//!
//! - [`series`] turns raw rows into a gap-filled [`DailySeries`](eventwatch_core::DailySeries)
//! - [`detectors`] holds the decomposition and relative-change tests
//! - [`scanner`] runs both tests over every eligible segment
//! - [`report`] renders the resulting records as text

pub mod detectors;
pub mod metrics;
pub mod report;
pub mod scanner;
pub mod series;

pub use detectors::decomposition::{
    DecompositionAnomalyDetector, DecompositionResult, DecompositionVerdict, Decomposer,
    StlDecomposer, StlSettings,
};
pub use detectors::relative_change::{ChangeSummary, RelativeChangeAnomalyDetector, RelativeChangeResult};
pub use metrics::ScanMetrics;
pub use report::AnomalyReporter;
pub use scanner::{ScanReport, SegmentScanner};
pub use series::SeriesBuilder;
