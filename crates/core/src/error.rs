use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while building or scoring a single segment.
///
/// None of these abort a scan: the segment scanner contains them per segment
/// and reports them through logs and run counters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("invalid date range: {min} .. {max}")]
    InvalidRange { min: NaiveDate, max: NaiveDate },

    #[error("insufficient history: need {needed} days, have {actual}")]
    InsufficientHistory { needed: usize, actual: usize },

    #[error("decomposition fit failed: {0}")]
    DecompositionFit(String),

    #[error("threshold lookup failed for property '{property}': {reason}")]
    ThresholdLookup { property: String, reason: String },

    #[error("segment {segment} failed: {reason}")]
    SegmentProcessing { segment: String, reason: String },
}
