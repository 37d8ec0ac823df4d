//! Input adapters for the anomaly scan: the daily event export and the
//! per-property threshold sheet, both read from CSV.

pub mod error;
pub mod events;
pub mod thresholds;

pub use error::IngestError;
pub use events::{
    filter_valid_event_names, latest_date, load_event_rows, parse_event_rows,
    properties_active_on,
};
pub use thresholds::{fetch_thresholds, load_thresholds, parse_thresholds};
