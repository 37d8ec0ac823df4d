use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use eventwatch_core::Config;

/// Daily anomaly scan over per-segment event counts.
///
/// Flags (property, platform, event_name) segments whose latest day is
/// out of line with their history, either by seasonal decomposition or by
/// week-over-week change against per-property thresholds.
#[derive(Parser, Debug)]
#[command(name = "eventwatch", about = "Daily event-count anomaly scan")]
pub struct CliArgs {
    /// Day to check (YYYY-MM-DD). Defaults to the latest date in the data.
    #[arg(long, env = "EVENTWATCH_DATE")]
    pub date: Option<NaiveDate>,

    /// Event export CSV (overrides EVENTS_PATH)
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Threshold sheet CSV path or http(s) export URL (overrides THRESHOLDS_PATH)
    #[arg(long)]
    pub thresholds: Option<String>,

    /// Seasonal period in days (overrides STL_PERIOD)
    #[arg(long)]
    pub period: Option<usize>,

    /// Residual standard deviation multiplier (overrides STD_PARAMETER)
    #[arg(long)]
    pub std_parameter: Option<f64>,

    /// Disable low-volume widening and the threshold floor
    #[arg(long)]
    pub no_dynamic_threshold: bool,

    /// Scan worker threads, 0 for all cores (overrides SCAN_WORKER_THREADS)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Also print anomaly records as JSON
    #[arg(long)]
    pub json: bool,
}

impl CliArgs {
    /// Command-line values win over the environment.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.events {
            config.input.events_path = path.clone();
        }
        if let Some(source) = &self.thresholds {
            config.input.thresholds_source = source.clone();
        }
        if let Some(period) = self.period {
            config.detection.period = period;
        }
        if let Some(std_parameter) = self.std_parameter {
            config.detection.std_parameter = std_parameter;
        }
        if self.no_dynamic_threshold {
            config.detection.dynamic_threshold = false;
        }
        if let Some(workers) = self.workers {
            config.scan.worker_threads = workers;
        }
    }
}
