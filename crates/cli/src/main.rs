mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use eventwatch_compute::{AnomalyReporter, SegmentScanner};
use eventwatch_core::Config;
use eventwatch_ingest::{latest_date, load_event_rows, load_thresholds, properties_active_on};

use crate::cli::CliArgs;

fn load_config(args: &CliArgs) -> Config {
    eventwatch_core::config::load_dotenv();
    let mut config = Config::from_env();
    args.apply_overrides(&mut config);
    config
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args);
    config.log_summary();

    let events_path = &config.input.events_path;
    let rows = load_event_rows(events_path, args.date)
        .with_context(|| format!("failed to load events from {}", events_path.display()))?;

    let Some(check_date) = args.date.or_else(|| latest_date(&rows)) else {
        bail!("no usable event rows in {}", events_path.display());
    };

    let eligible = properties_active_on(&rows, check_date);
    if eligible.is_empty() {
        warn!(%check_date, "no property has data on the check date");
    }
    info!(%check_date, properties = eligible.len(), "properties to check");

    let thresholds_source = &config.input.thresholds_source;
    let thresholds = load_thresholds(thresholds_source)
        .with_context(|| format!("failed to load thresholds from {thresholds_source}"))?;

    let scanner = SegmentScanner::new(config.detection.clone(), config.scan.clone());
    let report = scanner.scan(&rows, &eligible, &thresholds);
    info!(run_id = %report.run_id, "{}", report.summary_line());

    print!("{}", AnomalyReporter::render(&report.records));
    if args.json {
        let json = serde_json::to_string_pretty(&report.records)
            .context("failed to serialize anomaly records")?;
        println!("{json}");
    }

    Ok(())
}
