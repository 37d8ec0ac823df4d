use eventwatch_compute::{AnomalyReporter, SegmentScanner};
use eventwatch_core::ThresholdTable;

use crate::helpers::{
    day, default_thresholds, detection_config, eligible, flat_then, history, scan_config,
    MedianDecomposer,
};

#[test]
fn test_week_over_week_spike_is_reported() {
    let rows = history("Shop", "web", "view_item", &flat_then(40, 100, 400));
    let scanner = SegmentScanner::new(detection_config(), scan_config(1));

    let report = scanner.scan(&rows, &eligible(&["Shop"]), &default_thresholds(&["Shop"]));

    assert_eq!(report.check_date, Some(day(40)));
    assert_eq!(report.metrics.segments_scanned, 1);
    assert_eq!(report.metrics.segments_failed, 0);
    assert_eq!(report.records.len(), 1);

    let record = &report.records[0];
    assert_eq!(record.date, day(40));
    assert_eq!(record.property, "Shop");
    assert_eq!(record.platform, "web");
    assert_eq!(record.event_name, "view_item");
    assert_eq!(record.value_change_wow, 300);
    assert_eq!(record.perc_change_wow, 300);
    assert_eq!(record.value_change_dod, 300);
    assert_eq!(record.perc_change_dod, 300);
    assert!(record.is_anomalous);
}

#[test]
fn test_flat_zero_series_is_quiet() {
    let rows = history("Shop", "web", "refund", &[0; 40]);
    let scanner = SegmentScanner::new(detection_config(), scan_config(1));

    let report = scanner.scan(&rows, &eligible(&["Shop"]), &default_thresholds(&["Shop"]));

    assert_eq!(report.metrics.segments_scanned, 1);
    assert_eq!(report.metrics.segments_failed, 0);
    assert_eq!(report.metrics.decomposition_failures, 0);
    assert!(report.records.is_empty());
    assert!(AnomalyReporter::render(&report.records).contains("No anomalies detected"));
}

#[test]
fn test_same_day_rows_are_summed() {
    // Two rows per day; each half alone never reaches the absolute threshold.
    let mut rows = history("Shop", "ios", "login", &flat_then(40, 50, 200));
    rows.extend(history("Shop", "ios", "login", &flat_then(40, 50, 200)));
    let scanner = SegmentScanner::with_decomposer(
        detection_config(),
        scan_config(1),
        MedianDecomposer { fail_marker: None },
    );

    let report = scanner.scan(&rows, &eligible(&["Shop"]), &default_thresholds(&["Shop"]));

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].value_change_wow, 300);
    assert_eq!(report.records[0].perc_change_wow, 300);
}

#[test]
fn test_decomposition_runs_without_thresholds() {
    let rows = history("Blog", "web", "page_view", &flat_then(40, 1000, 5000));
    let scanner = SegmentScanner::with_decomposer(
        detection_config(),
        scan_config(1),
        MedianDecomposer { fail_marker: None },
    );

    let report = scanner.scan(&rows, &eligible(&["Blog"]), &ThresholdTable::new());

    assert_eq!(report.metrics.threshold_misses, 1);
    assert_eq!(report.metrics.segments_failed, 0);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].value_change_wow, 4000);
    assert_eq!(report.records[0].perc_change_wow, 400);
}

#[test]
fn test_records_sorted_and_rendered_by_property() {
    let mut rows = history("Zeta", "web", "purchase", &flat_then(40, 100, 400));
    rows.extend(history("Alpha", "web", "view_item", &flat_then(40, 100, 400)));
    rows.extend(history("Alpha", "android", "login", &flat_then(40, 100, 400)));
    rows.extend(history("Alpha", "android", "logout", &flat_then(40, 100, 100)));

    let props = ["Alpha", "Zeta"];
    let scanner = SegmentScanner::with_decomposer(
        detection_config(),
        scan_config(2),
        MedianDecomposer { fail_marker: None },
    );
    let report = scanner.scan(&rows, &eligible(&props), &default_thresholds(&props));

    let keys: Vec<(&str, &str, &str)> = report.records.iter().map(|r| r.sort_key()).collect();
    assert_eq!(
        keys,
        vec![
            ("Alpha", "android", "login"),
            ("Alpha", "web", "view_item"),
            ("Zeta", "web", "purchase"),
        ]
    );
    assert_eq!(report.metrics.segments_scanned, 4);
    assert_eq!(report.metrics.segments_clean(), 1);

    let text = AnomalyReporter::render(&report.records);
    let alpha = text.find(">Alpha").unwrap();
    let zeta = text.find(">Zeta").unwrap();
    assert!(alpha < zeta);
    assert!(text.contains("- android > login | WoW: 300 (300%)"));
}

#[test]
fn test_records_serialize_with_column_names() {
    let rows = history("Shop", "web", "view_item", &flat_then(40, 100, 400));
    let scanner = SegmentScanner::new(detection_config(), scan_config(1));
    let report = scanner.scan(&rows, &eligible(&["Shop"]), &default_thresholds(&["Shop"]));

    let json = serde_json::to_value(&report.records).unwrap();
    let first = &json[0];
    assert_eq!(first["Date"], "2024-04-10");
    assert_eq!(first["Property"], "Shop");
    assert_eq!(first["Platform"], "web");
    assert_eq!(first["event_name"], "view_item");
    assert_eq!(first["value_change_WoW"], 300);
    assert_eq!(first["perc_change_WoW"], 300);
    assert_eq!(first["is_anomalous"], true);
}
