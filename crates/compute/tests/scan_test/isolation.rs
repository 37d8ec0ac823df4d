use eventwatch_compute::SegmentScanner;

use crate::helpers::{
    default_thresholds, detection_config, eligible, flat_then, history, scan_config,
    MedianDecomposer,
};

const MARKER: u64 = 777;

fn failing_scanner(workers: usize) -> SegmentScanner<MedianDecomposer> {
    SegmentScanner::with_decomposer(
        detection_config(),
        scan_config(workers),
        MedianDecomposer {
            fail_marker: Some(MARKER as f64),
        },
    )
}

#[test]
fn test_decomposition_failure_keeps_relative_change_test() {
    // Fit fails, but +677 week over week still trips the thresholds.
    let rows = history("Shop", "web", "add_to_cart", &flat_then(40, 100, MARKER));
    let report = failing_scanner(1).scan(&rows, &eligible(&["Shop"]), &default_thresholds(&["Shop"]));

    assert_eq!(report.metrics.decomposition_failures, 1);
    assert_eq!(report.metrics.segments_failed, 0);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].value_change_wow, 677);
    assert_eq!(report.records[0].perc_change_wow, 677);
}

#[test]
fn test_one_failing_segment_does_not_affect_others() {
    let mut rows = history("Shop", "web", "broken", &flat_then(40, 770, MARKER));
    rows.extend(history("Shop", "web", "spiking", &flat_then(40, 100, 400)));
    rows.extend(history("Shop", "ios", "steady", &flat_then(40, 250, 250)));

    let report = failing_scanner(3).scan(&rows, &eligible(&["Shop"]), &default_thresholds(&["Shop"]));

    assert_eq!(report.metrics.segments_scanned, 3);
    assert_eq!(report.metrics.decomposition_failures, 1);
    assert_eq!(report.metrics.segments_failed, 0);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].event_name, "spiking");
}

#[test]
fn test_missing_threshold_only_affects_its_property() {
    let mut rows = history("Known", "web", "view_item", &flat_then(40, 100, 400));
    rows.extend(history("Unknown", "web", "view_item", &flat_then(40, 100, 400)));

    let report = failing_scanner(2).scan(
        &rows,
        &eligible(&["Known", "Unknown"]),
        &default_thresholds(&["Known"]),
    );

    assert_eq!(report.metrics.segments_scanned, 2);
    assert_eq!(report.metrics.threshold_misses, 1);
    assert_eq!(report.metrics.segments_failed, 0);
    assert!(report.records.iter().any(|r| r.property == "Known"));
}
