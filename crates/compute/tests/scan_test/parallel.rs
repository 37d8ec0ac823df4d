use eventwatch_compute::SegmentScanner;
use eventwatch_core::EventRow;

use crate::helpers::{default_thresholds, detection_config, eligible, flat_then, history, scan_config};

/// A mix of spiking, dropping and steady segments across three properties.
fn mixed_rows() -> Vec<EventRow> {
    let mut rows = Vec::new();
    for (p, property) in ["North", "South", "West"].iter().enumerate() {
        for e in 0..8u64 {
            let base = 80 + 40 * e + 10 * p as u64;
            let last = match e % 3 {
                0 => base * 5,
                1 => base / 10,
                _ => base,
            };
            let event = format!("event_{e}");
            rows.extend(history(property, "web", &event, &flat_then(45, base, last)));
        }
    }
    rows
}

#[test]
fn test_worker_count_does_not_change_results() {
    let rows = mixed_rows();
    let props = ["North", "South", "West"];

    let serial = SegmentScanner::new(detection_config(), scan_config(1)).scan(
        &rows,
        &eligible(&props),
        &default_thresholds(&props),
    );
    let parallel = SegmentScanner::new(detection_config(), scan_config(4)).scan(
        &rows,
        &eligible(&props),
        &default_thresholds(&props),
    );

    assert_eq!(serial.metrics.segments_scanned, 24);
    assert_eq!(parallel.metrics.segments_scanned, 24);
    assert_eq!(serial.records, parallel.records);
    assert_ne!(serial.run_id, parallel.run_id);
}
