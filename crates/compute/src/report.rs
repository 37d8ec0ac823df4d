//! Human-readable anomaly summary.

use std::fmt::Write;

use eventwatch_core::AnomalyRecord;

/// Header of the anomaly section.
pub const SECTION_HEADER: &str = "Alerting on Property-Platform-event_name: \n";
/// Line emitted instead of an empty section.
pub const NO_ANOMALIES_LINE: &str = "- No anomalies detected \n \n";

/// Renders anomaly records grouped by property.
pub struct AnomalyReporter;

impl AnomalyReporter {
    /// Render `records` as text, grouped by property in sorted order.
    ///
    /// Each record becomes `- {platform} > {event_name} | WoW: {value} ({pct}%)`
    /// under a `>{property}` heading. An empty input produces an explicit
    /// no-anomalies line. The input is not modified.
    pub fn render(records: &[AnomalyRecord]) -> String {
        let mut text = String::from("\n \n");
        text.push_str(SECTION_HEADER);

        if records.is_empty() {
            text.push_str(NO_ANOMALIES_LINE);
            return text;
        }

        let mut sorted: Vec<&AnomalyRecord> = records.iter().collect();
        sorted.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut current_property: Option<&str> = None;
        for record in sorted {
            if current_property != Some(record.property.as_str()) {
                current_property = Some(record.property.as_str());
                let _ = writeln!(text, "\n>{}", record.property);
            }
            let _ = writeln!(
                text,
                "- {} > {} | WoW: {} ({}%)",
                record.platform,
                record.event_name,
                record.value_change_wow,
                format_thousands(record.perc_change_wow)
            );
        }
        text.push_str("\n \n");
        text
    }
}

/// Integer with comma thousands separators, e.g. `-12,345`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
