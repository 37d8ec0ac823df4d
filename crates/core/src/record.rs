use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One anomalous segment in a run's output.
///
/// Field names match the tabular output columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Property")]
    pub property: String,
    #[serde(rename = "Platform")]
    pub platform: String,
    pub event_name: String,
    #[serde(rename = "value_change_WoW")]
    pub value_change_wow: i64,
    #[serde(rename = "perc_change_WoW")]
    pub perc_change_wow: i64,
    #[serde(rename = "value_change_DoD")]
    pub value_change_dod: i64,
    #[serde(rename = "perc_change_DoD")]
    pub perc_change_dod: i64,
    pub is_anomalous: bool,
}

impl AnomalyRecord {
    /// Sort key used for reports: (property, platform, event_name).
    pub fn sort_key(&self) -> (&str, &str, &str) {
        (&self.property, &self.platform, &self.event_name)
    }
}
