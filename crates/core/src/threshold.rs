use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DetectError;

/// Relative-change thresholds configured for one property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// |WoW %| must exceed this.
    pub percentage_threshold: f64,
    /// |WoW absolute change| must reach this.
    pub absolute_threshold: f64,
}

impl Thresholds {
    pub fn new(percentage_threshold: f64, absolute_threshold: f64) -> Self {
        Self {
            percentage_threshold,
            absolute_threshold,
        }
    }

    fn is_well_formed(&self) -> bool {
        self.percentage_threshold.is_finite()
            && self.absolute_threshold.is_finite()
            && self.percentage_threshold >= 0.0
            && self.absolute_threshold >= 0.0
    }
}

/// Read-only lookup of thresholds keyed by property name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdTable {
    entries: HashMap<String, Thresholds>,
}

impl ThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, property: impl Into<String>, thresholds: Thresholds) {
        self.entries.insert(property.into(), thresholds);
    }

    /// Thresholds for `property`, or `ThresholdLookup` if missing or malformed.
    pub fn get(&self, property: &str) -> Result<Thresholds, DetectError> {
        let thresholds = self
            .entries
            .get(property)
            .ok_or_else(|| DetectError::ThresholdLookup {
                property: property.to_owned(),
                reason: "no entry configured".to_string(),
            })?;

        if !thresholds.is_well_formed() {
            return Err(DetectError::ThresholdLookup {
                property: property.to_owned(),
                reason: format!(
                    "malformed values ({}, {})",
                    thresholds.percentage_threshold, thresholds.absolute_threshold
                ),
            });
        }

        Ok(*thresholds)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured property names, sorted.
    pub fn properties(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl FromIterator<(String, Thresholds)> for ThresholdTable {
    fn from_iter<I: IntoIterator<Item = (String, Thresholds)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
