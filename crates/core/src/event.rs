use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One raw input row: the count of a named event on one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRow {
    pub date: NaiveDate,
    pub property: String,
    pub platform: String,
    pub event_name: String,
    pub event_count: u64,
}

impl EventRow {
    pub fn segment(&self) -> Segment {
        Segment::new(&self.property, &self.platform, &self.event_name)
    }
}

/// The unit of anomaly checking: a (property, platform, event name) triple.
///
/// Ordering is lexicographic on the triple, which is also the report order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Segment {
    pub property: String,
    pub platform: String,
    pub event_name: String,
}

impl Segment {
    pub fn new(property: &str, platform: &str, event_name: &str) -> Self {
        Self {
            property: property.to_owned(),
            platform: platform.to_owned(),
            event_name: event_name.to_owned(),
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {} - {}", self.property, self.platform, self.event_name)
    }
}
