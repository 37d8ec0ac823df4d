use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DetectError;
use crate::event::Segment;

/// A single (date, count) observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub count: u64,
}

/// Dense daily series for one segment, most recent day first.
///
/// Offset 0 is the newest day, offset 1 the day before, and so on. Every
/// calendar day of the covered range is present exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DailyPoint>", into = "Vec<DailyPoint>")]
pub struct DailySeries {
    points: Vec<DailyPoint>,
}

impl TryFrom<Vec<DailyPoint>> for DailySeries {
    type Error = DetectError;

    fn try_from(points: Vec<DailyPoint>) -> Result<Self, Self::Error> {
        Self::from_descending(points)
    }
}

impl From<DailySeries> for Vec<DailyPoint> {
    fn from(series: DailySeries) -> Self {
        series.points
    }
}

impl DailySeries {
    /// Wrap points that are already dense and sorted newest first.
    ///
    /// Returns `InsufficientHistory` for an empty input and `InvalidRange` if
    /// the points do not step back exactly one day at a time.
    pub fn from_descending(points: Vec<DailyPoint>) -> Result<Self, DetectError> {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Err(DetectError::InsufficientHistory {
                needed: 1,
                actual: 0,
            });
        };
        let dense = points
            .windows(2)
            .all(|w| w[0].date.pred_opt() == Some(w[1].date));
        if !dense {
            return Err(DetectError::InvalidRange {
                min: last.date,
                max: first.date,
            });
        }
        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    /// The newest date in the series.
    pub fn latest_date(&self) -> NaiveDate {
        // Non-empty by construction.
        self.points[0].date
    }

    pub fn earliest_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    /// Count `offset` days before the newest day.
    pub fn value_at(&self, offset: usize) -> Result<u64, DetectError> {
        self.points
            .get(offset)
            .map(|p| p.count)
            .ok_or(DetectError::InsufficientHistory {
                needed: offset + 1,
                actual: self.points.len(),
            })
    }

    /// Counts in chronological order (oldest first), as floats.
    pub fn chronological_values(&self) -> Vec<f64> {
        self.points.iter().rev().map(|p| p.count as f64).collect()
    }

    /// Dates in chronological order (oldest first).
    pub fn chronological_dates(&self) -> Vec<NaiveDate> {
        self.points.iter().rev().map(|p| p.date).collect()
    }

    /// Mean count over the `days` most recent days (or the whole series if shorter).
    pub fn recent_mean(&self, days: usize) -> f64 {
        let window = &self.points[..days.min(self.points.len())];
        if window.is_empty() {
            return 0.0;
        }
        window.iter().map(|p| p.count as f64).sum::<f64>() / window.len() as f64
    }
}

/// A segment paired with its dense series, ready for scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentTask {
    pub segment: Segment,
    pub series: DailySeries,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn series(counts: &[u64]) -> DailySeries {
        // counts[0] is the newest day, 2024-04-20.
        let points = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| DailyPoint {
                date: day(20 - i as u32),
                count,
            })
            .collect();
        DailySeries::from_descending(points).unwrap()
    }

    #[test]
    fn value_at_offsets() {
        let s = series(&[5, 4, 3]);
        assert_eq!(s.value_at(0).unwrap(), 5);
        assert_eq!(s.value_at(2).unwrap(), 3);
        assert_eq!(
            s.value_at(7),
            Err(DetectError::InsufficientHistory { needed: 8, actual: 3 })
        );
    }

    #[test]
    fn chronological_order_is_reversed() {
        let s = series(&[5, 4, 3]);
        assert_eq!(s.chronological_values(), vec![3.0, 4.0, 5.0]);
        assert_eq!(s.chronological_dates()[0], day(18));
        assert_eq!(s.latest_date(), day(20));
        assert_eq!(s.earliest_date(), day(18));
    }

    #[test]
    fn recent_mean_clamps_window() {
        let s = series(&[10, 20, 30, 40]);
        assert!((s.recent_mean(2) - 15.0).abs() < 1e-9);
        assert!((s.recent_mean(30) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn gaps_are_rejected() {
        let points = vec![
            DailyPoint { date: day(20), count: 1 },
            DailyPoint { date: day(18), count: 1 },
        ];
        assert!(matches!(
            DailySeries::from_descending(points),
            Err(DetectError::InvalidRange { .. })
        ));
    }

    #[test]
    fn deserialize_validates_density() {
        let s = series(&[7, 8]);
        let json = serde_json::to_string(&s).unwrap();
        let back: DailySeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);

        let gappy = r#"[{"date":"2024-04-20","count":1},{"date":"2024-04-17","count":1}]"#;
        assert!(serde_json::from_str::<DailySeries>(gappy).is_err());
        assert!(serde_json::from_str::<DailySeries>("[]").is_err());
    }

    #[test]
    fn empty_is_rejected() {
        assert!(DailySeries::from_descending(Vec::new()).is_err());
    }
}
