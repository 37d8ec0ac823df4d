//! Dense daily series construction.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use eventwatch_core::{DailyPoint, DailySeries, DetectError, EventRow};

/// Builds gap-filled daily series over a fixed inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesBuilder {
    min_date: NaiveDate,
    max_date: NaiveDate,
}

impl SeriesBuilder {
    /// Returns `InvalidRange` if `min_date` is after `max_date`.
    pub fn new(min_date: NaiveDate, max_date: NaiveDate) -> Result<Self, DetectError> {
        if min_date > max_date {
            return Err(DetectError::InvalidRange {
                min: min_date,
                max: max_date,
            });
        }
        Ok(Self { min_date, max_date })
    }

    /// Number of calendar days in the range, both ends included.
    pub fn span_days(&self) -> usize {
        (self.max_date - self.min_date).num_days() as usize + 1
    }

    pub fn min_date(&self) -> NaiveDate {
        self.min_date
    }

    pub fn max_date(&self) -> NaiveDate {
        self.max_date
    }

    /// Sum counts per day and lay them out newest first, one row per day.
    ///
    /// Same-day duplicates are summed. Days with no rows get a count of 0.
    /// Rows outside the range are ignored.
    pub fn build<'a, I>(&self, rows: I) -> Result<DailySeries, DetectError>
    where
        I: IntoIterator<Item = &'a EventRow>,
    {
        let mut totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for row in rows {
            if row.date < self.min_date || row.date > self.max_date {
                continue;
            }
            *totals.entry(row.date).or_default() += row.event_count;
        }

        let mut points = Vec::with_capacity(self.span_days());
        for offset in 0..self.span_days() as u64 {
            let date = self
                .max_date
                .checked_sub_days(Days::new(offset))
                .ok_or(DetectError::InvalidRange {
                    min: self.min_date,
                    max: self.max_date,
                })?;
            points.push(DailyPoint {
                date,
                count: totals.get(&date).copied().unwrap_or(0),
            });
        }

        DailySeries::from_descending(points)
    }
}
