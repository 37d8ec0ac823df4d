//! The two independent anomaly tests.
//!
//! Both take a [`DailySeries`](eventwatch_core::DailySeries) and nothing else
//! about the segment; they are composed only by the scanner.

pub mod decomposition;
pub mod relative_change;
pub mod stats;
