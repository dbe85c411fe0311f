//! Shared test utilities for unit tests
//!
//! Integration tests in the workspace root keep their own builders in
//! tests/common/mod.rs since this module is only compiled for unit tests.

use crate::types::CostAggregate;
use chrono::NaiveDate;

/// Build a date, panicking on invalid input
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Build an aggregate from `(key, cost)` pairs
pub fn aggregate(entries: &[(&str, f64)]) -> CostAggregate {
    entries
        .iter()
        .map(|(key, cost)| (key.to_string(), *cost))
        .collect()
}
