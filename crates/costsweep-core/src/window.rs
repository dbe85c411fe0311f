//! Date window arithmetic for cost comparison
//!
//! The analysis compares two contiguous, non-overlapping windows that end
//! yesterday (UTC):
//!
//! ```text
//! |<---- comparison (N days) ---->|<--- recent (M days) --->| today
//! ```
//!
//! Non-positive window lengths are rejected as configuration errors rather
//! than producing an empty or inverted window.
//!
//! # Examples
//!
//! ```
//! use costsweep_core::window::compute_windows;
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//! let windows = compute_windows(today, 7, 30).unwrap();
//!
//! assert_eq!(windows.recent.end, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
//! assert_eq!(windows.recent.start, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
//! assert_eq!(windows.comparison.end, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
//! assert_eq!(windows.comparison.start, NaiveDate::from_ymd_opt(2024, 2, 7).unwrap());
//! ```

use crate::error::{CostsweepError, Result};
use chrono::{NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Inclusive, contiguous range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// First day (inclusive)
    pub start: NaiveDate,
    /// Last day (inclusive)
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window, rejecting `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(CostsweepError::InvalidDate(format!(
                "window start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Every day in the window, in ascending order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |day| *day <= self.end)
    }

    /// Number of days covered
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Whether a day falls inside the window
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// The recent and comparison windows of one analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindows {
    /// Window ending yesterday
    pub recent: DateWindow,
    /// Window ending the day before `recent` starts
    pub comparison: DateWindow,
}

fn days_before(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_sub_signed(delta))
        .ok_or_else(|| {
            CostsweepError::InvalidDate(format!("{days} days before {date} is out of range"))
        })
}

/// Compute both windows relative to `today`
///
/// # Errors
///
/// Returns a configuration error when either day count is not positive.
pub fn compute_windows(
    today: NaiveDate,
    recent_days: i64,
    comparison_days: i64,
) -> Result<AnalysisWindows> {
    if recent_days <= 0 {
        return Err(CostsweepError::Config(format!(
            "recent period must be at least 1 day, got {recent_days}"
        )));
    }
    if comparison_days <= 0 {
        return Err(CostsweepError::Config(format!(
            "comparison period must be at least 1 day, got {comparison_days}"
        )));
    }

    let recent_end = days_before(today, 1)?;
    let recent_start = days_before(recent_end, recent_days - 1)?;
    let comparison_end = days_before(recent_start, 1)?;
    let comparison_start = days_before(comparison_end, comparison_days - 1)?;

    let windows = AnalysisWindows {
        recent: DateWindow::new(recent_start, recent_end)?,
        comparison: DateWindow::new(comparison_start, comparison_end)?,
    };
    debug!(
        "Date ranges calculated: recent ({}), comparison ({})",
        windows.recent, windows.comparison
    );
    Ok(windows)
}

/// Compute both windows anchored on the current UTC date
pub fn compute_windows_from_now(recent_days: i64, comparison_days: i64) -> Result<AnalysisWindows> {
    compute_windows(Utc::now().date_naive(), recent_days, comparison_days)
}
