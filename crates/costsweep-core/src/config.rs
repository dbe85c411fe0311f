//! Analyzer configuration
//!
//! Every tunable of the pipeline lives in an explicit struct that is built
//! once (by the CLI layer, from flags and environment variables) and passed
//! into each component at construction. Nothing here is global or mutated
//! after validation.

use crate::error::{CostsweepError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Default suffix appended to `YYMMDD` to form a daily cost object key
pub const DEFAULT_FILE_SUFFIX: &str = "_sorted_costs.csv";

/// Bucket name shipped in sample deployments; never a real bucket
pub const PLACEHOLDER_BUCKET: &str = "your-cost-data-bucket-name";

/// Default billing database name
pub const DEFAULT_DATABASE: &str = "MyProgrammaticCUR";

/// Default billing table name
pub const DEFAULT_TABLE: &str = "my_programmatic_c_u_r";

/// Default cap on concurrent region scans
pub const DEFAULT_SCAN_CONCURRENCY: usize = 10;

/// Fixed delay between query state checks
pub const QUERY_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Usage-date predicate applied by the resolver query
///
/// # Examples
/// ```
/// use costsweep_core::config::QueryWindow;
/// use std::str::FromStr;
///
/// assert_eq!(QueryWindow::from_str("yesterday").unwrap(), QueryWindow::Yesterday);
/// assert_eq!(QueryWindow::default().to_string(), "trailing-week");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryWindow {
    /// Usage dated exactly one day before the query runs
    Yesterday,
    /// Usage in the seven days before the query runs, excluding today
    #[default]
    TrailingWeek,
}

impl fmt::Display for QueryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yesterday => write!(f, "yesterday"),
            Self::TrailingWeek => write!(f, "trailing-week"),
        }
    }
}

impl std::str::FromStr for QueryWindow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "yesterday" => Ok(Self::Yesterday),
            "trailing-week" | "week" | "7d" => Ok(Self::TrailingWeek),
            _ => Err(format!("Invalid query window: {s}")),
        }
    }
}

/// Where daily cost files are read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Object storage bucket holding daily cost files
    pub bucket: Option<String>,
    /// Local directory used instead of the bucket when set
    pub local_dir: Option<PathBuf>,
    /// Suffix appended to `YYMMDD`
    pub file_suffix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            local_dir: None,
            file_suffix: DEFAULT_FILE_SUFFIX.to_string(),
        }
    }
}

impl StorageConfig {
    /// Validate the storage location
    pub fn validate(&self) -> Result<()> {
        if self.file_suffix.trim().is_empty() {
            return Err(CostsweepError::Config("file suffix must not be empty".to_string()));
        }
        if self.local_dir.is_some() {
            return Ok(());
        }
        match self.bucket.as_deref().map(str::trim) {
            None | Some("") => Err(CostsweepError::Config(
                "S3_BUCKET_NAME is not set".to_string(),
            )),
            Some(bucket) if bucket.contains(PLACEHOLDER_BUCKET) => Err(CostsweepError::Config(
                format!("S3_BUCKET_NAME is still the placeholder '{bucket}'"),
            )),
            Some(_) => Ok(()),
        }
    }
}

/// Cost-trend thresholds and window lengths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Length of the recent window in days
    pub recent_days: i64,
    /// Length of the comparison window in days
    pub comparison_days: i64,
    /// Recent cost must fall below this percentage of comparison cost
    pub threshold_percentage: f64,
    /// Comparison cost must be at least this much to be considered
    pub min_comparison_cost: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            recent_days: 7,
            comparison_days: 30,
            threshold_percentage: 1.0,
            min_comparison_cost: 0.01,
        }
    }
}

impl TrendConfig {
    /// Threshold as a ratio, e.g. `1.0` percent becomes `0.01`
    pub fn threshold_ratio(&self) -> f64 {
        self.threshold_percentage / 100.0
    }

    /// Comparison floor with negative values clamped to zero
    pub fn effective_floor(&self) -> f64 {
        if self.min_comparison_cost < 0.0 {
            warn!(
                "MIN_COMPARISON_COST ({}) is negative. Using 0.0 instead.",
                self.min_comparison_cost
            );
            0.0
        } else {
            self.min_comparison_cost
        }
    }

    /// Validate window lengths and thresholds
    pub fn validate(&self) -> Result<()> {
        if self.recent_days <= 0 {
            return Err(CostsweepError::Config(format!(
                "RECENT_PERIOD_DAYS must be positive, got {}",
                self.recent_days
            )));
        }
        if self.comparison_days <= 0 {
            return Err(CostsweepError::Config(format!(
                "COMPARISON_PERIOD_DAYS must be positive, got {}",
                self.comparison_days
            )));
        }
        if !self.threshold_percentage.is_finite() || self.threshold_percentage < 0.0 {
            return Err(CostsweepError::Config(format!(
                "COST_THRESHOLD_PERCENTAGE must be a non-negative number, got {}",
                self.threshold_percentage
            )));
        }
        if !self.min_comparison_cost.is_finite() {
            return Err(CostsweepError::Config(format!(
                "MIN_COMPARISON_COST must be a finite number, got {}",
                self.min_comparison_cost
            )));
        }
        Ok(())
    }
}

/// Analytical query service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Billing database name
    pub database: String,
    /// Billing table name
    pub table: String,
    /// Where the query service writes results; required
    pub output_location: Option<String>,
    /// Usage-date predicate
    pub window: QueryWindow,
    /// Delay between state checks
    pub poll_interval: Duration,
    /// Upper bound on one resolution, unbounded when unset
    pub deadline: Option<Duration>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            output_location: None,
            window: QueryWindow::default(),
            poll_interval: QUERY_POLL_INTERVAL,
            deadline: None,
        }
    }
}

impl QueryConfig {
    /// Output location, or a configuration error when unset
    pub fn require_output_location(&self) -> Result<&str> {
        match self.output_location.as_deref().map(str::trim) {
            Some(location) if !location.is_empty() => Ok(location),
            _ => Err(CostsweepError::Config(
                "ATHENA_QUERY_OUTPUT_LOCATION is not set".to_string(),
            )),
        }
    }

    /// Validate names and output location
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(CostsweepError::Config("ATHENA_DATABASE is empty".to_string()));
        }
        if self.table.trim().is_empty() {
            return Err(CostsweepError::Config("ATHENA_TABLE is empty".to_string()));
        }
        if self.deadline.is_some_and(|deadline| deadline.is_zero()) {
            return Err(CostsweepError::Config(
                "query timeout must be greater than zero".to_string(),
            ));
        }
        let location = self.require_output_location()?;
        if !location.starts_with("s3://") {
            return Err(CostsweepError::Config(format!(
                "ATHENA_QUERY_OUTPUT_LOCATION must be an s3:// URI, got '{location}'"
            )));
        }
        Ok(())
    }
}

/// Orphan scan settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum number of regions scanned at once
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_SCAN_CONCURRENCY,
        }
    }
}

impl ScanConfig {
    /// Validate the worker cap
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(CostsweepError::Config(
                "scan concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete configuration of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Daily cost file location
    pub storage: StorageConfig,
    /// Trend thresholds
    pub trend: TrendConfig,
    /// Resolver query settings
    pub query: QueryConfig,
    /// Orphan scan settings
    pub scan: ScanConfig,
    /// Region override for the storage, query, and directory clients
    pub region: Option<String>,
}

impl AnalyzerConfig {
    /// Validate the settings needed by the cost-trend pipeline
    pub fn validate_cost_trend(&self) -> Result<()> {
        self.storage.validate()?;
        self.trend.validate()?;
        self.query.validate()
    }

    /// Validate every setting
    pub fn validate(&self) -> Result<()> {
        self.validate_cost_trend()?;
        self.scan.validate()
    }
}
