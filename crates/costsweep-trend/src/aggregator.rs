//! Daily cost aggregation
//!
//! One cost object exists per calendar day, keyed `YYMMDD` followed by a
//! configurable suffix. Each object is a CSV file with a header row naming
//! (in any order and case) the `service`, `operation`, and `cost` columns.
//!
//! Aggregation tolerates partial data: missing days contribute nothing,
//! unreadable files and malformed rows are logged and skipped. It never
//! fails because of the data it reads.
//!
//! # Examples
//!
//! ```no_run
//! use costsweep_core::window::compute_windows_from_now;
//! use costsweep_trend::{CostAggregator, LocalDirSource};
//! use std::sync::Arc;
//!
//! # async fn example() -> costsweep_core::Result<()> {
//! let windows = compute_windows_from_now(7, 30)?;
//! let aggregator = CostAggregator::new(Arc::new(LocalDirSource::new("./costs")), "_sorted_costs.csv");
//! let (recent, comparison) = aggregator.aggregate_windows(&windows).await;
//! println!("{} recent keys, {} baseline keys", recent.len(), comparison.len());
//! # Ok(())
//! # }
//! ```

use crate::source::CostObjectSource;
use chrono::NaiveDate;
use costsweep_core::types::{CostAggregate, CostRecord};
use costsweep_core::window::{AnalysisWindows, DateWindow};
use futures::StreamExt;
use futures::stream::Stream;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Object key for one day's cost file
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use costsweep_trend::object_key;
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// assert_eq!(object_key(day, "_sorted_costs.csv"), "240305_sorted_costs.csv");
/// ```
pub fn object_key(day: NaiveDate, suffix: &str) -> String {
    format!("{}{}", day.format("%y%m%d"), suffix)
}

struct ColumnLayout {
    service: usize,
    operation: usize,
    cost: usize,
}

impl ColumnLayout {
    fn resolve(headers: &csv::StringRecord) -> Option<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };
        Some(Self {
            service: position("service")?,
            operation: position("operation")?,
            cost: position("cost")?,
        })
    }

    fn min_columns(&self) -> usize {
        self.service.max(self.operation).max(self.cost) + 1
    }
}

/// Parse one daily cost file into records
///
/// Rows with too few columns or an unparseable, negative, or non-finite
/// cost are skipped with a warning. A file missing one of the required
/// columns yields no records.
pub fn parse_cost_file(content: &str, key: &str) -> Vec<CostRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let layout = match reader.headers() {
        Ok(headers) => match ColumnLayout::resolve(headers) {
            Some(layout) => layout,
            None => {
                warn!(
                    "Skipping {}: header must contain service, operation and cost columns (found: {:?})",
                    key,
                    headers.iter().collect::<Vec<_>>()
                );
                return Vec::new();
            }
        },
        Err(e) => {
            warn!("Skipping {}: unreadable header: {}", key, e);
            return Vec::new();
        }
    };

    let min_columns = layout.min_columns();
    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping {} line {}: {}", key, line, e);
                continue;
            }
        };
        if row.len() < min_columns {
            warn!(
                "Skipping {} line {}: expected at least {} columns, found {}",
                key,
                line,
                min_columns,
                row.len()
            );
            continue;
        }

        let raw_cost = row[layout.cost].trim();
        let cost = match raw_cost.parse::<f64>() {
            Ok(cost) if cost.is_finite() && cost >= 0.0 => cost,
            _ => {
                warn!("Skipping {} line {}: invalid cost '{}'", key, line, raw_cost);
                continue;
            }
        };

        records.push(CostRecord::new(
            row[layout.service].trim(),
            row[layout.operation].trim(),
            cost,
        ));
    }
    records
}

/// Records read from one day's cost object
#[derive(Debug, Clone)]
pub struct DailyCosts {
    /// Calendar day the object covers
    pub day: NaiveDate,
    /// Parsed rows
    pub records: Vec<CostRecord>,
}

/// Folds daily cost objects over a date window
pub struct CostAggregator {
    source: Arc<dyn CostObjectSource>,
    file_suffix: String,
    progress: Option<MultiProgress>,
}

impl CostAggregator {
    /// Create an aggregator over `source` using `file_suffix` for object keys
    pub fn new(source: Arc<dyn CostObjectSource>, file_suffix: impl Into<String>) -> Self {
        Self {
            source,
            file_suffix: file_suffix.into(),
            progress: None,
        }
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.progress = show_progress.then(MultiProgress::new);
        self
    }

    fn progress_bar(&self, window: &DateWindow, label: &str) -> Option<ProgressBar> {
        let multi = self.progress.as_ref()?;
        let pb = multi.add(ProgressBar::new(window.len_days().max(0) as u64));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} days")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(format!("Loading {label} costs"));
        Some(pb)
    }

    /// Stream the parsed cost objects of every day in `window`
    ///
    /// Days without an object and days whose object cannot be read are
    /// logged and produce no item.
    pub fn load_daily_costs<'a>(
        &'a self,
        window: DateWindow,
        label: &'a str,
    ) -> impl Stream<Item = DailyCosts> + 'a {
        async_stream::stream! {
            let progress = self.progress_bar(&window, label);
            for day in window.days() {
                let key = object_key(day, &self.file_suffix);
                let fetched = self.source.fetch(&key).await;
                if let Some(ref pb) = progress {
                    pb.inc(1);
                }
                match fetched {
                    Ok(Some(content)) => {
                        let records = parse_cost_file(&content, &key);
                        debug!("Read {} records from {}", records.len(), key);
                        yield DailyCosts { day, records };
                    }
                    Ok(None) => {
                        info!("Cost file {} not found in {}", key, self.source.location());
                    }
                    Err(e) => {
                        error!("Failed to read cost file {}: {}", key, e);
                    }
                }
            }
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }
        }
    }

    /// Sum every record in `window` by `service::operation`
    pub async fn aggregate(&self, window: DateWindow, label: &str) -> CostAggregate {
        info!("Aggregating {} costs for {}", label, window);
        let aggregate = self
            .load_daily_costs(window, label)
            .fold(CostAggregate::new(), |mut acc, daily| async move {
                for record in &daily.records {
                    acc.add(record);
                }
                acc
            })
            .await;
        debug!(
            "{} window: {} keys, total {:.4}",
            label,
            aggregate.len(),
            aggregate.total()
        );
        aggregate
    }

    /// Aggregate the recent and comparison windows concurrently
    ///
    /// Returns `(recent, comparison)`.
    pub async fn aggregate_windows(
        &self,
        windows: &AnalysisWindows,
    ) -> (CostAggregate, CostAggregate) {
        futures::join!(
            self.aggregate(windows.recent, "recent"),
            self.aggregate(windows.comparison, "comparison"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use costsweep_core::error::{CostsweepError, Result};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SUFFIX: &str = "_sorted_costs.csv";

    #[derive(Default)]
    struct MemorySource {
        objects: HashMap<String, String>,
        broken: Vec<String>,
        fetches: AtomicUsize,
    }

    impl MemorySource {
        fn with(mut self, day: NaiveDate, content: &str) -> Self {
            self.objects.insert(object_key(day, SUFFIX), content.to_string());
            self
        }

        fn broken(mut self, day: NaiveDate) -> Self {
            self.broken.push(object_key(day, SUFFIX));
            self
        }
    }

    #[async_trait]
    impl CostObjectSource for MemorySource {
        async fn fetch(&self, key: &str) -> Result<Option<String>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.broken.iter().any(|k| k == key) {
                return Err(CostsweepError::Storage {
                    key: key.to_string(),
                    message: "AccessDenied".to_string(),
                });
            }
            Ok(self.objects.get(key).cloned())
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_case_insensitive_headers_any_order() {
        let content = "Cost,SERVICE,Operation\n1.25,AmazonEC2,RunInstances\n0.5,AmazonS3,PutObject\n";
        let records = parse_cost_file(content, "test");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], CostRecord::new("AmazonEC2", "RunInstances", 1.25));
        assert_eq!(records[1], CostRecord::new("AmazonS3", "PutObject", 0.5));
    }

    #[test]
    fn test_parse_missing_column_skips_file() {
        let content = "service,cost\nAmazonEC2,1.0\n";
        assert!(parse_cost_file(content, "test").is_empty());
    }

    #[test]
    fn test_parse_skips_bad_rows() {
        let content = "service,operation,cost\n\
                       AmazonEC2,RunInstances,abc\n\
                       AmazonEC2\n\
                       AmazonEC2,RunInstances,-2.0\n\
                       AmazonEC2,RunInstances,NaN\n\
                       AmazonEC2,RunInstances,inf\n\
                       AmazonEC2,RunInstances, 3.0 \n";
        let records = parse_cost_file(content, "test");
        assert_eq!(records, vec![CostRecord::new("AmazonEC2", "RunInstances", 3.0)]);
    }

    #[test]
    fn test_parse_credit_rows_do_not_offset_usage() {
        let content = "service,operation,cost\n\
                       AmazonEC2,RunInstances,10.0\n\
                       AmazonEC2,RunInstances,-9.5\n";
        let mut aggregate = CostAggregate::new();
        for record in parse_cost_file(content, "credits") {
            aggregate.add(&record);
        }
        assert_eq!(aggregate.get("AmazonEC2::RunInstances"), Some(10.0));
    }

    #[test]
    fn test_parse_extra_columns_ignored() {
        let content = "region,service,operation,cost,currency\nus-east-1,AmazonRDS,CreateDBInstance,4.0,USD\n";
        let records = parse_cost_file(content, "test");
        assert_eq!(records, vec![CostRecord::new("AmazonRDS", "CreateDBInstance", 4.0)]);
    }

    #[test]
    fn test_parse_empty_file() {
        assert!(parse_cost_file("", "test").is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_sums_across_days() {
        let source = MemorySource::default()
            .with(date(2024, 1, 1), "service,operation,cost\nEC2,RunInstances,1.0\nS3,PutObject,0.25\n")
            .with(date(2024, 1, 2), "service,operation,cost\nEC2,RunInstances,2.0\n");
        let aggregator = CostAggregator::new(Arc::new(source), SUFFIX);
        let window = DateWindow::new(date(2024, 1, 1), date(2024, 1, 3)).unwrap();

        let aggregate = aggregator.aggregate(window, "recent").await;
        assert_eq!(aggregate.get("EC2::RunInstances"), Some(3.0));
        assert_eq!(aggregate.get("S3::PutObject"), Some(0.25));
    }

    #[tokio::test]
    async fn test_aggregate_visits_every_day_and_survives_read_errors() {
        let source = Arc::new(
            MemorySource::default()
                .with(date(2024, 1, 1), "service,operation,cost\nEC2,RunInstances,1.0\n")
                .broken(date(2024, 1, 2))
                .with(date(2024, 1, 3), "service,operation,cost\nEC2,RunInstances,1.0\n"),
        );
        let aggregator = CostAggregator::new(source.clone(), SUFFIX);
        let window = DateWindow::new(date(2024, 1, 1), date(2024, 1, 5)).unwrap();

        let aggregate = aggregator.aggregate(window, "comparison").await;
        assert_eq!(aggregate.get("EC2::RunInstances"), Some(2.0));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_aggregate_windows_keeps_windows_apart() {
        let windows = costsweep_core::window::compute_windows(date(2024, 1, 10), 2, 3).unwrap();
        let source = MemorySource::default()
            .with(windows.recent.end, "service,operation,cost\nEC2,RunInstances,0.5\n")
            .with(windows.comparison.start, "service,operation,cost\nEC2,RunInstances,100.0\n");
        let aggregator = CostAggregator::new(Arc::new(source), SUFFIX);

        let (recent, comparison) = aggregator.aggregate_windows(&windows).await;
        assert_eq!(recent.get("EC2::RunInstances"), Some(0.5));
        assert_eq!(comparison.get("EC2::RunInstances"), Some(100.0));
    }

    #[tokio::test]
    async fn test_daily_stream_skips_missing_days() {
        let source = MemorySource::default()
            .with(date(2024, 2, 29), "service,operation,cost\nEC2,RunInstances,1.0\n");
        let aggregator = CostAggregator::new(Arc::new(source), SUFFIX);
        let window = DateWindow::new(date(2024, 2, 28), date(2024, 3, 1)).unwrap();

        let days: Vec<_> = aggregator
            .load_daily_costs(window, "recent")
            .map(|daily| daily.day)
            .collect()
            .await;
        assert_eq!(days, vec![date(2024, 2, 29)]);
    }
}
