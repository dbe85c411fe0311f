//! CLI interface for costsweep
//!
//! Every setting is a global flag with an environment variable fallback, so
//! the same binary works interactively and from a scheduled job:
//!
//! ```bash
//! # Cost-trend candidates only, from a local copy of the daily files
//! costsweep candidates --cost-dir ./costs --recent-days 7 --comparison-days 30
//!
//! # Full analysis as JSON
//! S3_BUCKET_NAME=day-by-day ATHENA_QUERY_OUTPUT_LOCATION=s3://athena-results/ costsweep analyze --json
//!
//! # Event-style invocation
//! echo '{"operation":"delete","region":"us-east-1","resource_id":"eni-0abc"}' | costsweep invoke
//! ```

use clap::{Args, Parser, Subcommand};
use costsweep_core::config::{
    AnalyzerConfig, DEFAULT_DATABASE, DEFAULT_FILE_SUFFIX, DEFAULT_SCAN_CONCURRENCY, DEFAULT_TABLE,
    QUERY_POLL_INTERVAL, QueryConfig, QueryWindow, ScanConfig, StorageConfig, TrendConfig,
};
use std::path::PathBuf;
use std::time::Duration;

/// Find idle AWS resources from cost trends and orphaned network state
#[derive(Parser, Debug, Clone)]
#[command(name = "costsweep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only show warnings and errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Log filter, e.g. "debug" or "costsweep=trace" (overrides RUST_LOG)
    #[arg(long, env = "LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(flatten)]
    pub settings: Settings,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Analysis settings shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Bucket holding daily cost files
    #[arg(long, env = "S3_BUCKET_NAME", global = true)]
    pub bucket: Option<String>,

    /// Read daily cost files from a local directory instead of the bucket
    #[arg(long, global = true)]
    pub cost_dir: Option<PathBuf>,

    /// Suffix appended to YYMMDD to form a daily cost file name
    #[arg(long, env = "FILE_SUFFIX", default_value = DEFAULT_FILE_SUFFIX, global = true)]
    pub file_suffix: String,

    /// Length of the recent window in days
    #[arg(
        long,
        env = "RECENT_PERIOD_DAYS",
        allow_negative_numbers = true,
        default_value_t = 7,
        global = true,
    )]
    pub recent_days: i64,

    /// Length of the comparison window in days
    #[arg(
        long,
        env = "COMPARISON_PERIOD_DAYS",
        allow_negative_numbers = true,
        default_value_t = 30,
        global = true,
    )]
    pub comparison_days: i64,

    /// Flag pairs whose recent cost is below this percentage of the comparison cost
    #[arg(
        long,
        env = "COST_THRESHOLD_PERCENTAGE",
        allow_negative_numbers = true,
        default_value_t = 1.0,
        global = true,
    )]
    pub threshold_percentage: f64,

    /// Ignore pairs whose comparison cost is below this amount
    #[arg(
        long,
        env = "MIN_COMPARISON_COST",
        allow_negative_numbers = true,
        default_value_t = 0.01,
        global = true,
    )]
    pub min_comparison_cost: f64,

    /// Billing database
    #[arg(long, env = "ATHENA_DATABASE", default_value = DEFAULT_DATABASE, global = true)]
    pub database: String,

    /// Billing table
    #[arg(long, env = "ATHENA_TABLE", default_value = DEFAULT_TABLE, global = true)]
    pub table: String,

    /// S3 location for query results
    #[arg(long, env = "ATHENA_QUERY_OUTPUT_LOCATION", global = true)]
    pub output_location: Option<String>,

    /// Usage dates covered by the resource id query (yesterday, trailing-week)
    #[arg(long, env = "QUERY_WINDOW", default_value_t = QueryWindow::TrailingWeek, global = true)]
    pub query_window: QueryWindow,

    /// Abort resource id resolution after this many seconds
    #[arg(long, env = "QUERY_TIMEOUT_SECONDS", global = true)]
    pub query_timeout: Option<u64>,

    /// AWS region for the storage, query, and region-listing clients
    #[arg(long, env = "AWS_REGION", global = true)]
    pub aws_region: Option<String>,

    /// Maximum number of regions scanned at once
    #[arg(
        long,
        env = "SCAN_CONCURRENCY",
        default_value_t = DEFAULT_SCAN_CONCURRENCY,
        global = true,
    )]
    pub scan_concurrency: usize,
}

impl Settings {
    /// Build the analysis configuration
    pub fn to_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            storage: StorageConfig {
                bucket: self.bucket.clone(),
                local_dir: self.cost_dir.clone(),
                file_suffix: self.file_suffix.clone(),
            },
            trend: TrendConfig {
                recent_days: self.recent_days,
                comparison_days: self.comparison_days,
                threshold_percentage: self.threshold_percentage,
                min_comparison_cost: self.min_comparison_cost,
            },
            query: QueryConfig {
                database: self.database.clone(),
                table: self.table.clone(),
                output_location: self.output_location.clone(),
                window: self.query_window,
                poll_interval: QUERY_POLL_INTERVAL,
                deadline: self.query_timeout.map(Duration::from_secs),
            },
            scan: ScanConfig {
                concurrency: self.scan_concurrency,
            },
            region: self.aws_region.clone(),
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scan for orphaned network resources and resolve unused resources by cost trend
    Analyze,

    /// Run the cost-trend pipeline and resolve resource ids
    Unused,

    /// Flag service/operation pairs with collapsed spend without querying for ids
    Candidates,

    /// Scan every region for detached network interfaces and unassociated elastic IPs
    Orphans,

    /// Delete a network interface or release an elastic IP
    Delete {
        /// Region of the resource
        #[arg(long)]
        region: String,

        /// Resource id (eni-... or eipalloc-...)
        #[arg(long)]
        resource_id: String,
    },

    /// Handle a JSON invocation event and print the JSON response
    Invoke {
        /// Event JSON; read from stdin when omitted
        #[arg(long)]
        event: Option<String>,
    },
}
