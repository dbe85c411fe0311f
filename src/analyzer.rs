//! End-to-end analysis orchestration
//!
//! [`Analyzer`] wires the cost-trend pipeline (windows, aggregation,
//! detection, resolution) and the orphan scan to a set of [`Backends`].
//! Production backends talk to AWS; tests plug in in-memory fakes.
//!
//! # Examples
//!
//! ```no_run
//! use costsweep::analyzer::{Analyzer, Backends};
//! use costsweep_core::AnalyzerConfig;
//!
//! # async fn example(config: AnalyzerConfig) -> costsweep_core::Result<()> {
//! let backends = Backends::from_aws(&config).await;
//! let analyzer = Analyzer::new(config, backends);
//! let report = analyzer.unused_report().await;
//! println!("{}", report.message);
//! # Ok(())
//! # }
//! ```

use aws_config::{BehaviorVersion, Region};
use chrono::{NaiveDate, Utc};
use costsweep_athena::{AthenaQueryService, QueryService, ResourceIdResolver};
use costsweep_core::config::AnalyzerConfig;
use costsweep_core::error::Result;
use costsweep_core::types::{OrphanReport, UnusedCandidate};
use costsweep_core::window::{AnalysisWindows, compute_windows};
use costsweep_network::{
    CleanupTarget, Ec2Inventory, NetworkCleaner, NetworkInventory, OrphanScanner,
    RegionDirectory, cleanup,
};
use costsweep_trend::{CostAggregator, CostObjectSource, LocalDirSource, S3CostSource, find_unused};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Message reported when no candidate survives detection
pub const NO_CANDIDATES_MESSAGE: &str = "No resource IDs to query.";

/// Remote collaborators used by an analysis run
#[derive(Clone)]
pub struct Backends {
    /// Daily cost objects
    pub cost_source: Arc<dyn CostObjectSource>,
    /// Billing query service
    pub query_service: Arc<dyn QueryService>,
    /// Region listing
    pub regions: Arc<dyn RegionDirectory>,
    /// Per-region network listings
    pub inventory: Arc<dyn NetworkInventory>,
    /// Cleanup actions
    pub cleaner: Arc<dyn NetworkCleaner>,
}

impl Backends {
    /// Build AWS-backed collaborators from the default credential chain
    ///
    /// The cost source reads from `--cost-dir` when one is configured and
    /// from the configured bucket otherwise.
    pub async fn from_aws(config: &AnalyzerConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let cost_source: Arc<dyn CostObjectSource> = match &config.storage.local_dir {
            Some(dir) => {
                info!("Reading cost files from {}", dir.display());
                Arc::new(LocalDirSource::new(dir))
            }
            None => Arc::new(S3CostSource::new(
                aws_sdk_s3::Client::new(&sdk_config),
                config.storage.bucket.clone().unwrap_or_default(),
            )),
        };
        let ec2 = Arc::new(Ec2Inventory::new(sdk_config.clone()));

        Self {
            cost_source,
            query_service: Arc::new(AthenaQueryService::new(aws_sdk_athena::Client::new(
                &sdk_config,
            ))),
            regions: ec2.clone(),
            inventory: ec2.clone(),
            cleaner: ec2,
        }
    }
}

/// Flagged service/operation pairs together with the windows compared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    /// Recent window, `YYYY-MM-DD to YYYY-MM-DD`
    pub recent_period: String,
    /// Comparison window, `YYYY-MM-DD to YYYY-MM-DD`
    pub comparison_period: String,
    /// Flagged pairs sorted by key
    pub candidates: Vec<UnusedCandidate>,
}

impl CandidateReport {
    fn new(windows: &AnalysisWindows, candidates: Vec<UnusedCandidate>) -> Self {
        Self {
            recent_period: windows.recent.to_string(),
            comparison_period: windows.comparison.to_string(),
            candidates,
        }
    }
}

/// Outcome of the cost-trend pipeline, success or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusedReport {
    /// 200 on success, 400 for configuration errors, 500 otherwise
    pub status_code: u16,
    /// Human-readable summary
    pub message: String,
    /// Recent window, when windows could be computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_period: Option<String>,
    /// Comparison window, when windows could be computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_period: Option<String>,
    /// Flagged pairs
    pub candidates: Vec<UnusedCandidate>,
    /// Resolved resource ids, sorted
    pub resource_ids: Vec<String>,
}

impl UnusedReport {
    fn failed(status_code: u16, message: String) -> Self {
        Self {
            status_code,
            message,
            recent_period: None,
            comparison_period: None,
            candidates: Vec::new(),
            resource_ids: Vec::new(),
        }
    }

    /// Whether the pipeline completed
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Full analysis result: state-based orphans plus cost-based unused ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Orphaned networking resources by region
    pub orphans: OrphanReport,
    /// Cost-trend pipeline outcome
    pub unused: UnusedReport,
}

/// Runs analyses against a fixed configuration and set of backends
pub struct Analyzer {
    config: AnalyzerConfig,
    backends: Backends,
    show_progress: bool,
}

impl Analyzer {
    /// Create an analyzer
    pub fn new(config: AnalyzerConfig, backends: Backends) -> Self {
        Self {
            config,
            backends,
            show_progress: false,
        }
    }

    /// Show progress bars while reading daily cost files
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn aggregator(&self) -> CostAggregator {
        CostAggregator::new(
            self.backends.cost_source.clone(),
            self.config.storage.file_suffix.clone(),
        )
        .with_progress(self.show_progress)
    }

    fn resolver(&self) -> ResourceIdResolver {
        ResourceIdResolver::new(
            self.backends.query_service.clone(),
            self.config.query.clone(),
        )
    }

    /// Flag collapsed service/operation pairs relative to `today`
    pub async fn candidates_at(&self, today: NaiveDate) -> Result<CandidateReport> {
        self.config.storage.validate()?;
        self.config.trend.validate()?;

        let windows = compute_windows(
            today,
            self.config.trend.recent_days,
            self.config.trend.comparison_days,
        )?;
        info!(
            "Comparing recent ({}) against comparison ({})",
            windows.recent, windows.comparison
        );

        let (recent, comparison) = self.aggregator().aggregate_windows(&windows).await;
        let candidates = find_unused(&comparison, &recent, &self.config.trend);
        Ok(CandidateReport::new(&windows, candidates))
    }

    /// [`candidates_at`](Self::candidates_at) anchored on the current UTC date
    pub async fn candidates(&self) -> Result<CandidateReport> {
        self.candidates_at(Utc::now().date_naive()).await
    }

    /// Run the full cost-trend pipeline relative to `today`
    ///
    /// Never fails: errors are folded into the report's status code and
    /// message.
    pub async fn unused_report_at(&self, today: NaiveDate) -> UnusedReport {
        match self.run_unused(today).await {
            Ok(report) => report,
            Err(e) if e.is_config_error() => {
                error!("{}", e);
                UnusedReport::failed(400, e.to_string())
            }
            Err(e) => {
                error!("Error during cost-trend analysis: {}", e);
                UnusedReport::failed(500, format!("An error occurred: {e}"))
            }
        }
    }

    /// [`unused_report_at`](Self::unused_report_at) anchored on the current UTC date
    pub async fn unused_report(&self) -> UnusedReport {
        self.unused_report_at(Utc::now().date_naive()).await
    }

    async fn run_unused(&self, today: NaiveDate) -> Result<UnusedReport> {
        self.config.validate_cost_trend()?;
        let report = self.candidates_at(today).await?;

        let (message, resource_ids) = if report.candidates.is_empty() {
            (NO_CANDIDATES_MESSAGE.to_string(), Vec::new())
        } else {
            let resolver = self.resolver();
            let ids = match self.config.query.deadline {
                Some(deadline) => {
                    resolver
                        .resolve_with_deadline(&report.candidates, deadline)
                        .await?
                }
                None => resolver.resolve(&report.candidates).await?,
            };
            (
                format!(
                    "Found {} unique resource IDs with costs for the associated services.",
                    ids.len()
                ),
                ids.into_iter().collect(),
            )
        };

        Ok(UnusedReport {
            status_code: 200,
            message,
            recent_period: Some(report.recent_period),
            comparison_period: Some(report.comparison_period),
            candidates: report.candidates,
            resource_ids,
        })
    }

    /// Scan every region for orphaned networking resources
    pub async fn orphans(&self) -> Result<OrphanReport> {
        self.config.scan.validate()?;
        OrphanScanner::new(self.backends.regions.clone(), self.backends.inventory.clone())
            .with_concurrency(self.config.scan.concurrency)
            .scan()
            .await
    }

    /// Run the orphan scan and the cost-trend pipeline concurrently
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or the region list cannot be
    /// fetched. Cost-trend failures are reported inside the result.
    pub async fn analyze_at(&self, today: NaiveDate) -> Result<AnalysisReport> {
        self.config.validate()?;
        let (orphans, unused) = tokio::join!(self.orphans(), self.unused_report_at(today));
        Ok(AnalysisReport {
            orphans: orphans?,
            unused,
        })
    }

    /// [`analyze_at`](Self::analyze_at) anchored on the current UTC date
    pub async fn analyze(&self) -> Result<AnalysisReport> {
        self.analyze_at(Utc::now().date_naive()).await
    }

    /// Delete or release a single resource
    pub async fn delete(&self, region: &str, resource_id: &str) -> Result<String> {
        let target = CleanupTarget::classify(resource_id)?;
        cleanup(self.backends.cleaner.as_ref(), region, &target).await
    }
}
