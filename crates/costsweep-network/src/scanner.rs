//! Concurrent per-region orphan scan
//!
//! One task is spawned per region on a [`JoinSet`]; a [`Semaphore`] caps how
//! many of them talk to the provider at once. A failing or panicking region
//! is reported in its own result and never affects the others. The scan
//! only returns after every region task has finished.

use crate::inventory::{NetworkInventory, RegionDirectory};
use costsweep_core::config::DEFAULT_SCAN_CONCURRENCY;
use costsweep_core::error::Result;
use costsweep_core::types::{OrphanReport, RegionScanResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Scans every region for orphaned network interfaces and addresses
pub struct OrphanScanner {
    directory: Arc<dyn RegionDirectory>,
    inventory: Arc<dyn NetworkInventory>,
    concurrency: usize,
}

impl OrphanScanner {
    /// Create a scanner with the default worker cap
    pub fn new(directory: Arc<dyn RegionDirectory>, inventory: Arc<dyn NetworkInventory>) -> Self {
        Self {
            directory,
            inventory,
            concurrency: DEFAULT_SCAN_CONCURRENCY,
        }
    }

    /// Set the maximum number of regions scanned at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// List every region and scan them all
    ///
    /// # Errors
    ///
    /// Fails only when the region list itself cannot be fetched; per-region
    /// failures end up in [`OrphanReport::errors`].
    pub async fn scan(&self) -> Result<OrphanReport> {
        let regions = self.directory.list_regions().await?;
        let results = self.scan_regions(regions).await;
        let report = OrphanReport::from_results(results);
        info!(
            "Orphan scan found {} resources ({} regions failed)",
            report.total_findings(),
            report.errors.len()
        );
        Ok(report)
    }

    /// Scan the given regions, returning one result per region sorted by name
    pub async fn scan_regions(&self, regions: Vec<String>) -> Vec<RegionScanResult> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut task_regions = HashMap::new();

        for region in regions {
            let semaphore = semaphore.clone();
            let inventory = self.inventory.clone();
            let task_region = region.clone();
            let handle = tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return RegionScanResult::failed(task_region, e.to_string()),
                };
                scan_region(inventory.as_ref(), task_region).await
            });
            task_regions.insert(handle.id(), region);
        }

        let mut results = Vec::with_capacity(task_regions.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, result)) => results.push(result),
                Err(join_error) => {
                    let region = task_regions
                        .remove(&join_error.id())
                        .unwrap_or_else(|| "unknown".to_string());
                    error!("Scan task for {} did not complete: {}", region, join_error);
                    results.push(RegionScanResult::failed(
                        region,
                        format!("scan task failed: {join_error}"),
                    ));
                }
            }
        }

        results.sort_by(|a, b| a.region.cmp(&b.region));
        results
    }
}

async fn scan_region(inventory: &dyn NetworkInventory, region: String) -> RegionScanResult {
    let (interfaces, addresses) = tokio::join!(
        inventory.available_network_interfaces(&region),
        inventory.unassociated_addresses(&region),
    );

    match (interfaces, addresses) {
        (Ok(orphaned_network_interfaces), Ok(orphaned_elastic_ips)) => RegionScanResult {
            region,
            orphaned_network_interfaces,
            orphaned_elastic_ips,
            error: None,
        },
        (Err(e), _) | (_, Err(e)) => {
            warn!("Error occurred while scanning region {}: {}", region, e);
            RegionScanResult::failed(region, e.to_string())
        }
    }
}
