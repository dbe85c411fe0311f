//! Candidate-to-resource-id resolution
//!
//! Resolution runs one query per call:
//!
//! 1. Reduce candidates to their distinct services. No services, no query.
//! 2. Submit the billing query and poll its state at a fixed interval until
//!    it reaches a terminal state.
//! 3. Page through the results, skipping the first row of every page, and
//!    collect the first column of each remaining row.
//!
//! The poll loop has no deadline of its own; wrap the call with
//! [`ResourceIdResolver::resolve_with_deadline`] to bound it.

use crate::query::{build_query, extract_services};
use crate::service::{QueryService, QueryState};
use costsweep_core::config::QueryConfig;
use costsweep_core::error::{CostsweepError, Result};
use costsweep_core::types::{ResourceIdSet, UnusedCandidate};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Resolves unused candidates to concrete resource identifiers
pub struct ResourceIdResolver {
    service: Arc<dyn QueryService>,
    config: QueryConfig,
}

impl ResourceIdResolver {
    /// Create a resolver over `service`
    pub fn new(service: Arc<dyn QueryService>, config: QueryConfig) -> Self {
        Self { service, config }
    }

    /// Override the delay between state checks
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Resolve candidates to the distinct resource ids that accrued cost
    ///
    /// # Errors
    ///
    /// Returns an error when the query service rejects a call or the query
    /// ends in `FAILED` or `CANCELLED`.
    pub async fn resolve(&self, candidates: &[UnusedCandidate]) -> Result<ResourceIdSet> {
        let services = extract_services(candidates);
        let Some(sql) = build_query(
            &self.config.database,
            &self.config.table,
            &services,
            self.config.window,
        ) else {
            info!("No services to query");
            return Ok(ResourceIdSet::new());
        };
        let output_location = self.config.require_output_location()?;

        debug!("Resource id query:\n{}", sql);
        let execution_id = self
            .service
            .start_query(&sql, &self.config.database, output_location)
            .await?;
        info!(
            "Started query {} for {} services ({} window)",
            execution_id,
            services.len(),
            self.config.window
        );

        self.wait_for_completion(&execution_id).await?;
        let ids = self.collect_ids(&execution_id).await?;
        info!("Query {} returned {} resource ids", execution_id, ids.len());
        Ok(ids)
    }

    /// [`resolve`](Self::resolve) bounded by `deadline`
    pub async fn resolve_with_deadline(
        &self,
        candidates: &[UnusedCandidate],
        deadline: Duration,
    ) -> Result<ResourceIdSet> {
        tokio::time::timeout(deadline, self.resolve(candidates))
            .await
            .map_err(|_| CostsweepError::Timeout(deadline))?
    }

    async fn wait_for_completion(&self, execution_id: &str) -> Result<()> {
        loop {
            let status = self.service.query_status(execution_id).await?;
            match status.state {
                QueryState::Succeeded => return Ok(()),
                QueryState::Failed | QueryState::Cancelled => {
                    return Err(CostsweepError::QueryFailed {
                        state: status.state.to_string(),
                        reason: status
                            .reason
                            .unwrap_or_else(|| "Unknown reason".to_string()),
                    });
                }
                state => {
                    debug!("Query {} is {}", execution_id, state);
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    async fn collect_ids(&self, execution_id: &str) -> Result<ResourceIdSet> {
        let mut ids = ResourceIdSet::new();
        let mut next_token = None;
        let mut page_number = 0usize;

        loop {
            let page = self.service.result_page(execution_id, next_token).await?;
            page_number += 1;
            debug!("Result page {} has {} rows", page_number, page.rows.len());

            // Row 0 of each page is treated as a header
            for row in page.rows.into_iter().skip(1) {
                match row.into_iter().next().flatten() {
                    Some(id) if !id.is_empty() => {
                        ids.insert(id);
                    }
                    Some(_) => {}
                    None => warn!("Skipping result row without a resource id column"),
                }
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }
        Ok(ids)
    }
}
