//! Cost-decay detection
//!
//! A `service::operation` pair is flagged as potentially unused when its
//! baseline spend was meaningful but its recent spend fell below a small
//! fraction of that baseline while remaining non-zero.
//!
//! For a key with comparison cost `c` and recent cost `r`, given a threshold
//! ratio `t` and a floor `f`, the key is a candidate iff
//! `c >= f`, `r > 0` and `r < c * t`. Keys that appear only in the recent
//! window are never candidates.

use costsweep_core::config::TrendConfig;
use costsweep_core::types::{CostAggregate, UnusedCandidate};
use tracing::{debug, info};

/// Compare two window aggregates and return the collapsed pairs, sorted by key
///
/// # Examples
/// ```
/// use costsweep_core::config::TrendConfig;
/// use costsweep_core::types::CostAggregate;
/// use costsweep_trend::find_unused;
///
/// let comparison: CostAggregate = [("EC2::RunInstances".to_string(), 100.0)].into_iter().collect();
/// let recent: CostAggregate = [("EC2::RunInstances".to_string(), 0.5)].into_iter().collect();
///
/// let candidates = find_unused(&comparison, &recent, &TrendConfig::default());
/// assert_eq!(candidates.len(), 1);
/// assert_eq!(candidates[0].recent_cost, 0.5);
/// ```
pub fn find_unused(
    comparison: &CostAggregate,
    recent: &CostAggregate,
    trend: &TrendConfig,
) -> Vec<UnusedCandidate> {
    let ratio = trend.threshold_ratio();
    let floor = trend.effective_floor();

    let mut candidates: Vec<UnusedCandidate> = comparison
        .iter()
        .filter(|(_, comparison_cost)| *comparison_cost >= floor)
        .filter_map(|(key, comparison_cost)| {
            let recent_cost = recent.get(key).unwrap_or(0.0);
            if recent_cost <= 0.0 || recent_cost >= comparison_cost * ratio {
                return None;
            }
            debug!(
                "{} dropped to {:.4} from a baseline of {:.4}",
                key, recent_cost, comparison_cost
            );
            Some(UnusedCandidate {
                resource_key: key.to_string(),
                comparison_cost,
                recent_cost,
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.resource_key.cmp(&b.resource_key));
    info!(
        "Found {} potentially unused service/operation pairs (threshold {}%, floor {})",
        candidates.len(),
        trend.threshold_percentage,
        floor
    );
    candidates
}
