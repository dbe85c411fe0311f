//! Core domain types for costsweep
//!
//! These types carry data between pipeline stages. Each stage owns the value
//! it produces and hands it by value to the next one.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Separator between service and operation in a resource key
pub const KEY_SEPARATOR: &str = "::";

/// One `(service, operation, cost)` observation for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    /// Billing service name, e.g. `AmazonEC2`
    pub service: String,
    /// Billing operation name, e.g. `RunInstances`
    pub operation: String,
    /// Cost in USD, finite and non-negative
    pub cost: f64,
}

impl CostRecord {
    /// Create a new CostRecord
    pub fn new(service: impl Into<String>, operation: impl Into<String>, cost: f64) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
            cost,
        }
    }

    /// Aggregation key in `service::operation` form
    pub fn resource_key(&self) -> String {
        format!("{}{KEY_SEPARATOR}{}", self.service, self.operation)
    }
}

/// Accumulated cost per `service::operation` key over one date window
///
/// # Examples
/// ```
/// use costsweep_core::types::{CostAggregate, CostRecord};
///
/// let mut agg = CostAggregate::new();
/// agg.add(&CostRecord::new("AmazonEC2", "RunInstances", 1.5));
/// agg.add(&CostRecord::new("AmazonEC2", "RunInstances", 2.0));
/// assert_eq!(agg.get("AmazonEC2::RunInstances"), Some(3.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostAggregate(HashMap<String, f64>);

impl CostAggregate {
    /// Create an empty aggregate
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the aggregate
    pub fn add(&mut self, record: &CostRecord) {
        self.add_cost(record.resource_key(), record.cost);
    }

    /// Add cost directly under a key
    pub fn add_cost(&mut self, key: impl Into<String>, cost: f64) {
        *self.0.entry(key.into()).or_insert(0.0) += cost;
    }

    /// Fold another aggregate into this one
    pub fn merge(&mut self, other: CostAggregate) {
        for (key, cost) in other.0 {
            self.add_cost(key, cost);
        }
    }

    /// Accumulated cost for a key
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    /// Iterate over `(key, cost)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no cost has been recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all accumulated costs
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

impl FromIterator<(String, f64)> for CostAggregate {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut agg = Self::new();
        for (key, cost) in iter {
            agg.add_cost(key, cost);
        }
        agg
    }
}

/// A `service::operation` pair whose recent cost collapsed against its baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusedCandidate {
    /// Key in `service::operation` form
    pub resource_key: String,
    /// Accumulated cost over the comparison window
    pub comparison_cost: f64,
    /// Accumulated cost over the recent window
    pub recent_cost: f64,
}

impl UnusedCandidate {
    /// Service component of the key, if the key has a separator
    pub fn service(&self) -> Option<ServiceName> {
        ServiceName::from_resource_key(&self.resource_key)
    }
}

/// Service portion of a resource key
///
/// # Examples
/// ```
/// use costsweep_core::types::ServiceName;
///
/// let svc = ServiceName::from_resource_key("AmazonS3::PutObject").unwrap();
/// assert_eq!(svc.as_str(), "AmazonS3");
/// assert!(ServiceName::from_resource_key("NoSeparator").is_none());
/// assert!(ServiceName::from_resource_key("::Orphaned").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceName(String);

impl ServiceName {
    /// Create a new ServiceName
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Extract the text before the first separator; `None` when absent or empty
    pub fn from_resource_key(key: &str) -> Option<Self> {
        let (service, _) = key.split_once(KEY_SEPARATOR)?;
        if service.is_empty() {
            None
        } else {
            Some(Self(service.to_string()))
        }
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deduplicated set of resource identifiers
pub type ResourceIdSet = BTreeSet<String>;

/// Outcome of scanning one region for orphaned networking resources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionScanResult {
    /// Region name, e.g. `us-east-1`
    pub region: String,
    /// Detached network interface ids
    pub orphaned_network_interfaces: Vec<String>,
    /// Unassociated address allocation ids
    pub orphaned_elastic_ips: Vec<String>,
    /// Failure message when the region could not be scanned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RegionScanResult {
    /// Result for a region that failed to scan
    pub fn failed(region: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Orphaned networking resources merged across every region
///
/// Regions without findings are absent from the resource maps; regions whose
/// scan failed appear only in `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanReport {
    /// Detached network interfaces by region
    pub network_interfaces: BTreeMap<String, Vec<String>>,
    /// Unassociated elastic IP allocations by region
    pub elastic_ips: BTreeMap<String, Vec<String>>,
    /// Scan failures by region
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub errors: BTreeMap<String, String>,
}

impl OrphanReport {
    /// Merge per-region results
    pub fn from_results(results: impl IntoIterator<Item = RegionScanResult>) -> Self {
        let mut report = Self::default();
        for result in results {
            if let Some(error) = result.error {
                report.errors.insert(result.region, error);
                continue;
            }
            if !result.orphaned_network_interfaces.is_empty() {
                report
                    .network_interfaces
                    .insert(result.region.clone(), result.orphaned_network_interfaces);
            }
            if !result.orphaned_elastic_ips.is_empty() {
                report
                    .elastic_ips
                    .insert(result.region, result.orphaned_elastic_ips);
            }
        }
        report
    }

    /// Total number of orphaned resources across regions
    pub fn total_findings(&self) -> usize {
        self.network_interfaces.values().map(Vec::len).sum::<usize>()
            + self.elastic_ips.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::aggregate;

    #[test]
    fn test_resource_key() {
        let record = CostRecord::new("AmazonEC2", "RunInstances", 0.25);
        assert_eq!(record.resource_key(), "AmazonEC2::RunInstances");
    }

    #[test]
    fn test_aggregate_accumulates() {
        let mut agg = CostAggregate::new();
        agg.add(&CostRecord::new("EC2", "RunInstances", 1.0));
        agg.add(&CostRecord::new("EC2", "RunInstances", 2.5));
        agg.add(&CostRecord::new("S3", "PutObject", 0.5));

        assert_eq!(agg.len(), 2);
        assert_eq!(agg.get("EC2::RunInstances"), Some(3.5));
        assert_eq!(agg.get("S3::PutObject"), Some(0.5));
        assert_eq!(agg.get("S3::GetObject"), None);
        assert!((agg.total() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aggregate_merge() {
        let mut a = aggregate(&[("EC2::RunInstances", 1.0)]);
        let b = aggregate(&[("EC2::RunInstances", 2.0), ("S3::PutObject", 3.0)]);

        a.merge(b);
        assert_eq!(a.get("EC2::RunInstances"), Some(3.0));
        assert_eq!(a.get("S3::PutObject"), Some(3.0));
    }

    #[test]
    fn test_service_name_splits_on_first_separator() {
        let svc = ServiceName::from_resource_key("EC2::Run::Instances").unwrap();
        assert_eq!(svc.as_str(), "EC2");
    }

    #[test]
    fn test_orphan_report_merge() {
        let results = vec![
            RegionScanResult {
                region: "us-east-1".to_string(),
                orphaned_network_interfaces: vec!["eni-1".to_string()],
                orphaned_elastic_ips: vec![],
                error: None,
            },
            RegionScanResult {
                region: "eu-west-1".to_string(),
                orphaned_network_interfaces: vec![],
                orphaned_elastic_ips: vec![],
                error: None,
            },
            RegionScanResult::failed("ap-south-1", "UnauthorizedOperation"),
        ];

        let report = OrphanReport::from_results(results);
        assert_eq!(report.network_interfaces.len(), 1);
        assert_eq!(report.network_interfaces["us-east-1"], vec!["eni-1"]);
        assert!(report.elastic_ips.is_empty());
        assert_eq!(report.errors["ap-south-1"], "UnauthorizedOperation");
        assert_eq!(report.total_findings(), 1);
    }
}
