//! Single-resource cleanup
//!
//! The resource type is inferred from the id prefix: `eni` ids are network
//! interfaces, `eip`/`eipalloc` ids are elastic IP allocations.

use crate::inventory::NetworkCleaner;
use costsweep_core::error::{CostsweepError, Result};
use serde::Serialize;
use std::fmt;
use tracing::{error, info};

/// A resource that can be cleaned up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum CleanupTarget {
    /// Network interface id, e.g. `eni-0abc`
    NetworkInterface(String),
    /// Elastic IP allocation id, e.g. `eipalloc-0abc`
    ElasticIp(String),
}

impl CleanupTarget {
    /// Classify a resource id by prefix
    ///
    /// # Examples
    /// ```
    /// use costsweep_network::CleanupTarget;
    ///
    /// assert!(matches!(CleanupTarget::classify("eni-123"), Ok(CleanupTarget::NetworkInterface(_))));
    /// assert!(matches!(CleanupTarget::classify("eipalloc-123"), Ok(CleanupTarget::ElasticIp(_))));
    /// assert!(CleanupTarget::classify("i-123").is_err());
    /// ```
    pub fn classify(resource_id: &str) -> Result<Self> {
        let id = resource_id.trim();
        if id.starts_with("eni") {
            Ok(Self::NetworkInterface(id.to_string()))
        } else if id.starts_with("eip") {
            Ok(Self::ElasticIp(id.to_string()))
        } else {
            Err(CostsweepError::InvalidArgument(format!(
                "Unsupported resource type: {resource_id}"
            )))
        }
    }

    /// The resource id
    pub fn id(&self) -> &str {
        match self {
            Self::NetworkInterface(id) | Self::ElasticIp(id) => id,
        }
    }
}

impl fmt::Display for CleanupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkInterface(id) => write!(f, "network interface {id}"),
            Self::ElasticIp(id) => write!(f, "elastic IP {id}"),
        }
    }
}

/// Delete or release `target` in `region`, returning a confirmation message
pub async fn cleanup(
    cleaner: &dyn NetworkCleaner,
    region: &str,
    target: &CleanupTarget,
) -> Result<String> {
    let outcome = match target {
        CleanupTarget::NetworkInterface(id) => cleaner.delete_network_interface(region, id).await,
        CleanupTarget::ElasticIp(id) => cleaner.release_address(region, id).await,
    };

    match outcome {
        Ok(()) => {
            let message = match target {
                CleanupTarget::NetworkInterface(id) => {
                    format!("Deleted network interface {id} in {region}")
                }
                CleanupTarget::ElasticIp(id) => format!("Released elastic IP {id} in {region}"),
            };
            info!("{}", message);
            Ok(message)
        }
        Err(e) => {
            error!("Failed to clean up {} in {}: {}", target, region, e);
            Err(e)
        }
    }
}
