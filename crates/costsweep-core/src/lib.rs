//! Core types, configuration, and utilities for costsweep
//!
//! This crate provides the shared error type, the domain types passed
//! between pipeline stages, the analysis configuration, and date window
//! arithmetic used by every other costsweep crate.

pub mod config;
pub mod error;
pub mod types;
pub mod window;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use config::{AnalyzerConfig, QueryWindow};
pub use error::{CostsweepError, Result};
pub use types::{
    CostAggregate, CostRecord, OrphanReport, RegionScanResult, ResourceIdSet, ServiceName,
    UnusedCandidate,
};
pub use window::{AnalysisWindows, DateWindow};
