//! Cost-trend analysis for costsweep
//!
//! This crate reads daily cost files from object storage (or a local
//! directory), folds them into per-window aggregates keyed by
//! `service::operation`, and flags pairs whose recent spend collapsed
//! relative to their baseline.

pub mod aggregator;
pub mod detector;
pub mod source;

pub use aggregator::{CostAggregator, object_key, parse_cost_file};
pub use detector::find_unused;
pub use source::{CostObjectSource, LocalDirSource, S3CostSource};
