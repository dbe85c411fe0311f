//! costsweep - Find idle AWS resources from cost trends and orphaned network state
//!
//! This library provides functionality to:
//! - Compare daily cost files across a recent and a comparison window
//! - Flag service/operation pairs whose spend collapsed
//! - Resolve flagged services to resource ids through a billing query
//! - Scan every region for detached network interfaces and elastic IPs
//! - Release individual orphaned resources
//!
//! # Examples
//!
//! ```no_run
//! use costsweep::analyzer::{Analyzer, Backends};
//! use costsweep_core::AnalyzerConfig;
//!
//! #[tokio::main]
//! async fn main() -> costsweep::Result<()> {
//!     let config = AnalyzerConfig::default();
//!     config.validate()?;
//!
//!     let analyzer = Analyzer::new(config.clone(), Backends::from_aws(&config).await);
//!     let report = analyzer.analyze().await?;
//!     println!("{} orphaned resources", report.orphans.total_findings());
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod cli;
pub mod dispatch;
pub mod output;

// Re-export commonly used types
pub use costsweep_core::error::{CostsweepError, Result};
pub use costsweep_core::{AnalyzerConfig, OrphanReport, UnusedCandidate};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
