//! Error types for costsweep
//!
//! This module defines the error type shared by every costsweep crate.
//! All errors derive from `thiserror` for convenient `?` propagation and
//! automatic `From` implementations.
//!
//! Errors fall into two families that callers treat differently:
//! configuration problems (surfaced as client errors and never retried)
//! and everything else (remote failures and internal errors).
//!
//! # Example
//!
//! ```
//! use costsweep_core::error::{CostsweepError, Result};
//!
//! fn require_bucket(bucket: Option<&str>) -> Result<&str> {
//!     bucket.ok_or_else(|| CostsweepError::Config("bucket name is not set".to_string()))
//! }
//!
//! let err = require_bucket(None).unwrap_err();
//! assert!(err.is_config_error());
//! ```

use thiserror::Error;

/// Main error type for costsweep operations
#[derive(Error, Debug)]
pub enum CostsweepError {
    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid date or date window
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Object storage read failed for a reason other than a missing object
    #[error("Storage error for {key}: {message}")]
    Storage {
        /// Object key being read
        key: String,
        /// Provider error message
        message: String,
    },

    /// Asynchronous query reached a failed terminal state
    #[error("Query {state}. Reason: {reason}")]
    QueryFailed {
        /// Terminal state reported by the query service
        state: String,
        /// State change reason reported by the query service
        reason: String,
    },

    /// Query service call failed
    #[error("Query service error: {0}")]
    Query(String),

    /// Compute/network API call failed
    #[error("EC2 error: {0}")]
    Ec2(String),

    /// Caller-supplied deadline elapsed
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl CostsweepError {
    /// Whether this error stems from caller-supplied configuration or input
    ///
    /// Configuration errors map to client-error statuses; everything else
    /// is a server-side failure.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::InvalidArgument(_) | Self::InvalidDate(_)
        )
    }
}

/// Convenience type alias for Results in costsweep
pub type Result<T> = std::result::Result<T, CostsweepError>;
