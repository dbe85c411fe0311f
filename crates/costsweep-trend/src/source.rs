//! Daily cost object sources
//!
//! A [`CostObjectSource`] hands back the text of one daily cost object by
//! key. A missing object is not an error: it resolves to `Ok(None)` so the
//! aggregator can treat the day as contributing nothing.
//!
//! Two implementations are provided:
//! - [`S3CostSource`] reads from an S3 bucket
//! - [`LocalDirSource`] reads from a local directory, for offline runs

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use costsweep_core::error::{CostsweepError, Result};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::trace;

/// Keyed access to daily cost objects
#[async_trait]
pub trait CostObjectSource: Send + Sync {
    /// Fetch an object's text, or `None` when no object exists under `key`
    async fn fetch(&self, key: &str) -> Result<Option<String>>;

    /// Human-readable location, used in log lines
    fn location(&self) -> String;
}

/// Cost objects stored in an S3 bucket
pub struct S3CostSource {
    client: Client,
    bucket: String,
}

impl S3CostSource {
    /// Create a source over `bucket` using an already configured client
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Bucket this source reads from
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl CostObjectSource for S3CostSource {
    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        trace!("GetObject s3://{}/{}", self.bucket, key);
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|service_err| service_err.is_no_such_key())
                {
                    return Ok(None);
                }
                return Err(CostsweepError::Storage {
                    key: key.to_string(),
                    message: DisplayErrorContext(&err).to_string(),
                });
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| CostsweepError::Storage {
                key: key.to_string(),
                message: e.to_string(),
            })?
            .into_bytes();

        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|e| CostsweepError::Storage {
                key: key.to_string(),
                message: format!("object is not valid UTF-8: {e}"),
            })
    }

    fn location(&self) -> String {
        format!("s3://{}", self.bucket)
    }
}

/// Cost objects stored as files in a local directory
#[derive(Debug, Clone)]
pub struct LocalDirSource {
    root: PathBuf,
}

impl LocalDirSource {
    /// Create a source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl CostObjectSource for LocalDirSource {
    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        let path = self.root.join(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CostsweepError::Storage {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}
