//! Event-style operation dispatch
//!
//! An [`Invocation`] names one operation (`analyze` or `delete`) plus its
//! parameters and always yields an [`InvocationResponse`] with an HTTP-like
//! status code and a JSON body. Errors never escape this boundary.
//!
//! ```json
//! {"operation": "delete", "region": "us-east-1", "resource_id": "eni-0abc"}
//! ```

use crate::analyzer::Analyzer;
use costsweep_core::error::CostsweepError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

/// Incoming operation request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// `analyze` or `delete`
    #[serde(default)]
    pub operation: Option<String>,
    /// Region of the resource to delete
    #[serde(default)]
    pub region: Option<String>,
    /// Id of the resource to delete
    #[serde(default, alias = "arn_id")]
    pub resource_id: Option<String>,
}

/// Outcome of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    /// HTTP-like status code
    pub status_code: u16,
    /// JSON payload
    pub body: Value,
}

impl InvocationResponse {
    /// 200 response with `body`
    pub fn ok(body: Value) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    /// Error response with `{"error": message}`
    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            body: json!({ "error": message.into() }),
        }
    }

    fn from_error(err: CostsweepError) -> Self {
        if err.is_config_error() {
            Self::error(400, err.to_string())
        } else {
            error!("Error while handling invocation: {}", err);
            Self::error(500, format!("Internal server error: {err}"))
        }
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Route an invocation to its operation
pub async fn dispatch(analyzer: &Analyzer, invocation: Invocation) -> InvocationResponse {
    info!(
        "Received invocation: {}",
        serde_json::to_string(&invocation).unwrap_or_default()
    );

    let Some(operation) = invocation
        .operation
        .as_deref()
        .map(str::trim)
        .filter(|op| !op.is_empty())
    else {
        return InvocationResponse::error(400, "Missing required parameter: operation");
    };

    match operation {
        "analyze" => analyze(analyzer).await,
        "delete" => delete(analyzer, &invocation).await,
        other => {
            error!("Unsupported operation: {}", other);
            InvocationResponse::error(400, format!("Unsupported operation: {other}"))
        }
    }
}

async fn analyze(analyzer: &Analyzer) -> InvocationResponse {
    match analyzer.analyze().await {
        Ok(report) => match serde_json::to_value(&report) {
            Ok(body) => InvocationResponse::ok(body),
            Err(e) => InvocationResponse::from_error(e.into()),
        },
        Err(e) => InvocationResponse::from_error(e),
    }
}

async fn delete(analyzer: &Analyzer, invocation: &Invocation) -> InvocationResponse {
    let region = invocation.region.as_deref().filter(|r| !r.trim().is_empty());
    let resource_id = invocation
        .resource_id
        .as_deref()
        .filter(|id| !id.trim().is_empty());

    let (Some(region), Some(resource_id)) = (region, resource_id) else {
        return InvocationResponse::error(
            400,
            "Missing required parameters: region, resource_id",
        );
    };

    match analyzer.delete(region, resource_id).await {
        Ok(message) => InvocationResponse::ok(json!({ "message": message })),
        Err(e) => InvocationResponse::from_error(e),
    }
}
