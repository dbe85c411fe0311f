//! Asynchronous SQL query service seam
//!
//! [`QueryService`] covers the three calls the resolver needs: submit a
//! query, check its state, and fetch one page of results. The Athena
//! implementation is [`AthenaQueryService`]; tests use in-memory fakes.

use async_trait::async_trait;
use aws_sdk_athena::Client;
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration};
use costsweep_core::error::{CostsweepError, Result};
use std::fmt;
use tracing::trace;

/// Lifecycle state of a submitted query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    /// Accepted, waiting for capacity
    Queued,
    /// Executing
    Running,
    /// Finished with results
    Succeeded,
    /// Finished with an error
    Failed,
    /// Stopped before completion
    Cancelled,
    /// A state this client does not know; treated as still in flight
    Other(String),
}

impl QueryState {
    /// Whether the query will not change state again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "QUEUED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Other(state) => write!(f, "{state}"),
        }
    }
}

/// State of a query plus the service's explanation of the last transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStatus {
    /// Current state
    pub state: QueryState,
    /// State change reason, if the service gave one
    pub reason: Option<String>,
}

/// One page of query results
///
/// Each row is a list of cells; a cell is `None` when the service returned
/// no value for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    /// Rows in service order, including any header row
    pub rows: Vec<Vec<Option<String>>>,
    /// Continuation token for the next page
    pub next_token: Option<String>,
}

/// Asynchronous SQL query service
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submit `sql` and return the execution id
    async fn start_query(&self, sql: &str, database: &str, output_location: &str)
    -> Result<String>;

    /// Current status of an execution
    async fn query_status(&self, execution_id: &str) -> Result<QueryStatus>;

    /// Fetch one page of results
    async fn result_page(&self, execution_id: &str, next_token: Option<String>)
    -> Result<ResultPage>;
}

/// [`QueryService`] backed by Amazon Athena
pub struct AthenaQueryService {
    client: Client,
}

impl AthenaQueryService {
    /// Create a service from a configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn map_state(state: &QueryExecutionState) -> QueryState {
    match state {
        QueryExecutionState::Queued => QueryState::Queued,
        QueryExecutionState::Running => QueryState::Running,
        QueryExecutionState::Succeeded => QueryState::Succeeded,
        QueryExecutionState::Failed => QueryState::Failed,
        QueryExecutionState::Cancelled => QueryState::Cancelled,
        other => QueryState::Other(other.as_str().to_string()),
    }
}

#[async_trait]
impl QueryService for AthenaQueryService {
    async fn start_query(
        &self,
        sql: &str,
        database: &str,
        output_location: &str,
    ) -> Result<String> {
        let output = self
            .client
            .start_query_execution()
            .query_string(sql)
            .query_execution_context(QueryExecutionContext::builder().database(database).build())
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(output_location)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| CostsweepError::Query(DisplayErrorContext(&e).to_string()))?;

        output
            .query_execution_id()
            .map(str::to_string)
            .ok_or_else(|| CostsweepError::Query("no query execution id returned".to_string()))
    }

    async fn query_status(&self, execution_id: &str) -> Result<QueryStatus> {
        let output = self
            .client
            .get_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
            .map_err(|e| CostsweepError::Query(DisplayErrorContext(&e).to_string()))?;

        let status = output
            .query_execution()
            .and_then(|execution| execution.status())
            .ok_or_else(|| {
                CostsweepError::Query(format!("no status returned for query {execution_id}"))
            })?;
        let state = status.state().ok_or_else(|| {
            CostsweepError::Query(format!("no state returned for query {execution_id}"))
        })?;

        trace!("Query {} is {}", execution_id, state.as_str());
        Ok(QueryStatus {
            state: map_state(state),
            reason: status.state_change_reason().map(str::to_string),
        })
    }

    async fn result_page(
        &self,
        execution_id: &str,
        next_token: Option<String>,
    ) -> Result<ResultPage> {
        let output = self
            .client
            .get_query_results()
            .query_execution_id(execution_id)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| CostsweepError::Query(DisplayErrorContext(&e).to_string()))?;

        let rows = output
            .result_set()
            .map(|result_set| result_set.rows())
            .unwrap_or_default()
            .iter()
            .map(|row| {
                row.data()
                    .iter()
                    .map(|datum| datum.var_char_value().map(str::to_string))
                    .collect()
            })
            .collect();

        Ok(ResultPage {
            rows,
            next_token: output.next_token().map(str::to_string),
        })
    }
}
