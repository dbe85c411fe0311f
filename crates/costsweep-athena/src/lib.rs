//! Resource-id resolution for costsweep
//!
//! Candidate `service::operation` keys carry no resource identifiers. This
//! crate turns the candidate services into a billing query, runs it on an
//! asynchronous SQL query service, and collects the distinct resource ids
//! that still accrued cost.

pub mod query;
pub mod resolver;
pub mod service;

pub use query::{build_query, extract_services};
pub use resolver::ResourceIdResolver;
pub use service::{AthenaQueryService, QueryService, QueryState, ResultPage};
