//! Billing query construction

use costsweep_core::config::QueryWindow;
use costsweep_core::types::{ServiceName, UnusedCandidate};
use std::collections::BTreeSet;
use tracing::warn;

/// Distinct services named by the candidate keys, in sorted order
///
/// Keys without a `::` separator, or with an empty service part, are
/// dropped with a warning.
pub fn extract_services(candidates: &[UnusedCandidate]) -> BTreeSet<ServiceName> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let service = candidate.service();
            if service.is_none() {
                warn!(
                    "Dropping candidate '{}': no service before '::'",
                    candidate.resource_key
                );
            }
            service
        })
        .collect()
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_identifier(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn date_predicate(window: QueryWindow) -> &'static str {
    match window {
        QueryWindow::Yesterday => {
            "CAST(line_item_usage_start_date AS DATE) = (current_date - interval '1' day)"
        }
        QueryWindow::TrailingWeek => {
            "CAST(line_item_usage_start_date AS DATE) >= (current_date - interval '7' day)\n  \
             AND CAST(line_item_usage_start_date AS DATE) < current_date"
        }
    }
}

/// Build the resource-id query for `services`
///
/// Returns `None` for an empty service set, since an empty `IN ()` list is
/// not valid SQL and there is nothing to look up.
///
/// # Examples
/// ```
/// use costsweep_athena::build_query;
/// use costsweep_core::config::QueryWindow;
/// use costsweep_core::types::ServiceName;
/// use std::collections::BTreeSet;
///
/// let services: BTreeSet<_> = [ServiceName::new("O'Brien")].into_iter().collect();
/// let sql = build_query("cur", "costs", &services, QueryWindow::Yesterday).unwrap();
/// assert!(sql.contains("IN ('O''Brien')"));
/// assert!(sql.contains(r#"FROM "cur"."costs""#));
/// ```
pub fn build_query(
    database: &str,
    table: &str,
    services: &BTreeSet<ServiceName>,
    window: QueryWindow,
) -> Option<String> {
    if services.is_empty() {
        return None;
    }
    let service_list = services
        .iter()
        .map(|service| quote_literal(service.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    Some(format!(
        "SELECT DISTINCT line_item_resource_id\n\
         FROM {}.{}\n\
         WHERE {}\n  \
         AND product_product_name IN ({})\n  \
         AND line_item_unblended_cost > 0\n  \
         AND line_item_resource_id IS NOT NULL\n  \
         AND line_item_resource_id <> ''",
        quote_identifier(database),
        quote_identifier(table),
        date_predicate(window),
        service_list,
    ))
}
