//! Output formatting for costsweep reports
//!
//! Reports render either as tables for terminal use or as JSON for
//! scripting. [`get_formatter`] picks the implementation.
//!
//! # Examples
//!
//! ```
//! use costsweep::output::get_formatter;
//! use costsweep_core::types::OrphanReport;
//!
//! let formatter = get_formatter(true, false);
//! let output = formatter.format_orphans(&OrphanReport::default());
//! assert!(output.contains("network_interfaces"));
//! ```

use crate::analyzer::{AnalysisReport, CandidateReport, UnusedReport};
use colored::Colorize;
use costsweep_core::types::{OrphanReport, UnusedCandidate};
use prettytable::{Table, format, row};
use serde::Serialize;

/// Renders reports as text
pub trait OutputFormatter {
    /// Flagged pairs without resolution
    fn format_candidates(&self, report: &CandidateReport) -> String;

    /// Cost-trend pipeline outcome
    fn format_unused(&self, report: &UnusedReport) -> String;

    /// Orphan scan outcome
    fn format_orphans(&self, report: &OrphanReport) -> String;

    /// Full analysis
    fn format_analysis(&self, report: &AnalysisReport) -> String;

    /// Cleanup confirmation
    fn format_cleanup(&self, message: &str) -> String;
}

/// Human-readable tables
pub struct TableFormatter {
    color: bool,
}

impl TableFormatter {
    /// Create a table formatter, optionally with colored headings
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn format_currency(amount: f64) -> String {
        format!("${amount:.4}")
    }

    fn format_drop(candidate: &UnusedCandidate) -> String {
        if candidate.comparison_cost > 0.0 {
            format!(
                "{:.2}%",
                candidate.recent_cost / candidate.comparison_cost * 100.0
            )
        } else {
            "-".to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().cyan().to_string()
        } else {
            text.to_string()
        }
    }

    fn failure(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    fn candidate_table(candidates: &[UnusedCandidate]) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![
            b -> "Service::Operation",
            b -> "Comparison",
            b -> "Recent",
            b -> "Recent / Comparison"
        ]);
        for candidate in candidates {
            table.add_row(row![
                candidate.resource_key,
                r -> Self::format_currency(candidate.comparison_cost),
                r -> Self::format_currency(candidate.recent_cost),
                r -> Self::format_drop(candidate)
            ]);
        }
        table.to_string()
    }

    fn region_table(title: &str, by_region: &std::collections::BTreeMap<String, Vec<String>>) -> String {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table.set_titles(row![b -> "Region", b -> title]);
        for (region, ids) in by_region {
            for id in ids {
                table.add_row(row![region, id]);
            }
        }
        table.to_string()
    }
}

impl OutputFormatter for TableFormatter {
    fn format_candidates(&self, report: &CandidateReport) -> String {
        let mut output = format!(
            "{}\nRecent period:     {}\nComparison period: {}\n\n",
            self.heading("Potentially unused service/operation pairs"),
            report.recent_period,
            report.comparison_period
        );
        if report.candidates.is_empty() {
            output.push_str("No service/operation pairs with collapsed spend.\n");
        } else {
            output.push_str(&Self::candidate_table(&report.candidates));
        }
        output
    }

    fn format_unused(&self, report: &UnusedReport) -> String {
        let mut output = format!("{}\n", self.heading("Unused resources by cost trend"));
        if !report.is_success() {
            output.push_str(&self.failure(&format!(
                "[{}] {}",
                report.status_code, report.message
            )));
            output.push('\n');
            return output;
        }

        if let (Some(recent), Some(comparison)) = (&report.recent_period, &report.comparison_period)
        {
            output.push_str(&format!(
                "Recent period:     {recent}\nComparison period: {comparison}\n"
            ));
        }
        output.push_str(&format!("{}\n\n", report.message));
        if !report.candidates.is_empty() {
            output.push_str(&Self::candidate_table(&report.candidates));
            output.push('\n');
        }
        if !report.resource_ids.is_empty() {
            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
            table.set_titles(row![b -> "Resource ID"]);
            for id in &report.resource_ids {
                table.add_row(row![id]);
            }
            output.push_str(&table.to_string());
        }
        output
    }

    fn format_orphans(&self, report: &OrphanReport) -> String {
        let mut output = format!("{}\n", self.heading("Orphaned network resources"));
        if report.total_findings() == 0 {
            output.push_str("No orphaned network interfaces or elastic IPs found.\n");
        }
        if !report.network_interfaces.is_empty() {
            output.push_str(&Self::region_table(
                "Network Interface",
                &report.network_interfaces,
            ));
            output.push('\n');
        }
        if !report.elastic_ips.is_empty() {
            output.push_str(&Self::region_table("Elastic IP Allocation", &report.elastic_ips));
            output.push('\n');
        }
        for (region, message) in &report.errors {
            output.push_str(&self.failure(&format!("{region}: {message}")));
            output.push('\n');
        }
        output
    }

    fn format_analysis(&self, report: &AnalysisReport) -> String {
        format!(
            "{}\n{}",
            self.format_orphans(&report.orphans),
            self.format_unused(&report.unused)
        )
    }

    fn format_cleanup(&self, message: &str) -> String {
        message.to_string()
    }
}

/// Pretty-printed JSON
pub struct JsonFormatter;

impl JsonFormatter {
    fn render<T: Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize output: {e}\"}}"))
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_candidates(&self, report: &CandidateReport) -> String {
        Self::render(report)
    }

    fn format_unused(&self, report: &UnusedReport) -> String {
        Self::render(report)
    }

    fn format_orphans(&self, report: &OrphanReport) -> String {
        Self::render(report)
    }

    fn format_analysis(&self, report: &AnalysisReport) -> String {
        Self::render(report)
    }

    fn format_cleanup(&self, message: &str) -> String {
        Self::render(&serde_json::json!({ "message": message }))
    }
}

/// Pick a formatter: JSON when `json` is set, tables otherwise
pub fn get_formatter(json: bool, color: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter::new(color))
    }
}
