//! costsweep - Find idle AWS resources from cost trends and orphaned network state

use anyhow::Context;
use clap::Parser;
use costsweep::{
    analyzer::{Analyzer, Backends},
    cli::{Cli, Command},
    dispatch::{Invocation, InvocationResponse, dispatch},
    output::get_formatter,
};
use std::io::Read;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "costsweep=info";

/// Build the log filter: --quiet, then LOG_LEVEL, then RUST_LOG, then the default
fn log_filter(cli: &Cli) -> EnvFilter {
    if cli.quiet {
        return EnvFilter::new("warn");
    }
    if let Some(level) = cli.log_level.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        // A bare level applies to costsweep crates only
        let directives = if level.contains('=') || level.contains(',') {
            level.to_string()
        } else {
            format!("costsweep={}", level.to_lowercase())
        };
        return EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn read_event(event: Option<String>) -> anyhow::Result<String> {
    match event {
        Some(event) => Ok(event),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read invocation event from stdin")?;
            Ok(buffer)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays parseable
    tracing_subscriber::registry()
        .with(log_filter(&cli))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let is_tty = is_terminal::is_terminal(std::io::stdout());
    let color = !cli.no_color && is_tty;
    if !color {
        colored::control::set_override(false);
    }
    let show_progress = !cli.json && is_tty;
    let formatter = get_formatter(cli.json, color);

    let config = cli.settings.to_config();
    let backends = Backends::from_aws(&config).await;
    let analyzer = Analyzer::new(config, backends).with_progress(show_progress);

    match cli.command {
        Command::Analyze => {
            info!("Running full analysis");
            let report = analyzer.analyze().await?;
            println!("{}", formatter.format_analysis(&report));
            Ok(exit_code(report.unused.is_success()))
        }

        Command::Unused => {
            info!("Running cost-trend analysis");
            let report = analyzer.unused_report().await;
            println!("{}", formatter.format_unused(&report));
            Ok(exit_code(report.is_success()))
        }

        Command::Candidates => {
            info!("Detecting cost-trend candidates");
            let report = analyzer.candidates().await?;
            println!("{}", formatter.format_candidates(&report));
            Ok(ExitCode::SUCCESS)
        }

        Command::Orphans => {
            info!("Scanning regions for orphaned network resources");
            let report = analyzer.orphans().await?;
            println!("{}", formatter.format_orphans(&report));
            Ok(ExitCode::SUCCESS)
        }

        Command::Delete {
            region,
            resource_id,
        } => {
            info!("Cleaning up {} in {}", resource_id, region);
            let message = analyzer.delete(&region, &resource_id).await?;
            println!("{}", formatter.format_cleanup(&message));
            Ok(ExitCode::SUCCESS)
        }

        Command::Invoke { event } => {
            let raw = read_event(event)?;
            let response = match serde_json::from_str::<Invocation>(&raw) {
                Ok(invocation) => dispatch(&analyzer, invocation).await,
                Err(e) => InvocationResponse::error(400, format!("Invalid event: {e}")),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&response).context("failed to encode response")?
            );
            Ok(exit_code(response.is_success()))
        }
    }
}
