//! Property-based tests for costsweep using proptest

mod common;

use chrono::{Datelike, NaiveDate};
use common::{MemoryCostSource, SUFFIX};
use costsweep_core::config::TrendConfig;
use costsweep_core::types::{CostAggregate, CostRecord};
use costsweep_core::window::compute_windows;
use costsweep_trend::{CostAggregator, find_unused, parse_cost_file};
use proptest::prelude::*;
use std::sync::Arc;

// Strategies for generating test data

prop_compose! {
    fn arb_date()(
        days in 0i64..3650,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::TimeDelta::days(days)
    }
}

prop_compose! {
    fn arb_record()(
        service in prop::sample::select(vec!["AmazonEC2", "AmazonS3", "AmazonRDS", "AWSLambda"]),
        operation in prop::sample::select(vec!["RunInstances", "PutObject", "Invoke", "NatGateway-Hours"]),
        cost in 0.0f64..1_000.0,
    ) -> CostRecord {
        CostRecord::new(service, operation, cost)
    }
}

prop_compose! {
    fn arb_aggregate()(
        entries in prop::collection::vec(
            (prop::sample::select(vec!["a::x", "b::y", "c::z", "d::w", "e::v"]), 0.0f64..500.0),
            0..5,
        )
    ) -> CostAggregate {
        let mut aggregate = CostAggregate::new();
        for (key, cost) in entries {
            aggregate.add_cost(key, cost);
        }
        aggregate
    }
}

fn arb_trend() -> impl Strategy<Value = TrendConfig> {
    (0.0f64..100.0, 0.0f64..50.0).prop_map(|(threshold_percentage, min_comparison_cost)| {
        TrendConfig {
            threshold_percentage,
            min_comparison_cost,
            ..Default::default()
        }
    })
}

fn approx_eq(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() <= 1e-6 * a.abs().max(1.0),
        (None, None) => true,
        _ => false,
    }
}

proptest! {
    #[test]
    fn test_windows_are_contiguous_and_end_yesterday(
        today in arb_date(),
        recent_days in 1i64..60,
        comparison_days in 1i64..120,
    ) {
        let windows = compute_windows(today, recent_days, comparison_days).unwrap();

        prop_assert_eq!(windows.recent.end.succ_opt().unwrap(), today);
        prop_assert_eq!(windows.comparison.end.succ_opt().unwrap(), windows.recent.start);
        prop_assert_eq!(windows.recent.len_days(), recent_days);
        prop_assert_eq!(windows.comparison.len_days(), comparison_days);
        prop_assert_eq!(windows.recent.days().count() as i64, recent_days);
    }

    #[test]
    fn test_non_positive_windows_rejected(
        today in arb_date(),
        recent_days in -30i64..=0,
        comparison_days in 1i64..60,
    ) {
        prop_assert!(compute_windows(today, recent_days, comparison_days).is_err());
        prop_assert!(compute_windows(today, comparison_days, recent_days).is_err());
    }

    #[test]
    fn test_aggregation_is_order_independent(
        records in prop::collection::vec(arb_record(), 0..50),
    ) {
        let mut forward = CostAggregate::new();
        records.iter().for_each(|record| forward.add(record));

        let mut backward = CostAggregate::new();
        records.iter().rev().for_each(|record| backward.add(record));

        prop_assert_eq!(forward.len(), backward.len());
        for (key, cost) in forward.iter() {
            prop_assert!(approx_eq(Some(cost), backward.get(key)));
        }
    }

    #[test]
    fn test_detector_output_matches_predicate(
        comparison in arb_aggregate(),
        recent in arb_aggregate(),
        trend in arb_trend(),
    ) {
        let candidates = find_unused(&comparison, &recent, &trend);
        let ratio = trend.threshold_ratio();

        for candidate in &candidates {
            prop_assert_eq!(comparison.get(&candidate.resource_key), Some(candidate.comparison_cost));
            prop_assert!(candidate.comparison_cost >= trend.min_comparison_cost);
            prop_assert!(candidate.recent_cost > 0.0);
            prop_assert!(candidate.recent_cost < candidate.comparison_cost * ratio);
        }

        let flagged = candidates.len();
        let expected = comparison
            .iter()
            .filter(|(key, comp)| {
                let recent_cost = recent.get(key).unwrap_or(0.0);
                *comp >= trend.min_comparison_cost
                    && recent_cost > 0.0
                    && recent_cost < comp * ratio
            })
            .count();
        prop_assert_eq!(flagged, expected);

        let keys: Vec<_> = candidates.iter().map(|c| c.resource_key.clone()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }

    #[test]
    fn test_parse_cost_file_never_yields_invalid_costs(content in "\\PC{0,200}") {
        let content = format!("service,operation,cost\n{content}");
        for record in parse_cost_file(&content, "fuzz.csv") {
            prop_assert!(record.cost.is_finite());
            prop_assert!(record.cost >= 0.0);
        }
    }

    #[test]
    fn test_window_total_matches_daily_files(
        costs in prop::collection::vec(0.0f64..100.0, 7),
        today in arb_date(),
    ) {
        let windows = compute_windows(today, 7, 1).unwrap();
        let mut source = MemoryCostSource::default();
        for (day, cost) in windows.recent.days().zip(&costs) {
            // Only weekdays have files
            if day.weekday().number_from_monday() <= 5 {
                source = source.with_day(day, &[("AmazonEC2", "RunInstances", *cost)]);
            }
        }
        let expected: f64 = windows
            .recent
            .days()
            .zip(&costs)
            .filter(|(day, _)| day.weekday().number_from_monday() <= 5)
            .map(|(_, cost)| cost)
            .sum();

        let aggregator = CostAggregator::new(Arc::new(source), SUFFIX);
        let aggregate = tokio_test::block_on(aggregator.aggregate(windows.recent, "recent"));

        prop_assert!((aggregate.total() - expected).abs() < 1e-6);
    }
}
