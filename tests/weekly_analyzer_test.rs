// ABOUTME: Unit tests for rolling statistics, trend detection, volatility, and week comparisons
// ABOUTME: Seeds an in-memory source with daily values and checks the analyzer layer end to end
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use vital_analytics::{
    exponential_smoothing, moving_average_smoothing, AnalyticsConfig, AnalyticsError,
    DailyAggregator, InMemorySource, MeasurementRecord, TrendDirection, WeeklyAnalyzer,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn analyzer_from_daily(metric: &str, start: NaiveDate, values: &[f64]) -> WeeklyAnalyzer {
    let records = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let date = start + Duration::days(i as i64);
            MeasurementRecord::new(
                Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap()),
                metric,
                *v,
            )
        })
        .collect();
    let daily = DailyAggregator::new(
        Arc::new(InMemorySource::from_records(records)),
        AnalyticsConfig::default(),
    );
    WeeklyAnalyzer::new(daily)
}

#[test]
fn test_rolling_window_shrinks_at_series_start() {
    let analyzer = analyzer_from_daily("steps", day(2024, 3, 1), &[10.0, 20.0, 30.0]);
    let rolling = analyzer
        .rolling_statistics("steps", 3, None, None)
        .unwrap();

    assert_eq!(rolling.len(), 3);
    assert!((rolling[0].mean - 10.0).abs() < 1e-9);
    assert!((rolling[1].mean - 15.0).abs() < 1e-9);
    assert!((rolling[2].mean - 20.0).abs() < 1e-9);
    assert!(rolling[0].std.is_none());
    assert!(rolling[2].std.is_some());
}

#[test]
fn test_zero_window_rejected() {
    let analyzer = analyzer_from_daily("steps", day(2024, 3, 1), &[10.0, 20.0]);
    let result = analyzer.rolling_statistics("steps", 0, None, None);
    assert!(matches!(
        result,
        Err(AnalyticsError::InvalidArgument { .. })
    ));
}

#[test]
fn test_detect_trend_upward_significant() {
    let values: Vec<f64> = (1..=30).map(|i| f64::from(i) * 10.0).collect();
    let analyzer = analyzer_from_daily("steps", day(2024, 3, 1), &values);
    let trend = analyzer.detect_trend("steps", 7).unwrap();

    assert!(trend.slope > 0.0);
    assert!(trend.significant);
    assert_eq!(trend.direction, TrendDirection::Up);
    assert!(trend.r_squared > 0.95);
    assert!(trend.p_value.unwrap() < 0.05);
}

#[test]
fn test_detect_trend_flat_noise_is_stable() {
    // Alternating values: slope indistinguishable from zero
    let values: Vec<f64> = (0..30)
        .map(|i| if i % 2 == 0 { 100.0 } else { 102.0 })
        .collect();
    let analyzer = analyzer_from_daily("resting_hr", day(2024, 3, 1), &values);
    let trend = analyzer.detect_trend("resting_hr", 1).unwrap();

    assert_eq!(trend.direction, TrendDirection::Stable);
    assert!(!trend.significant);
}

#[test]
fn test_detect_trend_requires_window_points() {
    let analyzer = analyzer_from_daily("steps", day(2024, 3, 1), &[1.0, 2.0, 3.0]);
    let result = analyzer.detect_trend("steps", 7);
    assert!(matches!(
        result,
        Err(AnalyticsError::InsufficientData { .. })
    ));
}

#[test]
fn test_batch_trends_degrades_failed_metric() {
    let _ = tracing_subscriber::fmt::try_init();
    let analyzer = analyzer_from_daily("steps", day(2024, 3, 1), &[1.0, 2.0, 3.0]);
    let metrics = vec!["steps".to_owned(), "missing_metric".to_owned()];
    let trends = analyzer.batch_trends(&metrics, 7);

    assert_eq!(trends.len(), 2);
    let degraded = &trends["missing_metric"];
    assert_eq!(degraded.direction, TrendDirection::Stable);
    assert!((degraded.slope - 0.0).abs() < 1e-12);
    assert!(!degraded.significant);
}

#[test]
fn test_volatility_constant_series_fully_consistent() {
    let analyzer = analyzer_from_daily("steps", day(2024, 3, 1), &[10.0; 14]);
    let report = analyzer.calculate_volatility("steps", 7).unwrap();

    assert!((report.std_dev - 0.0).abs() < 1e-12);
    assert!((report.coefficient_of_variation - 0.0).abs() < 1e-12);
    assert!((report.consistency_score - 1.0).abs() < 1e-12);
}

#[test]
fn test_volatility_zero_mean_gives_infinite_cv() {
    let values: Vec<f64> = (0..10).map(|i| if i % 2 == 0 { -1.0 } else { 1.0 }).collect();
    let analyzer = analyzer_from_daily("net_balance", day(2024, 3, 1), &values);
    let report = analyzer.calculate_volatility("net_balance", 10).unwrap();

    assert!(report.coefficient_of_variation.is_infinite());
    assert!((report.consistency_score - 0.0).abs() < 1e-12);
}

#[test]
fn test_week_comparison_detects_jump_from_zero() {
    // ISO week 19 of 2024 starts Monday 2024-05-06, week 20 on 2024-05-13
    let mut values = vec![0.0; 7];
    values.extend(vec![5.0; 7]);
    let analyzer = analyzer_from_daily("steps", day(2024, 5, 6), &values);

    let comparison = analyzer.compare_week_to_date("steps", 20, 2024).unwrap();
    assert_eq!(comparison.previous_week, 19);
    assert_eq!(comparison.previous_year, 2024);
    assert_eq!(comparison.days_compared, 7);
    assert!((comparison.current_mean - 5.0).abs() < 1e-9);
    assert!((comparison.previous_mean - 0.0).abs() < 1e-12);
    assert!((comparison.absolute_change - 5.0).abs() < 1e-9);
    assert!(comparison.percent_change.is_infinite() && comparison.percent_change > 0.0);
}

#[test]
fn test_week_comparison_both_weeks_zero() {
    let analyzer = analyzer_from_daily("steps", day(2024, 5, 6), &[0.0; 14]);
    let comparison = analyzer.compare_week_to_date("steps", 20, 2024).unwrap();

    assert!((comparison.current_mean - 0.0).abs() < 1e-12);
    assert!((comparison.previous_mean - 0.0).abs() < 1e-12);
    assert!((comparison.percent_change - 0.0).abs() < 1e-12);
}

#[test]
fn test_week_comparison_truncates_partial_week() {
    // Week 20 has only 3 observed days; both weeks compare over 3 days
    let mut values = vec![10.0; 7];
    values.extend(vec![20.0; 3]);
    let analyzer = analyzer_from_daily("steps", day(2024, 5, 6), &values);

    let comparison = analyzer.compare_week_to_date("steps", 20, 2024).unwrap();
    assert_eq!(comparison.days_compared, 3);
    assert!((comparison.current_mean - 20.0).abs() < 1e-9);
    assert!((comparison.previous_mean - 10.0).abs() < 1e-9);
    assert!((comparison.percent_change - 100.0).abs() < 1e-9);
}

#[test]
fn test_week_one_wraps_into_prior_year() {
    // ISO week 1 of 2025 starts Monday 2024-12-30; the prior week is 52/2024
    let analyzer = analyzer_from_daily("steps", day(2024, 12, 23), &[10.0; 14]);
    let comparison = analyzer.compare_week_to_date("steps", 1, 2025).unwrap();

    assert_eq!(comparison.previous_year, 2024);
    assert_eq!(comparison.previous_week, 52);
}

#[test]
fn test_exponential_smoothing_carries_through_nan() {
    let smoothed = exponential_smoothing(&[10.0, f64::NAN, 20.0], 0.5);
    assert_eq!(smoothed.len(), 3);
    assert!((smoothed[0] - 10.0).abs() < 1e-12);
    assert!((smoothed[1] - 10.0).abs() < 1e-12);
    assert!((smoothed[2] - 15.0).abs() < 1e-12);
}

#[test]
fn test_moving_average_smoothing_preserves_length() {
    let smoothed = moving_average_smoothing(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
    assert_eq!(smoothed.len(), 5);
    assert!((smoothed[2] - 3.0).abs() < 1e-12);
}
