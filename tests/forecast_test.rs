// ABOUTME: Unit tests for the chain-of-strategies forecaster
// ABOUTME: Verifies strategy selection, method tagging, bands, and graceful decline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics

use chrono::{Duration, NaiveDate};
use vital_analytics::{
    ForecastEngine, ForecastStrategy, LinearTrendStrategy, MetricSeries, SeasonalNaiveStrategy,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn daily_series(metric: &str, start: NaiveDate, values: &[f64]) -> MetricSeries {
    let points = values
        .iter()
        .enumerate()
        .map(|(i, v)| (start + Duration::days(i as i64), *v))
        .collect();
    MetricSeries::new(metric, points).unwrap()
}

#[test]
fn test_short_series_falls_back_to_linear() {
    let values: Vec<f64> = (1..=10).map(f64::from).collect();
    let series = daily_series("steps", day(2024, 3, 1), &values);

    let forecast = ForecastEngine::default().forecast(&series, 5).unwrap();
    assert_eq!(forecast.method, "linear_regression");
    assert_eq!(forecast.horizon_days, 5);
    assert_eq!(forecast.points.len(), 5);

    // Perfect unit slope extrapolates exactly; zero residuals collapse the band
    assert!((forecast.points[0].value - 11.0).abs() < 1e-9);
    assert!((forecast.points[4].value - 15.0).abs() < 1e-9);
    assert!((forecast.points[0].upper - forecast.points[0].lower).abs() < 1e-9);
    assert_eq!(forecast.points[0].date, day(2024, 3, 11));
}

#[test]
fn test_long_series_uses_seasonal_naive() {
    let values = vec![100.0; 730];
    let series = daily_series("steps", day(2023, 1, 1), &values);

    let forecast = ForecastEngine::default().forecast(&series, 30).unwrap();
    assert_eq!(forecast.method, "seasonal_naive_trend");
    assert_eq!(forecast.points.len(), 30);
    for point in &forecast.points {
        assert!((point.value - 100.0).abs() < 1e-9);
        assert!(point.lower <= point.value && point.value <= point.upper);
    }
}

#[test]
fn test_empty_series_declines_entirely() {
    let series = MetricSeries::empty("steps");
    assert!(ForecastEngine::default().forecast(&series, 30).is_none());
}

#[test]
fn test_seasonal_naive_declines_below_a_year() {
    let values = vec![100.0; 200];
    let series = daily_series("steps", day(2024, 1, 1), &values);
    assert!(SeasonalNaiveStrategy.try_forecast(&series, 10).is_none());
}

#[test]
fn test_linear_declines_single_point() {
    let series = daily_series("steps", day(2024, 1, 1), &[42.0]);
    assert!(LinearTrendStrategy.try_forecast(&series, 10).is_none());
}

#[test]
fn test_custom_chain_order_is_respected() {
    // A chain with only the linear strategy never reports the seasonal method
    let engine = ForecastEngine::new(vec![Box::new(LinearTrendStrategy)]);
    let values = vec![50.0; 730];
    let series = daily_series("steps", day(2023, 1, 1), &values);

    let forecast = engine.forecast(&series, 7).unwrap();
    assert_eq!(forecast.method, "linear_regression");
}

#[test]
fn test_forecast_dates_follow_last_observation() {
    let values: Vec<f64> = (1..=30).map(f64::from).collect();
    let series = daily_series("steps", day(2024, 6, 1), &values);

    let forecast = ForecastEngine::default().forecast(&series, 3).unwrap();
    let last_observed = day(2024, 6, 30);
    for (i, point) in forecast.points.iter().enumerate() {
        assert_eq!(point.date, last_observed + Duration::days(i as i64 + 1));
    }
}
