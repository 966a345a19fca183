// ABOUTME: Unit tests for Fourier cycle detection, decomposition, change points, and momentum
// ABOUTME: Uses synthetic daily and monthly series with known cycles, shifts, and trends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics

use chrono::{Duration, NaiveDate};
use std::f64::consts::TAU;
use vital_analytics::{
    monthly_means, BreakSeverity, Decomposition, DecompositionMethod, MetricSeries,
    MomentumDirection, MomentumStrength, SeasonalAnalyzer,
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

/// Two years of a clean annual cycle with a small weekly wiggle on top
fn annual_cycle_series() -> MetricSeries {
    let values: Vec<f64> = (0..730)
        .map(|i| {
            let t = f64::from(i);
            2000.0f64.mul_add(
                (TAU * t / 365.25).sin(),
                30.0f64.mul_add((TAU * t / 7.0).sin(), 5000.0),
            )
        })
        .collect();
    daily_series("steps", day(2023, 1, 1), &values)
}

#[test]
fn test_fourier_detects_annual_cycle() {
    let analyzer = SeasonalAnalyzer::default();
    let analysis = analyzer.fourier_analysis(&annual_cycle_series());

    assert!(!analysis.insufficient_data);
    assert_eq!(analysis.sample_count, 730);
    assert!(analysis.annual_cycle_detected);
    assert!(!analysis.semi_annual_cycle_detected);
    assert!(analysis.seasonal_strength > 0.5);

    let dominant = &analysis.components[0];
    assert!((0.8..=1.2).contains(&dominant.frequency));
    assert!((dominant.period_days - 365.25).abs() < 60.0);
    assert!(dominant.p_value < 0.05);
    // Amplitude recovers the synthetic cycle magnitude to within 10%
    assert!((dominant.amplitude - 2000.0).abs() < 200.0);
}

#[test]
fn test_fourier_under_a_year_is_empty_not_error() {
    let values: Vec<f64> = (0..100).map(f64::from).collect();
    let series = daily_series("steps", day(2024, 1, 1), &values);
    let analysis = SeasonalAnalyzer::default().fourier_analysis(&series);

    assert!(analysis.insufficient_data);
    assert!(analysis.components.is_empty());
    assert!((analysis.seasonal_strength - 0.0).abs() < 1e-12);
    assert_eq!(analysis.sample_count, 100);
}

#[test]
fn test_decompose_recovers_seasonal_pattern() {
    // Three years of monthly data: fixed seasonal shape plus a slow trend
    let shape = [
        5.0, 3.0, 1.0, -1.0, -3.0, -5.0, -5.0, -3.0, -1.0, 1.0, 3.0, 5.0,
    ];
    let values: Vec<f64> = (0..36)
        .map(|i| 0.1f64.mul_add(i as f64, 100.0 + shape[i % 12]))
        .collect();

    let decomposition = SeasonalAnalyzer::default().decompose(&values);
    assert_eq!(decomposition.method, DecompositionMethod::StlStyle);
    assert_eq!(decomposition.period, 12);
    assert_eq!(decomposition.trend.len(), 36);
    assert_eq!(decomposition.seasonal.len(), 36);
    assert_eq!(decomposition.residual.len(), 36);
    assert!(decomposition.seasonal_strength > 0.5);
}

#[test]
fn test_decompose_short_series_falls_back_to_moving_average() {
    let values = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
    let decomposition = SeasonalAnalyzer::default().decompose(&values);

    assert_eq!(decomposition.method, DecompositionMethod::MovingAverage);
    assert!(decomposition
        .seasonal
        .iter()
        .all(|s| (s - 0.0).abs() < 1e-12));
    assert!((decomposition.seasonal_strength - 0.0).abs() < 1e-12);
}

#[test]
fn test_change_point_found_at_level_shift() {
    // Step from ~10 to ~50 halfway, with jitter so the windows have variance
    let values: Vec<f64> = (0..20)
        .map(|i| {
            let base = if i < 10 { 10.0 } else { 50.0 };
            0.1f64.mul_add((i % 3) as f64, base)
        })
        .collect();

    let change_points = SeasonalAnalyzer::default().detect_change_points(&values, None);
    assert!(!change_points.is_empty());
    let shift = &change_points[0];
    assert!((8..=12).contains(&shift.index));
    assert!(shift.after_mean > shift.before_mean);
    assert!(shift.magnitude > 20.0);
    assert!(shift.p_value < 0.05);
    assert!(shift.confidence > 0.95);
}

#[test]
fn test_no_change_point_in_steady_series() {
    let values: Vec<f64> = (0..20).map(|i| 10.0 + 0.1 * ((i % 3) as f64)).collect();
    let change_points = SeasonalAnalyzer::default().detect_change_points(&values, None);
    assert!(change_points.is_empty());
}

#[test]
fn test_momentum_perfect_rise_is_strong_increasing() {
    let values: Vec<f64> = (1..=20).map(f64::from).collect();
    let momentum = SeasonalAnalyzer::default().momentum(&values);

    assert_eq!(momentum.direction, MomentumDirection::Increasing);
    assert_eq!(momentum.strength, MomentumStrength::Strong);
    assert!(momentum.score > 0.7);
    assert!((momentum.slope - 1.0).abs() < 1e-9);
    assert!((momentum.consistency - 1.0).abs() < 1e-9);
}

#[test]
fn test_momentum_constant_series_is_stable() {
    let momentum = SeasonalAnalyzer::default().momentum(&[5.0; 10]);
    assert_eq!(momentum.direction, MomentumDirection::Stable);
    assert_eq!(momentum.strength, MomentumStrength::Weak);
    assert!((momentum.score - 0.0).abs() < 1e-12);
}

#[test]
fn test_momentum_under_three_points_is_flat() {
    let momentum = SeasonalAnalyzer::default().momentum(&[1.0, 2.0]);
    assert_eq!(momentum.direction, MomentumDirection::Stable);
    assert!((momentum.score - 0.0).abs() < 1e-12);
}

#[test]
fn test_pattern_break_flags_residual_spike() {
    let mut residual: Vec<f64> = (0..20).map(|i| 0.1 * f64::from(i % 2)).collect();
    residual.push(10.0);
    let len = residual.len();
    let decomposition = Decomposition {
        trend: vec![0.0; len],
        seasonal: vec![0.0; len],
        residual,
        period: 12,
        seasonal_strength: 0.0,
        trend_strength: 0.0,
        method: DecompositionMethod::MovingAverage,
    };

    let breaks = SeasonalAnalyzer::default().pattern_breaks(&decomposition, None);
    assert_eq!(breaks.len(), 1);
    assert_eq!(breaks[0].index, 20);
    assert!(breaks[0].deviation > 2.0);
    assert_eq!(breaks[0].severity, BreakSeverity::High);
    assert!(breaks[0].p_value < 0.05);
}

#[test]
fn test_monthly_means_skips_empty_months() {
    let mut points = Vec::new();
    for d in 1..=10 {
        points.push((day(2024, 1, d), 10.0));
    }
    // February has no data at all
    for d in 1..=10 {
        points.push((day(2024, 3, d), 30.0));
    }
    let series = MetricSeries::new("steps", points).unwrap();

    let monthly = monthly_means(&series).unwrap();
    assert_eq!(monthly.len(), 2);
    let months = monthly.points();
    assert_eq!(months[0].0, day(2024, 1, 1));
    assert!((months[0].1 - 10.0).abs() < 1e-9);
    assert_eq!(months[1].0, day(2024, 3, 1));
    assert!((months[1].1 - 30.0).abs() < 1e-9);
}

#[test]
fn test_full_analysis_bundle_on_two_year_series() {
    let series = annual_cycle_series();
    let result = SeasonalAnalyzer::default().analyze(&series).unwrap();

    assert_eq!(result.metric, "steps");
    assert!(result.fourier.annual_cycle_detected);
    assert!(result.decomposition.is_some());

    let forecast = result.forecast.unwrap();
    assert_eq!(forecast.method, "seasonal_naive_trend");
    assert_eq!(forecast.horizon_days, 30);
    assert_eq!(forecast.points.len(), 30);
}
