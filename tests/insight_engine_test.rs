// ABOUTME: Unit tests for milestone detection, insight ranking, streaks, and narration
// ABOUTME: Uses hand-built monthly series and analyzer outputs with known milestones
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics

use chrono::NaiveDate;
use serde_json::json;
use vital_analytics::{
    ChangePoint, ChangeSignificance, Forecast, ForecastPoint, InsightCategory, InsightEngine,
    MetricSeries, Milestone, MilestoneKind, MomentumDirection, MomentumReport, MomentumStrength,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn monthly_series(values: &[f64]) -> MetricSeries {
    let points = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let month = (i % 12) as u32 + 1;
            let year = 2023 + (i / 12) as i32;
            (day(year, month, 1), *v)
        })
        .collect();
    MetricSeries::new("steps", points).unwrap()
}

fn increasing_momentum() -> MomentumReport {
    MomentumReport {
        score: 0.85,
        slope: 1.0,
        direction: MomentumDirection::Increasing,
        strength: MomentumStrength::Strong,
        acceleration: 0.0,
        consistency: 0.95,
    }
}

#[test]
fn test_personal_records_skip_first_period() {
    let milestones = InsightEngine::detect_milestones(&monthly_series(&[10.0, 12.0, 11.0, 15.0]));

    let records: Vec<_> = milestones
        .iter()
        .filter(|m| m.kind == MilestoneKind::PersonalRecord)
        .collect();
    assert_eq!(records.len(), 2);
    assert!((records[0].value - 12.0).abs() < 1e-9);
    assert!((records[1].value - 15.0).abs() < 1e-9);
}

#[test]
fn test_streak_recorded_once_at_run_end() {
    // Four increases then a drop: one streak milestone of length 4
    let milestones =
        InsightEngine::detect_milestones(&monthly_series(&[1.0, 2.0, 3.0, 4.0, 5.0, 4.0]));

    let streaks: Vec<_> = milestones
        .iter()
        .filter(|m| m.kind == MilestoneKind::ImprovementStreak)
        .collect();
    assert_eq!(streaks.len(), 1);
    assert_eq!(streaks[0].detail["streak_length"], json!(4));
    assert!((streaks[0].value - 5.0).abs() < 1e-9);
}

#[test]
fn test_jump_over_trailing_minimum() {
    let milestones = InsightEngine::detect_milestones(&monthly_series(&[
        10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 20.0,
    ]));

    let jumps: Vec<_> = milestones
        .iter()
        .filter(|m| m.kind == MilestoneKind::Jump)
        .collect();
    assert_eq!(jumps.len(), 1);
    assert!((jumps[0].value - 20.0).abs() < 1e-9);
    assert_eq!(jumps[0].detail["trailing_min"], json!(10.0));
}

#[test]
fn test_milestones_capped_to_most_recent_ten() {
    let values: Vec<f64> = (1..=15).map(f64::from).collect();
    let milestones = InsightEngine::detect_milestones(&monthly_series(&values));

    assert_eq!(milestones.len(), 10);
    // Time-sorted ascending after the cap
    for pair in milestones.windows(2) {
        assert!(pair[0].date <= pair[1].date);
    }
}

#[test]
fn test_insights_ranked_by_confidence() {
    let momentum = increasing_momentum();
    let milestone = Milestone {
        kind: MilestoneKind::PersonalRecord,
        date: day(2024, 5, 1),
        value: 120.0,
        description: "New record: 120.0 (previous best 110.0)".to_owned(),
        detail: json!({ "previous_best": 110.0 }),
    };
    let change_point = ChangePoint {
        index: 8,
        date: Some(day(2024, 4, 1)),
        before_mean: 90.0,
        after_mean: 110.0,
        magnitude: 20.0,
        p_value: 0.002,
        confidence: 0.998,
        significance: ChangeSignificance::Medium,
    };
    let forecast = Forecast {
        method: "linear_regression".to_owned(),
        horizon_days: 30,
        points: vec![ForecastPoint {
            date: day(2024, 7, 1),
            value: 110.0,
            lower: 100.0,
            upper: 120.0,
        }],
    };

    let insights = InsightEngine::generate_insights(
        "steps",
        &momentum,
        &[milestone],
        &[change_point],
        Some(&forecast),
        Some(100.0),
    );

    assert_eq!(insights.len(), 4);
    assert_eq!(insights[0].category, InsightCategory::Momentum);
    assert!((insights[0].confidence - 0.9).abs() < 1e-12);
    assert_eq!(insights[1].category, InsightCategory::Milestone);
    assert!((insights[1].confidence - 0.8).abs() < 1e-12);
    assert_eq!(insights[2].category, InsightCategory::ChangePoint);
    assert_eq!(insights[3].category, InsightCategory::Forecast);
    for pair in insights.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
}

#[test]
fn test_stable_momentum_produces_no_insight() {
    let insights = InsightEngine::generate_insights(
        "steps",
        &MomentumReport::flat(),
        &[],
        &[],
        None,
        None,
    );
    assert!(insights.is_empty());
}

#[test]
fn test_small_forecast_delta_is_suppressed() {
    let forecast = Forecast {
        method: "linear_regression".to_owned(),
        horizon_days: 30,
        points: vec![ForecastPoint {
            date: day(2024, 7, 1),
            value: 100.5,
            lower: 99.0,
            upper: 102.0,
        }],
    };
    let insights = InsightEngine::generate_insights(
        "steps",
        &MomentumReport::flat(),
        &[],
        &[],
        Some(&forecast),
        Some(100.0),
    );
    assert!(insights.is_empty());
}

#[test]
fn test_streak_summary_longest_and_current() {
    let (longest, current) =
        InsightEngine::streak_summary(&monthly_series(&[1.0, 2.0, 3.0, 2.0, 3.0, 4.0]));
    assert_eq!(longest, 2);
    assert_eq!(current, 2);

    let (longest, current) =
        InsightEngine::streak_summary(&monthly_series(&[1.0, 2.0, 3.0, 4.0, 2.0]));
    assert_eq!(longest, 3);
    assert_eq!(current, 0);
}

#[test]
fn test_narration_reflects_momentum_and_top_insight() {
    let momentum = increasing_momentum();
    let insights = InsightEngine::generate_insights("resting_hr", &momentum, &[], &[], None, None);
    let narrative = InsightEngine::narrate("resting_hr", &momentum, &insights);

    assert!(narrative.contains("trending upward strongly"));
    assert!(narrative.contains("Momentum score"));
}
