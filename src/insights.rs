// ABOUTME: Milestone detection and ranked natural-language insight generation
// ABOUTME: Personal records, improvement streaks, and jumps feed fixed-confidence insight objects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics

use crate::forecast::Forecast;
use crate::seasonal::{ChangePoint, MomentumDirection, MomentumReport, MomentumStrength};
use crate::series::MetricSeries;
use crate::stats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Most recent milestones kept
const MAX_MILESTONES: usize = 10;

/// Top insights kept after ranking
const MAX_INSIGHTS: usize = 10;

/// Consecutive period-over-period increases that count as a streak
const STREAK_MIN_LENGTH: usize = 3;

/// Jump threshold over the trailing six-period minimum
const JUMP_RATIO: f64 = 1.2;

/// Trailing periods the jump detector looks back over
const JUMP_LOOKBACK: usize = 6;

/// Fixed per-category insight confidences
///
/// Deliberately simple constants, not a learned model.
mod confidence {
    /// Strong momentum in either direction
    pub const MOMENTUM_STRONG: f64 = 0.9;
    /// Moderate momentum
    pub const MOMENTUM_MODERATE: f64 = 0.75;
    /// Weak but directional momentum
    pub const MOMENTUM_WEAK: f64 = 0.6;
    /// Volatility call-out
    pub const VOLATILITY: f64 = 0.65;
    /// Any detected milestone
    pub const MILESTONE: f64 = 0.8;
    /// A significant change point
    pub const CHANGE_POINT: f64 = 0.75;
    /// Forecast-delta insight
    pub const FORECAST: f64 = 0.7;
}

/// Kind of detected milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    /// New maximum value to date
    PersonalRecord,
    /// Three or more consecutive period-over-period increases
    ImprovementStreak,
    /// More than 20% above the trailing six-period minimum
    Jump,
}

/// A notable event in a metric's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    /// What kind of event this is
    pub kind: MilestoneKind,
    /// Period the event occurred in
    pub date: NaiveDate,
    /// Metric value at the event
    pub value: f64,
    /// Human-readable summary
    pub description: String,
    /// Supporting numbers (previous best, streak length, baseline)
    pub detail: serde_json::Value,
}

/// Insight category, which fixes the confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    /// Momentum direction and strength
    Momentum,
    /// Personal record, streak, or jump
    Milestone,
    /// Detected mean shift
    ChangePoint,
    /// Forecast relative to the current level
    Forecast,
}

/// A ranked natural-language insight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Category that produced the insight
    pub category: InsightCategory,
    /// Short headline
    pub title: String,
    /// One or two sentence narrative
    pub description: String,
    /// Fixed per-category confidence in [0, 1]
    pub confidence: f64,
    /// Supporting data for display
    pub data: serde_json::Value,
}

/// Milestone detection and insight ranking over analyzer outputs
pub struct InsightEngine;

impl InsightEngine {
    /// Detect personal records, improvement streaks, and jumps
    ///
    /// Operates on a period series (typically monthly means). Milestones are
    /// time-sorted and capped to the most recent ten.
    #[must_use]
    pub fn detect_milestones(series: &MetricSeries) -> Vec<Milestone> {
        let points = series.valid_points();
        let mut milestones = Vec::new();

        // Personal records: strictly new maximum after the first period
        let mut best = f64::NEG_INFINITY;
        for (i, (date, value)) in points.iter().enumerate() {
            if i > 0 && *value > best {
                milestones.push(Milestone {
                    kind: MilestoneKind::PersonalRecord,
                    date: *date,
                    value: *value,
                    description: format!("New record: {value:.1} (previous best {best:.1})"),
                    detail: json!({ "previous_best": best }),
                });
            }
            best = best.max(*value);
        }

        // Improvement streaks: a run of 3+ consecutive increases, recorded
        // once at the period where the run ends
        let mut run = 0usize;
        for i in 1..points.len() {
            if points[i].1 > points[i - 1].1 {
                run += 1;
            } else {
                run = 0;
            }
            let run_ends = i + 1 == points.len()
                || points.get(i + 1).is_some_and(|next| next.1 <= points[i].1);
            if run >= STREAK_MIN_LENGTH && run_ends {
                let (date, value) = points[i];
                milestones.push(Milestone {
                    kind: MilestoneKind::ImprovementStreak,
                    date,
                    value,
                    description: format!("{run} consecutive periods of improvement"),
                    detail: json!({ "streak_length": run }),
                });
            }
        }

        // Jumps: > 20% above the trailing six-period minimum
        for i in JUMP_LOOKBACK..points.len() {
            let trailing_min = points[i - JUMP_LOOKBACK..i]
                .iter()
                .map(|(_, v)| *v)
                .fold(f64::INFINITY, f64::min);
            let (date, value) = points[i];
            if trailing_min > 0.0 && value > JUMP_RATIO * trailing_min {
                milestones.push(Milestone {
                    kind: MilestoneKind::Jump,
                    date,
                    value,
                    description: format!(
                        "Jumped {:.0}% above the recent low of {trailing_min:.1}",
                        stats::percent_change(trailing_min, value)
                    ),
                    detail: json!({ "trailing_min": trailing_min }),
                });
            }
        }

        milestones.sort_by_key(|m| m.date);
        if milestones.len() > MAX_MILESTONES {
            milestones.drain(..milestones.len() - MAX_MILESTONES);
        }
        milestones
    }

    /// Ranked insights from momentum, milestones, change points, and forecast
    ///
    /// Sorted by confidence descending and truncated to the top ten.
    #[must_use]
    pub fn generate_insights(
        metric: &str,
        momentum: &MomentumReport,
        milestones: &[Milestone],
        change_points: &[ChangePoint],
        forecast: Option<&Forecast>,
        current_level: Option<f64>,
    ) -> Vec<Insight> {
        let mut insights = Vec::new();

        if let Some(insight) = momentum_insight(metric, momentum) {
            insights.push(insight);
        }

        for milestone in milestones {
            insights.push(Insight {
                category: InsightCategory::Milestone,
                title: milestone_title(milestone.kind, metric),
                description: milestone.description.clone(),
                confidence: confidence::MILESTONE,
                data: json!({
                    "date": milestone.date,
                    "value": milestone.value,
                    "detail": milestone.detail,
                }),
            });
        }

        for change_point in change_points {
            let direction = if change_point.after_mean > change_point.before_mean {
                "rose"
            } else {
                "dropped"
            };
            insights.push(Insight {
                category: InsightCategory::ChangePoint,
                title: format!("Shift detected in {metric}"),
                description: format!(
                    "Your typical {metric} {direction} from {:.1} to {:.1}",
                    change_point.before_mean, change_point.after_mean
                ),
                confidence: confidence::CHANGE_POINT,
                data: json!({
                    "date": change_point.date,
                    "magnitude": change_point.magnitude,
                    "p_value": change_point.p_value,
                }),
            });
        }

        if let (Some(forecast), Some(level)) = (forecast, current_level) {
            if let Some(last_point) = forecast.points.last() {
                let delta = stats::percent_change(level, last_point.value);
                if delta.is_finite() && delta.abs() >= 1.0 {
                    let direction = if delta > 0.0 { "rise" } else { "fall" };
                    insights.push(Insight {
                        category: InsightCategory::Forecast,
                        title: format!("{metric} projected to {direction}"),
                        description: format!(
                            "Projected to {direction} {:.0}% to {:.1} over the next {} days",
                            delta.abs(),
                            last_point.value,
                            forecast.horizon_days
                        ),
                        confidence: confidence::FORECAST,
                        data: json!({
                            "method": forecast.method,
                            "projected": last_point.value,
                            "percent_change": delta,
                        }),
                    });
                }
            }
        }

        insights.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        insights.truncate(MAX_INSIGHTS);
        insights
    }

    /// Longest and current improvement streak lengths over a period series
    #[must_use]
    pub fn streak_summary(series: &MetricSeries) -> (usize, usize) {
        let points = series.valid_points();
        let mut longest = 0usize;
        let mut current = 0usize;
        for pair in points.windows(2) {
            if pair[1].1 > pair[0].1 {
                current += 1;
                longest = longest.max(current);
            } else {
                current = 0;
            }
        }
        (longest, current)
    }

    /// Short textual summary composed from momentum and the top insight
    #[must_use]
    pub fn narrate(metric: &str, momentum: &MomentumReport, insights: &[Insight]) -> String {
        let mut summary = match momentum.direction {
            MomentumDirection::Increasing => {
                format!("Your {metric} is trending upward")
            }
            MomentumDirection::Decreasing => {
                format!("Your {metric} is trending downward")
            }
            MomentumDirection::Stable => format!("Your {metric} is holding steady"),
            MomentumDirection::Volatile => {
                format!("Your {metric} has been fluctuating without a clear direction")
            }
        };
        match momentum.strength {
            MomentumStrength::Strong => summary.push_str(" strongly"),
            MomentumStrength::Moderate => summary.push_str(" moderately"),
            MomentumStrength::Weak => {}
        }
        summary.push('.');
        if let Some(top) = insights.first() {
            summary.push(' ');
            summary.push_str(&top.description);
            summary.push('.');
        }
        summary
    }
}

fn momentum_insight(metric: &str, momentum: &MomentumReport) -> Option<Insight> {
    let (title, description, confidence) = match momentum.direction {
        MomentumDirection::Stable => return None,
        MomentumDirection::Volatile => (
            format!("{metric} is volatile"),
            format!(
                "Readings are swinging widely; consistency score {:.2}",
                momentum.consistency
            ),
            confidence::VOLATILITY,
        ),
        MomentumDirection::Increasing | MomentumDirection::Decreasing => {
            let trend_word = if momentum.direction == MomentumDirection::Increasing {
                "upward"
            } else {
                "downward"
            };
            let confidence = match momentum.strength {
                MomentumStrength::Strong => confidence::MOMENTUM_STRONG,
                MomentumStrength::Moderate => confidence::MOMENTUM_MODERATE,
                MomentumStrength::Weak => confidence::MOMENTUM_WEAK,
            };
            (
                format!("{metric} momentum is {trend_word}"),
                format!(
                    "Momentum score {:.2} with {:.2} consistency",
                    momentum.score, momentum.consistency
                ),
                confidence,
            )
        }
    };
    Some(Insight {
        category: InsightCategory::Momentum,
        title,
        description,
        confidence,
        data: json!({
            "score": momentum.score,
            "slope": momentum.slope,
            "acceleration": momentum.acceleration,
        }),
    })
}

fn milestone_title(kind: MilestoneKind, metric: &str) -> String {
    match kind {
        MilestoneKind::PersonalRecord => format!("Personal record for {metric}"),
        MilestoneKind::ImprovementStreak => format!("Improvement streak in {metric}"),
        MilestoneKind::Jump => format!("Big jump in {metric}"),
    }
}
