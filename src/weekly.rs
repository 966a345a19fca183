// ABOUTME: Weekly analysis layer: rolling windows, trend detection, volatility, week comparisons
// ABOUTME: Consumes the daily aggregator's series reindexed so missing days are NaN, never zero
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics
#![allow(clippy::cast_precision_loss)] // window lengths and day counts fit f64 exactly

use crate::config::WeekStandard;
use crate::daily::{Aggregation, DailyAggregator};
use crate::errors::{AnalyticsError, Result};
use crate::series::Interpolation;
use crate::stats::{self, TrendDirection, ALPHA};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Batch size at which multi-metric computation fans out onto the worker pool
const PARALLEL_BATCH_THRESHOLD: usize = 6;

/// One day of rolling-window statistics
///
/// Early days use a shrinking window (minimum one period) rather than NaN;
/// a window with no valid values reports NaN for the point estimates and
/// `None` for the spread measures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingPoint {
    /// Day this window ends on
    pub date: NaiveDate,
    /// Windowed mean
    pub mean: f64,
    /// Windowed median
    pub median: f64,
    /// Windowed minimum
    pub min: f64,
    /// Windowed maximum
    pub max: f64,
    /// Windowed sample standard deviation; `None` below two valid values
    pub std: Option<f64>,
    /// Coefficient of variation (std / mean); `None` when std is undefined
    pub coefficient_of_variation: Option<f64>,
}

/// Linear-trend detection result over a rolling-mean series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendInfo {
    /// Metric the trend describes
    pub metric: String,
    /// OLS slope against the 0..n-1 index
    pub slope: f64,
    /// OLS intercept
    pub intercept: f64,
    /// Explained variance of the fit
    pub r_squared: f64,
    /// Two-tailed p-value of the slope, when computable
    pub p_value: Option<f64>,
    /// Direction: up/down only when the slope is significant at alpha = 0.05
    pub direction: TrendDirection,
    /// Whether the slope passed the significance test
    pub significant: bool,
}

impl TrendInfo {
    /// Zero-valued stable trend, used when a batch entry degrades
    #[must_use]
    pub fn degraded(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
            p_value: None,
            direction: TrendDirection::Stable,
            significant: false,
        }
    }
}

/// Volatility and consistency measures over a recent window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityReport {
    /// Metric the report describes
    pub metric: String,
    /// Sample standard deviation of the window
    pub std_dev: f64,
    /// Coefficient of variation (sigma / mu); infinite when the mean is zero
    pub coefficient_of_variation: f64,
    /// (max - min) / mean; infinite when the mean is zero
    pub range_ratio: f64,
    /// Bounded consistency score 1 / (1 + CV); 0 when CV is infinite
    pub consistency_score: f64,
}

/// Week-over-week comparison with partial-week truncation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekComparison {
    /// Metric compared
    pub metric: String,
    /// Week number of the current week
    pub week: u32,
    /// Year of the current week
    pub year: i32,
    /// Week number compared against (may wrap into the prior year)
    pub previous_week: u32,
    /// Year of the comparison week
    pub previous_year: i32,
    /// Mean of the current week over the compared days
    pub current_mean: f64,
    /// Mean of the previous week over the same number of elapsed days
    pub previous_mean: f64,
    /// current - previous
    pub absolute_change: f64,
    /// Percent change; +inf when the previous mean is zero and current is not
    pub percent_change: f64,
    /// Elapsed day count both weeks were truncated to
    pub days_compared: usize,
}

/// Rolling, trend, and comparison analysis over daily series
pub struct WeeklyAnalyzer {
    daily: DailyAggregator,
    week_standard: WeekStandard,
    parallel: bool,
}

impl WeeklyAnalyzer {
    /// Analyzer over a daily aggregator, inheriting its configuration
    #[must_use]
    pub fn new(daily: DailyAggregator) -> Self {
        let week_standard = daily.config().week_standard;
        let parallel = daily.config().parallel;
        Self {
            daily,
            week_standard,
            parallel,
        }
    }

    /// Rolling-window statistics for each day of the metric's range
    ///
    /// The daily series is reindexed to a complete range first, so missing
    /// days participate as NaN and shrink the effective window.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a zero window and `DateRange` for an
    /// inverted range.
    pub fn rolling_statistics(
        &self,
        metric: &str,
        window: usize,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<RollingPoint>> {
        if window == 0 {
            return Err(AnalyticsError::invalid_argument(
                "window",
                "rolling window must be at least 1",
            ));
        }
        let series = self
            .daily
            .calculate_daily_aggregates(metric, Aggregation::Mean, start, end)?
            .filled(Interpolation::None);

        let points = series.points();
        let mut rolling = Vec::with_capacity(points.len());
        for (i, (date, _)) in points.iter().enumerate() {
            let window_start = i.saturating_sub(window - 1);
            let in_window: Vec<f64> = points[window_start..=i]
                .iter()
                .map(|(_, v)| *v)
                .filter(|v| !v.is_nan())
                .collect();
            rolling.push(make_rolling_point(*date, &in_window));
        }
        Ok(rolling)
    }

    /// Ordinary-least-squares trend over the metric's rolling-mean series
    ///
    /// Direction is up/down only when the slope is significant at alpha 0.05,
    /// stable otherwise regardless of sign.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` when fewer than `window` valid points exist.
    pub fn detect_trend(&self, metric: &str, window: usize) -> Result<TrendInfo> {
        let rolling = self.rolling_statistics(metric, window, None, None)?;
        let values: Vec<f64> = rolling
            .iter()
            .map(|p| p.mean)
            .filter(|v| !v.is_nan())
            .collect();
        if values.len() < window.max(2) {
            return Err(AnalyticsError::insufficient_data(
                "trend_detection",
                window.max(2),
                values.len(),
            ));
        }

        let regression = stats::linear_regression(&values)?;
        let significant = regression.is_significant();
        let direction = if !significant {
            TrendDirection::Stable
        } else if regression.slope > 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        };

        Ok(TrendInfo {
            metric: metric.to_owned(),
            slope: regression.slope,
            intercept: regression.intercept,
            r_squared: regression.r_squared,
            p_value: regression.p_value,
            direction,
            significant,
        })
    }

    /// Trend detection across several metrics, fanned out when large enough
    ///
    /// A failing metric degrades to a zero-valued stable trend instead of
    /// aborting the batch.
    #[must_use]
    pub fn batch_trends(&self, metrics: &[String], window: usize) -> HashMap<String, TrendInfo> {
        let detect = |metric: &String| {
            let info = self.detect_trend(metric, window).unwrap_or_else(|error| {
                tracing::warn!(metric = %metric, %error, "trend detection degraded to stable");
                TrendInfo::degraded(metric.clone())
            });
            (metric.clone(), info)
        };
        if self.parallel && metrics.len() >= PARALLEL_BATCH_THRESHOLD {
            metrics.par_iter().map(detect).collect()
        } else {
            metrics.iter().map(detect).collect()
        }
    }

    /// Volatility measures over the metric's most recent `window` valid days
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` below two valid values.
    pub fn calculate_volatility(&self, metric: &str, window: usize) -> Result<VolatilityReport> {
        let series = self
            .daily
            .calculate_daily_aggregates(metric, Aggregation::Mean, None, None)?;
        let valid = series.valid_values();
        if valid.len() < 2 {
            return Err(AnalyticsError::insufficient_data(
                "volatility",
                2,
                valid.len(),
            ));
        }
        let recent = &valid[valid.len().saturating_sub(window)..];
        let mean = stats::mean(recent);
        let std_dev = stats::sample_std(recent).unwrap_or(0.0);
        let min = recent.iter().copied().fold(f64::INFINITY, f64::min);
        let max = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let coefficient_of_variation = if mean == 0.0 {
            f64::INFINITY
        } else {
            std_dev / mean
        };
        let range_ratio = if mean == 0.0 {
            f64::INFINITY
        } else {
            (max - min) / mean
        };
        let consistency_score = if coefficient_of_variation.is_infinite() {
            0.0
        } else {
            1.0 / (1.0 + coefficient_of_variation)
        };

        Ok(VolatilityReport {
            metric: metric.to_owned(),
            std_dev,
            coefficient_of_variation,
            range_ratio,
            consistency_score,
        })
    }

    /// Compare a week's mean to the immediately preceding week
    ///
    /// When the target week is still in progress relative to the last observed
    /// day, both weeks are truncated to the same elapsed day count so the
    /// comparison stays apples-to-apples. Week 1 wraps into the prior year's
    /// final week (52 or 53).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a week number outside the year and
    /// `InsufficientData` when the metric has no data at all.
    pub fn compare_week_to_date(
        &self,
        metric: &str,
        week: u32,
        year: i32,
    ) -> Result<WeekComparison> {
        let series = self
            .daily
            .calculate_daily_aggregates(metric, Aggregation::Mean, None, None)?;
        let Some(last_observed) = series.last_date() else {
            return Err(AnalyticsError::insufficient_data("week_comparison", 1, 0));
        };

        let current_start = week_start(self.week_standard, year, week)?;
        let (previous_year, previous_week) = if week > 1 {
            (year, week - 1)
        } else {
            let prior = year - 1;
            (prior, weeks_in_year(self.week_standard, prior))
        };
        let previous_start = week_start(self.week_standard, previous_year, previous_week)?;

        // Truncate both weeks to the elapsed portion of the current week
        let elapsed = if last_observed < current_start {
            7
        } else {
            usize::try_from((last_observed - current_start).num_days() + 1)
                .unwrap_or(7)
                .min(7)
        };

        let current_mean = week_mean(&series, current_start, elapsed);
        let previous_mean = week_mean(&series, previous_start, elapsed);
        let percent = stats::percent_change(previous_mean, current_mean);

        Ok(WeekComparison {
            metric: metric.to_owned(),
            week,
            year,
            previous_week,
            previous_year,
            current_mean,
            previous_mean,
            absolute_change: current_mean - previous_mean,
            percent_change: percent,
            days_compared: elapsed,
        })
    }

    /// Significance threshold used for trend direction
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        ALPHA
    }
}

/// Exponential smoothing over a value series, first value seeding the state
///
/// Alpha is clamped to [0, 1]; NaN inputs propagate through untouched.
#[must_use]
pub fn exponential_smoothing(values: &[f64], alpha: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let mut smoothed = Vec::with_capacity(values.len());
    smoothed.push(values[0]);
    for (i, value) in values.iter().enumerate().skip(1) {
        let previous = smoothed[i - 1];
        if value.is_nan() {
            smoothed.push(previous);
        } else {
            smoothed.push(alpha.mul_add(*value, (1.0 - alpha) * previous));
        }
    }
    smoothed
}

/// Centered moving-average smoothing; windows shrink at the edges
#[must_use]
pub fn moving_average_smoothing(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || values.len() < window {
        return values.to_vec();
    }
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(window / 2);
            let end = (start + window).min(values.len());
            let slice: Vec<f64> = values[start..end]
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .collect();
            if slice.is_empty() {
                f64::NAN
            } else {
                stats::mean(&slice)
            }
        })
        .collect()
}

fn make_rolling_point(date: NaiveDate, valid: &[f64]) -> RollingPoint {
    if valid.is_empty() {
        return RollingPoint {
            date,
            mean: f64::NAN,
            median: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            std: None,
            coefficient_of_variation: None,
        };
    }
    let mean = stats::mean(valid);
    let std = stats::sample_std(valid);
    let coefficient_of_variation = std.map(|s| if mean == 0.0 { f64::INFINITY } else { s / mean });
    RollingPoint {
        date,
        mean,
        median: stats::median(valid),
        min: valid.iter().copied().fold(f64::INFINITY, f64::min),
        max: valid.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        std,
        coefficient_of_variation,
    }
}

fn week_mean(series: &crate::series::MetricSeries, start: NaiveDate, elapsed: usize) -> f64 {
    let values: Vec<f64> = (0..elapsed)
        .filter_map(|offset| series.get(start + Duration::days(offset as i64)))
        .filter(|v| !v.is_nan())
        .collect();
    if values.is_empty() {
        0.0
    } else {
        stats::mean(&values)
    }
}

/// First day of the given week under a numbering standard
fn week_start(standard: WeekStandard, year: i32, week: u32) -> Result<NaiveDate> {
    match standard {
        WeekStandard::Iso => NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(|| {
            AnalyticsError::invalid_argument(
                "week",
                format!("ISO week {week} does not exist in {year}"),
            )
        }),
        WeekStandard::Us => {
            if week == 0 || week > weeks_in_year(WeekStandard::Us, year) {
                return Err(AnalyticsError::invalid_argument(
                    "week",
                    format!("US week {week} does not exist in {year}"),
                ));
            }
            let jan_first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
                AnalyticsError::invalid_argument("year", format!("invalid year {year}"))
            })?;
            let back = i64::from(jan_first.weekday().num_days_from_sunday());
            let week_one_start = jan_first - Duration::days(back);
            Ok(week_one_start + Duration::days(7 * (i64::from(week) - 1)))
        }
    }
}

/// Number of weeks in a year under a numbering standard (52 or 53)
fn weeks_in_year(standard: WeekStandard, year: i32) -> u32 {
    match standard {
        WeekStandard::Iso => NaiveDate::from_ymd_opt(year, 12, 28)
            .map_or(52, |d| d.iso_week().week()),
        WeekStandard::Us => {
            let Some(jan_first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
                return 52;
            };
            let Some(dec_last) = NaiveDate::from_ymd_opt(year, 12, 31) else {
                return 52;
            };
            let back = i64::from(jan_first.weekday().num_days_from_sunday());
            let week_one_start = jan_first - Duration::days(back);
            ((dec_last - week_one_start).num_days() / 7 + 1) as u32
        }
    }
}
