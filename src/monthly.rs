// ABOUTME: Monthly analysis layer: calendar/rolling month statistics, YoY comparison, growth rate
// ABOUTME: Distribution shape at eight-plus valid days, LRU memoization, rayon batch fan-out
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics
#![allow(clippy::cast_precision_loss)] // month lengths and sample sizes fit f64 exactly

use crate::cache::MemoCache;
use crate::config::MonthMode;
use crate::daily::{Aggregation, DailyAggregator};
use crate::errors::{AnalyticsError, Result};
use crate::stats::{self, NormalityTest, ALPHA};
use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum valid days before distribution shape is computed
const MIN_DAYS_FOR_DISTRIBUTION: usize = 8;

/// Minimum measured days in the target month for YoY significance testing
const MIN_DAYS_FOR_YOY_SIGNIFICANCE: usize = 7;

/// Minimum prior years for YoY significance testing
const MIN_YEARS_FOR_YOY_SIGNIFICANCE: usize = 3;

/// Batch size at which computation fans out onto the worker pool
const PARALLEL_BATCH_THRESHOLD: usize = 6;

/// Days in the rolling-month window
const ROLLING_WINDOW_DAYS: i64 = 30;

/// Distribution shape of a month's daily values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionStats {
    /// Moment-based skewness
    pub skewness: f64,
    /// Moment-based excess kurtosis
    pub kurtosis: f64,
    /// Normality test p-value
    pub normality_p_value: f64,
    /// Which normality test ran (Shapiro-Wilk family up to n = 5000, else KS)
    pub normality_test: NormalityTest,
    /// Whether the sample looks normal (p > 0.05)
    pub is_normal: bool,
    /// Jarque-Bera statistic
    pub jarque_bera: f64,
    /// Jarque-Bera chi-squared(2) p-value
    pub jarque_bera_p_value: f64,
}

/// Monthly statistics for one metric
///
/// The base statistics call never fails; an empty month degrades to zeroed
/// fields with `insufficient_data = true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyStatistics {
    /// Metric these statistics describe
    pub metric: String,
    /// Year of the named month
    pub year: i32,
    /// Month number (1-12)
    pub month: u32,
    /// First day of the aggregation window
    pub period_start: NaiveDate,
    /// Last day of the aggregation window
    pub period_end: NaiveDate,
    /// Boundary policy that produced the window
    pub mode: MonthMode,
    /// Mean of the measured days
    pub avg: f64,
    /// Median of the measured days
    pub median: f64,
    /// Sample standard deviation of the measured days
    pub std: f64,
    /// Smallest measured day value
    pub min: f64,
    /// Largest measured day value
    pub max: f64,
    /// Number of days with a valid measurement (never calendar days)
    pub count: usize,
    /// Distribution shape, present at eight or more valid days
    pub distribution: Option<DistributionStats>,
    /// True below two valid days
    pub insufficient_data: bool,
}

impl MonthlyStatistics {
    /// Zero-valued statistics for an empty or failed (metric, month)
    #[must_use]
    pub fn empty(
        metric: impl Into<String>,
        year: i32,
        month: u32,
        period_start: NaiveDate,
        period_end: NaiveDate,
        mode: MonthMode,
    ) -> Self {
        Self {
            metric: metric.into(),
            year,
            month,
            period_start,
            period_end,
            mode,
            avg: 0.0,
            median: 0.0,
            std: 0.0,
            min: 0.0,
            max: 0.0,
            count: 0,
            distribution: None,
            insufficient_data: true,
        }
    }

    /// Plain key-to-value mapping for display or serialization
    #[must_use]
    pub fn to_display_map(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Year-over-year comparison for one metric and month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearOverYearComparison {
    /// Metric compared
    pub metric: String,
    /// Month compared (1-12)
    pub month: u32,
    /// Target year
    pub target_year: i32,
    /// Monthly mean in the target year
    pub current_mean: f64,
    /// Average of the prior years' monthly means
    pub historical_mean: f64,
    /// Prior years that contributed data
    pub years_compared: usize,
    /// current - historical
    pub absolute_change: f64,
    /// Percent change with the +inf zero-previous sentinel
    pub percent_change: f64,
    /// One-sample t-test p-value, present when the significance gate is met
    pub p_value: Option<f64>,
    /// Whether the change is significant at alpha = 0.05
    pub significant: bool,
}

/// Compound growth rate over consecutive months
///
/// Months with non-positive means are skipped, not zero-filled, so the
/// compound-growth formula stays well-defined; `periods_used` reports how
/// many months survived the filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthRate {
    /// Metric measured
    pub metric: String,
    /// Months requested
    pub periods_requested: usize,
    /// Months that had a positive mean and entered the computation
    pub periods_used: usize,
    /// Compound monthly growth rate
    pub monthly_rate: f64,
    /// (1 + monthly)^12 - 1
    pub annualized_rate: f64,
    /// Lower 95% bound via log-linear regression, back-transformed
    pub confidence_low: f64,
    /// Upper 95% bound via log-linear regression, back-transformed
    pub confidence_high: f64,
    /// Whether the confidence interval excludes zero
    pub significant: bool,
}

impl GrowthRate {
    /// Zero/insignificant growth result for thin inputs
    #[must_use]
    pub fn zero(metric: impl Into<String>, periods_requested: usize, periods_used: usize) -> Self {
        Self {
            metric: metric.into(),
            periods_requested,
            periods_used,
            monthly_rate: 0.0,
            annualized_rate: 0.0,
            confidence_low: 0.0,
            confidence_high: 0.0,
            significant: false,
        }
    }
}

/// Calendar- or rolling-month statistics over the daily aggregator's output
pub struct MonthlyAnalyzer {
    daily: DailyAggregator,
    mode: MonthMode,
    parallel: bool,
    cache: MemoCache<(String, i32, u32), MonthlyStatistics>,
}

impl MonthlyAnalyzer {
    /// Analyzer over a daily aggregator, inheriting its configuration
    #[must_use]
    pub fn new(daily: DailyAggregator) -> Self {
        let mode = daily.config().month_mode;
        let parallel = daily.config().parallel;
        let cache = MemoCache::new(daily.config().cache_size);
        Self {
            daily,
            mode,
            parallel,
            cache,
        }
    }

    /// Boundary policy selected at construction
    #[must_use]
    pub const fn mode(&self) -> MonthMode {
        self.mode
    }

    /// Drop all memoized results
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    /// Aggregation window for a named month under the analyzer's mode
    ///
    /// Calendar mode spans the first through last calendar day (leap-year
    /// February included); rolling mode is a fixed 30-day window ending on
    /// the 15th of the named month.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a month outside 1-12.
    pub fn month_bounds(&self, year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            AnalyticsError::invalid_argument("month", format!("invalid month {year}-{month}"))
        })?;
        match self.mode {
            MonthMode::Calendar => {
                let next_first = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)
                }
                .ok_or_else(|| {
                    AnalyticsError::invalid_argument(
                        "month",
                        format!("invalid month {year}-{month}"),
                    )
                })?;
                Ok((first, next_first - Duration::days(1)))
            }
            MonthMode::Rolling => {
                let end = NaiveDate::from_ymd_opt(year, month, 15).ok_or_else(|| {
                    AnalyticsError::invalid_argument(
                        "month",
                        format!("invalid month {year}-{month}"),
                    )
                })?;
                Ok((end - Duration::days(ROLLING_WINDOW_DAYS - 1), end))
            }
        }
    }

    /// Monthly statistics for one metric; memoized per (metric, year, month)
    ///
    /// `count` reflects actual measured days, never calendar days. Never
    /// fails on empty data, degrading to a zeroed result instead.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a month outside 1-12.
    pub fn monthly_statistics(
        &self,
        metric: &str,
        year: i32,
        month: u32,
    ) -> Result<MonthlyStatistics> {
        let key = (metric.to_owned(), year, month);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let (start, end) = self.month_bounds(year, month)?;
        let series =
            self.daily
                .calculate_daily_aggregates(metric, Aggregation::Mean, Some(start), Some(end))?;
        let valid = series.valid_values();

        let statistics = if valid.is_empty() {
            MonthlyStatistics::empty(metric, year, month, start, end, self.mode)
        } else {
            let distribution = if valid.len() >= MIN_DAYS_FOR_DISTRIBUTION {
                distribution_stats(&valid).ok()
            } else {
                None
            };
            MonthlyStatistics {
                metric: metric.to_owned(),
                year,
                month,
                period_start: start,
                period_end: end,
                mode: self.mode,
                avg: stats::mean(&valid),
                median: stats::median(&valid),
                std: stats::sample_std(&valid).unwrap_or(0.0),
                min: valid.iter().copied().fold(f64::INFINITY, f64::min),
                max: valid.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                count: valid.len(),
                distribution,
                insufficient_data: valid.len() < 2,
            }
        };

        self.cache.put(key, statistics.clone());
        Ok(statistics)
    }

    /// Distribution shape of a month's daily values, explicitly requested
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` below eight valid days and
    /// `InvalidArgument` for a month outside 1-12.
    pub fn distribution_analysis(
        &self,
        metric: &str,
        year: i32,
        month: u32,
    ) -> Result<DistributionStats> {
        let (start, end) = self.month_bounds(year, month)?;
        let series =
            self.daily
                .calculate_daily_aggregates(metric, Aggregation::Mean, Some(start), Some(end))?;
        let valid = series.valid_values();
        if valid.len() < MIN_DAYS_FOR_DISTRIBUTION {
            return Err(AnalyticsError::insufficient_data(
                "distribution_analysis",
                MIN_DAYS_FOR_DISTRIBUTION,
                valid.len(),
            ));
        }
        distribution_stats(&valid)
    }

    /// Compare a month's mean to the average of the same month in prior years
    ///
    /// Significance requires at least three prior years and seven measured
    /// days in the target month, tested with a one-sample t-test of the
    /// current mean against the historical distribution.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a month outside 1-12 or zero
    /// `years_back`, and `InsufficientData` when no prior year has data.
    pub fn compare_year_over_year(
        &self,
        metric: &str,
        month: u32,
        target_year: i32,
        years_back: usize,
    ) -> Result<YearOverYearComparison> {
        if years_back == 0 {
            return Err(AnalyticsError::invalid_argument(
                "years_back",
                "must be at least 1",
            ));
        }
        let current = self.monthly_statistics(metric, target_year, month)?;

        let mut historical_means = Vec::with_capacity(years_back);
        for offset in 1..=years_back {
            let year = target_year - i32::try_from(offset).unwrap_or(i32::MAX);
            let prior = self.monthly_statistics(metric, year, month)?;
            if prior.count > 0 {
                historical_means.push(prior.avg);
            }
        }
        if historical_means.is_empty() {
            return Err(AnalyticsError::insufficient_data(
                "year_over_year",
                1,
                0,
            ));
        }

        let historical_mean = stats::mean(&historical_means);
        let percent = stats::percent_change(historical_mean, current.avg);

        let gate = historical_means.len() >= MIN_YEARS_FOR_YOY_SIGNIFICANCE
            && current.count >= MIN_DAYS_FOR_YOY_SIGNIFICANCE;
        let p_value = if gate {
            stats::one_sample_t_test(current.avg, &historical_means)
        } else {
            None
        };
        let significant = p_value.is_some_and(|p| p < ALPHA);

        Ok(YearOverYearComparison {
            metric: metric.to_owned(),
            month,
            target_year,
            current_mean: current.avg,
            historical_mean,
            years_compared: historical_means.len(),
            absolute_change: current.avg - historical_mean,
            percent_change: percent,
            p_value,
            significant,
        })
    }

    /// Compound monthly growth rate over up to `periods` months ending at the
    /// given month
    ///
    /// Months with non-positive means are skipped (not zero-filled). With
    /// fewer than two surviving months the result is zero/insignificant
    /// rather than an error. The 95% interval comes from log-linear OLS of
    /// log(mean) against the period index, back-transformed via exp - 1.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for zero periods or a month outside 1-12.
    pub fn calculate_growth_rate(
        &self,
        metric: &str,
        periods: usize,
        end_year: i32,
        end_month: u32,
    ) -> Result<GrowthRate> {
        if periods == 0 {
            return Err(AnalyticsError::invalid_argument(
                "periods",
                "must be at least 1",
            ));
        }

        // Chronological list of up to `periods` months ending at (end_year, end_month)
        let mut months = Vec::with_capacity(periods);
        let (mut year, mut month) = (end_year, end_month);
        for _ in 0..periods {
            months.push((year, month));
            (year, month) = previous_month(year, month);
        }
        months.reverse();

        let mut values = Vec::with_capacity(months.len());
        for (y, m) in months {
            let statistics = self.monthly_statistics(metric, y, m)?;
            if statistics.count > 0 && statistics.avg > 0.0 {
                values.push(statistics.avg);
            }
        }
        if values.len() < 2 {
            return Ok(GrowthRate::zero(metric, periods, values.len()));
        }

        let growth_periods = (values.len() - 1) as f64;
        let monthly_rate = (values[values.len() - 1] / values[0]).powf(1.0 / growth_periods) - 1.0;
        let annualized_rate = (1.0 + monthly_rate).powi(12) - 1.0;

        let log_values: Vec<f64> = values.iter().map(|v| v.ln()).collect();
        let regression = stats::linear_regression(&log_values)?;
        let (confidence_low, confidence_high) = if regression.degrees_of_freedom > 0 {
            let t_critical =
                stats::students_t_critical(0.95, regression.degrees_of_freedom as f64);
            let margin = t_critical * regression.slope_standard_error;
            (
                (regression.slope - margin).exp() - 1.0,
                (regression.slope + margin).exp() - 1.0,
            )
        } else {
            (monthly_rate, monthly_rate)
        };
        let significant = confidence_low > 0.0 || confidence_high < 0.0;

        Ok(GrowthRate {
            metric: metric.to_owned(),
            periods_requested: periods,
            periods_used: values.len(),
            monthly_rate,
            annualized_rate,
            confidence_low,
            confidence_high,
            significant,
        })
    }

    /// Monthly statistics for many (metric, year, month) combinations
    ///
    /// Fans out onto the rayon pool when the batch has at least six
    /// combinations and parallelism is enabled; an individual failure
    /// degrades that combination to a zeroed result and is logged, never
    /// aborting the batch.
    #[must_use]
    pub fn batch_statistics(
        &self,
        combinations: &[(String, i32, u32)],
    ) -> HashMap<(String, i32, u32), MonthlyStatistics> {
        let compute = |combo: &(String, i32, u32)| {
            let (metric, year, month) = combo;
            let statistics = self
                .monthly_statistics(metric, *year, *month)
                .unwrap_or_else(|error| {
                    tracing::warn!(
                        metric = %metric,
                        year,
                        month,
                        %error,
                        "monthly batch entry degraded to zeroed statistics"
                    );
                    let fallback_day =
                        NaiveDate::from_ymd_opt(*year, 1, 1).unwrap_or(NaiveDate::MIN);
                    MonthlyStatistics::empty(
                        metric.clone(),
                        *year,
                        *month,
                        fallback_day,
                        fallback_day,
                        self.mode,
                    )
                });
            (combo.clone(), statistics)
        };

        if self.parallel && combinations.len() >= PARALLEL_BATCH_THRESHOLD {
            combinations.par_iter().map(compute).collect()
        } else {
            combinations.iter().map(compute).collect()
        }
    }
}

fn distribution_stats(values: &[f64]) -> Result<DistributionStats> {
    let normality = stats::normality_test(values)?;
    let (jb, jb_p) = stats::jarque_bera(values);
    Ok(DistributionStats {
        skewness: stats::skewness(values),
        kurtosis: stats::excess_kurtosis(values),
        normality_p_value: normality.p_value,
        normality_test: normality.test,
        is_normal: normality.p_value > ALPHA,
        jarque_bera: jb,
        jarque_bera_p_value: jb_p,
    })
}

const fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}
