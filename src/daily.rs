// ABOUTME: Daily aggregation layer: collapses the raw measurement stream to one value per day
// ABOUTME: Descriptive statistics, IQR/z-score outlier detection, percentiles, aggregate series
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics
#![allow(clippy::cast_precision_loss)] // day counts and sample sizes fit f64 exactly

use crate::config::AnalyticsConfig;
use crate::errors::{AnalyticsError, Result};
use crate::records::MeasurementSource;
use crate::series::{Interpolation, MetricSeries};
use crate::stats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

/// IQR fence multiplier for outlier detection
const IQR_MULTIPLIER: f64 = 1.5;

/// Z-score magnitude above which a day is an outlier
const Z_SCORE_THRESHOLD: f64 = 3.0;

/// Relative/absolute tolerance under which all values count as identical
const IDENTICAL_VALUES_TOLERANCE: f64 = 1e-15;

/// How same-day readings collapse into the day's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Average of the day's readings (the default for statistics)
    Mean,
    /// Sum of the day's readings
    Sum,
    /// Smallest reading of the day
    Min,
    /// Largest reading of the day
    Max,
    /// Number of readings taken that day
    Count,
}

impl FromStr for Aggregation {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "count" => Ok(Self::Count),
            other => Err(AnalyticsError::invalid_argument(
                "aggregation",
                format!("unknown aggregation '{other}', expected mean|sum|min|max|count"),
            )),
        }
    }
}

/// Outlier detection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Values outside [Q1 - 1.5*IQR, Q3 + 1.5*IQR]
    Iqr,
    /// |z| > 3.0 against the population mean/std of the day series
    ZScore,
}

/// Descriptive statistics for one metric over a date range
///
/// Numeric fields are `None` in the degenerate regimes: with zero valid values
/// everything is `None`; with exactly one, mean/median/min/max carry that
/// value while std and percentiles stay `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStatistics {
    /// Metric these statistics describe
    pub metric: String,
    /// Number of days with a valid value
    pub count: usize,
    /// Mean of the valid day values
    pub mean: Option<f64>,
    /// Median of the valid day values
    pub median: Option<f64>,
    /// Sample standard deviation (ddof = 1)
    pub std: Option<f64>,
    /// Smallest valid day value
    pub min: Option<f64>,
    /// Largest valid day value
    pub max: Option<f64>,
    /// 25th percentile
    pub percentile_25: Option<f64>,
    /// 75th percentile
    pub percentile_75: Option<f64>,
    /// 95th percentile
    pub percentile_95: Option<f64>,
    /// Days flagged by the IQR fences
    pub outlier_count: usize,
    /// Days still missing after reindexing and optional gap fill
    pub missing_count: usize,
    /// True below two valid values
    pub insufficient_data: bool,
}

impl DailyStatistics {
    /// Statistics object for a metric with no usable data
    #[must_use]
    pub fn empty(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            count: 0,
            mean: None,
            median: None,
            std: None,
            min: None,
            max: None,
            percentile_25: None,
            percentile_75: None,
            percentile_95: None,
            outlier_count: 0,
            missing_count: 0,
            insufficient_data: true,
        }
    }

    /// Plain key-to-value mapping for display or serialization
    #[must_use]
    pub fn to_display_map(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Collapses the raw measurement stream into per-day values and statistics
///
/// The first stage of the calculator chain; the weekly and monthly analyzers
/// consume its daily series.
#[derive(Clone)]
pub struct DailyAggregator {
    source: Arc<dyn MeasurementSource + Send + Sync>,
    config: AnalyticsConfig,
}

impl DailyAggregator {
    /// Aggregator over a measurement source with the given configuration
    pub fn new(source: Arc<dyn MeasurementSource + Send + Sync>, config: AnalyticsConfig) -> Self {
        Self { source, config }
    }

    /// The configuration this aggregator was constructed with
    #[must_use]
    pub const fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Raw daily series for a metric under the requested aggregation
    ///
    /// Same-day readings collapse per `aggregation`; a day whose readings are
    /// all NaN stays present with a NaN value (skipping NaN would hide the
    /// distinction between "unmeasured" and "measured but unusable").
    ///
    /// # Errors
    ///
    /// Returns `DateRange` when `end` precedes `start`.
    pub fn calculate_daily_aggregates(
        &self,
        metric: &str,
        aggregation: Aggregation,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<MetricSeries> {
        validate_range(start, end)?;
        let records = self.source.records(metric, start, end);

        let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for record in records {
            let local_date = record
                .timestamp
                .with_timezone(&self.config.timezone)
                .date_naive();
            if start.is_some_and(|s| local_date < s) || end.is_some_and(|e| local_date > e) {
                continue;
            }
            by_day.entry(local_date).or_default().push(record.value);
        }

        let points: Vec<(NaiveDate, f64)> = by_day
            .into_iter()
            .map(|(date, readings)| (date, collapse_day(&readings, aggregation)))
            .collect();

        MetricSeries::new(metric, points)
    }

    /// Descriptive statistics for a metric over an optional date range
    ///
    /// Never fails on missing data: degenerate inputs produce a result with
    /// `insufficient_data = true` and nulled fields.
    ///
    /// # Errors
    ///
    /// Returns `DateRange` when `end` precedes `start`.
    pub fn calculate_statistics(
        &self,
        metric: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        interpolation: Interpolation,
    ) -> Result<DailyStatistics> {
        let day_series =
            self.calculate_daily_aggregates(metric, Aggregation::Mean, start, end)?;
        if day_series.is_empty() {
            return Ok(DailyStatistics::empty(metric));
        }

        let filled = day_series.filled(interpolation);
        let missing_count = filled.missing_count();
        let valid = filled.valid_values();

        if valid.is_empty() {
            let mut statistics = DailyStatistics::empty(metric);
            statistics.missing_count = missing_count;
            return Ok(statistics);
        }
        if valid.len() == 1 {
            let value = valid[0];
            return Ok(DailyStatistics {
                metric: metric.to_owned(),
                count: 1,
                mean: Some(value),
                median: Some(value),
                std: None,
                min: Some(value),
                max: Some(value),
                percentile_25: None,
                percentile_75: None,
                percentile_95: None,
                outlier_count: 0,
                missing_count,
                insufficient_data: true,
            });
        }

        let mean = stats::mean(&valid);
        let std = stats::sample_std(&valid);
        let mut min = valid.iter().copied().fold(f64::INFINITY, f64::min);
        let mut max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut median = stats::median(&valid);

        // Numerically identical values: collapse to the mean so floating-point
        // noise cannot place min above max
        let tolerance = IDENTICAL_VALUES_TOLERANCE * mean.abs().max(1.0);
        if (max - min).abs() <= tolerance {
            min = mean;
            max = mean;
            median = mean;
        }

        let percentile_25 = stats::percentile(&valid, 25.0)?;
        let percentile_75 = stats::percentile(&valid, 75.0)?;
        let percentile_95 = stats::percentile(&valid, 95.0)?;
        let outlier_count = iqr_flags(&valid).iter().filter(|flag| **flag).count();

        Ok(DailyStatistics {
            metric: metric.to_owned(),
            count: valid.len(),
            mean: Some(mean),
            median: Some(median),
            std,
            min: Some(min),
            max: Some(max),
            percentile_25: Some(percentile_25),
            percentile_75: Some(percentile_75),
            percentile_95: Some(percentile_95),
            outlier_count,
            missing_count,
            insufficient_data: false,
        })
    }

    /// Per-day outlier flags for a metric's daily mean series
    ///
    /// Only days with a valid value appear in the output. The z-score method
    /// uses population mean/std and returns all-false when the std is zero.
    ///
    /// # Errors
    ///
    /// Returns `DateRange` when `end` precedes `start`.
    pub fn detect_outliers(
        &self,
        metric: &str,
        method: OutlierMethod,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<(NaiveDate, bool)>> {
        let day_series =
            self.calculate_daily_aggregates(metric, Aggregation::Mean, start, end)?;
        let valid = day_series.valid_points();
        let values: Vec<f64> = valid.iter().map(|(_, v)| *v).collect();

        let flags = match method {
            OutlierMethod::Iqr => iqr_flags(&values),
            OutlierMethod::ZScore => z_score_flags(&values),
        };

        Ok(valid
            .iter()
            .zip(flags)
            .map(|((date, _), flag)| (*date, flag))
            .collect())
    }

    /// Requested percentiles of the daily mean series
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for any percentile outside [0, 100],
    /// `InsufficientData` when no valid day values exist, and `DateRange`
    /// when `end` precedes `start`.
    pub fn calculate_percentiles(
        &self,
        metric: &str,
        percentiles: &[f64],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<(f64, f64)>> {
        for p in percentiles {
            if !(0.0..=100.0).contains(p) {
                return Err(AnalyticsError::invalid_argument(
                    "percentiles",
                    format!("must be within [0, 100], got {p}"),
                ));
            }
        }
        let day_series =
            self.calculate_daily_aggregates(metric, Aggregation::Mean, start, end)?;
        let valid = day_series.valid_values();
        if valid.is_empty() {
            return Err(AnalyticsError::insufficient_data("percentiles", 1, 0));
        }
        percentiles
            .iter()
            .map(|p| stats::percentile(&valid, *p).map(|v| (*p, v)))
            .collect()
    }
}

fn validate_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
    if let (Some(s), Some(e)) = (start, end) {
        if e < s {
            return Err(AnalyticsError::DateRange { start: s, end: e });
        }
    }
    Ok(())
}

fn collapse_day(readings: &[f64], aggregation: Aggregation) -> f64 {
    let valid: Vec<f64> = readings.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.is_empty() {
        // All readings NaN: the day stays NaN rather than being dropped
        return match aggregation {
            Aggregation::Count => 0.0,
            _ => f64::NAN,
        };
    }
    match aggregation {
        Aggregation::Mean => stats::mean(&valid),
        Aggregation::Sum => valid.iter().sum(),
        Aggregation::Min => valid.iter().copied().fold(f64::INFINITY, f64::min),
        Aggregation::Max => valid.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Aggregation::Count => valid.len() as f64,
    }
}

fn iqr_flags(values: &[f64]) -> Vec<bool> {
    if values.len() < 4 {
        return vec![false; values.len()];
    }
    let (Ok(q1), Ok(q3)) = (
        stats::percentile(values, 25.0),
        stats::percentile(values, 75.0),
    ) else {
        return vec![false; values.len()];
    };
    let iqr = q3 - q1;
    let lower = IQR_MULTIPLIER.mul_add(-iqr, q1);
    let upper = IQR_MULTIPLIER.mul_add(iqr, q3);
    values.iter().map(|v| *v < lower || *v > upper).collect()
}

fn z_score_flags(values: &[f64]) -> Vec<bool> {
    let std = stats::population_std(values);
    if std == 0.0 {
        return vec![false; values.len()];
    }
    let mean = stats::mean(values);
    values
        .iter()
        .map(|v| ((v - mean) / std).abs() > Z_SCORE_THRESHOLD)
        .collect()
}
