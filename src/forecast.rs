// ABOUTME: Ranked chain-of-strategies forecaster with seasonal-naive and linear fallbacks
// ABOUTME: Strategies are tried in order; the output always names the method that actually ran
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics
#![allow(clippy::cast_precision_loss)] // horizon offsets and sample sizes fit f64 exactly

use crate::series::{Interpolation, MetricSeries};
use crate::stats;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// One-sided 90% normal quantile for the fallback confidence band
const BAND_Z_90: f64 = 1.645;

/// Days of recent history used to estimate the trend and volatility
const RECENT_TREND_DAYS: usize = 60;

/// Daily points required for the seasonal-naive strategy
const SEASONAL_NAIVE_MIN_POINTS: usize = 365;

/// One forecast day with its confidence band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Forecast date
    pub date: NaiveDate,
    /// Point forecast
    pub value: f64,
    /// Lower confidence bound
    pub lower: f64,
    /// Upper confidence bound
    pub upper: f64,
}

/// Forecast output with the strategy identifier that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    /// Identifier of the strategy that actually ran
    pub method: String,
    /// Days forecast ahead of the last observed date
    pub horizon_days: usize,
    /// Per-day forecasts with confidence bounds
    pub points: Vec<ForecastPoint>,
}

/// A forecasting algorithm that may decline an input it cannot handle
///
/// Declining (returning `None`) is never fatal; the engine falls through to
/// the next strategy in its ranked chain.
pub trait ForecastStrategy: Send + Sync {
    /// Stable identifier reported in the forecast output
    fn name(&self) -> &'static str;

    /// Attempt a forecast; `None` signals the strategy does not apply
    fn try_forecast(&self, series: &MetricSeries, horizon_days: usize) -> Option<Forecast>;
}

/// Repeat last year's daily pattern plus a linear trend from recent days
///
/// Requires at least 365 daily points after gap interpolation.
pub struct SeasonalNaiveStrategy;

impl ForecastStrategy for SeasonalNaiveStrategy {
    fn name(&self) -> &'static str {
        "seasonal_naive_trend"
    }

    fn try_forecast(&self, series: &MetricSeries, horizon_days: usize) -> Option<Forecast> {
        let filled = filled_daily(series);
        let values = filled.valid_values();
        let n = values.len();
        if n < SEASONAL_NAIVE_MIN_POINTS {
            return None;
        }
        let last_date = filled.last_date()?;

        let recent = &values[n - RECENT_TREND_DAYS.min(n)..];
        let slope = stats::linear_regression(recent).map_or(0.0, |r| r.slope);
        let band = BAND_Z_90 * recent_volatility(recent);

        let points = (1..=horizon_days)
            .map(|h| {
                let seasonal_base = values[n - SEASONAL_NAIVE_MIN_POINTS
                    + (h - 1) % SEASONAL_NAIVE_MIN_POINTS];
                let value = slope.mul_add(h as f64, seasonal_base);
                ForecastPoint {
                    date: last_date + Duration::days(h as i64),
                    value,
                    lower: value - band,
                    upper: value + band,
                }
            })
            .collect();

        Some(Forecast {
            method: self.name().to_owned(),
            horizon_days,
            points,
        })
    }
}

/// Ordinary-least-squares extrapolation for short series
pub struct LinearTrendStrategy;

impl ForecastStrategy for LinearTrendStrategy {
    fn name(&self) -> &'static str {
        "linear_regression"
    }

    fn try_forecast(&self, series: &MetricSeries, horizon_days: usize) -> Option<Forecast> {
        let filled = filled_daily(series);
        let values = filled.valid_values();
        if values.len() < 2 {
            return None;
        }
        let last_date = filled.last_date()?;
        let regression = stats::linear_regression(&values).ok()?;
        let band = BAND_Z_90 * regression.standard_error;

        let n = values.len() as f64;
        let points = (1..=horizon_days)
            .map(|h| {
                let value = regression.predict(n - 1.0 + h as f64);
                ForecastPoint {
                    date: last_date + Duration::days(h as i64),
                    value,
                    lower: value - band,
                    upper: value + band,
                }
            })
            .collect();

        Some(Forecast {
            method: self.name().to_owned(),
            horizon_days,
            points,
        })
    }
}

/// Ranked chain of forecast strategies
///
/// The default chain prefers the seasonality-aware strategy and falls back to
/// linear extrapolation; callers can prepend a richer external model. Each
/// fall-through is logged so degradation is observable.
pub struct ForecastEngine {
    strategies: Vec<Box<dyn ForecastStrategy>>,
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self {
            strategies: vec![Box::new(SeasonalNaiveStrategy), Box::new(LinearTrendStrategy)],
        }
    }
}

impl ForecastEngine {
    /// Engine over an explicit strategy chain, tried in order
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn ForecastStrategy>>) -> Self {
        Self { strategies }
    }

    /// First successful forecast from the chain
    ///
    /// `None` only when every strategy declined (e.g. an empty series).
    #[must_use]
    pub fn forecast(&self, series: &MetricSeries, horizon_days: usize) -> Option<Forecast> {
        for strategy in &self.strategies {
            if let Some(forecast) = strategy.try_forecast(series, horizon_days) {
                return Some(forecast);
            }
            tracing::warn!(
                metric = series.metric(),
                strategy = strategy.name(),
                "forecast strategy declined, falling back"
            );
        }
        None
    }
}

fn filled_daily(series: &MetricSeries) -> MetricSeries {
    series.filled(Interpolation::Linear)
}

/// Sample standard deviation of day-over-day changes in the recent window
fn recent_volatility(recent: &[f64]) -> f64 {
    if recent.len() < 2 {
        return 0.0;
    }
    let diffs: Vec<f64> = recent.windows(2).map(|w| w[1] - w[0]).collect();
    stats::sample_std(&diffs).unwrap_or(0.0)
}
