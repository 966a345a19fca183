// ABOUTME: Seasonal analysis layer: Fourier cycle detection, decomposition, change points, momentum
// ABOUTME: Pure functional pipeline per call; degraded inputs yield explicit empty results
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics
#![allow(clippy::cast_precision_loss)] // sample counts and bin indices fit f64 exactly

use crate::errors::Result;
use crate::forecast::{Forecast, ForecastEngine};
use crate::insights::{Insight, InsightEngine, Milestone};
use crate::series::{Interpolation, MetricSeries};
use crate::stats::{self, ALPHA};
use chrono::{Datelike, NaiveDate};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

/// Minimum daily points required for Fourier analysis
const MIN_POINTS_FOR_FOURIER: usize = 365;

/// Days per year used for frequency conversion
const DAYS_PER_YEAR: f64 = 365.25;

/// Power threshold above the spectrum mean, in standard deviations
const PEAK_POWER_SIGMA: f64 = 2.0;

/// Maximum frequency components reported
const MAX_COMPONENTS: usize = 10;

/// Frequency band (cycles/year) counted toward seasonal strength
const SEASONAL_BAND: (f64, f64) = (0.5, 4.0);

/// Annual cycle band in cycles/year
const ANNUAL_BAND: (f64, f64) = (0.8, 1.2);

/// Semi-annual cycle band in cycles/year
const SEMI_ANNUAL_BAND: (f64, f64) = (1.8, 2.2);

/// Default seasonal period for monthly decomposition
const DEFAULT_SEASONAL_PERIOD: usize = 12;

/// Minimum change-point segment length
const MIN_SEGMENT_LENGTH: usize = 5;

/// Momentum score magnitude below which the direction is stable
const MOMENTUM_STABLE_THRESHOLD: f64 = 0.1;

/// Slope-to-noise ratio below which the direction is volatile
const MOMENTUM_VOLATILE_RATIO: f64 = 0.5;

/// Residual deviation (in sigma) that triggers a pattern-break alert
const PATTERN_BREAK_SIGMA: f64 = 2.0;

/// One dominant frequency component of the metric's spectrum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyComponent {
    /// Frequency in cycles per year
    pub frequency: f64,
    /// Amplitude in metric units (2|X|/n)
    pub amplitude: f64,
    /// Phase in radians
    pub phase: f64,
    /// Cycle length in days (365.25 / frequency)
    pub period_days: f64,
    /// Spectral power |X|^2
    pub power: f64,
    /// F-test p-value of the peak against the background spectrum
    pub p_value: f64,
}

/// Discrete Fourier analysis of a daily metric series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FourierAnalysis {
    /// Significant components, power-descending, at most ten
    pub components: Vec<FrequencyComponent>,
    /// Share of spectral power in the 0.5-4 cycles/year band
    pub seasonal_strength: f64,
    /// A significant component lies in the 0.8-1.2 cycles/year band
    pub annual_cycle_detected: bool,
    /// A significant component lies in the 1.8-2.2 cycles/year band
    pub semi_annual_cycle_detected: bool,
    /// Daily samples analyzed after interpolation
    pub sample_count: usize,
    /// True when fewer than 365 daily points were available
    pub insufficient_data: bool,
}

impl FourierAnalysis {
    /// Explicit empty result for sub-year series
    #[must_use]
    pub const fn empty(sample_count: usize) -> Self {
        Self {
            components: Vec::new(),
            seasonal_strength: 0.0,
            annual_cycle_detected: false,
            semi_annual_cycle_detected: false,
            sample_count,
            insufficient_data: true,
        }
    }
}

/// Which decomposition algorithm actually ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionMethod {
    /// STL-style additive decomposition with robust seasonal fitting
    StlStyle,
    /// Centered moving-average trend with zero seasonal component
    MovingAverage,
}

/// Additive trend/seasonal/residual decomposition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decomposition {
    /// Trend component, same length as the input
    pub trend: Vec<f64>,
    /// Seasonal component, zeros under the moving-average fallback
    pub seasonal: Vec<f64>,
    /// Residual component (value - trend - seasonal)
    pub residual: Vec<f64>,
    /// Seasonal period the fit used
    pub period: usize,
    /// var(seasonal) / (var(seasonal) + var(residual))
    pub seasonal_strength: f64,
    /// var(trend) / (var(trend) + var(residual))
    pub trend_strength: f64,
    /// Algorithm that actually ran
    pub method: DecompositionMethod,
}

/// Tier of change-point significance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSignificance {
    /// p < 0.001
    High,
    /// p < 0.01
    Medium,
    /// p < 0.05
    Low,
}

impl ChangeSignificance {
    fn from_p_value(p: f64) -> Self {
        if p < 0.001 {
            Self::High
        } else if p < 0.01 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A statistically significant shift in the underlying mean
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePoint {
    /// Index into the analyzed series
    pub index: usize,
    /// Date of the shift when dates were supplied
    pub date: Option<NaiveDate>,
    /// Mean of the window before the shift
    pub before_mean: f64,
    /// Mean of the window after the shift
    pub after_mean: f64,
    /// |after - before|
    pub magnitude: f64,
    /// Two-sample t-test p-value
    pub p_value: f64,
    /// 1 - p
    pub confidence: f64,
    /// Significance tier
    pub significance: ChangeSignificance,
}

/// Direction of the momentum signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumDirection {
    /// Significant upward movement
    Increasing,
    /// Significant downward movement
    Decreasing,
    /// Score magnitude below 0.1
    Stable,
    /// Noise dominates the trend
    Volatile,
}

/// Strength bucket of the momentum score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumStrength {
    /// |score| < 0.3
    Weak,
    /// |score| < 0.7
    Moderate,
    /// |score| >= 0.7
    Strong,
}

impl MomentumStrength {
    fn from_score(score: f64) -> Self {
        let magnitude = score.abs();
        if magnitude < 0.3 {
            Self::Weak
        } else if magnitude < 0.7 {
            Self::Moderate
        } else {
            Self::Strong
        }
    }
}

/// Bounded momentum signal derived from a squashed normalized slope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumReport {
    /// tanh-squashed normalized slope in [-1, 1]
    pub score: f64,
    /// Raw OLS slope per period
    pub slope: f64,
    /// Direction classification
    pub direction: MomentumDirection,
    /// Strength bucket by absolute score
    pub strength: MomentumStrength,
    /// Mean second difference of the series
    pub acceleration: f64,
    /// 1 / (1 + std(residuals) / mean(|residuals|)); 1.0 for a perfect fit
    pub consistency: f64,
}

impl MomentumReport {
    /// Flat momentum for degenerate inputs
    #[must_use]
    pub const fn flat() -> Self {
        Self {
            score: 0.0,
            slope: 0.0,
            direction: MomentumDirection::Stable,
            strength: MomentumStrength::Weak,
            acceleration: 0.0,
            consistency: 1.0,
        }
    }
}

/// Severity of a pattern-break alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakSeverity {
    /// Beyond three sigma
    High,
    /// Beyond two sigma
    Medium,
    /// At or under two sigma
    Low,
}

/// A residual excursion beyond the expected seasonal pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternBreak {
    /// Index into the decomposed series
    pub index: usize,
    /// Date of the excursion when dates were supplied
    pub date: Option<NaiveDate>,
    /// Signed deviation in sigma multiples
    pub deviation: f64,
    /// Two-sided normal-CDF significance
    pub p_value: f64,
    /// Severity tier
    pub severity: BreakSeverity,
}

/// Full seasonal analysis bundle for one metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalAnalysisResult {
    /// Metric analyzed
    pub metric: String,
    /// Dominant-cycle spectrum analysis
    pub fourier: FourierAnalysis,
    /// Monthly decomposition, absent below four monthly points
    pub decomposition: Option<Decomposition>,
    /// Detected mean shifts in the monthly series
    pub change_points: Vec<ChangePoint>,
    /// Momentum over the monthly series
    pub momentum: MomentumReport,
    /// Forecast from the strategy chain, absent when every strategy declined
    pub forecast: Option<Forecast>,
    /// Pattern-break alerts from the decomposition residuals
    pub pattern_breaks: Vec<PatternBreak>,
    /// Detected milestones, time-sorted, most recent ten
    pub milestones: Vec<Milestone>,
    /// Ranked insights, confidence-descending, top ten
    pub insights: Vec<Insight>,
}

/// Fourier, decomposition, change-point, and momentum analysis
///
/// Stateless: every method is a pure function of its inputs.
pub struct SeasonalAnalyzer {
    seasonal_period: usize,
    forecaster: ForecastEngine,
}

impl Default for SeasonalAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_SEASONAL_PERIOD)
    }
}

impl SeasonalAnalyzer {
    /// Analyzer with a custom seasonal period (12 = monthly data, annual cycle)
    #[must_use]
    pub fn new(seasonal_period: usize) -> Self {
        Self {
            seasonal_period: seasonal_period.max(2),
            forecaster: ForecastEngine::default(),
        }
    }

    /// Replace the forecast strategy chain
    #[must_use]
    pub fn with_forecaster(mut self, forecaster: ForecastEngine) -> Self {
        self.forecaster = forecaster;
        self
    }

    /// Discrete Fourier analysis of a daily series
    ///
    /// Missing days are linearly interpolated (edges carried flat). Below 365
    /// points the result is an explicit empty analysis, not an error: cycle
    /// detection is a best-effort feature detector.
    #[must_use]
    pub fn fourier_analysis(&self, series: &MetricSeries) -> FourierAnalysis {
        let values = daily_filled_values(series);
        let n = values.len();
        if n < MIN_POINTS_FOR_FOURIER {
            return FourierAnalysis::empty(n);
        }

        let mean = stats::mean(&values);
        let mut buffer: Vec<Complex<f64>> = values
            .iter()
            .map(|v| Complex::new(v - mean, 0.0))
            .collect();
        let mut planner = FftPlanner::new();
        planner.plan_fft_forward(n).process(&mut buffer);

        // Positive frequencies only; bin k maps to k/n cycles/day
        let half = n / 2;
        let powers: Vec<f64> = (1..=half).map(|k| buffer[k].norm_sqr()).collect();
        let frequencies: Vec<f64> = (1..=half)
            .map(|k| k as f64 / n as f64 * DAYS_PER_YEAR)
            .collect();

        let total_power: f64 = powers.iter().sum();
        let seasonal_power: f64 = powers
            .iter()
            .zip(&frequencies)
            .filter(|(_, f)| (SEASONAL_BAND.0..=SEASONAL_BAND.1).contains(*f))
            .map(|(p, _)| p)
            .sum();
        let seasonal_strength = if total_power > 0.0 {
            seasonal_power / total_power
        } else {
            0.0
        };

        let threshold = PEAK_POWER_SIGMA.mul_add(stats::population_std(&powers), stats::mean(&powers));
        let separation = (n / 100).max(1);
        let background = stats::mean(&powers);

        // Greedy peak picking, power-descending, enforcing bin separation
        let mut candidate_bins: Vec<usize> = (0..powers.len())
            .filter(|&i| powers[i] > threshold)
            .collect();
        candidate_bins.sort_by(|a, b| {
            powers[*b]
                .partial_cmp(&powers[*a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut kept_bins: Vec<usize> = Vec::new();
        for bin in candidate_bins {
            if kept_bins.iter().all(|k| bin.abs_diff(*k) >= separation) {
                kept_bins.push(bin);
            }
        }

        let mut components: Vec<FrequencyComponent> = kept_bins
            .into_iter()
            .filter_map(|bin| {
                let power = powers[bin];
                let f_stat = if background > 0.0 { power / background } else { 0.0 };
                let p_value = stats::f_test_upper_tail(f_stat, 2.0, (n - 2) as f64);
                if p_value >= ALPHA {
                    return None;
                }
                let frequency = frequencies[bin];
                Some(FrequencyComponent {
                    frequency,
                    amplitude: 2.0 * buffer[bin + 1].norm() / n as f64,
                    phase: buffer[bin + 1].arg(),
                    period_days: DAYS_PER_YEAR / frequency,
                    power,
                    p_value,
                })
            })
            .collect();
        components.sort_by(|a, b| {
            b.power
                .partial_cmp(&a.power)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        components.truncate(MAX_COMPONENTS);

        let annual_cycle_detected = components
            .iter()
            .any(|c| (ANNUAL_BAND.0..=ANNUAL_BAND.1).contains(&c.frequency));
        let semi_annual_cycle_detected = components
            .iter()
            .any(|c| (SEMI_ANNUAL_BAND.0..=SEMI_ANNUAL_BAND.1).contains(&c.frequency));

        FourierAnalysis {
            components,
            seasonal_strength,
            annual_cycle_detected,
            semi_annual_cycle_detected,
            sample_count: n,
            insufficient_data: false,
        }
    }

    /// Additive trend/seasonal/residual decomposition
    ///
    /// STL-style with robust (median) seasonal fitting when the series has at
    /// least twice the seasonal period; otherwise a centered moving-average
    /// trend with zero seasonal component.
    #[must_use]
    pub fn decompose(&self, values: &[f64]) -> Decomposition {
        let period = self.seasonal_period;
        if values.len() >= 2 * period {
            stl_style_decomposition(values, period)
        } else {
            moving_average_decomposition(values, period)
        }
    }

    /// Mean-shift detection via adjacent-window t-tests
    ///
    /// Windows are `max(5, n/10)` samples; candidates within one window-width
    /// of an already-kept point are suppressed, earliest first.
    #[must_use]
    pub fn detect_change_points(
        &self,
        values: &[f64],
        dates: Option<&[NaiveDate]>,
    ) -> Vec<ChangePoint> {
        let n = values.len();
        let window = MIN_SEGMENT_LENGTH.max(n / 10);
        if n < 2 * window {
            return Vec::new();
        }

        let mut change_points = Vec::new();
        let mut last_kept: Option<usize> = None;
        for i in window..=(n - window) {
            if last_kept.is_some_and(|k| i - k < window) {
                continue;
            }
            let before = &values[i - window..i];
            let after = &values[i..i + window];
            let (_, p_value) = stats::welch_t_test(before, after);
            if p_value >= ALPHA {
                continue;
            }
            let before_mean = stats::mean(before);
            let after_mean = stats::mean(after);
            change_points.push(ChangePoint {
                index: i,
                date: dates.and_then(|d| d.get(i).copied()),
                before_mean,
                after_mean,
                magnitude: (after_mean - before_mean).abs(),
                p_value,
                confidence: 1.0 - p_value,
                significance: ChangeSignificance::from_p_value(p_value),
            });
            last_kept = Some(i);
        }
        change_points
    }

    /// Momentum score from the tanh-squashed normalized regression slope
    #[must_use]
    pub fn momentum(&self, values: &[f64]) -> MomentumReport {
        let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let n = valid.len();
        if n < 3 {
            return MomentumReport::flat();
        }
        let Ok(regression) = stats::linear_regression(&valid) else {
            return MomentumReport::flat();
        };

        let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
        let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        let score = if range > 0.0 {
            (regression.slope * n as f64 / range).tanh()
        } else {
            0.0
        };

        let residuals = regression.residuals(&valid);
        let noise = stats::population_std(&residuals);
        let direction = if score.abs() < MOMENTUM_STABLE_THRESHOLD {
            MomentumDirection::Stable
        } else if noise > 0.0 && regression.slope.abs() / noise < MOMENTUM_VOLATILE_RATIO {
            MomentumDirection::Volatile
        } else if score > 0.0 {
            MomentumDirection::Increasing
        } else {
            MomentumDirection::Decreasing
        };

        let acceleration = second_difference_mean(&valid);
        let mean_abs_residual = stats::mean(
            &residuals.iter().map(|r| r.abs()).collect::<Vec<f64>>(),
        );
        let consistency = if mean_abs_residual == 0.0 {
            1.0
        } else {
            1.0 / (1.0 + stats::population_std(&residuals) / mean_abs_residual)
        };

        MomentumReport {
            score,
            slope: regression.slope,
            direction,
            strength: MomentumStrength::from_score(score),
            acceleration,
            consistency,
        }
    }

    /// Residual excursions beyond two sigma of the decomposition residuals
    #[must_use]
    pub fn pattern_breaks(
        &self,
        decomposition: &Decomposition,
        dates: Option<&[NaiveDate]>,
    ) -> Vec<PatternBreak> {
        let sigma = stats::population_std(&decomposition.residual);
        if sigma <= 0.0 {
            return Vec::new();
        }
        decomposition
            .residual
            .iter()
            .enumerate()
            .filter_map(|(index, residual)| {
                let deviation = residual / sigma;
                if deviation.abs() <= PATTERN_BREAK_SIGMA {
                    return None;
                }
                let p_value = 2.0 * (1.0 - stats::standard_normal_cdf(deviation.abs()));
                let severity = if deviation.abs() > 3.0 {
                    BreakSeverity::High
                } else {
                    BreakSeverity::Medium
                };
                Some(PatternBreak {
                    index,
                    date: dates.and_then(|d| d.get(index).copied()),
                    deviation,
                    p_value,
                    severity,
                })
            })
            .collect()
    }

    /// Full pipeline: spectrum, decomposition, change points, momentum,
    /// forecast, milestones, and ranked insights for one metric
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the monthly resample produces an
    /// internally inconsistent series (should not happen for a valid input).
    pub fn analyze(&self, series: &MetricSeries) -> Result<SeasonalAnalysisResult> {
        let fourier = self.fourier_analysis(series);

        let monthly = monthly_means(series)?;
        let monthly_values = monthly.values();
        let monthly_dates: Vec<NaiveDate> = monthly.points().iter().map(|(d, _)| *d).collect();

        let decomposition = if monthly_values.len() >= 4 {
            Some(self.decompose(&monthly_values))
        } else {
            None
        };
        let change_points = self.detect_change_points(&monthly_values, Some(&monthly_dates));
        let momentum = self.momentum(&monthly_values);
        let pattern_breaks = decomposition
            .as_ref()
            .map(|d| self.pattern_breaks(d, Some(&monthly_dates)))
            .unwrap_or_default();

        let forecast = self.forecaster.forecast(series, 30);
        let milestones = InsightEngine::detect_milestones(&monthly);
        let insights = InsightEngine::generate_insights(
            series.metric(),
            &momentum,
            &milestones,
            &change_points,
            forecast.as_ref(),
            monthly_values.last().copied(),
        );

        Ok(SeasonalAnalysisResult {
            metric: series.metric().to_owned(),
            fourier,
            decomposition,
            change_points,
            momentum,
            forecast,
            pattern_breaks,
            milestones,
            insights,
        })
    }
}

/// Resample a daily series into per-month means, skipping empty months
///
/// # Errors
///
/// Propagates series construction failure (dates are generated in order, so
/// this cannot trigger for a well-formed input).
pub fn monthly_means(series: &MetricSeries) -> Result<MetricSeries> {
    let mut months: Vec<(NaiveDate, Vec<f64>)> = Vec::new();
    for (date, value) in series.valid_points() {
        let month_start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
            .unwrap_or(date);
        match months.last_mut() {
            Some((current, values)) if *current == month_start => values.push(value),
            _ => months.push((month_start, vec![value])),
        }
    }
    let points: Vec<(NaiveDate, f64)> = months
        .into_iter()
        .map(|(month, values)| (month, stats::mean(&values)))
        .collect();
    MetricSeries::new(series.metric(), points)
}

/// Daily values with interior gaps linearly interpolated and edges carried flat
fn daily_filled_values(series: &MetricSeries) -> Vec<f64> {
    let filled = series.filled(Interpolation::Linear);
    let mut values = filled.values();
    // Linear fill leaves leading/trailing gaps; carry the nearest valid value
    if let Some(first_valid) = values.iter().copied().find(|v| !v.is_nan()) {
        let mut carry = first_valid;
        for value in &mut values {
            if value.is_nan() {
                *value = carry;
            } else {
                carry = *value;
            }
        }
    } else {
        values.clear();
    }
    values
}

fn stl_style_decomposition(values: &[f64], period: usize) -> Decomposition {
    let trend = centered_moving_average(values, period);
    let detrended: Vec<f64> = values.iter().zip(&trend).map(|(v, t)| v - t).collect();

    // Robust seasonal fit: median of each seasonal position, centered to zero
    let mut position_values: Vec<Vec<f64>> = vec![Vec::new(); period];
    for (i, value) in detrended.iter().enumerate() {
        position_values[i % period].push(*value);
    }
    let mut seasonal_index: Vec<f64> = position_values
        .iter()
        .map(|bucket| stats::median(bucket))
        .collect();
    let seasonal_mean = stats::mean(&seasonal_index);
    for s in &mut seasonal_index {
        *s -= seasonal_mean;
    }

    let seasonal: Vec<f64> = (0..values.len()).map(|i| seasonal_index[i % period]).collect();
    let residual: Vec<f64> = values
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((v, t), s)| v - t - s)
        .collect();

    let var_seasonal = stats::population_variance(&seasonal);
    let var_trend = stats::population_variance(&trend);
    let var_residual = stats::population_variance(&residual);

    Decomposition {
        trend,
        seasonal,
        residual,
        period,
        seasonal_strength: strength_ratio(var_seasonal, var_residual),
        trend_strength: strength_ratio(var_trend, var_residual),
        method: DecompositionMethod::StlStyle,
    }
}

fn moving_average_decomposition(values: &[f64], period: usize) -> Decomposition {
    let window = period.min(values.len().max(1)).max(3);
    let trend = centered_moving_average(values, window);
    let residual: Vec<f64> = values.iter().zip(&trend).map(|(v, t)| v - t).collect();
    let var_trend = stats::population_variance(&trend);
    let var_residual = stats::population_variance(&residual);

    Decomposition {
        seasonal: vec![0.0; values.len()],
        residual,
        period,
        seasonal_strength: 0.0,
        trend_strength: strength_ratio(var_trend, var_residual),
        method: DecompositionMethod::MovingAverage,
        trend,
    }
}

fn strength_ratio(component_variance: f64, residual_variance: f64) -> f64 {
    let total = component_variance + residual_variance;
    if total > 0.0 {
        component_variance / total
    } else {
        0.0
    }
}

/// Centered moving average with shrinking windows at the edges
fn centered_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let half = (window / 2).max(1);
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(values.len());
            stats::mean(&values[start..end])
        })
        .collect()
}

fn second_difference_mean(values: &[f64]) -> f64 {
    if values.len() < 3 {
        return 0.0;
    }
    let second_diffs: Vec<f64> = values
        .windows(3)
        .map(|w| 2.0f64.mul_add(-w[1], w[2] + w[0]))
        .collect();
    stats::mean(&second_diffs)
}
