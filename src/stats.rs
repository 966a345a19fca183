// ABOUTME: Shared numeric kernel: regression, percentiles, moments, normality tests, p-values
// ABOUTME: Every analyzer layers on these primitives so edge-case policy lives in one place
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics
#![allow(clippy::cast_precision_loss)] // statistical calculations with controlled ranges

use crate::errors::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

/// Significance threshold used throughout the crate
pub const ALPHA: f64 = 0.05;

/// Direction of a detected linear trend
///
/// Up/down are only assigned when the slope is statistically significant;
/// an insignificant slope is reported as stable regardless of its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// Significant positive slope
    Up,
    /// Significant negative slope
    Down,
    /// No significant slope
    Stable,
}

/// Complete ordinary-least-squares regression of a series against its 0..n-1 index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Slope of the regression line (rate of change per period)
    pub slope: f64,
    /// Y-intercept of the regression line
    pub intercept: f64,
    /// Coefficient of determination (explained variance, 0-1)
    pub r_squared: f64,
    /// Pearson correlation coefficient (-1 to 1)
    pub correlation: f64,
    /// Standard error of the estimate
    pub standard_error: f64,
    /// Standard error of the slope
    pub slope_standard_error: f64,
    /// Degrees of freedom (n - 2)
    pub degrees_of_freedom: usize,
    /// Two-tailed p-value for the slope, when computable
    pub p_value: Option<f64>,
}

impl RegressionResult {
    /// Predicted value at index `x`
    #[must_use]
    pub fn predict(&self, x: f64) -> f64 {
        self.slope.mul_add(x, self.intercept)
    }

    /// Residuals of the fitted line against the observed values
    #[must_use]
    pub fn residuals(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| v - self.predict(i as f64))
            .collect()
    }

    /// Whether the slope is significant at the crate-wide alpha
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.p_value.is_some_and(|p| p < ALPHA)
    }
}

/// Arithmetic mean; 0.0 for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (Bessel's correction, ddof = 1)
///
/// `None` below two values.
#[must_use]
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let ss = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Population standard deviation (ddof = 0); 0.0 for an empty slice
#[must_use]
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let ss = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>();
    (ss / values.len() as f64).sqrt()
}

/// Population variance (ddof = 0); 0.0 for an empty slice
#[must_use]
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Median of a slice; 0.0 when empty
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let len = sorted.len();
    if len % 2 == 0 {
        f64::midpoint(sorted[len / 2 - 1], sorted[len / 2])
    } else {
        sorted[len / 2]
    }
}

/// Percentile by linear interpolation between closest ranks
///
/// # Errors
///
/// Returns `InvalidArgument` when `p` is outside [0, 100] and
/// `InsufficientData` when the slice is empty.
pub fn percentile(values: &[f64], p: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&p) {
        return Err(AnalyticsError::invalid_argument(
            "percentile",
            format!("must be within [0, 100], got {p}"),
        ));
    }
    if values.is_empty() {
        return Err(AnalyticsError::insufficient_data("percentile", 1, 0));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Ok(sorted[lower]);
    }
    let fraction = rank - lower as f64;
    Ok((sorted[upper] - sorted[lower]).mul_add(fraction, sorted[lower]))
}

/// Percent change with the explicit divide-by-zero sentinel policy
///
/// `previous == 0` yields 0 when `current` is also 0, positive infinity
/// otherwise (a sentinel, never an error).
#[must_use]
pub fn percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        if current == 0.0 {
            return 0.0;
        }
        return f64::INFINITY;
    }
    (current - previous) / previous * 100.0
}

/// Ordinary least squares of `values` against the index 0..n-1
///
/// # Errors
///
/// Returns `InsufficientData` below two points and `InvalidArgument` when the
/// x variance is zero (cannot happen for an index regressor with n >= 2).
pub fn linear_regression(values: &[f64]) -> Result<RegressionResult> {
    if values.len() < 2 {
        return Err(AnalyticsError::insufficient_data(
            "linear_regression",
            2,
            values.len(),
        ));
    }

    let n = values.len() as f64;
    let sum_x = (0..values.len()).map(|i| i as f64).sum::<f64>();
    let sum_y = values.iter().sum::<f64>();
    let sum_xx = (0..values.len()).map(|i| (i * i) as f64).sum::<f64>();
    let sum_xy = values
        .iter()
        .enumerate()
        .map(|(i, y)| i as f64 * y)
        .sum::<f64>();
    let sum_yy = values.iter().map(|y| y * y).sum::<f64>();

    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let sxx = (n * mean_x).mul_add(-mean_x, sum_xx);
    if sxx.abs() < f64::EPSILON {
        return Err(AnalyticsError::invalid_argument(
            "values",
            "zero variance in regression index",
        ));
    }
    let sxy = (n * mean_x).mul_add(-mean_y, sum_xy);
    let syy = (n * mean_y).mul_add(-mean_y, sum_yy);

    let slope = sxy / sxx;
    let intercept = slope.mul_add(-mean_x, mean_y);

    let denominator_corr = (sxx * syy).sqrt();
    let correlation = if denominator_corr == 0.0 {
        0.0
    } else {
        sxy / denominator_corr
    };
    let r_squared = correlation * correlation;

    let sse = values
        .iter()
        .enumerate()
        .map(|(i, y)| {
            let diff = y - slope.mul_add(i as f64, intercept);
            diff * diff
        })
        .sum::<f64>();

    let degrees_of_freedom = values.len().saturating_sub(2);
    let standard_error = if degrees_of_freedom > 0 {
        (sse / degrees_of_freedom as f64).sqrt()
    } else {
        0.0
    };
    let slope_standard_error = if degrees_of_freedom > 0 {
        standard_error / sxx.sqrt()
    } else {
        0.0
    };

    let p_value = if degrees_of_freedom > 0 && slope_standard_error > 0.0 {
        let t_stat = (slope / slope_standard_error).abs();
        Some(students_t_two_tailed(t_stat, degrees_of_freedom as f64))
    } else {
        None
    };

    Ok(RegressionResult {
        slope,
        intercept,
        r_squared,
        correlation,
        standard_error,
        slope_standard_error,
        degrees_of_freedom,
        p_value,
    })
}

/// Moment-based skewness (g1); 0.0 below three values or with zero variance
#[must_use]
pub fn skewness(values: &[f64]) -> f64 {
    if values.len() < 3 {
        return 0.0;
    }
    let m = mean(values);
    let n = values.len() as f64;
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    if m2 <= 0.0 {
        return 0.0;
    }
    m3 / m2.powf(1.5)
}

/// Moment-based excess kurtosis (g2); 0.0 below four values or with zero variance
#[must_use]
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    if values.len() < 4 {
        return 0.0;
    }
    let m = mean(values);
    let n = values.len() as f64;
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    let m4 = values.iter().map(|v| (v - m).powi(4)).sum::<f64>() / n;
    if m2 <= 0.0 {
        return 0.0;
    }
    m4 / (m2 * m2) - 3.0
}

/// Two-tailed Student's t p-value
#[must_use]
pub fn students_t_two_tailed(t_abs: f64, df: f64) -> f64 {
    if df <= 0.0 {
        return 1.0;
    }
    StudentsT::new(0.0, 1.0, df).map_or(1.0, |dist| 2.0 * (1.0 - dist.cdf(t_abs)))
}

/// Critical t value for a two-sided interval at the given confidence level
#[must_use]
pub fn students_t_critical(confidence: f64, df: f64) -> f64 {
    if df <= 0.0 {
        return f64::INFINITY;
    }
    let tail = f64::midpoint(confidence, 1.0);
    StudentsT::new(0.0, 1.0, df).map_or(f64::INFINITY, |dist| dist.inverse_cdf(tail))
}

/// Upper-tail F-test p-value
#[must_use]
pub fn f_test_upper_tail(f_stat: f64, df1: f64, df2: f64) -> f64 {
    if f_stat <= 0.0 || df1 <= 0.0 || df2 <= 0.0 {
        return 1.0;
    }
    FisherSnedecor::new(df1, df2).map_or(1.0, |dist| 1.0 - dist.cdf(f_stat))
}

/// Standard normal CDF
#[must_use]
pub fn standard_normal_cdf(x: f64) -> f64 {
    Normal::new(0.0, 1.0).map_or(0.5, |dist| dist.cdf(x))
}

/// Standard normal quantile function
#[must_use]
pub fn standard_normal_quantile(p: f64) -> f64 {
    Normal::new(0.0, 1.0).map_or(0.0, |dist| dist.inverse_cdf(p.clamp(1e-12, 1.0 - 1e-12)))
}

/// Welch's two-sample t-test; returns (t statistic, two-tailed p-value)
///
/// Degrees of freedom via Welch-Satterthwaite. Returns (0.0, 1.0) when either
/// sample is shorter than two values or both variances are zero.
#[must_use]
pub fn welch_t_test(a: &[f64], b: &[f64]) -> (f64, f64) {
    if a.len() < 2 || b.len() < 2 {
        return (0.0, 1.0);
    }
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (ma, mb) = (mean(a), mean(b));
    let va = sample_std(a).map_or(0.0, |s| s * s);
    let vb = sample_std(b).map_or(0.0, |s| s * s);
    let pooled = va / na + vb / nb;
    if pooled <= 0.0 {
        return (0.0, 1.0);
    }
    let t = (mb - ma) / pooled.sqrt();
    let df = pooled * pooled
        / ((va / na).powi(2) / (na - 1.0) + (vb / nb).powi(2) / (nb - 1.0));
    (t, students_t_two_tailed(t.abs(), df))
}

/// One-sample t-test of `sample_mean` against a historical distribution
///
/// Returns the two-tailed p-value, or `None` when the historical spread is
/// degenerate.
#[must_use]
pub fn one_sample_t_test(sample_mean: f64, historical: &[f64]) -> Option<f64> {
    let n = historical.len();
    if n < 2 {
        return None;
    }
    let hist_std = sample_std(historical)?;
    if hist_std <= 0.0 {
        return None;
    }
    let t = (sample_mean - mean(historical)) / (hist_std / (n as f64).sqrt());
    Some(students_t_two_tailed(t.abs(), (n - 1) as f64))
}

/// Which normality test produced the p-value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalityTest {
    /// Shapiro-Wilk family statistic (Shapiro-Francia W' with Royston p-value)
    ShapiroWilk,
    /// Kolmogorov-Smirnov against a fitted normal
    KolmogorovSmirnov,
}

/// Normality test result: statistic, p-value, and which test ran
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormalityResult {
    /// Test statistic (W' or the KS D statistic)
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Test that produced the result
    pub test: NormalityTest,
}

/// Shapiro-Wilk-family normality test for n <= 5000, Kolmogorov-Smirnov above
///
/// # Errors
///
/// Returns `InsufficientData` below three values.
pub fn normality_test(values: &[f64]) -> Result<NormalityResult> {
    if values.len() < 3 {
        return Err(AnalyticsError::insufficient_data(
            "normality_test",
            3,
            values.len(),
        ));
    }
    if values.len() <= 5000 {
        let (w, p) = shapiro_francia(values);
        Ok(NormalityResult {
            statistic: w,
            p_value: p,
            test: NormalityTest::ShapiroWilk,
        })
    } else {
        let (d, p) = kolmogorov_smirnov(values);
        Ok(NormalityResult {
            statistic: d,
            p_value: p,
            test: NormalityTest::KolmogorovSmirnov,
        })
    }
}

/// Shapiro-Francia W' with Royston's (1993) p-value approximation
///
/// W' is the squared correlation between the order statistics and Blom scores;
/// ln(1 - W') is approximately normal with moments that depend on ln(n).
#[must_use]
pub fn shapiro_francia(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let blom: Vec<f64> = (1..=n)
        .map(|i| standard_normal_quantile((i as f64 - 0.375) / (n as f64 + 0.25)))
        .collect();

    let mean_x = mean(&sorted);
    let mean_m = mean(&blom);
    let mut sxm = 0.0;
    let mut sxx = 0.0;
    let mut smm = 0.0;
    for (x, m) in sorted.iter().zip(&blom) {
        sxm += (x - mean_x) * (m - mean_m);
        sxx += (x - mean_x) * (x - mean_x);
        smm += (m - mean_m) * (m - mean_m);
    }
    if sxx <= 0.0 || smm <= 0.0 {
        // Degenerate sample, treat as non-normal with certainty
        return (0.0, 0.0);
    }
    let w = (sxm * sxm) / (sxx * smm);

    let log_n = (n as f64).ln();
    let u = log_n.ln();
    let mu = 1.0521f64.mul_add(u - log_n, -1.2725);
    let sigma = (-0.26758f64).mul_add(u + 2.0 / log_n, 1.0308);
    let z = ((1.0 - w).max(1e-12).ln() - mu) / sigma;
    let p = 1.0 - standard_normal_cdf(z);
    (w, p.clamp(0.0, 1.0))
}

/// Kolmogorov-Smirnov test against a normal fitted to the sample
///
/// Returns (D, p) with the asymptotic Kolmogorov distribution p-value.
#[must_use]
pub fn kolmogorov_smirnov(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n < 2 {
        return (0.0, 1.0);
    }
    let m = mean(values);
    let s = sample_std(values).unwrap_or(0.0);
    if s <= 0.0 {
        return (1.0, 0.0);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut d = 0.0f64;
    for (i, x) in sorted.iter().enumerate() {
        let cdf = standard_normal_cdf((x - m) / s);
        let upper = (i + 1) as f64 / n as f64 - cdf;
        let lower = cdf - i as f64 / n as f64;
        d = d.max(upper.max(lower));
    }

    let sqrt_n = (n as f64).sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * d;
    let mut p = 0.0;
    for k in 1i32..=100 {
        let kf = f64::from(k);
        let term = 2.0 * (-1.0f64).powi(k - 1) * (-2.0 * kf * kf * lambda * lambda).exp();
        p += term;
        if term.abs() < 1e-10 {
            break;
        }
    }
    (d, p.clamp(0.0, 1.0))
}

/// Jarque-Bera statistic and its chi-squared(2) p-value
#[must_use]
pub fn jarque_bera(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n < 4 {
        return (0.0, 1.0);
    }
    let s = skewness(values);
    let k = excess_kurtosis(values);
    let jb = n as f64 / 6.0 * k.mul_add(k / 4.0, s * s);
    let p = ChiSquared::new(2.0).map_or(1.0, |dist| 1.0 - dist.cdf(jb));
    (jb, p)
}
