// ABOUTME: Canonical daily metric series: one value per calendar day, gaps as absence or NaN
// ABOUTME: Reindexing to a complete date range and linear/forward/backward gap filling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics

use crate::errors::{AnalyticsError, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Gap-filling policy applied after reindexing to a complete daily range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Leave gaps as NaN
    None,
    /// Linear interpolation between the nearest valid neighbours
    Linear,
    /// Carry the last valid value forward
    ForwardFill,
    /// Carry the next valid value backward
    BackwardFill,
}

impl FromStr for Interpolation {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "linear" => Ok(Self::Linear),
            "forward_fill" | "ffill" => Ok(Self::ForwardFill),
            "backward_fill" | "bfill" => Ok(Self::BackwardFill),
            other => Err(AnalyticsError::invalid_argument(
                "interpolation",
                format!("unknown method '{other}'"),
            )),
        }
    }
}

/// Ordered daily series for one metric
///
/// Invariant: dates strictly increasing, no duplicates. A date that is present
/// with a NaN value means "measured but unusable"; a date that is absent means
/// "not measured". Zero is never used as a gap marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSeries {
    metric: String,
    points: Vec<(NaiveDate, f64)>,
}

impl MetricSeries {
    /// Build a series from date-ordered points
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if dates are not strictly increasing.
    pub fn new(metric: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(AnalyticsError::invalid_argument(
                    "points",
                    format!(
                        "dates must be strictly increasing, found {} after {}",
                        pair[1].0, pair[0].0
                    ),
                ));
            }
        }
        Ok(Self {
            metric: metric.into(),
            points,
        })
    }

    /// Empty series for a metric
    #[must_use]
    pub fn empty(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            points: Vec::new(),
        }
    }

    /// Metric identifier this series belongs to
    #[must_use]
    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Number of dates present (valid or NaN)
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no dates are present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Borrow the underlying (date, value) points
    #[must_use]
    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    /// All values in date order, including NaN placeholders
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }

    /// Values with NaN entries dropped, in date order
    #[must_use]
    pub fn valid_values(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|(_, v)| *v)
            .filter(|v| !v.is_nan())
            .collect()
    }

    /// (date, value) pairs with NaN entries dropped
    #[must_use]
    pub fn valid_points(&self) -> Vec<(NaiveDate, f64)> {
        self.points
            .iter()
            .filter(|(_, v)| !v.is_nan())
            .copied()
            .collect()
    }

    /// Number of NaN entries currently present
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_nan()).count()
    }

    /// Earliest date present
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|(d, _)| *d)
    }

    /// Latest date present
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|(d, _)| *d)
    }

    /// Value for a specific date, if that date is present
    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |(d, _)| *d)
            .ok()
            .map(|i| self.points[i].1)
    }

    /// Reindex to the complete daily range spanning the observed min/max date
    ///
    /// Absent days become NaN entries. An empty series stays empty.
    #[must_use]
    pub fn reindex_daily(&self) -> Self {
        let (Some(first), Some(last)) = (self.first_date(), self.last_date()) else {
            return self.clone();
        };
        let span = (last - first).num_days() as usize + 1;
        let mut points = Vec::with_capacity(span);
        let mut cursor = 0;
        let mut date = first;
        while date <= last {
            if cursor < self.points.len() && self.points[cursor].0 == date {
                points.push(self.points[cursor]);
                cursor += 1;
            } else {
                points.push((date, f64::NAN));
            }
            date += Duration::days(1);
        }
        Self {
            metric: self.metric.clone(),
            points,
        }
    }

    /// Reindex to a complete daily range and apply the gap-filling policy
    ///
    /// Linear interpolation fills interior gaps only; leading/trailing gaps
    /// remain NaN (forward/backward fill behave symmetrically).
    #[must_use]
    pub fn filled(&self, interpolation: Interpolation) -> Self {
        let mut series = self.reindex_daily();
        match interpolation {
            Interpolation::None => {}
            Interpolation::Linear => fill_linear(&mut series.points),
            Interpolation::ForwardFill => fill_forward(&mut series.points),
            Interpolation::BackwardFill => fill_backward(&mut series.points),
        }
        series
    }
}

fn fill_forward(points: &mut [(NaiveDate, f64)]) {
    let mut last_valid = f64::NAN;
    for (_, value) in points.iter_mut() {
        if value.is_nan() {
            *value = last_valid;
        } else {
            last_valid = *value;
        }
    }
}

fn fill_backward(points: &mut [(NaiveDate, f64)]) {
    let mut next_valid = f64::NAN;
    for (_, value) in points.iter_mut().rev() {
        if value.is_nan() {
            *value = next_valid;
        } else {
            next_valid = *value;
        }
    }
}

fn fill_linear(points: &mut [(NaiveDate, f64)]) {
    let n = points.len();
    let mut i = 0;
    while i < n {
        if points[i].1.is_nan() {
            i += 1;
            continue;
        }
        // Find the next valid point and interpolate the run between them
        let mut j = i + 1;
        while j < n && points[j].1.is_nan() {
            j += 1;
        }
        if j < n && j > i + 1 {
            let left = points[i].1;
            let right = points[j].1;
            let gap = (j - i) as f64;
            for k in (i + 1)..j {
                let fraction = (k - i) as f64 / gap;
                points[k].1 = (right - left).mul_add(fraction, left);
            }
        }
        i = j;
    }
}
