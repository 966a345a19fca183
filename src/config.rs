// ABOUTME: Construction-time configuration for the analytics calculators
// ABOUTME: Timezone, month mode, week numbering standard, parallelism toggle, and cache sizing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics

use crate::errors::AnalyticsError;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Default memoization cache capacity per analyzer
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// Monthly aggregation boundary policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthMode {
    /// First through last calendar day of the named month
    Calendar,
    /// Fixed 30-day window ending on the 15th of the named month
    ///
    /// Mid-month anchoring keeps the rolling figure comparable across months
    /// of different lengths.
    Rolling,
}

impl FromStr for MonthMode {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calendar" => Ok(Self::Calendar),
            "rolling" | "rolling-30" => Ok(Self::Rolling),
            other => Err(AnalyticsError::invalid_argument(
                "month_mode",
                format!("unknown mode '{other}', expected 'calendar' or 'rolling'"),
            )),
        }
    }
}

/// Week numbering standard for week-over-week comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStandard {
    /// ISO 8601 weeks: Monday start, week 1 contains the first Thursday
    Iso,
    /// US weeks: Sunday start, week 1 contains January 1st
    Us,
}

impl FromStr for WeekStandard {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "iso" => Ok(Self::Iso),
            "us" => Ok(Self::Us),
            other => Err(AnalyticsError::invalid_argument(
                "week_standard",
                format!("unknown standard '{other}', expected 'iso' or 'us'"),
            )),
        }
    }
}

/// Shared analyzer configuration
///
/// These are the only externally adjustable knobs; algorithmic thresholds
/// (IQR multiplier, z-score cutoff, significance alpha, minimum samples) are
/// fixed constants of the design.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Timezone offset applied when bucketing timestamps into calendar days
    pub timezone: FixedOffset,
    /// Monthly boundary policy
    pub month_mode: MonthMode,
    /// Week numbering standard
    pub week_standard: WeekStandard,
    /// Whether batch APIs may fan out onto the rayon worker pool
    pub parallel: bool,
    /// Memoization cache capacity per analyzer
    pub cache_size: NonZeroUsize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            timezone: Utc.fix(),
            month_mode: MonthMode::Calendar,
            week_standard: WeekStandard::Iso,
            parallel: true,
            cache_size: NonZeroUsize::new(DEFAULT_CACHE_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl AnalyticsConfig {
    /// Configuration with a specific month mode, other knobs default
    #[must_use]
    pub fn with_month_mode(month_mode: MonthMode) -> Self {
        Self {
            month_mode,
            ..Self::default()
        }
    }

    /// Configuration with a specific week standard, other knobs default
    #[must_use]
    pub fn with_week_standard(week_standard: WeekStandard) -> Self {
        Self {
            week_standard,
            ..Self::default()
        }
    }
}
