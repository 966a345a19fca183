// ABOUTME: Analytics core for personal health metrics, from raw readings to ranked insights
// ABOUTME: Layered calculators: daily aggregation, weekly/monthly statistics, seasonal analysis
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics

//! # Vital Analytics
//!
//! Transforms a stream of time-stamped health measurements (steps, heart
//! rate, sleep, and friends) into derived statistics at multiple time
//! granularities, then layers trend, seasonality, and anomaly analysis on
//! top to produce forecasts and narrative insights.
//!
//! The calculator chain:
//!
//! ```text
//! raw records -> DailyAggregator -> { WeeklyAnalyzer, MonthlyAnalyzer }
//!             -> SeasonalAnalyzer -> InsightEngine
//! ```
//!
//! Every stage is pure given its inputs, apart from bounded per-analyzer
//! memoization caches that callers can clear explicitly. Validation failures
//! raise immediately; thin data degrades to flagged results instead of
//! surprising the caller with errors.

/// Bounded memoization cache shared by the analyzers
pub mod cache;
/// Construction-time configuration knobs
pub mod config;
/// Daily aggregation and descriptive statistics
pub mod daily;
/// Error taxonomy
pub mod errors;
/// Chain-of-strategies forecasting
pub mod forecast;
/// Milestone detection and ranked insights
pub mod insights;
/// Monthly statistics, year-over-year comparison, and growth rates
pub mod monthly;
/// Measurement records and the storage input contract
pub mod records;
/// Daily metric series and gap filling
pub mod series;
/// Seasonal analysis: Fourier cycles, decomposition, change points, momentum
pub mod seasonal;
/// Shared statistical kernel
pub mod stats;
/// Weekly rolling statistics, trends, and comparisons
pub mod weekly;

pub use cache::MemoCache;
pub use config::{AnalyticsConfig, MonthMode, WeekStandard};
pub use daily::{Aggregation, DailyAggregator, DailyStatistics, OutlierMethod};
pub use errors::{AnalyticsError, Result};
pub use forecast::{
    Forecast, ForecastEngine, ForecastPoint, ForecastStrategy, LinearTrendStrategy,
    SeasonalNaiveStrategy,
};
pub use insights::{Insight, InsightCategory, InsightEngine, Milestone, MilestoneKind};
pub use monthly::{
    DistributionStats, GrowthRate, MonthlyAnalyzer, MonthlyStatistics, YearOverYearComparison,
};
pub use records::{InMemorySource, MeasurementRecord, MeasurementSource};
pub use series::{Interpolation, MetricSeries};
pub use seasonal::{
    monthly_means, BreakSeverity, ChangePoint, ChangeSignificance, Decomposition,
    DecompositionMethod, FourierAnalysis, FrequencyComponent, MomentumDirection, MomentumReport,
    MomentumStrength, PatternBreak, SeasonalAnalysisResult, SeasonalAnalyzer,
};
pub use stats::{NormalityResult, NormalityTest, RegressionResult, TrendDirection};
pub use weekly::{
    exponential_smoothing, moving_average_smoothing, RollingPoint, TrendInfo, VolatilityReport,
    WeekComparison, WeeklyAnalyzer,
};
