// ABOUTME: Error taxonomy for the analytics core: invalid arguments vs insufficient data
// ABOUTME: Structured thiserror enums so callers can branch on failure kind without string matching
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics

use chrono::NaiveDate;

/// Common result type for all analytics operations
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors raised by the analytics calculators
///
/// Validation failures are always raised immediately. Data insufficiency is an
/// error only for methods whose contract documents a minimum sample; base
/// statistics methods degrade to a flagged result instead.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// A caller-supplied argument is outside its valid domain
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument {
        /// Name of the offending argument
        argument: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// The requested date range ends before it starts
    #[error("Invalid date range: end {end} is before start {start}")]
    DateRange {
        /// Inclusive range start
        start: NaiveDate,
        /// Inclusive range end
        end: NaiveDate,
    },

    /// A method with a documented minimum sample size was called with fewer points
    #[error("Insufficient data for {operation}: need at least {required}, got {actual}")]
    InsufficientData {
        /// Operation that required the minimum sample
        operation: &'static str,
        /// Documented minimum sample size
        required: usize,
        /// Number of valid points actually available
        actual: usize,
    },
}

impl AnalyticsError {
    /// Shorthand for an invalid-argument error
    #[must_use]
    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// Shorthand for an insufficient-data error
    #[must_use]
    pub const fn insufficient_data(
        operation: &'static str,
        required: usize,
        actual: usize,
    ) -> Self {
        Self::InsufficientData {
            operation,
            required,
            actual,
        }
    }
}
