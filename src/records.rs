// ABOUTME: Measurement record model and the input contract consumed from the storage collaborator
// ABOUTME: Best-effort coercion of raw timestamps/values plus an in-memory source for tests and tools
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Vital Analytics

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single time-stamped health measurement
///
/// Immutable once constructed. `value` may be NaN when the reading exists but
/// its payload could not be coerced to a number; missing days are represented
/// by absence of records, never by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Instant the measurement was taken
    pub timestamp: DateTime<Utc>,
    /// Metric identifier, matched exactly when filtering (e.g. "steps", "resting_hr")
    pub metric_type: String,
    /// Measured value; NaN marks a present-but-unusable reading
    pub value: f64,
    /// Optional origin of the reading (device, app, manual entry)
    pub source: Option<String>,
}

impl MeasurementRecord {
    /// Create a record from already-typed fields
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, metric_type: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp,
            metric_type: metric_type.into(),
            value,
            source: None,
        }
    }

    /// Best-effort coercion from raw string fields
    ///
    /// Returns `None` when the timestamp cannot be parsed (such readings are
    /// excluded, not fatal). A non-numeric value becomes NaN so the reading
    /// still counts as present for gap accounting.
    #[must_use]
    pub fn coerce(raw_timestamp: &str, metric_type: &str, raw_value: &str) -> Option<Self> {
        let timestamp = parse_timestamp(raw_timestamp)?;
        let value = raw_value.trim().parse::<f64>().unwrap_or(f64::NAN);
        Some(Self {
            timestamp,
            metric_type: metric_type.to_owned(),
            value,
            source: None,
        })
    }

    /// Attach a source label
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Input contract for the external storage collaborator
///
/// The collaborator supplies records ordered by time, filterable by exact
/// metric type and an inclusive calendar date range. Grouping and statistics
/// are internal to this crate.
pub trait MeasurementSource {
    /// Records for one metric within an optional inclusive date range
    fn records(
        &self,
        metric: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<MeasurementRecord>;

    /// Distinct metric types available from this source
    fn metric_types(&self) -> Vec<String>;
}

/// In-memory measurement source
///
/// Fulfils the input contract without the external storage collaborator,
/// which is what the integration tests and seeding tools use.
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    records: Vec<MeasurementRecord>,
}

impl InMemorySource {
    /// Empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source seeded from a record collection; records are sorted by time
    #[must_use]
    pub fn from_records(mut records: Vec<MeasurementRecord>) -> Self {
        records.sort_by_key(|r| r.timestamp);
        Self { records }
    }

    /// Append a record, keeping time order
    pub fn push(&mut self, record: MeasurementRecord) {
        let position = self
            .records
            .partition_point(|r| r.timestamp <= record.timestamp);
        self.records.insert(position, record);
    }

    /// Total number of stored records across all metrics
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the source holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MeasurementSource for InMemorySource {
    fn records(
        &self,
        metric: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<MeasurementRecord> {
        self.records
            .iter()
            .filter(|r| r.metric_type == metric)
            .filter(|r| {
                let date = r.timestamp.date_naive();
                start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
            })
            .cloned()
            .collect()
    }

    fn metric_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .records
            .iter()
            .map(|r| r.metric_type.clone())
            .collect();
        types.sort();
        types.dedup();
        types
    }
}
