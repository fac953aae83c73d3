//! Drive-test telemetry record.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// One drive-test measurement: position, time, numeric metrics, string attributes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPoint {
    pub lat: f64,
    pub lng: f64,
    pub timestamp_ms: i64,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl TelemetryPoint {
    pub fn new(lat: f64, lng: f64, timestamp_ms: i64) -> Self {
        Self {
            lat,
            lng,
            timestamp_ms,
            ..Default::default()
        }
    }

    pub fn with_metric(mut self, key: &str, value: f64) -> Self {
        self.metrics.insert(key.to_string(), value);
        self
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    #[inline]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// Metric value if present and finite.
    #[inline]
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.get(key).copied().filter(|v| v.is_finite())
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn local_time(&self, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
        DateTime::from_timestamp_millis(self.timestamp_ms).map(|t| t.with_timezone(&offset))
    }

    /// Local hour of day, 0..=23.
    pub fn local_hour(&self, offset: FixedOffset) -> Option<u32> {
        self.local_time(offset).map(|t| t.hour())
    }

    /// Local weekday, 0 = Sunday ..= 6 = Saturday.
    pub fn local_weekday(&self, offset: FixedOffset) -> Option<u8> {
        self.local_time(offset)
            .map(|t| t.weekday().num_days_from_sunday() as u8)
    }
}
