//! Descriptive statistics over one metric of a point set.
//!
//! Policy
//! - `count` is the number of points in the set, with or without the metric.
//! - `sample_count` counts points whose metric value is finite; only those feed
//!   mean/median/min/max. Zero and negative values are legitimate samples.
//! - With no samples the aggregates are `None`, never a placeholder zero.

use serde::{Deserialize, Serialize};

use crate::telemetry::TelemetryPoint;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub count: usize,
    pub sample_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Summarize `metric_key` over `points`.
pub fn summarize(points: &[TelemetryPoint], metric_key: &str) -> Stats {
    let values: Vec<f64> = points.iter().filter_map(|p| p.metric(metric_key)).collect();
    Stats {
        count: points.len(),
        ..summarize_values(&values)
    }
}

/// Statistics over raw values; non-finite entries are skipped.
pub fn summarize_values(values: &[f64]) -> Stats {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Stats {
            count: values.len(),
            ..Stats::default()
        };
    }
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) * 0.5
    };
    Stats {
        count: values.len(),
        sample_count: n,
        mean: mean_of(sorted.iter().copied()),
        median: Some(median),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
    }
}

/// Mean of finite values, `None` if there are none.
fn mean_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
