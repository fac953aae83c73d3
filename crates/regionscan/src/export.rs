//! Row builders for the aggregate-stats and raw-points exports.
//!
//! Only the tabular content lives here; writing files is the caller's job.

use crate::engine::AnalysisSummary;
use crate::grid::GridOutcome;
use crate::telemetry::TelemetryPoint;
use crate::temporal::DAY_NAMES;

/// Fixed column order of the raw-points export.
pub const RAW_POINT_COLUMNS: [&str; 12] = [
    "latitude",
    "longitude",
    "rsrp",
    "rsrq",
    "sinr",
    "dl_throughput",
    "ul_throughput",
    "mos",
    "lte_bler",
    "timestamp",
    "carrier",
    "technology",
];

/// Placeholder for absent aggregates in the stats export.
pub const NOT_AVAILABLE: &str = "N/A";

/// One raw-export cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RawValue<'a> {
    Float(Option<f64>),
    Int(i64),
    Text(Option<&'a str>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RawKind {
    Float,
    Int,
    Text,
}

/// Column type in the raw-points export; unknown columns are metrics.
pub fn raw_kind(column: &str) -> RawKind {
    match column {
        "timestamp" => RawKind::Int,
        "carrier" | "technology" => RawKind::Text,
        _ => RawKind::Float,
    }
}

/// Value of `column` for `p`.
pub fn raw_value<'a>(p: &'a TelemetryPoint, column: &str) -> RawValue<'a> {
    match (raw_kind(column), column) {
        (_, "latitude") => RawValue::Float(Some(p.lat)),
        (_, "longitude") => RawValue::Float(Some(p.lng)),
        (RawKind::Int, _) => RawValue::Int(p.timestamp_ms),
        (RawKind::Text, _) => RawValue::Text(p.attribute(column)),
        (RawKind::Float, metric) => RawValue::Float(p.metric(metric)),
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}"))
}

/// Flat key/value rows describing one analysis.
pub fn stats_rows(summary: &AnalysisSummary) -> Vec<(String, String)> {
    let mut rows: Vec<(&str, String)> = vec![
        ("shape_type", summary.shape_type.to_string()),
        ("area_sq_meters", format!("{:.2}", summary.area_sq_meters)),
        ("metric", summary.metric.clone()),
        ("input_count", summary.filter.input_count.to_string()),
        ("invalid_count", summary.filter.invalid_count.to_string()),
        ("truncated", summary.filter.truncated.to_string()),
        (
            "count_before_time_filter",
            summary.filter.before_time_filter.to_string(),
        ),
        ("total_count", summary.total_count.to_string()),
        ("sample_count", summary.stats.sample_count.to_string()),
        ("mean", fmt_opt(summary.stats.mean)),
        ("median", fmt_opt(summary.stats.median)),
        ("min", fmt_opt(summary.stats.min)),
        ("max", fmt_opt(summary.stats.max)),
    ];

    match &summary.grid {
        None => rows.push(("grid_status", "off".to_string())),
        Some(GridOutcome::Aborted {
            candidate_cells,
            max_cells,
        }) => {
            rows.push(("grid_status", "aborted".to_string()));
            rows.push(("grid_candidate_cells", candidate_cells.to_string()));
            rows.push(("grid_max_cells", max_cells.to_string()));
        }
        Some(GridOutcome::Complete(g)) => {
            rows.push(("grid_status", "complete".to_string()));
            rows.push(("grid_cell_size_m", format!("{}", g.cell_size_m)));
            rows.push(("grid_cells", g.cells.len().to_string()));
            rows.push(("grid_cells_with_points", g.cells_with_points.to_string()));
            rows.push(("grid_total_area_sq_meters", format!("{:.2}", g.total_grid_area)));
        }
    }

    if let Some(tf) = &summary.time_filter {
        rows.push(("time_filter_hours", tf.hours.label()));
        let days: Vec<&str> = tf
            .selected_days
            .days()
            .into_iter()
            .map(|d| DAY_NAMES[usize::from(d)])
            .collect();
        rows.push(("time_filter_days", days.join(" ")));
    }
    if let Some(tp) = &summary.temporal_patterns {
        rows.push(("peak_hour", format!("{:02}:00", tp.peak_hour)));
        rows.push(("peak_day", tp.peak_day_name().to_string()));
    }

    rows.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::AnalysisCfg;
    use crate::engine::{analyze, AnalysisOptions};
    use crate::filter::{DaySet, HourFilter, TimeFilter};
    use crate::geo::{Coordinate, Shape};

    fn lookup<'a>(rows: &'a [(String, String)], key: &str) -> Option<&'a str> {
        rows.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn raw_columns_in_fixed_order() {
        let p = TelemetryPoint::new(1.5, 2.5, 99)
            .with_metric("rsrp", -90.0)
            .with_attribute("carrier", "X");
        let vals: Vec<RawValue> = RAW_POINT_COLUMNS.iter().map(|c| raw_value(&p, c)).collect();
        assert_eq!(vals[0], RawValue::Float(Some(1.5)));
        assert_eq!(vals[1], RawValue::Float(Some(2.5)));
        assert_eq!(vals[2], RawValue::Float(Some(-90.0)));
        assert_eq!(vals[3], RawValue::Float(None));
        assert_eq!(vals[9], RawValue::Int(99));
        assert_eq!(vals[10], RawValue::Text(Some("X")));
        assert_eq!(vals[11], RawValue::Text(None));
    }

    #[test]
    fn stats_rows_mark_absent_values() {
        let shape = Shape::Circle {
            center: Coordinate::new(0.0, 0.0),
            radius_meters: 10.0,
        };
        let opts = AnalysisOptions::new("rsrp")
            .with_grid(true)
            .with_time_filter(TimeFilter::new(
                HourFilter::Single { hour: 14 },
                DaySet::from_days([0, 6]),
            ));
        let s = analyze(&shape, &[], &opts, &AnalysisCfg::default());
        let rows = stats_rows(&s);
        assert_eq!(lookup(&rows, "shape_type"), Some("circle"));
        assert_eq!(lookup(&rows, "total_count"), Some("0"));
        assert_eq!(lookup(&rows, "mean"), Some(NOT_AVAILABLE));
        assert_eq!(lookup(&rows, "grid_status"), Some("complete"));
        assert_eq!(lookup(&rows, "time_filter_hours"), Some("14:00"));
        assert_eq!(lookup(&rows, "time_filter_days"), Some("Sunday Saturday"));
        assert_eq!(lookup(&rows, "peak_hour"), None);
    }
}
