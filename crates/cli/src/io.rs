//! Telemetry CSV input and export CSV output (polars).

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use regionscan::api::{raw_kind, raw_value, RawKind, RawValue, TelemetryPoint, RAW_POINT_COLUMNS};

const LAT: &str = "latitude";
const LNG: &str = "longitude";
const TIMESTAMP: &str = "timestamp";

/// Read telemetry rows.
///
/// `latitude`, `longitude` and `timestamp` are required. `timestamp` may be
/// Unix ms or an RFC 3339 / `%Y-%m-%d %H:%M:%S` (UTC) string; rows where it is
/// empty or unparseable are dropped with a warning. Every other numeric column
/// becomes a metric and every string column an attribute.
pub fn read_points(path: &Path) -> Result<Vec<TelemetryPoint>> {
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(1000))
        .finish()
        .with_context(|| format!("opening {}", path.display()))?
        .collect()
        .with_context(|| format!("reading {}", path.display()))?;
    tracing::info!(rows = df.height(), cols = df.width(), "telemetry_csv_shape");

    let lat = f64_values(&df, LAT)?.with_context(|| format!("missing column {LAT}"))?;
    let lng = f64_values(&df, LNG)?.with_context(|| format!("missing column {LNG}"))?;
    let ts = timestamp_values(&df)?.with_context(|| format!("missing column {TIMESTAMP}"))?;

    let mut metrics: Vec<(String, Vec<Option<f64>>)> = Vec::new();
    let mut attributes: Vec<(String, Vec<Option<String>>)> = Vec::new();
    for s in df.get_columns() {
        let name = s.name().to_string();
        if name == LAT || name == LNG || name == TIMESTAMP {
            continue;
        }
        if matches!(s.dtype(), DataType::String) {
            let values = s
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect();
            attributes.push((name, values));
        } else {
            let values = s.cast(&DataType::Float64)?.f64()?.into_iter().collect();
            metrics.push((name, values));
        }
    }

    let points: Vec<TelemetryPoint> = (0..df.height())
        .filter_map(|i| Some((i, ts[i]?)))
        .map(|(i, timestamp_ms)| TelemetryPoint {
            // Missing coordinates become NaN and are dropped by the point filter.
            lat: lat[i].unwrap_or(f64::NAN),
            lng: lng[i].unwrap_or(f64::NAN),
            timestamp_ms,
            metrics: metrics
                .iter()
                .filter_map(|(k, v)| v[i].map(|x| (k.clone(), x)))
                .collect::<BTreeMap<_, _>>(),
            attributes: attributes
                .iter()
                .filter_map(|(k, v)| v[i].clone().map(|x| (k.clone(), x)))
                .collect::<BTreeMap<_, _>>(),
        })
        .collect();
    let dropped = df.height() - points.len();
    if dropped > 0 {
        tracing::warn!(dropped, "rows without a usable timestamp skipped");
    }
    Ok(points)
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    let Ok(s) = df.column(name) else {
        return Ok(None);
    };
    let cast = s.cast(&DataType::Float64)?;
    Ok(Some(cast.f64()?.into_iter().collect()))
}

fn timestamp_values(df: &DataFrame) -> Result<Option<Vec<Option<i64>>>> {
    let Ok(s) = df.column(TIMESTAMP) else {
        return Ok(None);
    };
    if matches!(s.dtype(), DataType::String) {
        return Ok(Some(
            s.str()?.into_iter().map(|v| v.and_then(parse_time)).collect(),
        ));
    }
    let cast = s.cast(&DataType::Int64)?;
    Ok(Some(cast.i64()?.into_iter().collect()))
}

fn parse_time(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|t| t.and_utc().timestamp_millis())
}

/// Write points in the fixed raw-export column order.
pub fn write_points_csv(points: &[TelemetryPoint], path: &Path) -> Result<()> {
    let mut columns: Vec<Series> = Vec::with_capacity(RAW_POINT_COLUMNS.len());
    for col in RAW_POINT_COLUMNS {
        let series = match raw_kind(col) {
            RawKind::Float => {
                let v: Vec<Option<f64>> = points
                    .iter()
                    .map(|p| match raw_value(p, col) {
                        RawValue::Float(x) => x,
                        _ => None,
                    })
                    .collect();
                Series::new(col.into(), v)
            }
            RawKind::Int => {
                let v: Vec<i64> = points.iter().map(|p| p.timestamp_ms).collect();
                Series::new(col.into(), v)
            }
            RawKind::Text => {
                let v: Vec<Option<&str>> = points
                    .iter()
                    .map(|p| match raw_value(p, col) {
                        RawValue::Text(x) => x,
                        _ => None,
                    })
                    .collect();
                Series::new(col.into(), v)
            }
        };
        columns.push(series);
    }
    let mut df = DataFrame::new(columns)?;
    write_csv(&mut df, path)
}

/// Write `key,value` rows.
pub fn write_stats_csv(rows: &[(String, String)], path: &Path) -> Result<()> {
    let keys: Vec<String> = rows.iter().map(|(k, _)| k.clone()).collect();
    let values: Vec<String> = rows.iter().map(|(_, v)| v.clone()).collect();
    let mut df = DataFrame::new(vec![
        Series::new("key".into(), keys),
        Series::new("value".into(), values),
    ])?;
    write_csv(&mut df, path)
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Parse `south,west,north,east`.
pub fn parse_bbox(s: &str) -> Result<regionscan::api::BoundingBox> {
    let v: Vec<f64> = s
        .split(',')
        .map(|t| t.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("bbox {s:?}: expected four numbers"))?;
    let [south, west, north, east] = v[..] else {
        bail!("bbox {s:?}: expected south,west,north,east");
    };
    if !(south < north && west < east) {
        bail!("bbox {s:?}: south must be < north and west < east");
    }
    Ok(regionscan::api::BoundingBox {
        south,
        west,
        north,
        east,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use regionscan::api::{uniform_points, ReplayToken, SynthCfg};
    use tempfile::tempdir;

    #[test]
    fn bbox_parsing() {
        let bb = parse_bbox("1, 2, 3, 4").unwrap();
        assert_eq!((bb.south, bb.west, bb.north, bb.east), (1.0, 2.0, 3.0, 4.0));
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("3,2,1,4").is_err());
        assert!(parse_bbox("a,b,c,d").is_err());
    }

    #[test]
    fn time_strings() {
        assert_eq!(parse_time("1704585600000"), Some(1_704_585_600_000));
        assert_eq!(parse_time("2024-01-07T00:00:00Z"), Some(1_704_585_600_000));
        assert_eq!(parse_time("2024-01-07 00:00:00"), Some(1_704_585_600_000));
        assert_eq!(parse_time("yesterday"), None);
    }

    #[test]
    fn points_csv_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("points.csv");
        let pts = uniform_points(
            SynthCfg {
                count: 25,
                bbox: parse_bbox("52,13,52.1,13.1").unwrap(),
                start_ms: 1_704_585_600_000,
            },
            ReplayToken { seed: 3, index: 0 },
        );
        write_points_csv(&pts, &path).unwrap();
        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with(&RAW_POINT_COLUMNS.join(",")));
        let back = read_points(&path).unwrap();
        assert_eq!(back.len(), 25);
        for (a, b) in back.iter().zip(&pts) {
            assert!((a.lat - b.lat).abs() < 1e-9);
            assert_eq!(a.timestamp_ms, b.timestamp_ms);
            assert_eq!(a.attribute("carrier"), b.attribute("carrier"));
            let (x, y) = (a.metric("rsrp").unwrap(), b.metric("rsrp").unwrap());
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn rows_without_usable_timestamp_are_dropped() {
        let dir = tempdir().unwrap();
        let numeric = dir.path().join("numeric.csv");
        std::fs::write(
            &numeric,
            "latitude,longitude,timestamp,rsrp\n1.0,2.0,1704585600000,-80\n1.5,2.5,,-90\n",
        )
        .unwrap();
        let pts = read_points(&numeric).unwrap();
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].timestamp_ms, 1_704_585_600_000);
        assert_eq!(pts[0].metric("rsrp"), Some(-80.0));

        let text = dir.path().join("text.csv");
        std::fs::write(
            &text,
            "latitude,longitude,timestamp\n1.0,2.0,not a time\n1.5,2.5,2024-01-07T01:00:00Z\n",
        )
        .unwrap();
        let pts = read_points(&text).unwrap();
        assert_eq!(pts.len(), 1);
        assert_eq!(pts[0].timestamp_ms, 1_704_589_200_000);
        assert_eq!(pts[0].lat, 1.5);

        let missing = dir.path().join("missing.csv");
        std::fs::write(&missing, "latitude,longitude\n1.0,2.0\n").unwrap();
        assert!(read_points(&missing).is_err());
    }

    #[test]
    fn stats_csv_has_key_value_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/stats.csv");
        write_stats_csv(&[("total_count".into(), "3".into())], &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("key,value"));
        assert!(text.contains("total_count,3"));
    }
}
