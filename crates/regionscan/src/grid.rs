//! Uniform metric grid over a selection region.
//!
//! Model
//! - The bounding box is tiled by square cells of `cell_size_m`. The latitude
//!   step is `cell / 111320`; the longitude step is corrected at the box's
//!   center latitude, `cell / (111320 · cos(lat))`.
//! - A cell is kept iff its center passes the membership test (area
//!   approximation, no exact cell/polygon clipping).
//! - Points are binned by index arithmetic, so the cost is O(cells + points).
//! - If `rows · cols` exceeds `max_cells` the grid is not built at all.

use serde::{Deserialize, Serialize};

use crate::cfg::{AnalysisCfg, METERS_PER_DEGREE};
use crate::geo::{BoundingBox, Coordinate};
use crate::telemetry::TelemetryPoint;

/// Smallest `cos(lat)` used for the longitude step (keeps polar boxes finite).
const MIN_COS_LAT: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub bounds: BoundingBox,
    pub point_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_average: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub cell_size_m: f64,
    pub rows: usize,
    pub cols: usize,
    /// Cells whose center lies inside the region.
    pub cells: Vec<GridCell>,
    pub cells_with_points: usize,
    /// Retained cell count × cell area, in m².
    pub total_grid_area: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GridOutcome {
    Complete(Grid),
    #[serde(rename_all = "camelCase")]
    Aborted {
        candidate_cells: usize,
        max_cells: usize,
    },
}

impl GridOutcome {
    pub fn grid(&self) -> Option<&Grid> {
        match self {
            GridOutcome::Complete(g) => Some(g),
            GridOutcome::Aborted { .. } => None,
        }
    }
    pub fn is_aborted(&self) -> bool {
        matches!(self, GridOutcome::Aborted { .. })
    }
}

/// Cell size and cap for one rasterization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSpec {
    pub cell_size_m: f64,
    pub max_cells: usize,
}

impl GridSpec {
    pub fn from_cfg(cfg: &AnalysisCfg) -> Self {
        Self {
            cell_size_m: cfg.cell_size_m,
            max_cells: cfg.max_cells,
        }
    }
}

/// Whole cells needed to cover `extent` (at least one); float noise below 1e-9 of a cell is ignored.
fn steps(extent: f64, step: f64) -> f64 {
    (extent / step - 1e-9).ceil().max(1.0)
}

#[derive(Clone, Copy, Default)]
struct Acc {
    count: usize,
    sum: f64,
    samples: usize,
}

/// Overlay the grid on `bbox`, keep cells passing `test`, and aggregate `points`.
pub fn rasterize<F>(
    bbox: BoundingBox,
    test: F,
    points: &[TelemetryPoint],
    metric_key: &str,
    spec: GridSpec,
) -> GridOutcome
where
    F: Fn(Coordinate) -> bool,
{
    let aborted = |candidate_cells: usize| {
        tracing::warn!(
            candidate_cells,
            max_cells = spec.max_cells,
            cell_size_m = spec.cell_size_m,
            "grid exceeds cell cap; skipped"
        );
        GridOutcome::Aborted {
            candidate_cells,
            max_cells: spec.max_cells,
        }
    };
    if !spec.cell_size_m.is_finite() || spec.cell_size_m <= 0.0 {
        return aborted(usize::MAX);
    }

    let lat_step = spec.cell_size_m / METERS_PER_DEGREE;
    let cos = bbox.center().lat.to_radians().cos().abs().max(MIN_COS_LAT);
    let lng_step = spec.cell_size_m / (METERS_PER_DEGREE * cos);

    let rows_f = steps(bbox.north - bbox.south, lat_step);
    let cols_f = steps(bbox.east - bbox.west, lng_step);
    let candidates_f = rows_f * cols_f;
    if !candidates_f.is_finite() || candidates_f > spec.max_cells as f64 {
        // `as` saturates for out-of-range floats.
        return aborted(candidates_f as usize);
    }
    let (rows, cols) = (rows_f as usize, cols_f as usize);

    // Cell index → retained slot.
    let mut slot: Vec<Option<usize>> = vec![None; rows * cols];
    let mut cells: Vec<GridCell> = Vec::new();
    for row in 0..rows {
        let south = bbox.south + row as f64 * lat_step;
        for col in 0..cols {
            let west = bbox.west + col as f64 * lng_step;
            let bounds = BoundingBox {
                south,
                west,
                north: south + lat_step,
                east: west + lng_step,
            };
            if test(bounds.center()) {
                slot[row * cols + col] = Some(cells.len());
                cells.push(GridCell {
                    row,
                    col,
                    bounds,
                    point_count: 0,
                    metric_average: None,
                });
            }
        }
    }

    let mut acc = vec![Acc::default(); cells.len()];
    for p in points {
        let c = p.coordinate();
        if !c.is_valid() || !bbox.contains(c) {
            continue;
        }
        let row = (((c.lat - bbox.south) / lat_step) as usize).min(rows - 1);
        let col = (((c.lng - bbox.west) / lng_step) as usize).min(cols - 1);
        if let Some(i) = slot[row * cols + col] {
            let a = &mut acc[i];
            a.count += 1;
            if let Some(v) = p.metric(metric_key) {
                a.sum += v;
                a.samples += 1;
            }
        }
    }
    for (cell, a) in cells.iter_mut().zip(&acc) {
        cell.point_count = a.count;
        cell.metric_average = (a.samples > 0).then(|| a.sum / a.samples as f64);
    }

    let cells_with_points = cells.iter().filter(|c| c.point_count > 0).count();
    let total_grid_area = cells.len() as f64 * spec.cell_size_m * spec.cell_size_m;
    tracing::debug!(
        rows,
        cols,
        retained = cells.len(),
        cells_with_points,
        "grid rasterized"
    );
    GridOutcome::Complete(Grid {
        cell_size_m: spec.cell_size_m,
        rows,
        cols,
        cells,
        cells_with_points,
        total_grid_area,
    })
}
