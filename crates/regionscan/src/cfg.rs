//! Analysis configuration and numeric constants.
//!
//! Policy
//! - Geodesy constants are fixed; only the per-run knobs (cell size, caps,
//!   local-time offset) are configurable through `AnalysisCfg`.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used by haversine distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
/// Metres per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Per-run analysis knobs.
///
/// Invariants (checked by `validate`):
/// - `cell_size_m` finite and > 0.
/// - `max_cells >= 1`, `max_points >= 1`.
/// - `|utc_offset_minutes| <= 14h`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisCfg {
    /// Grid cell edge length in metres.
    pub cell_size_m: f64,
    /// Hard cap on candidate grid cells; exceeding it aborts rasterization.
    pub max_cells: usize,
    /// Hard cap on input points considered by one run.
    pub max_points: usize,
    /// Fixed offset defining "local" hour-of-day and weekday.
    pub utc_offset_minutes: i32,
}

impl Default for AnalysisCfg {
    fn default() -> Self {
        Self {
            cell_size_m: 100.0,
            max_cells: 10_000,
            max_points: 50_000,
            utc_offset_minutes: 0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("cell size must be a positive number of metres, got {0}")]
    CellSize(f64),
    #[error("max_cells must be at least 1")]
    MaxCells,
    #[error("max_points must be at least 1")]
    MaxPoints,
    #[error("utc offset of {0} minutes is outside ±14h")]
    UtcOffset(i32),
}

impl AnalysisCfg {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cell_size_m.is_finite() || self.cell_size_m <= 0.0 {
            return Err(ConfigError::CellSize(self.cell_size_m));
        }
        if self.max_cells == 0 {
            return Err(ConfigError::MaxCells);
        }
        if self.max_points == 0 {
            return Err(ConfigError::MaxPoints);
        }
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::UtcOffset(self.utc_offset_minutes));
        }
        Ok(())
    }

    /// Local-time offset as a chrono `FixedOffset` (UTC when out of range).
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}
