//! Geometric selection and spatial-temporal aggregation for drive-test telemetry.
//!
//! A drawn shape (polygon, rectangle, circle) selects telemetry points; the
//! selection is summarized as statistics over one metric, an optional uniform
//! grid, and hour/weekday usage peaks. `wkt` converts saved regions to and
//! from Well-Known Text.
//!
//! API Policy
//! - Library consumers should prefer `api` or `prelude`; module paths may move.

pub mod api;
pub mod cfg;
pub mod engine;
pub mod export;
pub mod filter;
pub mod geo;
pub mod grid;
pub mod stats;
pub mod synth;
pub mod telemetry;
pub mod temporal;
pub mod wkt;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::cfg::AnalysisCfg;
    pub use crate::engine::{analyze, AnalysisOptions, AnalysisSummary, Orchestrator};
    pub use crate::filter::{DaySet, HourFilter, TimeFilter};
    pub use crate::geo::{from_shape, BoundingBox, Classifier, Coordinate, Ring, Shape};
    pub use crate::telemetry::TelemetryPoint;
}
