//! Curated API surface.
//!
//! Re-exports grouped by pipeline stage. Prefer these paths over deep module
//! paths; internal layout may change.

// Configuration
pub use crate::cfg::{AnalysisCfg, ConfigError, EARTH_RADIUS_M, METERS_PER_DEGREE};
// Geometry and codec
pub use crate::geo::{
    from_shape, haversine_m, BoundingBox, Classifier, Coordinate, MultiPolygon, Polygon, Ring,
    Shape,
};
pub use crate::wkt::{decode as decode_wkt, encode as encode_wkt, encode_multipolygon};
// Pipeline stages
pub use crate::filter::{
    filter, DaySet, FilterOutcome, HourFilter, HourOutOfRange, PointFilter, TimeFilter,
};
pub use crate::grid::{rasterize, Grid, GridCell, GridOutcome, GridSpec};
pub use crate::stats::{summarize, summarize_values, Stats};
pub use crate::telemetry::TelemetryPoint;
pub use crate::temporal::{analyze as analyze_temporal, TemporalPatterns, DAY_NAMES};
// Orchestration and outputs
pub use crate::engine::{
    analyze, AnalysisEvent, AnalysisOptions, AnalysisSubscriber, AnalysisSummary, Orchestrator,
    OrchestratorState,
};
pub use crate::export::{
    raw_kind, raw_value, stats_rows, RawKind, RawValue, NOT_AVAILABLE, RAW_POINT_COLUMNS,
};
pub use crate::synth::{uniform_points, ReplayToken, SynthCfg};
