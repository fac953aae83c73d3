use std::sync::mpsc::Sender;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::filter::{FilterOutcome, TimeFilter};
use crate::grid::GridOutcome;
use crate::stats::Stats;
use crate::telemetry::TelemetryPoint;
use crate::temporal::TemporalPatterns;

/// What to compute for the current shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Metric aggregated by statistics and grid cells (e.g. `rsrp`).
    pub metric: String,
    /// `Some` when time settings are enabled: filters points and turns on
    /// temporal pattern analysis.
    #[serde(default)]
    pub time_filter: Option<TimeFilter>,
    /// Build the spatial grid.
    #[serde(default)]
    pub grid: bool,
}

impl AnalysisOptions {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            time_filter: None,
            grid: false,
        }
    }
    pub fn with_time_filter(mut self, tf: TimeFilter) -> Self {
        self.time_filter = Some(tf);
        self
    }
    pub fn with_grid(mut self, grid: bool) -> Self {
        self.grid = grid;
        self
    }
}

/// Everything one analysis run produces.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub shape_type: &'static str,
    pub area_sq_meters: f64,
    pub metric: String,
    /// Points left after geometric and temporal filtering.
    pub total_count: usize,
    pub stats: Stats,
    /// Per-stage filter counts.
    pub filter: FilterOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_filter: Option<TimeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal_patterns: Option<TemporalPatterns>,
    pub points: Vec<TelemetryPoint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OrchestratorState {
    Idle,
    Drawing,
    Analyzed,
}

/// Notifications emitted by the orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisEvent {
    /// A fresh summary for the current shape, shared with the orchestrator.
    Analyzed(Arc<AnalysisSummary>),
    /// Temporal patterns, sent after `Analyzed` when time settings are enabled.
    TemporalReady(TemporalPatterns),
    /// The shape and its results were discarded.
    Cleared,
}

/// Observer for orchestrator output.
pub trait AnalysisSubscriber {
    fn on_event(&mut self, event: &AnalysisEvent);
}

impl AnalysisSubscriber for Sender<AnalysisEvent> {
    fn on_event(&mut self, event: &AnalysisEvent) {
        // A dropped receiver just stops listening.
        let _ = self.send(event.clone());
    }
}
