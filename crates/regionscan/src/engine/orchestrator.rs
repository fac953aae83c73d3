use std::sync::Arc;

use crate::cfg::{AnalysisCfg, ConfigError};
use crate::filter::{PointFilter, TimeFilter};
use crate::geo::{Classifier, Shape};
use crate::grid::{rasterize, GridSpec};
use crate::stats::summarize;
use crate::telemetry::TelemetryPoint;
use crate::temporal;

use super::types::{
    AnalysisEvent, AnalysisOptions, AnalysisSubscriber, AnalysisSummary, OrchestratorState,
};

/// A completed shape with its membership test derived once.
struct ActiveShape {
    shape: Shape,
    classifier: Classifier,
    area_sq_meters: f64,
}

impl ActiveShape {
    fn new(shape: Shape) -> Self {
        let classifier = Classifier::from_shape(&shape);
        let area_sq_meters = shape.area_sq_meters();
        Self {
            shape,
            classifier,
            area_sq_meters,
        }
    }
}

/// Run the full pipeline for one shape: a pure function of its inputs.
pub fn analyze(
    shape: &Shape,
    points: &[TelemetryPoint],
    options: &AnalysisOptions,
    cfg: &AnalysisCfg,
) -> AnalysisSummary {
    let active = ActiveShape::new(shape.clone());
    run(&active, points, options, cfg)
}

fn run(
    active: &ActiveShape,
    points: &[TelemetryPoint],
    options: &AnalysisOptions,
    cfg: &AnalysisCfg,
) -> AnalysisSummary {
    let filtered = PointFilter::from_cfg(cfg).apply(
        points,
        active.classifier.as_fn(),
        options.time_filter.as_ref(),
    );
    let stats = summarize(&filtered.points, &options.metric);

    let grid = if options.grid {
        active.shape.bounding_box().map(|bb| {
            rasterize(
                bb,
                active.classifier.as_fn(),
                &filtered.points,
                &options.metric,
                GridSpec::from_cfg(cfg),
            )
        })
    } else {
        None
    };

    let temporal_patterns = options
        .time_filter
        .as_ref()
        .and_then(|_| temporal::analyze(&filtered.points, cfg.offset()));

    tracing::debug!(
        shape = active.shape.kind(),
        input = filtered.input_count,
        inside = filtered.before_time_filter,
        kept = filtered.after_time_filter,
        metric = %options.metric,
        "analysis complete"
    );

    let mut filter = filtered;
    let points = std::mem::take(&mut filter.points);
    AnalysisSummary {
        shape_type: active.shape.kind(),
        area_sq_meters: active.area_sq_meters,
        metric: options.metric.clone(),
        total_count: points.len(),
        stats,
        filter,
        grid,
        time_filter: options.time_filter,
        temporal_patterns,
        points,
    }
}

/// Event-driven driver: `Idle → Drawing → Analyzed → Idle`.
///
/// Invariants
/// - At most one shape is active; a new shape replaces the old one.
/// - Metric/time/grid/point changes while `Analyzed` re-run from the point
///   filter with the stored classifier.
/// - `clear(signal)` only acts on a signal greater than any seen before.
pub struct Orchestrator {
    cfg: AnalysisCfg,
    options: AnalysisOptions,
    points: Vec<TelemetryPoint>,
    active: Option<ActiveShape>,
    summary: Option<Arc<AnalysisSummary>>,
    state: OrchestratorState,
    clear_signal: u64,
    subscribers: Vec<Box<dyn AnalysisSubscriber>>,
}

impl Orchestrator {
    pub fn new(cfg: AnalysisCfg, options: AnalysisOptions) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            options,
            points: Vec::new(),
            active: None,
            summary: None,
            state: OrchestratorState::Idle,
            clear_signal: 0,
            subscribers: Vec::new(),
        })
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn AnalysisSubscriber>) {
        self.subscribers.push(subscriber);
    }

    #[inline]
    pub fn state(&self) -> OrchestratorState {
        self.state
    }
    pub fn summary(&self) -> Option<&AnalysisSummary> {
        self.summary.as_deref()
    }
    pub fn shape(&self) -> Option<&Shape> {
        self.active.as_ref().map(|a| &a.shape)
    }
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }
    pub fn cfg(&self) -> &AnalysisCfg {
        &self.cfg
    }

    /// The user started drawing; any previous result is no longer current.
    pub fn begin_drawing(&mut self) {
        self.active = None;
        self.summary = None;
        self.state = OrchestratorState::Drawing;
    }

    /// A shape was completed (or loaded); analyze it and notify subscribers.
    pub fn complete_shape(&mut self, shape: Shape) -> Option<&AnalysisSummary> {
        self.active = Some(ActiveShape::new(shape));
        self.rerun();
        self.summary.as_deref()
    }

    /// Replace the point set (e.g. a new log was fetched).
    pub fn set_points(&mut self, points: Vec<TelemetryPoint>) {
        self.points = points;
        self.rerun_if_analyzed();
    }

    pub fn set_metric(&mut self, metric: impl Into<String>) {
        self.options.metric = metric.into();
        self.rerun_if_analyzed();
    }

    pub fn set_time_filter(&mut self, time_filter: Option<TimeFilter>) {
        self.options.time_filter = time_filter;
        self.rerun_if_analyzed();
    }

    pub fn set_grid(&mut self, grid: bool) {
        self.options.grid = grid;
        self.rerun_if_analyzed();
    }

    /// Advance the clear counter; stale or repeated signals are ignored.
    /// Returns whether the state was cleared.
    pub fn clear(&mut self, signal: u64) -> bool {
        if signal <= self.clear_signal {
            return false;
        }
        self.clear_signal = signal;
        self.active = None;
        self.summary = None;
        self.state = OrchestratorState::Idle;
        self.notify(&AnalysisEvent::Cleared);
        true
    }

    fn rerun_if_analyzed(&mut self) {
        if self.state == OrchestratorState::Analyzed {
            self.rerun();
        }
    }

    fn rerun(&mut self) {
        let Some(active) = &self.active else {
            return;
        };
        let summary = Arc::new(run(active, &self.points, &self.options, &self.cfg));
        let temporal = summary.temporal_patterns.clone();
        self.notify(&AnalysisEvent::Analyzed(Arc::clone(&summary)));
        if let Some(tp) = temporal {
            self.notify(&AnalysisEvent::TemporalReady(tp));
        }
        self.summary = Some(summary);
        self.state = OrchestratorState::Analyzed;
    }

    fn notify(&mut self, event: &AnalysisEvent) {
        for s in &mut self.subscribers {
            s.on_event(event);
        }
    }
}
