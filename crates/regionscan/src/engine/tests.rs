use std::sync::mpsc;

use super::*;
use crate::cfg::AnalysisCfg;
use crate::filter::{DaySet, HourFilter, TimeFilter};
use crate::geo::{BoundingBox, Coordinate, Ring, Shape};
use crate::grid::GridOutcome;
use crate::synth::{uniform_points, ReplayToken, SynthCfg};
use crate::telemetry::TelemetryPoint;

const SUNDAY: i64 = 1_704_585_600_000;
const HOUR_MS: i64 = 3_600_000;

fn region() -> BoundingBox {
    BoundingBox {
        south: 52.0,
        west: 13.0,
        north: 52.02,
        east: 13.03,
    }
}

fn synthetic(n: usize, seed: u64) -> Vec<TelemetryPoint> {
    uniform_points(
        SynthCfg {
            count: n,
            bbox: region(),
            start_ms: SUNDAY,
        },
        ReplayToken { seed, index: 0 },
    )
}

/// Central quarter (by area) of `region()`: half the extent on each axis.
fn central_quarter() -> Shape {
    let bb = region();
    let (h, w) = (bb.north - bb.south, bb.east - bb.west);
    Shape::Rectangle {
        south_west: Coordinate::new(bb.south + h * 0.25, bb.west + w * 0.25),
        north_east: Coordinate::new(bb.north - h * 0.25, bb.east - w * 0.25),
    }
}

#[test]
fn central_quarter_selects_about_a_quarter() {
    for seed in [1, 2, 3] {
        let pts = synthetic(1000, seed);
        let s = analyze(
            &central_quarter(),
            &pts,
            &AnalysisOptions::new("rsrp"),
            &AnalysisCfg::default(),
        );
        // Binomial(1000, 0.25): sd ≈ 13.7; allow ~4.5 sd.
        assert!(
            (190..=310).contains(&s.total_count),
            "seed {seed}: {}",
            s.total_count
        );
        assert_eq!(s.stats.count, s.total_count);
        assert_eq!(s.points.len(), s.total_count);
        assert_eq!(s.shape_type, "rectangle");
    }
}

#[test]
fn grid_abort_keeps_rest_of_summary() {
    let pts = synthetic(200, 9);
    let cfg = AnalysisCfg {
        cell_size_m: 1.0,
        max_cells: 100,
        ..Default::default()
    };
    let opts = AnalysisOptions::new("rsrp")
        .with_grid(true)
        .with_time_filter(TimeFilter::default());
    let s = analyze(&central_quarter(), &pts, &opts, &cfg);
    assert!(matches!(s.grid, Some(GridOutcome::Aborted { .. })));
    assert!(s.total_count > 0);
    assert!(s.stats.mean.is_some());
    assert!(s.temporal_patterns.is_some());
}

#[test]
fn grid_cells_cover_filtered_points() {
    let pts = synthetic(500, 4);
    let opts = AnalysisOptions::new("sinr").with_grid(true);
    let s = analyze(&central_quarter(), &pts, &opts, &AnalysisCfg::default());
    let g = s.grid.as_ref().and_then(GridOutcome::grid).expect("grid");
    let binned: usize = g.cells.iter().map(|c| c.point_count).sum();
    assert!(binned <= s.total_count);
    assert!(g.cells_with_points > 0);
    assert!(g.cells.len() <= AnalysisCfg::default().max_cells);
}

#[test]
fn temporal_only_when_time_settings_enabled() {
    let pts = synthetic(100, 5);
    let off = analyze(
        &central_quarter(),
        &pts,
        &AnalysisOptions::new("rsrp"),
        &AnalysisCfg::default(),
    );
    assert!(off.temporal_patterns.is_none());
    assert!(off.time_filter.is_none());
}

fn polygon_around_origin() -> Shape {
    Shape::Polygon {
        vertices: Ring::new(vec![
            Coordinate::new(-1.0, -1.0),
            Coordinate::new(-1.0, 1.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(1.0, -1.0),
        ]),
        holes: vec![],
    }
}

fn hourly_points() -> Vec<TelemetryPoint> {
    (0..48)
        .map(|h| {
            TelemetryPoint::new(0.0, 0.0, SUNDAY + h * HOUR_MS).with_metric("rsrp", -(h as f64))
        })
        .collect()
}

#[test]
fn orchestrator_lifecycle_and_notifications() {
    let (tx, rx) = mpsc::channel::<AnalysisEvent>();
    let mut orch = Orchestrator::new(AnalysisCfg::default(), AnalysisOptions::new("rsrp")).unwrap();
    orch.subscribe(Box::new(tx));
    orch.set_points(hourly_points());
    assert_eq!(orch.state(), OrchestratorState::Idle);
    assert!(rx.try_recv().is_err());

    orch.begin_drawing();
    assert_eq!(orch.state(), OrchestratorState::Drawing);

    let total = orch
        .complete_shape(polygon_around_origin())
        .map(|s| s.total_count);
    assert_eq!(total, Some(48));
    assert_eq!(orch.state(), OrchestratorState::Analyzed);
    match rx.try_recv().unwrap() {
        AnalysisEvent::Analyzed(s) => {
            assert_eq!(s.stats.mean, Some(-23.5));
            // Subscribers share the stored summary rather than a copy.
            assert!(std::ptr::eq(&*s, orch.summary().unwrap()));
        }
        other => panic!("unexpected {other:?}"),
    }

    // Time filter change re-runs and emits temporal patterns as well.
    orch.set_time_filter(Some(TimeFilter::new(
        HourFilter::Range {
            from_hour: 22,
            to_hour: 1,
        },
        DaySet::from_days([1]),
    )));
    let s = orch.summary().unwrap();
    // Monday 00, 01, 22 and 23.
    assert_eq!(s.total_count, 4);
    assert_eq!(s.filter.before_time_filter, 48);
    assert!(matches!(rx.try_recv().unwrap(), AnalysisEvent::Analyzed(_)));
    match rx.try_recv().unwrap() {
        AnalysisEvent::TemporalReady(tp) => assert_eq!(tp.peak_day, 1),
        other => panic!("unexpected {other:?}"),
    }

    // Metric change keeps the shape.
    orch.set_metric("sinr");
    assert_eq!(orch.summary().unwrap().metric, "sinr");
    assert!(orch.summary().unwrap().stats.mean.is_none());
    assert!(orch.shape().is_some());

    // Clear with an advancing counter; stale signals are ignored.
    assert!(orch.clear(1));
    assert_eq!(orch.state(), OrchestratorState::Idle);
    assert!(orch.summary().is_none());
    assert!(!orch.clear(1));
    assert!(!orch.clear(0));
    let events: Vec<AnalysisEvent> = rx.try_iter().collect();
    assert_eq!(events.last(), Some(&AnalysisEvent::Cleared));
}

#[test]
fn changes_while_idle_do_not_analyze() {
    let (tx, rx) = mpsc::channel::<AnalysisEvent>();
    let mut orch = Orchestrator::new(AnalysisCfg::default(), AnalysisOptions::new("rsrp")).unwrap();
    orch.subscribe(Box::new(tx));
    orch.set_metric("mos");
    orch.set_grid(true);
    orch.set_time_filter(Some(TimeFilter::default()));
    assert!(rx.try_recv().is_err());
    assert!(orch.summary().is_none());
}

#[test]
fn new_shape_replaces_old() {
    let mut orch = Orchestrator::new(AnalysisCfg::default(), AnalysisOptions::new("rsrp")).unwrap();
    orch.set_points(hourly_points());
    orch.complete_shape(polygon_around_origin());
    let far = Shape::Circle {
        center: Coordinate::new(40.0, 40.0),
        radius_meters: 100.0,
    };
    orch.complete_shape(far.clone());
    assert_eq!(orch.shape(), Some(&far));
    assert_eq!(orch.summary().unwrap().total_count, 0);
    assert_eq!(orch.summary().unwrap().shape_type, "circle");
}

#[test]
fn invalid_config_rejected() {
    let cfg = AnalysisCfg {
        cell_size_m: -1.0,
        ..Default::default()
    };
    assert!(Orchestrator::new(cfg, AnalysisOptions::new("rsrp")).is_err());
}
