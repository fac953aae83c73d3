//! Analysis orchestration.
//!
//! Purpose
//! - Sequence classifier → point filter → {statistics, grid, temporal} for the
//!   current shape and publish one `AnalysisSummary` per run.
//! - `analyze` is the pure single-run entry point; `Orchestrator` wraps it in
//!   the interactive state machine (shape drawn, filters changed, cleared).
//!
//! Code cross-refs: `crate::geo::Classifier`, `crate::filter::PointFilter`,
//! `crate::grid::rasterize`, `crate::temporal::analyze`.

mod orchestrator;
mod types;

pub use orchestrator::{analyze, Orchestrator};
pub use types::{
    AnalysisEvent, AnalysisOptions, AnalysisSubscriber, AnalysisSummary, OrchestratorState,
};

#[cfg(test)]
mod tests;
