use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use regionscan::api::{
    decode_wkt, stats_rows, uniform_points, AnalysisCfg, AnalysisEvent, AnalysisOptions,
    AnalysisSummary, DaySet, HourFilter, Orchestrator, ReplayToken, Shape, SynthCfg, TimeFilter,
};
use serde_json::json;
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

mod io;
mod provenance;

/// Sunday 2024-01-07T00:00:00Z.
const DEFAULT_SYNTH_START_MS: i64 = 1_704_585_600_000;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Select drive-test telemetry by drawn region and summarize it")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Select points inside a shape and write the analysis summary
    Analyze(AnalyzeArgs),
    /// Convert between WKT and shape JSON
    Wkt {
        #[command(subcommand)]
        op: WktOp,
    },
    /// Write a reproducible synthetic telemetry CSV
    Synth {
        #[arg(long, default_value_t = 1000)]
        count: usize,
        /// south,west,north,east
        #[arg(long, allow_hyphen_values = true)]
        bbox: String,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// First timestamp of the sampled week (Unix ms)
        #[arg(long, default_value_t = DEFAULT_SYNTH_START_MS)]
        start_ms: i64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print library version and git revision
    Report,
}

#[derive(Subcommand)]
enum WktOp {
    /// Decode WKT text into polygon JSON
    Decode { text: String },
    /// Encode a shape (JSON file or inline JSON) as WKT
    Encode {
        #[arg(long)]
        shape: String,
    },
}

#[derive(Args, Clone, Debug, Default)]
struct AnalyzeArgs {
    /// Telemetry CSV (latitude, longitude, timestamp, metric columns)
    #[arg(long)]
    points: PathBuf,
    /// Shape JSON file or inline JSON
    #[arg(long, conflicts_with = "wkt", required_unless_present = "wkt")]
    shape: Option<String>,
    /// File holding a POLYGON/MULTIPOLYGON project region
    #[arg(long)]
    wkt: Option<PathBuf>,
    #[arg(long, default_value = "rsrp")]
    metric: String,
    #[arg(long)]
    grid: bool,
    #[arg(long)]
    cell_size: Option<f64>,
    #[arg(long)]
    max_cells: Option<usize>,
    #[arg(long)]
    max_points: Option<usize>,
    /// Minutes east of UTC defining local hour and weekday
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<i32>,
    /// all | H | A-B (wraps past midnight)
    #[arg(long)]
    hours: Option<String>,
    /// all | weekdays | comma-separated 0..6 (0 = Sunday)
    #[arg(long)]
    days: Option<String>,
    /// JSON AnalysisCfg; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    stats_csv: Option<PathBuf>,
    #[arg(long)]
    points_csv: Option<PathBuf>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    SubscriberBuilder::default()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Analyze(args) => analyze(args).map(|_| ()),
        Action::Wkt { op } => wkt(op),
        Action::Synth {
            count,
            bbox,
            seed,
            start_ms,
            out,
        } => synth(count, &bbox, seed, start_ms, &out),
        Action::Report => report(),
    }
}

fn analyze(args: AnalyzeArgs) -> Result<AnalysisSummary> {
    let cfg = load_cfg(&args)?;
    let shape = load_shape(&args)?;
    let time_filter = time_filter(args.hours.as_deref(), args.days.as_deref())?;
    let mut options = AnalysisOptions::new(args.metric.clone()).with_grid(args.grid);
    options.time_filter = time_filter;

    let points = io::read_points(&args.points)?;
    tracing::info!(points = points.len(), shape = shape.kind(), "analyze");

    let (tx, rx) = mpsc::channel::<AnalysisEvent>();
    let mut orch = Orchestrator::new(cfg, options)?;
    orch.subscribe(Box::new(tx));
    orch.set_points(points);
    orch.begin_drawing();
    let summary = orch
        .complete_shape(shape)
        .cloned()
        .ok_or_else(|| anyhow!("analysis produced no summary"))?;
    for event in rx.try_iter() {
        match event {
            AnalysisEvent::Analyzed(s) => tracing::info!(
                total = s.total_count,
                mean = ?s.stats.mean,
                grid_aborted = s.grid.as_ref().is_some_and(|g| g.is_aborted()),
                "analyzed"
            ),
            AnalysisEvent::TemporalReady(tp) => tracing::info!(
                peak_hour = tp.peak_hour,
                peak_day = tp.peak_day_name(),
                "temporal_patterns"
            ),
            AnalysisEvent::Cleared => {}
        }
    }

    create_parent(&args.out)?;
    std::fs::write(&args.out, serde_json::to_vec_pretty(&summary)?)
        .with_context(|| format!("writing {}", args.out.display()))?;
    let mut payload = provenance::Payload::new(json!({
        "points": args.points,
        "shape": summary.shape_type,
        "metric": args.metric,
        "cfg": cfg,
        "time_filter": summary.time_filter,
        "grid": args.grid,
    }));
    if let Some(path) = &args.stats_csv {
        io::write_stats_csv(&stats_rows(&summary), path)?;
        payload = payload.with_output(path);
    }
    if let Some(path) = &args.points_csv {
        io::write_points_csv(&summary.points, path)?;
        payload = payload.with_output(path);
    }
    provenance::write_sidecar(&args.out, payload)?;
    Ok(summary)
}

fn load_cfg(args: &AnalyzeArgs) -> Result<AnalysisCfg> {
    let mut cfg = match &args.config {
        Some(path) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => AnalysisCfg::default(),
    };
    if let Some(v) = args.cell_size {
        cfg.cell_size_m = v;
    }
    if let Some(v) = args.max_cells {
        cfg.max_cells = v;
    }
    if let Some(v) = args.max_points {
        cfg.max_points = v;
    }
    if let Some(v) = args.utc_offset {
        cfg.utc_offset_minutes = v;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn load_shape(args: &AnalyzeArgs) -> Result<Shape> {
    if let Some(src) = &args.shape {
        return parse_shape(src);
    }
    let Some(path) = &args.wkt else {
        bail!("one of --shape or --wkt is required");
    };
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let polygons = decode_wkt(&text);
    tracing::debug!(polygons = polygons.len(), "wkt_region");
    Shape::from_multipolygon(polygons)
        .ok_or_else(|| anyhow!("{}: no valid polygon in WKT", path.display()))
}

/// Inline JSON when it looks like an object, otherwise a file path.
fn parse_shape(src: &str) -> Result<Shape> {
    let text = if src.trim_start().starts_with('{') {
        src.to_string()
    } else {
        std::fs::read_to_string(src).with_context(|| format!("reading shape {src}"))?
    };
    serde_json::from_str(&text).context("parsing shape JSON")
}

fn time_filter(hours: Option<&str>, days: Option<&str>) -> Result<Option<TimeFilter>> {
    if hours.is_none() && days.is_none() {
        return Ok(None);
    }
    let hours = match hours {
        Some(h) => HourFilter::parse(h).ok_or_else(|| anyhow!("invalid --hours {h:?}"))?,
        None => HourFilter::All,
    };
    let days = match days {
        Some(d) => parse_days(d)?,
        None => DaySet::all(),
    };
    Ok(Some(TimeFilter::new(hours, days)))
}

fn parse_days(s: &str) -> Result<DaySet> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("all") {
        return Ok(DaySet::all());
    }
    if s.eq_ignore_ascii_case("weekdays") {
        return Ok(DaySet::weekdays());
    }
    let days = s
        .split(',')
        .map(|t| match t.trim().parse::<u8>() {
            Ok(d) if d < 7 => Ok(d),
            _ => Err(anyhow!("invalid day {t:?} in --days (expected 0..6, 0 = Sunday)")),
        })
        .collect::<Result<Vec<u8>>>()?;
    Ok(DaySet::from_days(days))
}

fn wkt(op: WktOp) -> Result<()> {
    match op {
        WktOp::Decode { text } => {
            let polygons = decode_wkt(&text);
            tracing::info!(polygons = polygons.len(), "wkt_decode");
            println!("{}", serde_json::to_string_pretty(&polygons)?);
        }
        WktOp::Encode { shape } => {
            let shape = parse_shape(&shape)?;
            let text = shape
                .to_wkt()
                .ok_or_else(|| anyhow!("{} has fewer than 3 vertices", shape.kind()))?;
            println!("{text}");
        }
    }
    Ok(())
}

fn synth(count: usize, bbox: &str, seed: u64, start_ms: i64, out: &Path) -> Result<()> {
    let bbox = io::parse_bbox(bbox)?;
    let points = uniform_points(
        SynthCfg {
            count,
            bbox,
            start_ms,
        },
        ReplayToken { seed, index: 0 },
    );
    io::write_points_csv(&points, out)?;
    tracing::info!(count, seed, out = %out.display(), "synth");
    provenance::write_sidecar(
        out,
        provenance::Payload::new(json!({
            "count": count,
            "bbox": [bbox.south, bbox.west, bbox.north, bbox.east],
            "seed": seed,
            "start_ms": start_ms,
        })),
    )?;
    Ok(())
}

fn report() -> Result<()> {
    let obj = json!({
        "code_rev": provenance::current_git_rev(),
        "regionscan_version": regionscan::VERSION,
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}
