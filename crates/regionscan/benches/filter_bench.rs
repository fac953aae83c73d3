//! Criterion benchmarks for shape classification + point filtering.
//! Focus sizes: n in {1k, 10k, 50k} points.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use regionscan::api::{
    filter, from_shape, uniform_points, BoundingBox, Coordinate, ReplayToken, Ring, Shape,
    SynthCfg,
};

fn region() -> BoundingBox {
    BoundingBox {
        south: 48.0,
        west: 11.0,
        north: 48.1,
        east: 11.15,
    }
}

fn shapes() -> Vec<(&'static str, Shape)> {
    let c = region().center();
    vec![
        (
            "rectangle",
            Shape::Rectangle {
                south_west: Coordinate::new(48.02, 11.03),
                north_east: Coordinate::new(48.08, 11.12),
            },
        ),
        (
            "circle",
            Shape::Circle {
                center: c,
                radius_meters: 3000.0,
            },
        ),
        (
            "polygon",
            Shape::Polygon {
                vertices: Ring::new(
                    (0..32)
                        .map(|k| {
                            let th = std::f64::consts::TAU * k as f64 / 32.0;
                            let r = if k % 2 == 0 { 0.04 } else { 0.025 };
                            Coordinate::new(c.lat + r * th.sin(), c.lng + r * 1.5 * th.cos())
                        })
                        .collect(),
                ),
                holes: vec![],
            },
        ),
    ]
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    for &n in &[1_000usize, 10_000, 50_000] {
        let pts = uniform_points(
            SynthCfg {
                count: n,
                bbox: region(),
                start_ms: 1_704_585_600_000,
            },
            ReplayToken { seed: 43, index: 0 },
        );
        for (name, shape) in shapes() {
            let test = from_shape(&shape);
            group.bench_with_input(BenchmarkId::new(name, n), &pts, |b, pts| {
                b.iter(|| {
                    let _out = filter(pts, test.as_fn(), None);
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_filter);
criterion_main!(benches);
