//! Criterion benchmarks for grid rasterization.
//! Focus: cell sizes {50, 100, 250} m over a ~7 km circle with 20k points.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use regionscan::api::{
    from_shape, rasterize, uniform_points, Coordinate, GridSpec, ReplayToken, Shape, SynthCfg,
};

fn bench_grid(c: &mut Criterion) {
    let shape = Shape::Circle {
        center: Coordinate::new(48.05, 11.07),
        radius_meters: 3500.0,
    };
    let bbox = shape.bounding_box().expect("bbox");
    let test = from_shape(&shape);
    let pts = uniform_points(
        SynthCfg {
            count: 20_000,
            bbox,
            start_ms: 1_704_585_600_000,
        },
        ReplayToken { seed: 44, index: 0 },
    );
    let mut group = c.benchmark_group("grid");
    for &cell in &[50.0f64, 100.0, 250.0] {
        group.bench_with_input(BenchmarkId::new("rasterize", cell as u64), &cell, |b, &cell| {
            b.iter(|| {
                let _g = rasterize(
                    bbox,
                    test.as_fn(),
                    &pts,
                    "rsrp",
                    GridSpec {
                        cell_size_m: cell,
                        max_cells: 50_000,
                    },
                );
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_grid);
criterion_main!(benches);
