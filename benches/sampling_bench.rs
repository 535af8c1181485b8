//! Benchmarks for field sampling.
//!
//! Run with: `cargo bench --bench sampling_bench`
//!
//! Compares a flat 2-D field against a sigma-coordinate 3-D field, with and
//! without the per-field result cache.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use envfield::field::{DataShape, FieldData, GriddedField, SampleOptions};
use envfield::grid::{Grid, RectilinearGrid};
use envfield::time::TimeAxis;
use envfield::vertical::{DepthAxis, SigmaTerms, SongHaidvogelStretching};

const NX: usize = 200;
const NY: usize = 150;
const N_LAYERS: usize = 20;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

fn grid() -> Arc<dyn Grid> {
    Arc::new(RectilinearGrid::uniform(0.0, 10.0, NX, 55.0, 62.0, NY).unwrap())
}

/// Generate pseudo-random query points inside the grid.
fn generate_points(n: usize, max_depth: f64) -> Vec<[f64; 3]> {
    (0..n)
        .map(|i| {
            let phase = i as f64 * 0.618_033_988_75;
            let x = 10.0 * phase.fract();
            let y = 55.0 + 7.0 * (phase * 1.7).fract();
            let z = max_depth * (phase * 2.3).fract();
            [x, y, z]
        })
        .collect()
}

fn surface_field(grid: &Arc<dyn Grid>) -> GriddedField {
    let n = NX * NY;
    let time = TimeAxis::new(vec![t0(), t0() + Duration::hours(1)]).unwrap();
    let values: Vec<f64> = (0..2 * n).map(|k| (k % 97) as f64 * 0.01).collect();
    GriddedField::series("ssh", "m", Arc::clone(grid), time, values).unwrap()
}

fn sigma_field(grid: &Arc<dyn Grid>) -> GriddedField {
    let n = NX * NY;
    let stretching = SongHaidvogelStretching::default();
    let terms = SigmaTerms::from_stretching(N_LAYERS, 20.0, &stretching).unwrap();
    let h: Vec<f64> = (0..n).map(|k| 50.0 + (k % 31) as f64 * 5.0).collect();
    let bathymetry = Arc::new(GriddedField::surface("h", "m", Arc::clone(grid), h).unwrap());

    let n_w = terms.num_w_levels();
    let values: Vec<f64> = (0..n_w * n).map(|k| 4.0 + (k / n) as f64 * 0.5).collect();
    let data = FieldData::new(values, DataShape::surface(n).with_depth(n_w)).unwrap();
    GriddedField::new(
        "temp",
        "C",
        Arc::clone(grid),
        TimeAxis::empty(),
        data,
        DepthAxis::sigma(bathymetry, terms),
    )
    .unwrap()
}

/// Benchmark uncached sampling for growing batch sizes.
fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sampling");
    let grid = grid();
    let surface = surface_field(&grid);
    let sigma = sigma_field(&grid);
    let opts = SampleOptions::new().with_memoize(false);
    let t = t0() + Duration::minutes(20);

    for n in [100, 1_000, 10_000] {
        let surface_points = generate_points(n, 0.0);
        let deep_points = generate_points(n, 150.0);

        group.bench_with_input(BenchmarkId::new("surface", n), &surface_points, |b, pts| {
            b.iter(|| surface.at(black_box(pts), t, &opts).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("sigma", n), &deep_points, |b, pts| {
            b.iter(|| sigma.at(black_box(pts), t, &opts).unwrap())
        });
    }
    group.finish();
}

/// Benchmark a repeated query served from the cache.
fn bench_cache_hit(c: &mut Criterion) {
    let grid = grid();
    let sigma = sigma_field(&grid);
    let points = generate_points(10_000, 150.0);
    let opts = SampleOptions::new();
    sigma.at(&points, t0(), &opts).unwrap();

    c.bench_function("sigma_cache_hit_10000", |b| {
        b.iter(|| sigma.at(black_box(&points), t0(), &opts).unwrap())
    });
}

criterion_group!(benches, bench_sampling, bench_cache_hit);
criterion_main!(benches);
