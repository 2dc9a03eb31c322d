//! Clustering benchmarks using criterion for historical comparison.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rct_spatial::{ChunkSet, Region, cluster_regions, window};

const VIEW_DISTANCE: u32 = 10;

/// Players spread on a line, `spacing` chunks apart.
fn line_layout(players: u64, spacing: i32) -> Vec<ChunkSet> {
    (0..players as i32)
        .map(|i| window(i * spacing, 0, VIEW_DISTANCE))
        .collect()
}

fn cluster_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster");

    for players in [1, 10, 50, 200] {
        group.throughput(Throughput::Elements(players));

        group.bench_with_input(
            BenchmarkId::new("scattered", players),
            &players,
            |b, &players| {
                let sets = line_layout(players, 100);
                b.iter(|| {
                    let regions: Vec<Region<()>> = cluster_regions(black_box(sets.clone()));
                    black_box(regions)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("chained", players),
            &players,
            |b, &players| {
                // Overlapping neighbours: everything collapses into one region
                let sets = line_layout(players, 15);
                b.iter(|| {
                    let regions: Vec<Region<()>> = cluster_regions(black_box(sets.clone()));
                    black_box(regions)
                });
            },
        );
    }

    group.finish();
}

fn window_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("window");

    for radius in [2, 10, 32] {
        group.bench_with_input(BenchmarkId::new("build", radius), &radius, |b, &radius| {
            b.iter(|| black_box(window(black_box(0), black_box(0), radius)));
        });
    }

    group.finish();
}

criterion_group!(benches, cluster_benchmarks, window_benchmarks);
criterion_main!(benches);
