//! Performance benchmarks for large-cluster-lib
//!
//! Run with: cargo bench --package large-cluster-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use large_cluster_lib::synthetic::seeded_points;
use large_cluster_lib::{
    ClusterConfig, ClusteringEngine, Coordinate, Coordinator, ElementId, GridClusterer,
    HostSurface, PresentableItem, ViewportRegion, VisualElement,
};
use std::time::Duration;

/// Host that draws nothing
struct NullHost;

impl HostSurface for NullHost {
    fn display_element(&mut self, _element: &VisualElement) {}
    fn remove_element(&mut self, _id: ElementId) {}
    fn animate_opacity(&mut self, _ids: &[ElementId], _to: f32, _duration: Duration) {}
    fn request_viewport(&mut self, _region: ViewportRegion, _animated: bool) {}
}

fn san_francisco(delta: f64) -> ViewportRegion {
    ViewportRegion::new(Coordinate::new(37.787994, -122.407437), delta, delta)
}

fn engine_with(count: usize) -> GridClusterer {
    let config = ClusterConfig {
        max_zoom_level: 17,
        min_count_for_clustering: 3,
        ..Default::default()
    };
    let mut engine = GridClusterer::new(config);
    engine.add(seeded_points(count, &san_francisco(0.1), 42));
    engine
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_recluster(c: &mut Criterion) {
    let mut group = c.benchmark_group("recluster");
    group.sample_size(20);

    let engine = engine_with(100_000);
    let viewport = san_francisco(0.1);
    group.throughput(Throughput::Elements(100_000));

    for zoom in [10.0, 13.0, 15.0, 17.0] {
        group.bench_with_input(BenchmarkId::new("100k", zoom), &zoom, |b, &zoom| {
            b.iter(|| engine.recluster(&viewport, zoom));
        });
    }

    // Detailed view; most points filtered out
    let small = san_francisco(0.01);
    group.bench_function("100k_small_viewport", |b| {
        b.iter(|| engine.recluster(&small, 16.0));
    });

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    group.sample_size(10);

    let engine = engine_with(100_000);
    let viewport = san_francisco(0.1);
    let clustered: Vec<PresentableItem> = engine.recluster(&viewport, 12.0);
    let singletons: Vec<PresentableItem> = engine.recluster(&viewport, 17.0);

    // Alternate between two results so every apply does a full diff
    group.bench_function("100k_zoom_in_out", |b| {
        let mut coordinator = Coordinator::new(GridClusterer::default(), NullHost);
        b.iter(|| {
            for items in [&singletons, &clustered] {
                let task = coordinator.on_viewport_settled(viewport, 12.0);
                let mut outcome = task.run();
                outcome.items = items.clone();
                coordinator.apply(outcome);
            }
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_recluster, bench_reconcile);

criterion_main!(benches);
