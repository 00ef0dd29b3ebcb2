//! Performance benchmarks for monument-lib
//!
//! Run with: cargo bench --package monument-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::{Coord, LineString};
use monument_lib::cluster::cluster;
use monument_lib::export::{to_gpx, to_kml};
use monument_lib::{ClusterConfig, PixelViewport, PointOfInterest, Stop, ViewportBounds};
use std::hint::black_box;

/// Generate markers scattered over a country-sized area with some dense towns
fn generate_markers(count: usize) -> Vec<PointOfInterest> {
    (0..count)
        .map(|i| {
            let t = i as f64 / count as f64;
            let town = (i % 40) as f64;
            let lat = 38.0 + (town * 0.13) % 5.0 + (t * 97.0).sin() * 0.05;
            let lon = -6.0 + (town * 0.29) % 8.0 + (t * 71.0).cos() * 0.05;
            PointOfInterest {
                id: i as u64,
                lon,
                lat,
                name: format!("Monument {i}"),
                category_tag: if i % 3 == 0 {
                    "Arquitectura religiosa".to_string()
                } else {
                    "Arquitectura civil".to_string()
                },
                type_tag: String::new(),
                municipality: None,
                thumbnail_url: None,
            }
        })
        .collect()
}

// ============================================================================
// Core Benchmarks - Key performance indicators
// ============================================================================

fn bench_clustering(c: &mut Criterion) {
    let mut group = c.benchmark_group("cluster");
    let config = ClusterConfig::default();

    for &count in &[1_500usize, 5_000, 10_000] {
        let markers = generate_markers(count);
        group.throughput(Throughput::Elements(count as u64));

        // Overview of the whole area (few, large clusters)
        let overview = PixelViewport::from_bounds(ViewportBounds::new(-7.0, 37.0, 3.0, 44.0, 7));
        group.bench_with_input(BenchmarkId::new("overview_z7", count), &markers, |b, m| {
            b.iter(|| cluster(black_box(m), &overview, &config));
        });

        // Regional view (many small clusters)
        let regional = PixelViewport::from_bounds(ViewportBounds::new(-6.0, 38.0, -2.0, 41.0, 10));
        group.bench_with_input(BenchmarkId::new("regional_z10", count), &markers, |b, m| {
            b.iter(|| cluster(black_box(m), &regional, &config));
        });
    }

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");

    let stops: Vec<Stop> = generate_markers(25).iter().map(Stop::from).collect();
    let geometry: LineString<f64> = (0..5_000)
        .map(|i| {
            let t = i as f64 / 5_000.0;
            Coord {
                x: -6.0 + t * 8.0,
                y: 38.0 + (t * 20.0).sin(),
            }
        })
        .collect();

    group.bench_function("gpx_25_stops_5k_track", |b| {
        b.iter(|| to_gpx("Bench", black_box(&stops), Some(&geometry)));
    });
    group.bench_function("kml_25_stops_5k_track", |b| {
        b.iter(|| to_kml("Bench", black_box(&stops), Some(&geometry)));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_clustering, bench_export);

criterion_main!(benches);
