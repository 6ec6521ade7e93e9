//! Criterion benchmarks for location and route scoring.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package saferoute-scorer
//! ```

// Criterion macros generate code that triggers missing_docs warnings.
#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::hint::black_box;

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use saferoute_core::{FactorFlags, Location, Route, RouteSegment, TravelMode};
use saferoute_data::{CrimeDataGenerator, CrimeDataService};
use saferoute_scorer::{EngineConfig, SafetyScoringEngine};

fn engine() -> SafetyScoringEngine<CrimeDataService> {
    let reference = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or(NaiveDate::MIN);
    let service = CrimeDataService::new(CrimeDataGenerator::new(), reference);
    if let Err(err) = service.initialize() {
        panic!("dataset should initialize: {err}");
    }
    SafetyScoringEngine::new(service, EngineConfig::default())
}

fn location(lat: f64, lng: f64) -> Location {
    Location::new(lat, lng).unwrap_or_else(|err| panic!("valid bench location: {err}"))
}

/// A straight walk south from the Tenderloin through SoMa into the Mission.
fn route(segments: u32) -> Route {
    let (start_lat, end_lat, lng) = (37.7847, 37.7599, -122.4148);
    let step = (start_lat - end_lat) / f64::from(segments);
    let legs = (0..segments)
        .map(|i| {
            let from = start_lat - step * f64::from(i);
            RouteSegment::new(location(from, lng), location(from - step, lng), 250.0)
        })
        .collect();
    Route::new(format!("bench-{segments}"), TravelMode::Walking, legs)
}

fn bench_score_location(c: &mut Criterion) {
    let engine = engine();
    let mission = location(37.7599, -122.4148);
    c.bench_function("score_location", |b| {
        b.iter(|| engine.score_location(black_box(&mission), None, FactorFlags::default()));
    });
}

fn bench_score_route(c: &mut Criterion) {
    let engine = engine();
    let mut group = c.benchmark_group("score_route");
    for segments in [4_u32, 16, 64] {
        let route = route(segments);
        group.bench_with_input(BenchmarkId::from_parameter(segments), &route, |b, route| {
            b.iter(|| engine.score_route(black_box(route), None));
        });
    }
    group.finish();
}

fn bench_real_time_hit(c: &mut Criterion) {
    let engine = engine();
    let mission = location(37.7599, -122.4148);
    if let Err(err) = engine.get_real_time_score(&mission, None, false) {
        panic!("warm-up score: {err}");
    }
    c.bench_function("real_time_cache_hit", |b| {
        b.iter(|| engine.get_real_time_score(black_box(&mission), None, false));
    });
}

criterion_group!(
    benches,
    bench_score_location,
    bench_score_route,
    bench_real_time_hit
);
criterion_main!(benches);
