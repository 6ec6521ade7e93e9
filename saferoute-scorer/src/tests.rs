//! Unit coverage for the scoring engine.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use rstest::{fixture, rstest};
use saferoute_core::test_support::{
    FailingCrimeSource, ManualClock, MemoryCrimeSource, local_time, record_at, uniform_stat,
};
use saferoute_core::{
    Clock, CrimeRecord, CrimeType, DataInitializationError, FactorFlags, GeoPoint, InvalidInputError,
    Location, RiskLevel, Route, RouteSegment, ScoringError, TimeContext, TravelMode, clamp_score,
};

use crate::{
    AlertLevel, EngineConfig, EnvironmentalConditions, FixedEnvironment, SafetyScoringEngine,
    WeatherCondition,
};

const MISSION: GeoPoint = GeoPoint::new(37.7599, -122.4148);

fn mission_record() -> CrimeRecord {
    let mut record = record_at("mission_0", MISSION, RiskLevel::High);
    record.location.neighborhood = "Mission District".to_owned();
    record.crime_stats = vec![uniform_stat(CrimeType::Petty, 30, 80.0)];
    record.population_density = 11_200.0;
    record.economic_indicators.business_density = 38.0;
    record
}

fn tenderloin_record() -> CrimeRecord {
    let mut record = record_at(
        "tenderloin_0",
        GeoPoint::new(37.7647, -122.4148),
        RiskLevel::Critical,
    );
    record.location.neighborhood = "Tenderloin".to_owned();
    record
}

type Engine = SafetyScoringEngine<MemoryCrimeSource>;

#[fixture]
fn clock() -> Arc<ManualClock> {
    // 2024-03-12 is a Tuesday.
    Arc::new(ManualClock::new(local_time(2024, 3, 12, 23, 0)))
}

fn engine_with(clock: &Arc<ManualClock>, conditions: EnvironmentalConditions) -> Engine {
    let source = MemoryCrimeSource::with_records([mission_record(), tenderloin_record()]);
    SafetyScoringEngine::new(source, EngineConfig::default())
        .with_clock(Arc::clone(clock) as Arc<dyn Clock>)
        .with_environment(Arc::new(FixedEnvironment(conditions)))
}

#[fixture]
fn engine(clock: Arc<ManualClock>) -> (Engine, Arc<ManualClock>) {
    (engine_with(&clock, EnvironmentalConditions::default()), clock)
}

fn mission() -> Location {
    Location::from_point(MISSION)
}

#[rstest]
fn empty_cell_uses_defaults(engine: (Engine, Arc<ManualClock>)) {
    let (engine, _clock) = engine;
    let location = Location::new(37.70, -122.50).expect("valid location");
    let assessment = engine
        .score_location(&location, None, FactorFlags::default())
        .expect("scores");
    assert_eq!(assessment.score.overall, 74);
    assert_eq!(assessment.score.confidence_level, 70);
    assert_eq!(assessment.score.historical_incidents, 0);
    assert!(assessment.score.explanation.contains("No crime records"));
    assert!(assessment.metadata.data_sources_used.is_empty());
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test compares component values")]
fn late_weekday_walk_in_high_risk_area(engine: (Engine, Arc<ManualClock>)) {
    let (engine, clock) = engine;
    let context = TimeContext::new(clock.now());
    let flags = FactorFlags::default().with_travel_mode(TravelMode::Walking);
    let assessment = engine
        .score_location(&mission(), Some(&context), flags)
        .expect("scores");
    let score = &assessment.score;

    // (100 - 60) * 0.6 - 15 = 9
    assert!((score.components.crime_risk - 9.0).abs() < 1e-9);
    assert!((score.components.time_factor - 30.0).abs() < 1e-9);
    assert!((score.components.population_density - 100.0).abs() < 1e-9);
    assert!((score.components.lighting_level - 70.0).abs() < 1e-9);
    // 3.6 + 9 + 20 + 7 = 39.6
    assert_eq!(score.overall, 40);
    assert_eq!(score.historical_incidents, 30);
    assert!(score.explanation.starts_with("Mission District scores 40"));

    let levels: Vec<AlertLevel> = assessment.alerts.iter().map(|a| a.level).collect();
    assert_eq!(
        levels,
        vec![AlertLevel::Warning, AlertLevel::Warning, AlertLevel::Info]
    );
    assert!(
        assessment
            .alerts
            .iter()
            .any(|a| a.message.contains("Tenderloin"))
    );
    assert!(
        assessment
            .recommendations
            .iter()
            .any(|r| r.contains("pickpocketing"))
    );
    assert_eq!(
        assessment.metadata.data_sources_used,
        vec!["memory".to_owned(), "time_context".to_owned()]
    );
}

#[rstest]
fn invalid_coordinates_are_rejected(engine: (Engine, Arc<ManualClock>)) {
    let (engine, _clock) = engine;
    let mut location = mission();
    location.point.lat = 91.0;
    let err = engine
        .score_location(&location, None, FactorFlags::default())
        .expect_err("latitude out of range");
    assert!(matches!(
        err,
        ScoringError::InvalidInput(InvalidInputError::LatitudeOutOfRange { .. })
    ));
}

#[rstest]
fn dataset_failures_propagate() {
    let engine = SafetyScoringEngine::new(
        FailingCrimeSource(DataInitializationError::EmptyAreaTable),
        EngineConfig::default(),
    );
    let err = engine
        .score_location(&mission(), None, FactorFlags::default())
        .expect_err("dataset failure");
    assert!(matches!(
        err,
        ScoringError::DataInitialization(DataInitializationError::EmptyAreaTable)
    ));
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test recomputes the weighted mean")]
fn routes_are_scored_per_segment(engine: (Engine, Arc<ManualClock>)) {
    let (engine, _clock) = engine;
    let far = Location::new(37.70, -122.50).expect("valid location");
    let route = Route::new(
        "r1",
        TravelMode::Walking,
        vec![
            RouteSegment::new(mission(), mission(), 100.0),
            RouteSegment::new(far.clone(), far, 300.0),
        ],
    );
    let scored = engine.score_route(&route, None).expect("scores route");
    let segment_scores: Vec<u8> = scored
        .segments
        .iter()
        .filter_map(|s| s.safety_score.as_ref().map(|score| score.overall))
        .collect();
    let [first, second] = segment_scores.as_slice() else {
        panic!("both segments should be scored: {segment_scores:?}");
    };
    let route_score = scored.safety_score.expect("route score");
    let expected = clamp_score((f64::from(*first) * 100.0 + f64::from(*second) * 300.0) / 400.0);
    assert_eq!(route_score.overall, expected);
    assert!(route_score.explanation.contains("of 2 segments"));
}

#[rstest]
fn empty_route_is_invalid(engine: (Engine, Arc<ManualClock>)) {
    let (engine, _clock) = engine;
    let route = Route::new("empty", TravelMode::Driving, Vec::new());
    let err = engine.score_route(&route, None).expect_err("empty route");
    assert!(matches!(
        err,
        ScoringError::InvalidInput(InvalidInputError::EmptyRoute { .. })
    ));
}

#[rstest]
fn real_time_hits_keep_non_time_components(engine: (Engine, Arc<ManualClock>)) {
    let (engine, clock) = engine;
    let first = engine
        .get_real_time_score(&mission(), None, false)
        .expect("first score");
    clock.advance(TimeDelta::minutes(4));
    let second = engine
        .get_real_time_score(&mission(), None, false)
        .expect("cached score");
    assert_eq!(engine.cache_len(), 1);
    assert_eq!(
        first.components.crime_risk.to_bits(),
        second.components.crime_risk.to_bits()
    );
    assert_eq!(
        first.components.population_density.to_bits(),
        second.components.population_density.to_bits()
    );
    assert_eq!(second.last_calculated, local_time(2024, 3, 12, 23, 4));
    let stored = engine.cached_score(&mission()).expect("cached");
    assert_eq!(stored.last_calculated, second.last_calculated);
}

#[rstest]
fn expired_entries_are_evicted_by_a_sweep(engine: (Engine, Arc<ManualClock>)) {
    let (engine, clock) = engine;
    engine
        .get_real_time_score(&mission(), None, false)
        .expect("score");
    clock.advance(TimeDelta::minutes(6));
    let report = engine.sweep_cache();
    assert_eq!(report.evicted, 1);
    assert_eq!(report.refreshed, 0);
    assert_eq!(engine.cache_len(), 0);
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test compares component values")]
fn sweep_refreshes_time_factor_across_hour_boundary(clock: Arc<ManualClock>) {
    clock.set(local_time(2024, 3, 12, 17, 58));
    let engine = engine_with(&clock, EnvironmentalConditions::default());
    let before = engine
        .get_real_time_score(&mission(), None, false)
        .expect("score");
    assert!((before.components.time_factor - 90.0).abs() < 1e-9);

    clock.set(local_time(2024, 3, 12, 18, 1));
    let report = engine.sweep_cache();
    assert_eq!(report.refreshed, 1);
    let after = engine.cached_score(&mission()).expect("cached");
    assert!((after.components.time_factor - 75.0).abs() < 1e-9);
    assert_eq!(
        before.components.crime_risk.to_bits(),
        after.components.crime_risk.to_bits()
    );
    // Lighting keeps the day floor applied when the entry was created.
    assert!((after.components.lighting_level - 85.0).abs() < 1e-9);
    assert!(after.overall < before.overall);
}

#[rstest]
#[expect(clippy::float_arithmetic, reason = "test compares component values")]
fn recomputation_uses_caller_time_context(clock: Arc<ManualClock>) {
    clock.set(local_time(2024, 3, 12, 12, 0));
    let engine = engine_with(&clock, EnvironmentalConditions::default());
    let night = TimeContext::new(local_time(2024, 3, 12, 23, 0));
    let expected = engine
        .score_location(&mission(), Some(&night), FactorFlags::default())
        .expect("scores")
        .score;

    let forced = engine
        .get_real_time_score(&mission(), Some(&night), true)
        .expect("forced score");
    assert!((forced.components.time_factor - 30.0).abs() < 1e-9);
    assert_eq!(
        forced.components.time_factor.to_bits(),
        expected.components.time_factor.to_bits()
    );
    assert_eq!(forced.overall, expected.overall);
    assert_eq!(forced.last_calculated, local_time(2024, 3, 12, 12, 0));

    let hit = engine
        .get_real_time_score(&mission(), Some(&night), false)
        .expect("cached score");
    assert!((hit.components.time_factor - 90.0).abs() < 1e-9);
}

#[rstest]
fn environmental_adjustment_is_applied(clock: Arc<ManualClock>) {
    let mut foggy = EnvironmentalConditions::default();
    foggy.weather.condition = WeatherCondition::Fog;
    let calm = engine_with(&clock, EnvironmentalConditions::default());
    let fog = engine_with(&clock, foggy);
    let base = calm
        .get_real_time_score(&mission(), None, false)
        .expect("calm score");
    let adjusted = fog
        .get_real_time_score(&mission(), None, true)
        .expect("foggy score");
    assert_eq!(base.environmental_adjustment, 0);
    assert_eq!(adjusted.environmental_adjustment, -4);
    assert_eq!(i32::from(adjusted.overall), i32::from(base.overall) - 4);
}

#[rstest]
fn forced_refresh_replaces_the_entry(engine: (Engine, Arc<ManualClock>)) {
    let (engine, clock) = engine;
    let first = engine
        .get_real_time_score(&mission(), None, false)
        .expect("score");
    clock.advance(TimeDelta::minutes(1));
    let forced = engine
        .get_real_time_score(&mission(), None, true)
        .expect("forced score");
    assert_eq!(engine.cache_len(), 1);
    assert!(forced.last_calculated > first.last_calculated);
    engine.clear_cache();
    assert_eq!(engine.cache_len(), 0);
}

#[rstest]
fn background_refresh_lifecycle(clock: Arc<ManualClock>) {
    let source = MemoryCrimeSource::with_records([mission_record()]);
    let engine = SafetyScoringEngine::new(
        source,
        EngineConfig::default().with_sweep_interval(Duration::from_millis(10)),
    )
    .with_clock(Arc::clone(&clock) as Arc<dyn Clock>);
    engine.start_background_refresh().expect("spawn worker");
    assert!(engine.is_refreshing());
    engine.start_background_refresh().expect("idempotent start");
    engine
        .get_real_time_score(&mission(), None, false)
        .expect("score");
    clock.advance(TimeDelta::minutes(10));
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while engine.cache_len() > 0 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(engine.cache_len(), 0);
    engine.stop_background_refresh();
    assert!(!engine.is_refreshing());
}

#[rstest]
fn assessments_serialize_with_lowercase_alert_levels(engine: (Engine, Arc<ManualClock>)) {
    let (engine, clock) = engine;
    let context = TimeContext::new(clock.now());
    let assessment = engine
        .score_location(&mission(), Some(&context), FactorFlags::default())
        .expect("scores");
    let json = serde_json::to_value(&assessment).expect("serializes");
    assert_eq!(json["alerts"][0]["level"], "warning");
    assert_eq!(json["score"]["overall"], u64::from(assessment.score.overall));
}
