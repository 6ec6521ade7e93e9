//! Behavioural coverage for location, route and real-time scoring.

use std::cell::RefCell;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use saferoute_core::test_support::ManualClock;
use saferoute_core::{
    Clock, ComponentWeights, FactorFlags, InvalidInputError, Location, Route, SafetyScore,
    ScoreComponents, ScoringError, TimeContext, TravelMode,
};
use saferoute_data::{CrimeDataGenerator, CrimeDataService};
use saferoute_scorer::{
    AlertLevel, EngineConfig, EnvironmentalConditions, FixedEnvironment, LocationAssessment,
    SafetyScoringEngine, aggregate_route_scores,
};

type Engine = SafetyScoringEngine<CrimeDataService>;

/// World state for scoring scenarios.
#[derive(Default)]
struct ScoringWorld {
    engine: RefCell<Option<Engine>>,
    clock: RefCell<Option<Arc<ManualClock>>>,
    assessment: RefCell<Option<LocationAssessment>>,
    comparison: RefCell<Option<LocationAssessment>>,
    real_time: RefCell<Vec<SafetyScore>>,
    segments: RefCell<Vec<(f64, SafetyScore)>>,
    route_score: RefCell<Option<SafetyScore>>,
    route_result: RefCell<Option<Result<Route, ScoringError>>>,
}

impl ScoringWorld {
    fn with_engine<T>(&self, f: impl FnOnce(&Engine) -> T) -> T {
        let borrowed = self.engine.borrow();
        let engine = borrowed
            .as_ref()
            .unwrap_or_else(|| panic!("engine must be configured"));
        f(engine)
    }

    fn clock(&self) -> Arc<ManualClock> {
        self.clock
            .borrow()
            .clone()
            .unwrap_or_else(|| panic!("clock must be configured"))
    }

    fn score_at(&self, lat: f64, lng: f64, time: &str) -> LocationAssessment {
        let context = TimeContext::new(parse_time(time));
        self.with_engine(|e| {
            e.score_location(&location(lat, lng), Some(&context), FactorFlags::default())
        })
        .unwrap_or_else(|err| panic!("location should score: {err}"))
    }

    fn first_real_time(&self) -> SafetyScore {
        self.real_time
            .borrow()
            .first()
            .cloned()
            .unwrap_or_else(|| panic!("a real-time score must be requested"))
    }
}

#[fixture]
fn world() -> ScoringWorld {
    ScoringWorld::default()
}

fn parse_time(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M")
        .unwrap_or_else(|err| panic!("time {raw}: {err}"))
}

fn location(lat: f64, lng: f64) -> Location {
    Location::new(lat, lng).unwrap_or_else(|err| panic!("valid test location: {err}"))
}

fn same_non_time_components(a: &ScoreComponents, b: &ScoreComponents) -> bool {
    a.crime_risk.to_bits() == b.crime_risk.to_bits()
        && a.population_density.to_bits() == b.population_density.to_bits()
        && a.lighting_level.to_bits() == b.lighting_level.to_bits()
}

#[given("a scoring engine over the San Francisco dataset ending {date}")]
fn given_engine(world: &ScoringWorld, date: String) {
    let reference = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .unwrap_or_else(|err| panic!("reference date {date}: {err}"));
    let start = reference
        .and_hms_opt(12, 0, 0)
        .unwrap_or_else(|| panic!("noon is a valid time"));
    let clock = Arc::new(ManualClock::new(start));
    let service = CrimeDataService::new(CrimeDataGenerator::new(), reference);
    let engine = SafetyScoringEngine::new(service, EngineConfig::default())
        .with_clock(Arc::clone(&clock) as Arc<dyn Clock>)
        .with_environment(Arc::new(FixedEnvironment(EnvironmentalConditions::default())));
    world.engine.replace(Some(engine));
    world.clock.replace(Some(clock));
}

#[given("the clock reads {time}")]
fn given_clock(world: &ScoringWorld, time: String) {
    world.clock().set(parse_time(&time));
}

#[given("a segment scoring {overall} over {distance} metres")]
fn given_segment(world: &ScoringWorld, overall: u8, distance: f64) {
    let components = ScoreComponents {
        crime_risk: 60.0,
        time_factor: 60.0,
        population_density: 60.0,
        lighting_level: 60.0,
    };
    world.segments.borrow_mut().push((
        distance,
        SafetyScore {
            overall,
            components,
            historical_incidents: 0,
            confidence_level: 70,
            explanation: String::new(),
            factors: components.factors(&ComponentWeights::default()),
            environmental_adjustment: 0,
            last_calculated: NaiveDateTime::default(),
        },
    ));
}

#[when("I score the location {lat}, {lng} at {time}")]
fn when_score_location(world: &ScoringWorld, lat: f64, lng: f64, time: String) {
    let assessment = world.score_at(lat, lng, &time);
    world.assessment.replace(Some(assessment));
}

#[when("I score the comparison location {lat}, {lng} at {time}")]
fn when_score_comparison(world: &ScoringWorld, lat: f64, lng: f64, time: String) {
    let assessment = world.score_at(lat, lng, &time);
    world.comparison.replace(Some(assessment));
}

#[when("the segment scores are aggregated")]
fn when_aggregated(world: &ScoringWorld) {
    let segments = world.segments.borrow();
    let score = aggregate_route_scores(
        segments.iter().map(|(d, s)| (*d, s)),
        &ComponentWeights::default(),
        NaiveDateTime::default(),
    );
    world.route_score.replace(score);
}

#[when("I request the real-time score at {lat}, {lng}")]
fn when_real_time(world: &ScoringWorld, lat: f64, lng: f64) {
    let score = world
        .with_engine(|e| e.get_real_time_score(&location(lat, lng), None, false))
        .unwrap_or_else(|err| panic!("real-time score: {err}"));
    world.real_time.borrow_mut().push(score);
}

#[when("the clock advances {minutes} minutes")]
fn when_clock_advances(world: &ScoringWorld, minutes: i64) {
    world.clock().advance(TimeDelta::minutes(minutes));
}

#[when("the cache is swept")]
fn when_swept(world: &ScoringWorld) {
    let _report = world.with_engine(SafetyScoringEngine::sweep_cache);
}

#[when("I score an empty walking route")]
fn when_empty_route(world: &ScoringWorld) {
    let route = Route::new("empty", TravelMode::Walking, Vec::new());
    let result = world.with_engine(|e| e.score_route(&route, None));
    world.route_result.replace(Some(result));
}

#[then("the time factor is at most {max}")]
fn then_time_at_most(world: &ScoringWorld, max: f64) {
    let borrowed = world.assessment.borrow();
    let assessment = borrowed.as_ref().expect("assessment recorded");
    assert!(
        assessment.score.components.time_factor <= max,
        "time factor {}",
        assessment.score.components.time_factor
    );
}

#[then("the overall score is below {limit}")]
fn then_overall_below(world: &ScoringWorld, limit: u8) {
    let borrowed = world.assessment.borrow();
    let assessment = borrowed.as_ref().expect("assessment recorded");
    assert!(
        assessment.score.overall < limit,
        "overall {}",
        assessment.score.overall
    );
}

#[then("the assessment carries a high risk alert")]
fn then_high_risk_alert(world: &ScoringWorld) {
    let borrowed = world.assessment.borrow();
    let assessment = borrowed.as_ref().expect("assessment recorded");
    assert!(
        assessment
            .alerts
            .iter()
            .any(|a| a.level >= AlertLevel::Warning && a.message.contains("High crime risk")),
        "alerts: {:?}",
        assessment.alerts
    );
}

#[then("the crime risk exceeds the comparison by at least {margin}")]
#[expect(clippy::float_arithmetic, reason = "test compares component values")]
fn then_crime_risk_margin(world: &ScoringWorld, margin: f64) {
    let assessment = world.assessment.borrow();
    let comparison = world.comparison.borrow();
    let (Some(a), Some(b)) = (assessment.as_ref(), comparison.as_ref()) else {
        panic!("both locations must be scored");
    };
    let gap = a.score.components.crime_risk - b.score.components.crime_risk;
    assert!(
        gap >= margin,
        "crime risk {} against {}",
        a.score.components.crime_risk,
        b.score.components.crime_risk
    );
}

#[then("the overall score exceeds the comparison")]
fn then_overall_exceeds(world: &ScoringWorld) {
    let assessment = world.assessment.borrow();
    let comparison = world.comparison.borrow();
    let (Some(a), Some(b)) = (assessment.as_ref(), comparison.as_ref()) else {
        panic!("both locations must be scored");
    };
    assert!(
        a.score.overall > b.score.overall,
        "overall {} against {}",
        a.score.overall,
        b.score.overall
    );
}

#[then("the route overall score is {expected}")]
fn then_route_overall(world: &ScoringWorld, expected: u8) {
    let overall = world.route_score.borrow().as_ref().map(|s| s.overall);
    assert_eq!(overall, Some(expected));
}

#[then("both real-time scores share their crime and population components")]
fn then_shared_components(world: &ScoringWorld) {
    let scores = world.real_time.borrow();
    let [first, second] = scores.as_slice() else {
        panic!("expected two real-time scores, got {}", scores.len());
    };
    assert!(same_non_time_components(&first.components, &second.components));
}

#[then("the cache holds {count} entries")]
fn then_cache_len(world: &ScoringWorld, count: usize) {
    assert_eq!(world.with_engine(SafetyScoringEngine::cache_len), count);
}

#[then("the cached time factor differs from the first score")]
fn then_time_changed(world: &ScoringWorld) {
    let first = world.first_real_time();
    let cached = world
        .with_engine(|e| e.cached_score(&location(37.7599, -122.4148)))
        .expect("entry still cached");
    assert!(
        cached.components.time_factor.to_bits() != first.components.time_factor.to_bits(),
        "time factor stayed at {}",
        first.components.time_factor
    );
}

#[then("the cached crime and population components are unchanged")]
fn then_components_unchanged(world: &ScoringWorld) {
    let first = world.first_real_time();
    let cached = world
        .with_engine(|e| e.cached_score(&location(37.7599, -122.4148)))
        .expect("entry still cached");
    assert!(same_non_time_components(&first.components, &cached.components));
}

#[then("the route is rejected as invalid input")]
fn then_route_rejected(world: &ScoringWorld) {
    match world.route_result.borrow().as_ref() {
        Some(Err(ScoringError::InvalidInput(InvalidInputError::EmptyRoute { route_id }))) => {
            assert_eq!(route_id, "empty");
        }
        other => panic!("expected an empty-route error, got {other:?}"),
    }
}

#[scenario(path = "tests/features/safety_scoring.feature", index = 0)]
fn late_weekday_visit(world: ScoringWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/safety_scoring.feature", index = 1)]
fn distance_weighted_route(world: ScoringWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/safety_scoring.feature", index = 2)]
fn real_time_cache_hit(world: ScoringWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/safety_scoring.feature", index = 3)]
fn sweep_refreshes_time_factor(world: ScoringWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/safety_scoring.feature", index = 4)]
fn expired_scores_are_evicted(world: ScoringWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/safety_scoring.feature", index = 5)]
fn empty_routes_are_rejected(world: ScoringWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/safety_scoring.feature", index = 6)]
fn low_risk_area_outscores_critical_area(world: ScoringWorld) {
    let _ = world;
}
