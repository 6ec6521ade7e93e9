//! End-to-end command tests over the generated dataset.

use super::helpers::{mission_walk, run_cli, utf8_tempdir, write_route};
use super::*;
use crate::dataset::DatasetReport;
use rstest::rstest;
use saferoute_core::{CrimeType, Route, ScoringError, Timeframe, TravelMode};
use saferoute_scorer::{AlertLevel, LocationAssessment};

#[rstest]
fn location_prints_an_assessment() {
    let (result, stdout) = run_cli(&[
        "saferoute",
        "location",
        "--lat",
        "37.7599",
        "--lng",
        "-122.4148",
        "--at",
        "2024-05-28T23:00:00",
        "--mode",
        "walking",
        "--reference-date",
        "2024-06-01",
    ]);
    result.expect("location command succeeds");
    let assessment: LocationAssessment =
        serde_json::from_str(&stdout).expect("output should be a JSON assessment");
    assert!(assessment.score.components.time_factor <= 50.0);
    assert!(assessment.score.overall < 60);
    assert!(
        assessment
            .alerts
            .iter()
            .any(|a| a.level >= AlertLevel::Warning)
    );
    assert!(stdout.ends_with('\n'));
}

#[rstest]
fn route_scores_every_segment() {
    let (_tmp, root) = utf8_tempdir();
    let path = root.join("route.json");
    write_route(&path, &mission_walk());
    let (result, stdout) = run_cli(&[
        "saferoute",
        "route",
        path.as_str(),
        "--at",
        "2024-05-28T14:00:00",
        "--reference-date",
        "2024-06-01",
    ]);
    result.expect("route command succeeds");
    let scored: Route = serde_json::from_str(&stdout).expect("output should be a JSON route");
    assert_eq!(scored.id, "mission-walk");
    assert_eq!(scored.travel_mode, TravelMode::Walking);
    assert!(scored.segments.iter().all(|s| s.safety_score.is_some()));
    let overall = scored.safety_score.map(|s| s.overall);
    assert!(overall.is_some(), "route score missing");
}

#[rstest]
fn empty_route_surfaces_a_scoring_error() {
    let (_tmp, root) = utf8_tempdir();
    let path = root.join("empty.json");
    write_route(&path, &Route::new("empty", TravelMode::Driving, Vec::new()));
    let (result, stdout) = run_cli(&["saferoute", "route", path.as_str()]);
    assert!(stdout.is_empty());
    match result.expect_err("empty route rejected") {
        CliError::Scoring(ScoringError::InvalidInput(_)) => {}
        other => panic!("expected a scoring error, found {other:?}"),
    }
}

#[rstest]
fn dataset_filters_by_area_and_type() {
    let (result, stdout) = run_cli(&[
        "saferoute",
        "dataset",
        "--area",
        "Mission",
        "--crime-type",
        "petty",
        "--timeframe",
        "1year",
        "--reference-date",
        "2024-06-01",
    ]);
    result.expect("dataset command succeeds");
    let report: DatasetReport = serde_json::from_str(&stdout).expect("JSON report");
    assert_eq!(report.filter.timeframe, Some(Timeframe::OneYear));
    assert!(report.total_incidents > 0);
    assert!(report.by_type.iter().all(|t| t.crime_type == CrimeType::Petty));
    assert!(!report.trends.is_empty());
    assert!(report.trends.iter().all(|t| t.area.contains("Mission")));
}

#[rstest]
fn dataset_without_filters_covers_every_area() {
    let (result, stdout) = run_cli(&["saferoute", "dataset", "--reference-date", "2024-06-01"]);
    result.expect("dataset command succeeds");
    let report: DatasetReport = serde_json::from_str(&stdout).expect("JSON report");
    let summed: u64 = report.by_type.iter().map(|t| t.incidents).sum();
    assert_eq!(summed, report.total_incidents);
    assert_eq!(
        report.trends.len(),
        saferoute_data::generator::SAN_FRANCISCO_AREAS.len()
    );
}

#[rstest]
fn unknown_subcommands_fail_parsing() {
    let (result, _stdout) = run_cli(&["saferoute", "teleport"]);
    assert!(matches!(result, Err(CliError::ArgumentParsing(_))));
}
