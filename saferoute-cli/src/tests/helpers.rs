//! Test helpers for composing CLI invocations and inputs.

use super::*;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use saferoute_core::{Location, Route, RouteSegment, TravelMode};
use tempfile::TempDir;

/// Fixed "now" used by every CLI test: Tuesday 2024-05-28 23:00.
pub(super) fn test_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 28)
        .and_then(|d| d.and_hms_opt(23, 0, 0))
        .expect("valid test time")
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test file");
}

pub(super) fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

fn location(lat: f64, lng: f64) -> Location {
    Location::new(lat, lng).expect("valid test location")
}

/// A short walk from SoMa into the Mission.
pub(super) fn mission_walk() -> Route {
    Route::new(
        "mission-walk",
        TravelMode::Walking,
        vec![
            RouteSegment::new(
                location(37.7785, -122.4056),
                location(37.7700, -122.4100),
                1_000.0,
            ),
            RouteSegment::new(
                location(37.7700, -122.4100),
                location(37.7599, -122.4148),
                1_200.0,
            ),
        ],
    )
}

pub(super) fn write_route(path: &Utf8Path, route: &Route) {
    let payload = serde_json::to_string_pretty(route).expect("serialize route");
    write_utf8(path, payload.as_bytes());
}

/// Parse a command line and run it against `now`, capturing stdout.
pub(super) fn run_cli(argv: &[&str]) -> (Result<(), CliError>, String) {
    let mut stdout = Vec::new();
    let result = Cli::try_parse_from(argv)
        .map_err(CliError::from)
        .and_then(|cli| dispatch(cli.command, test_now(), &mut stdout));
    let text = String::from_utf8(stdout).expect("stdout utf-8");
    (result, text)
}
