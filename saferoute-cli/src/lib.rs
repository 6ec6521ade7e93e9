//! Command-line interface for the SafeRoute scoring engine.
//!
//! Every command builds the synthetic San Francisco dataset for a reference
//! date, answers one query and prints the result as pretty JSON on stdout.
//! Options are layered from CLI flags, configuration files and
//! `SAFEROUTE_*` environment variables.
#![forbid(unsafe_code)]

use std::io::Write;

use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use saferoute_data::{CrimeDataGenerator, CrimeDataService};
use saferoute_scorer::{EngineConfig, SafetyScoringEngine};
use serde::Serialize;

mod dataset;
mod error;
mod location;
mod route;

pub use error::CliError;

use dataset::{DatasetArgs, run_dataset};
use location::{LocationArgs, run_location};
use route::{RouteArgs, run_route};

pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LNG: &str = "lng";
pub(crate) const ARG_AT: &str = "at";
pub(crate) const ARG_MODE: &str = "mode";
pub(crate) const ARG_ROUTE: &str = "route";
pub(crate) const ARG_AREA: &str = "area";
pub(crate) const ARG_CRIME_TYPE: &str = "crime-type";
pub(crate) const ARG_TIMEFRAME: &str = "timeframe";
pub(crate) const ARG_REFERENCE_DATE: &str = "reference-date";
pub(crate) const ENV_LAT: &str = "SAFEROUTE_CMDS_LOCATION_LAT";
pub(crate) const ENV_LNG: &str = "SAFEROUTE_CMDS_LOCATION_LNG";
pub(crate) const ENV_ROUTE: &str = "SAFEROUTE_CMDS_ROUTE_ROUTE_PATH";

/// Run the SafeRoute CLI with the current process arguments and environment.
///
/// # Errors
/// Returns a [`CliError`] when argument parsing, configuration loading,
/// scoring or writing the output fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    let now = Local::now().naive_local();
    dispatch(cli.command, now, &mut stdout)
}

pub(crate) fn dispatch(
    command: Command,
    now: NaiveDateTime,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Location(args) => run_location(args, now, writer),
        Command::Route(args) => run_route(args, now, writer),
        Command::Dataset(args) => run_dataset(args, now, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "saferoute",
    about = "Score the safety of San Francisco locations and routes",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Score a single location.
    Location(LocationArgs),
    /// Score every segment of a route read from a JSON file.
    Route(RouteArgs),
    /// Summarize crime statistics and per-area trends.
    Dataset(DatasetArgs),
}

/// The reference date, or today when none was configured.
pub(crate) fn reference_date_or_today(date: Option<NaiveDate>, now: NaiveDateTime) -> NaiveDate {
    date.unwrap_or_else(|| now.date())
}

/// Data service over the generated dataset ending at `reference_date`.
pub(crate) fn data_service(reference_date: NaiveDate) -> CrimeDataService {
    CrimeDataService::new(CrimeDataGenerator::new(), reference_date)
}

/// Scoring engine over the generated dataset ending at `reference_date`.
pub(crate) fn engine(reference_date: NaiveDate) -> SafetyScoringEngine<CrimeDataService> {
    SafetyScoringEngine::new(data_service(reference_date), EngineConfig::default())
}

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
