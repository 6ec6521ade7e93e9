//! `location` command: score one point.

use std::io::Write;

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, ValueEnum};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use saferoute_core::{FactorFlags, Location, TimeContext, TravelMode};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_AT, ARG_LAT, ARG_LNG, ARG_MODE, ARG_REFERENCE_DATE, CliError, ENV_LAT, ENV_LNG, engine,
    reference_date_or_today, write_json,
};

/// Travel mode accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ModeArg {
    Walking,
    Driving,
    Cycling,
    Transit,
}

impl From<ModeArg> for TravelMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Walking => Self::Walking,
            ModeArg::Driving => Self::Driving,
            ModeArg::Cycling => Self::Cycling,
            ModeArg::Transit => Self::Transit,
        }
    }
}

/// CLI arguments for the `location` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Score a location against the synthetic crime dataset. The \
                 assessment includes the weighted score, its factors, \
                 recommendations and alerts about nearby high-risk areas.",
    about = "Score a single location"
)]
#[ortho_config(prefix = "SAFEROUTE")]
pub(crate) struct LocationArgs {
    /// Latitude in decimal degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude in decimal degrees.
    #[arg(long = ARG_LNG, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lng: Option<f64>,
    /// Local time of the visit (e.g. "2024-05-28T23:00:00"); now when omitted.
    #[arg(long = ARG_AT, value_name = "datetime")]
    #[serde(default)]
    pub(crate) at: Option<NaiveDateTime>,
    /// Treat the visit as falling on a public holiday.
    #[arg(long)]
    #[serde(default)]
    pub(crate) holiday: bool,
    /// How the visitor travels.
    #[arg(long = ARG_MODE, value_enum)]
    #[serde(default)]
    pub(crate) mode: Option<ModeArg>,
    /// Last day covered by the dataset; today when omitted.
    #[arg(long = ARG_REFERENCE_DATE, value_name = "date")]
    #[serde(default)]
    pub(crate) reference_date: Option<NaiveDate>,
}

impl LocationArgs {
    fn into_config(self, now: NaiveDateTime) -> Result<LocationConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LocationConfig::resolve(merged, now)
    }
}

/// Resolved `location` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocationConfig {
    pub(crate) location: Location,
    pub(crate) context: TimeContext,
    pub(crate) flags: FactorFlags,
    pub(crate) reference_date: NaiveDate,
}

impl LocationConfig {
    pub(crate) fn resolve(args: LocationArgs, now: NaiveDateTime) -> Result<Self, CliError> {
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_LAT,
        })?;
        let lng = args.lng.ok_or(CliError::MissingArgument {
            field: ARG_LNG,
            env: ENV_LNG,
        })?;
        let location = Location::new(lat, lng)?;
        let context = TimeContext::new(args.at.unwrap_or(now)).with_holiday(args.holiday);
        let flags = args.mode.map_or_else(FactorFlags::default, |mode| {
            FactorFlags::default().with_travel_mode(mode.into())
        });
        Ok(Self {
            location,
            context,
            flags,
            reference_date: reference_date_or_today(args.reference_date, now),
        })
    }
}

pub(crate) fn run_location(
    args: LocationArgs,
    now: NaiveDateTime,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config(now)?;
    execute_location(&config, writer)
}

pub(crate) fn execute_location(
    config: &LocationConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let engine = engine(config.reference_date);
    let assessment =
        engine.score_location(&config.location, Some(&config.context), config.flags)?;
    log::info!(
        "scored {:.4},{:.4} at {}: {}",
        config.location.point.lat,
        config.location.point.lng,
        config.context.local_time,
        assessment.score.overall
    );
    write_json(writer, &assessment)
}
