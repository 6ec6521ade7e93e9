//! `route` command: score a route read from disk.

use std::fs::File;
use std::io::{BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use saferoute_core::{Route, TimeContext};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_AT, ARG_REFERENCE_DATE, ARG_ROUTE, CliError, ENV_ROUTE, engine, reference_date_or_today,
    write_json,
};

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Score a route provided as a JSON-encoded Route. Every \
                 segment is scored at its midpoint and the route score is \
                 the distance-weighted mean of the segment scores.",
    about = "Score every segment of a route"
)]
#[ortho_config(prefix = "SAFEROUTE")]
pub(crate) struct RouteArgs {
    /// Path to a JSON file containing a Route.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) route_path: Option<Utf8PathBuf>,
    /// Local time of travel; now when omitted.
    #[arg(long = ARG_AT, value_name = "datetime")]
    #[serde(default)]
    pub(crate) at: Option<NaiveDateTime>,
    /// Last day covered by the dataset; today when omitted.
    #[arg(long = ARG_REFERENCE_DATE, value_name = "date")]
    #[serde(default)]
    pub(crate) reference_date: Option<NaiveDate>,
}

impl RouteArgs {
    fn into_config(self, now: NaiveDateTime) -> Result<RouteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RouteConfig::resolve(merged, now)
    }
}

/// Resolved `route` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RouteConfig {
    pub(crate) route_path: Utf8PathBuf,
    pub(crate) at: NaiveDateTime,
    pub(crate) reference_date: NaiveDate,
}

impl RouteConfig {
    pub(crate) fn resolve(args: RouteArgs, now: NaiveDateTime) -> Result<Self, CliError> {
        let route_path = args.route_path.ok_or(CliError::MissingArgument {
            field: ARG_ROUTE,
            env: ENV_ROUTE,
        })?;
        Ok(Self {
            route_path,
            at: args.at.unwrap_or(now),
            reference_date: reference_date_or_today(args.reference_date, now),
        })
    }

    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        let path = &self.route_path;
        match std::fs::metadata(path.as_std_path()) {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(CliError::SourcePathNotFile {
                field: ARG_ROUTE,
                path: path.clone(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field: ARG_ROUTE,
                    path: path.clone(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_ROUTE,
                path: path.clone(),
                source,
            }),
        }
    }
}

pub(crate) fn run_route(
    args: RouteArgs,
    now: NaiveDateTime,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config(now)?;
    config.validate_sources()?;
    execute_route(&config, writer)
}

pub(crate) fn execute_route(config: &RouteConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    let route = load_route(&config.route_path)?;
    let engine = engine(config.reference_date);
    let context = TimeContext::new(config.at);
    let scored = engine.score_route(&route, Some(&context))?;
    if let Some(score) = &scored.safety_score {
        log::info!(
            "scored route {} ({} segments): {}",
            scored.id,
            scored.segments.len(),
            score.overall
        );
    }
    write_json(writer, &scored)
}

/// Loads a JSON-encoded [`Route`] from disk.
pub(crate) fn load_route(path: &Utf8Path) -> Result<Route, CliError> {
    let file = File::open(path.as_std_path()).map_err(|source| CliError::OpenRoute {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseRoute {
        path: path.to_path_buf(),
        source,
    })
}
