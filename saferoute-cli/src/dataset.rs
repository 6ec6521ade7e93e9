//! `dataset` command: aggregate statistics over the generated records.

use std::io::Write;

use chrono::{NaiveDate, NaiveDateTime};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use saferoute_core::{CrimeStat, CrimeType, RiskLevel, Timeframe};
use saferoute_data::generator::{AreaTrend, area_matches, normalize_area_query};
use saferoute_data::{StatisticsFilter, weighted_severity_score};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_AREA, ARG_CRIME_TYPE, ARG_REFERENCE_DATE, ARG_TIMEFRAME, CliError, data_service,
    reference_date_or_today, write_json,
};

/// CLI arguments for the `dataset` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Summarize the synthetic crime dataset: incident totals per \
                 crime type, the weighted severity band and per-area trends. \
                 Filters narrow the statistics to one area or crime type.",
    about = "Summarize crime statistics and trends"
)]
#[ortho_config(prefix = "SAFEROUTE")]
pub(crate) struct DatasetArgs {
    /// Case-insensitive neighborhood name or fragment.
    #[arg(long = ARG_AREA, value_name = "name")]
    #[serde(default)]
    pub(crate) area: Option<String>,
    /// Restrict to one crime type (violent, property, vehicular, petty).
    #[arg(long = ARG_CRIME_TYPE, value_name = "type")]
    #[serde(default)]
    pub(crate) crime_type: Option<String>,
    /// Window to rescale counts to (1month, 3months, 6months, 1year).
    #[arg(long = ARG_TIMEFRAME, value_name = "window")]
    #[serde(default)]
    pub(crate) timeframe: Option<String>,
    /// Last day covered by the dataset; today when omitted.
    #[arg(long = ARG_REFERENCE_DATE, value_name = "date")]
    #[serde(default)]
    pub(crate) reference_date: Option<NaiveDate>,
}

impl DatasetArgs {
    fn into_config(self, now: NaiveDateTime) -> Result<DatasetConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DatasetConfig::resolve(merged, now)
    }
}

/// Resolved `dataset` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DatasetConfig {
    pub(crate) filter: StatisticsFilter,
    pub(crate) reference_date: NaiveDate,
}

impl DatasetConfig {
    /// Unknown timeframes fall back to six months; unknown crime types are
    /// rejected.
    pub(crate) fn resolve(args: DatasetArgs, now: NaiveDateTime) -> Result<Self, CliError> {
        let mut filter = StatisticsFilter::default()
            .with_timeframe(args.timeframe.as_deref().map_or_else(
                Timeframe::default,
                Timeframe::parse_or_default,
            ));
        if let Some(area) = args.area {
            filter = filter.with_area(area);
        }
        if let Some(raw) = args.crime_type {
            filter = filter.with_crime_type(raw.parse::<CrimeType>()?);
        }
        Ok(Self {
            filter,
            reference_date: reference_date_or_today(args.reference_date, now),
        })
    }

    fn timeframe(&self) -> Timeframe {
        self.filter.timeframe.unwrap_or_default()
    }
}

/// Incident total for one crime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct CrimeTypeTotal {
    pub(crate) crime_type: CrimeType,
    pub(crate) incidents: u64,
}

/// Output of the `dataset` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DatasetReport {
    pub(crate) reference_date: NaiveDate,
    pub(crate) filter: StatisticsFilter,
    pub(crate) total_incidents: u64,
    pub(crate) severity_score: Option<f64>,
    pub(crate) risk_level: RiskLevel,
    pub(crate) by_type: Vec<CrimeTypeTotal>,
    pub(crate) trends: Vec<AreaTrend>,
}

fn totals_by_type(stats: &[CrimeStat]) -> Vec<CrimeTypeTotal> {
    CrimeType::ALL
        .into_iter()
        .map(|crime_type| CrimeTypeTotal {
            crime_type,
            incidents: stats
                .iter()
                .filter(|s| s.crime_type == crime_type)
                .map(|s| u64::from(s.incident_count))
                .sum(),
        })
        .filter(|total| total.incidents > 0)
        .collect()
}

pub(crate) fn run_dataset(
    args: DatasetArgs,
    now: NaiveDateTime,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config(now)?;
    let report = build_report(&config)?;
    write_json(writer, &report)
}

pub(crate) fn build_report(config: &DatasetConfig) -> Result<DatasetReport, CliError> {
    let service = data_service(config.reference_date);
    let stats = service.get_statistics(&config.filter)?;
    let severity_score = weighted_severity_score(stats.iter());
    let area_query = config.filter.area.as_deref().map(normalize_area_query);
    let trends = service
        .area_trends(config.timeframe())?
        .into_iter()
        .filter(|t| {
            area_query
                .as_deref()
                .is_none_or(|q| area_matches(&t.area, q))
        })
        .collect();
    log::info!(
        "summarized {} stats for {:?} over {}",
        stats.len(),
        config.filter.area,
        config.timeframe()
    );
    Ok(DatasetReport {
        reference_date: config.reference_date,
        filter: config.filter.clone(),
        total_incidents: stats.iter().map(|s| u64::from(s.incident_count)).sum(),
        severity_score,
        risk_level: severity_score.map_or(RiskLevel::Low, RiskLevel::from_score),
        by_type: totals_by_type(&stats),
        trends,
    })
}
