//! Pure component scoring.
//!
//! Each function maps a summary of the crime records in one grid cell plus
//! the visit context to a component value in `0..=100`. Missing inputs
//! yield the documented default rather than an error.

use std::sync::Arc;

use chrono::NaiveDate;
use saferoute_core::{
    CrimeRecord, CrimeType, DayPeriod, FactorFlags, FactorType, Location, RiskLevel,
    ScoreComponents, TimeContext, TravelMode, clamp_score,
};

/// Crime component when the cell has no records.
pub const DEFAULT_CRIME_RISK: f64 = 70.0;
/// Time component without a time context.
pub const DEFAULT_TIME_FACTOR: f64 = 80.0;
/// Population component when the cell has no records.
pub const DEFAULT_POPULATION_DENSITY: f64 = 70.0;
/// Lighting component when no lighting data is known.
pub const DEFAULT_LIGHTING_LEVEL: f64 = 80.0;
/// Confidence before stat confidence, age and coverage are applied.
pub const BASE_CONFIDENCE: f64 = 70.0;

/// Incident count at which the crime volume term saturates.
const INCIDENT_SATURATION: f64 = 50.0;
const WALKING_PETTY_PENALTY: f64 = 15.0;
const DRIVING_VEHICULAR_PENALTY: f64 = 10.0;

const DAY_TIME_FACTOR: f64 = 90.0;
const EVENING_TIME_FACTOR: f64 = 75.0;
const OVERNIGHT_TIME_FACTOR: f64 = 50.0;
/// Mean overnight probability above which late hours are penalised further.
const OVERNIGHT_PROBABILITY_THRESHOLD: f64 = 0.3;
const OVERNIGHT_HOTSPOT_PENALTY: f64 = 20.0;
const WEEKEND_EVENING_PENALTY: f64 = 5.0;

const BUSINESS_BONUS_CAP: f64 = 20.0;
const NIGHT_LIGHTING_CAP: f64 = 95.0;
const DAY_LIGHTING_FLOOR: f64 = 85.0;

const STALE_AFTER_DAYS: i64 = 30;
const VERY_STALE_AFTER_DAYS: i64 = 90;
const STALE_PENALTY: f64 = 10.0;
const VERY_STALE_PENALTY: f64 = 20.0;

/// Aggregate view of the records in one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSummary {
    /// Number of records summarised.
    pub record_count: usize,
    /// Sum of every stat's incident count.
    pub total_incidents: u64,
    /// Most severe risk level among the records.
    pub risk_level: RiskLevel,
    /// Whether any record carries a petty stat.
    pub has_petty: bool,
    /// Whether any record carries a vehicular stat.
    pub has_vehicular: bool,
    /// Mean probability that an incident falls between 22:00 and 05:59.
    pub overnight_probability: Option<f64>,
    /// Mean population density, residents per km².
    pub population_density: f64,
    /// Mean business density.
    pub business_density: f64,
    /// Best lighting infrastructure indicator.
    pub lighting_infrastructure: f64,
    /// Mean stat confidence.
    pub mean_confidence: Option<f64>,
    /// Most recent `last_updated` date.
    pub newest_update: NaiveDate,
    /// Neighbourhood of the first record.
    pub neighborhood: String,
}

impl CellSummary {
    /// Summarise `records`, or `None` when there are none.
    #[must_use]
    pub fn from_records(records: &[Arc<CrimeRecord>]) -> Option<Self> {
        let first = records.first()?;
        let stats = || records.iter().flat_map(|r| r.crime_stats.iter());
        Some(Self {
            record_count: records.len(),
            total_incidents: records.iter().map(|r| r.total_incidents()).sum(),
            risk_level: records
                .iter()
                .map(|r| r.risk_level)
                .max()
                .unwrap_or_default(),
            has_petty: records.iter().any(|r| r.has_crime_type(CrimeType::Petty)),
            has_vehicular: records
                .iter()
                .any(|r| r.has_crime_type(CrimeType::Vehicular)),
            overnight_probability: mean(stats().map(|s| s.overnight_probability())),
            population_density: mean(records.iter().map(|r| r.population_density))
                .unwrap_or_default(),
            business_density: mean(
                records
                    .iter()
                    .map(|r| r.economic_indicators.business_density),
            )
            .unwrap_or_default(),
            lighting_infrastructure: records
                .iter()
                .map(|r| r.economic_indicators.lighting_infrastructure)
                .fold(0.0, f64::max),
            mean_confidence: mean(stats().map(|s| s.confidence)),
            newest_update: records
                .iter()
                .map(|r| r.last_updated)
                .max()
                .unwrap_or(first.last_updated),
            neighborhood: first.location.neighborhood.clone(),
        })
    }
}

#[expect(clippy::float_arithmetic, reason = "arithmetic mean")]
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0_u32), |(sum, count), v| {
        (sum + v, count.saturating_add(1))
    });
    (count > 0).then(|| sum / f64::from(count))
}

/// Crime component.
///
/// The volume term falls linearly to zero at fifty incidents, scaled by the
/// cell's most severe risk level. Walking past petty crime and driving past
/// vehicular crime cost extra points.
///
/// # Examples
/// ```
/// use saferoute_scorer::components::{DEFAULT_CRIME_RISK, crime_risk};
///
/// assert_eq!(crime_risk(None, None), DEFAULT_CRIME_RISK);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "component formula")]
#[expect(
    clippy::cast_precision_loss,
    reason = "incident totals stay far below 2^52"
)]
pub fn crime_risk(summary: Option<&CellSummary>, travel_mode: Option<TravelMode>) -> f64 {
    let Some(summary) = summary else {
        return DEFAULT_CRIME_RISK;
    };
    let volume = (summary.total_incidents as f64 / INCIDENT_SATURATION * 100.0).min(100.0);
    let base = (100.0 - volume).clamp(0.0, 100.0) * summary.risk_level.crime_multiplier();
    let penalty = match travel_mode {
        Some(TravelMode::Walking) if summary.has_petty => WALKING_PETTY_PENALTY,
        Some(TravelMode::Driving) if summary.has_vehicular => DRIVING_VEHICULAR_PENALTY,
        _ => 0.0,
    };
    (base - penalty).clamp(0.0, 100.0)
}

/// Time-of-day component.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "component formula")]
pub fn time_factor(context: Option<&TimeContext>, overnight_probability: Option<f64>) -> f64 {
    let Some(context) = context else {
        return DEFAULT_TIME_FACTOR;
    };
    let period = context.period();
    let mut value = match period {
        DayPeriod::Day => DAY_TIME_FACTOR,
        DayPeriod::Evening => EVENING_TIME_FACTOR,
        DayPeriod::Overnight => OVERNIGHT_TIME_FACTOR,
    };
    if period == DayPeriod::Overnight
        && overnight_probability.is_some_and(|p| p > OVERNIGHT_PROBABILITY_THRESHOLD)
    {
        value -= OVERNIGHT_HOTSPOT_PENALTY;
    }
    if context.is_weekend_evening() {
        value -= WEEKEND_EVENING_PENALTY;
    }
    value.clamp(0.0, 100.0)
}

/// Population component from density bands plus a business bonus.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "component formula")]
pub fn population_density(summary: Option<&CellSummary>) -> f64 {
    let Some(summary) = summary else {
        return DEFAULT_POPULATION_DENSITY;
    };
    let band = match summary.population_density {
        d if d < 1_000.0 => 60.0,
        d if d < 5_000.0 => 85.0,
        d if d < 15_000.0 => 90.0,
        _ => 70.0,
    };
    let bonus = (summary.business_density * 2.0).clamp(0.0, BUSINESS_BONUS_CAP);
    (band + bonus).clamp(0.0, 100.0)
}

/// Lighting component.
///
/// Takes the better of the location's own lighting metric and the area's
/// infrastructure indicator; at night the value is capped, by day floored.
#[must_use]
pub fn lighting_level(
    location_lighting: Option<f64>,
    summary: Option<&CellSummary>,
    context: Option<&TimeContext>,
) -> f64 {
    let area = summary.map(|s| s.lighting_infrastructure);
    let value = match (location_lighting, area) {
        (Some(a), Some(b)) => a.max(b),
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => return DEFAULT_LIGHTING_LEVEL,
    };
    let adjusted = match context.map(TimeContext::period) {
        Some(period) if period.is_night() => value.min(NIGHT_LIGHTING_CAP),
        Some(_) => value.max(DAY_LIGHTING_FLOOR),
        None => value,
    };
    adjusted.clamp(0.0, 100.0)
}

/// Every component, honouring `flags`.
#[must_use]
pub fn compute_components(
    location: &Location,
    summary: Option<&CellSummary>,
    context: Option<&TimeContext>,
    flags: &FactorFlags,
) -> ScoreComponents {
    let value = |factor: FactorType, computed: &dyn Fn() -> f64, default: f64| {
        if flags.includes(factor) {
            computed()
        } else {
            default
        }
    };
    ScoreComponents {
        crime_risk: value(
            FactorType::CrimeRisk,
            &|| crime_risk(summary, flags.travel_mode),
            DEFAULT_CRIME_RISK,
        ),
        time_factor: value(
            FactorType::TimeFactor,
            &|| time_factor(context, summary.and_then(|s| s.overnight_probability)),
            DEFAULT_TIME_FACTOR,
        ),
        population_density: value(
            FactorType::PopulationDensity,
            &|| population_density(summary),
            DEFAULT_POPULATION_DENSITY,
        ),
        lighting_level: value(
            FactorType::LightingLevel,
            &|| lighting_level(location.lighting_level, summary, context),
            DEFAULT_LIGHTING_LEVEL,
        ),
    }
}

/// Age of the newest record on `today`, in whole days.
#[must_use]
pub fn data_age_days(summary: &CellSummary, today: NaiveDate) -> i64 {
    (today - summary.newest_update).num_days()
}

/// Confidence in a score.
///
/// Starts at 70, rises to the mean stat confidence, loses points for stale
/// data and is scaled by the share of non-zero components.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "confidence formula")]
pub fn confidence_level(
    summary: Option<&CellSummary>,
    components: &ScoreComponents,
    today: NaiveDate,
) -> u8 {
    let base = summary
        .and_then(|s| s.mean_confidence)
        .map_or(BASE_CONFIDENCE, |m| m.max(BASE_CONFIDENCE));
    let age_penalty = match summary.map(|s| data_age_days(s, today)) {
        Some(days) if days > VERY_STALE_AFTER_DAYS => VERY_STALE_PENALTY,
        Some(days) if days > STALE_AFTER_DAYS => STALE_PENALTY,
        _ => 0.0,
    };
    let non_zero = FactorType::ALL
        .iter()
        .filter(|t| components.value(**t) > 0.0)
        .count();
    let coverage = f64::from(u8::try_from(non_zero).unwrap_or(u8::MAX))
        / f64::from(u8::try_from(FactorType::ALL.len()).unwrap_or(u8::MAX));
    clamp_score((base - age_penalty) * coverage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use saferoute_core::test_support::{local_time, record_at, uniform_stat};
    use saferoute_core::{GeoPoint, TimeContext};

    #[fixture]
    fn summary() -> CellSummary {
        let mut record = record_at("a", GeoPoint::new(37.76, -122.41), RiskLevel::High);
        record.crime_stats = vec![
            uniform_stat(CrimeType::Petty, 10, 80.0),
            uniform_stat(CrimeType::Vehicular, 10, 90.0),
        ];
        record.population_density = 11_200.0;
        record.economic_indicators.business_density = 38.0;
        CellSummary::from_records(&[Arc::new(record)]).expect("one record")
    }

    fn weekday(hour: u32) -> TimeContext {
        // 2024-03-12 is a Tuesday.
        TimeContext::new(local_time(2024, 3, 12, hour, 0))
    }

    #[rstest]
    fn summary_aggregates_records(summary: CellSummary) {
        assert_eq!(summary.total_incidents, 20);
        assert_eq!(summary.risk_level, RiskLevel::High);
        assert!(summary.has_petty && summary.has_vehicular);
        let overnight = summary.overnight_probability.expect("stats present");
        assert!((overnight - 8.0 / 24.0).abs() < 1e-9);
        assert_eq!(summary.mean_confidence, Some(85.0));
    }

    #[rstest]
    #[case(None, 36.0)]
    #[case(Some(TravelMode::Walking), 21.0)]
    #[case(Some(TravelMode::Driving), 26.0)]
    #[case(Some(TravelMode::Transit), 36.0)]
    fn crime_risk_applies_mode_penalties(
        summary: CellSummary,
        #[case] mode: Option<TravelMode>,
        #[case] expected: f64,
    ) {
        // (100 - 40) * 0.6 = 36 for 20 incidents at high risk.
        assert!((crime_risk(Some(&summary), mode) - expected).abs() < 1e-9);
    }

    #[rstest]
    fn crime_risk_saturates_at_zero(mut summary: CellSummary) {
        summary.total_incidents = 500;
        assert!(crime_risk(Some(&summary), Some(TravelMode::Walking)).abs() < 1e-9);
    }

    #[rstest]
    #[case(10, None, 90.0)]
    #[case(19, None, 75.0)]
    #[case(23, None, 50.0)]
    #[case(23, Some(0.31), 30.0)]
    #[case(19, Some(0.9), 75.0)]
    fn time_factor_buckets(
        #[case] hour: u32,
        #[case] overnight: Option<f64>,
        #[case] expected: f64,
    ) {
        assert!((time_factor(Some(&weekday(hour)), overnight) - expected).abs() < 1e-9);
    }

    #[rstest]
    fn weekend_evening_costs_five_points() {
        // 2024-03-16 is a Saturday.
        let context = TimeContext::new(local_time(2024, 3, 16, 21, 0));
        assert!((time_factor(Some(&context), None) - 70.0).abs() < 1e-9);
        assert!((time_factor(None, None) - DEFAULT_TIME_FACTOR).abs() < 1e-9);
    }

    #[rstest]
    #[case(800.0, 0.0, 60.0)]
    #[case(3_500.0, 4.0, 93.0)]
    #[case(11_200.0, 38.0, 100.0)]
    #[case(35_000.0, 6.0, 82.0)]
    fn population_bands(
        mut summary: CellSummary,
        #[case] density: f64,
        #[case] business: f64,
        #[case] expected: f64,
    ) {
        summary.population_density = density;
        summary.business_density = business;
        assert!((population_density(Some(&summary)) - expected).abs() < 1e-9);
    }

    #[rstest]
    #[case(Some(99.0), 10, 99.0)]
    #[case(Some(99.0), 23, 95.0)]
    #[case(Some(20.0), 10, 85.0)]
    #[case(None, 23, 70.0)]
    fn lighting_caps_and_floors(
        summary: CellSummary,
        #[case] own: Option<f64>,
        #[case] hour: u32,
        #[case] expected: f64,
    ) {
        let value = lighting_level(own, Some(&summary), Some(&weekday(hour)));
        assert!((value - expected).abs() < 1e-9);
    }

    #[rstest]
    fn lighting_defaults_without_data() {
        assert!((lighting_level(None, None, None) - DEFAULT_LIGHTING_LEVEL).abs() < 1e-9);
    }

    #[rstest]
    fn disabled_components_take_defaults(summary: CellSummary) {
        let location = Location::from_point(GeoPoint::new(37.76, -122.41));
        let flags = FactorFlags::default()
            .without(FactorType::CrimeRisk)
            .without(FactorType::PopulationDensity);
        let components = compute_components(&location, Some(&summary), None, &flags);
        assert!((components.crime_risk - DEFAULT_CRIME_RISK).abs() < 1e-9);
        assert!((components.population_density - DEFAULT_POPULATION_DENSITY).abs() < 1e-9);
        assert!((components.time_factor - DEFAULT_TIME_FACTOR).abs() < 1e-9);
    }

    #[rstest]
    #[case(10, 85)]
    #[case(45, 75)]
    #[case(120, 65)]
    fn confidence_penalises_stale_data(
        summary: CellSummary,
        #[case] age_days: u64,
        #[case] expected: u8,
    ) {
        let today = summary.newest_update + chrono::Days::new(age_days);
        let components = ScoreComponents {
            crime_risk: 10.0,
            time_factor: 50.0,
            population_density: 90.0,
            lighting_level: 70.0,
        };
        assert_eq!(
            confidence_level(Some(&summary), &components, today),
            expected
        );
    }

    #[rstest]
    fn confidence_scales_with_non_zero_components(summary: CellSummary) {
        let components = ScoreComponents {
            crime_risk: 0.0,
            time_factor: 50.0,
            population_density: 90.0,
            lighting_level: 70.0,
        };
        // 85 * 3/4 = 63.75
        assert_eq!(
            confidence_level(Some(&summary), &components, summary.newest_update),
            64
        );
        assert_eq!(confidence_level(None, &components, summary.newest_update), 53);
    }
}
