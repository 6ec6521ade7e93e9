//! Deterministic synthetic crime data.
//!
//! [`CrimeDataGenerator`] turns a static table of [`AreaProfile`]s into
//! [`CrimeRecord`]s. Output depends only on the area table, the reference
//! date and the requested [`Timeframe`]: every random-looking value is drawn
//! from a [`Variation`] stream seeded by [`area_seed`].
//!
//! Counts are produced for the six-month baseline and rescaled by
//! [`apply_timeframe`].

mod areas;
mod queries;
mod trend;
mod variation;

use chrono::{Months, NaiveDate, TimeDelta};
use log::debug;

use saferoute_core::{
    CrimeRecord, CrimeStat, CrimeType, DataInitializationError, DateRange, GeoPoint, GridCellId,
    HOURS_PER_DAY, RecordLocation, RiskLevel, Timeframe,
};

pub use areas::{AreaProfile, SAN_FRANCISCO_AREAS};
pub use queries::{
    area_matches, by_area, by_coordinates, by_grid_id, nearest_area_risk_level,
    normalize_area_query,
};
pub use trend::{
    AreaTrend, IMPROVING_THRESHOLD_PERCENT, Trend, TrendDirection, WORSENING_THRESHOLD_PERCENT,
    baseline_incidents, calculate_trend,
};
pub use variation::{Variation, area_seed, deterministic_variation};

/// Records generated per area.
pub const RECORDS_PER_AREA: usize = 3;
/// Maximum offset of non-central records from the area centre, in degrees.
pub const JITTER_DEGREES: f64 = 0.004;
/// Relative per-hour perturbation of the baseline hourly profile.
pub const HOURLY_PERTURBATION: f64 = 0.2;
/// Oldest age of a record's `last_updated` date, in days.
pub const MAX_RECORD_AGE_DAYS: u32 = 120;
/// Provenance tag carried by generated records.
pub const DATA_SOURCE: &str = "synthetic-generator";

const MIN_CONFIDENCE: f64 = 60.0;
const MAX_CONFIDENCE: f64 = 95.0;
const MIN_COUNT_FACTOR: f64 = 0.7;
const COUNT_FACTOR_SPAN: f64 = 0.6;

/// Incidents per subtype over six months in a medium-risk area.
///
/// A grid cell gathers the three records of an area, so a medium cell
/// totals roughly 36 incidents and only high and critical cells reach the
/// 50-incident saturation point of the crime-risk component.
#[must_use]
pub const fn type_base(crime_type: CrimeType) -> f64 {
    match crime_type {
        CrimeType::Violent => 0.6,
        CrimeType::Property => 1.4,
        CrimeType::Petty => 1.2,
        CrimeType::Vehicular => 0.8,
    }
}

/// Scale applied to [`type_base`] for each risk level.
#[must_use]
pub const fn risk_factor(risk_level: RiskLevel) -> f64 {
    match risk_level {
        RiskLevel::Low => 0.5,
        RiskLevel::Medium => 1.0,
        RiskLevel::High => 1.8,
        RiskLevel::Critical => 2.8,
    }
}

/// Produces reproducible crime records for a table of areas.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use saferoute_core::Timeframe;
/// use saferoute_data::generator::{CrimeDataGenerator, RECORDS_PER_AREA};
///
/// let generator = CrimeDataGenerator::new();
/// let reference = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let first = generator.generate(reference, Timeframe::SixMonths).unwrap();
/// let second = generator.generate(reference, Timeframe::SixMonths).unwrap();
/// assert_eq!(first, second);
/// assert_eq!(first.len(), generator.areas().len() * RECORDS_PER_AREA);
/// ```
#[derive(Debug, Clone)]
pub struct CrimeDataGenerator {
    areas: Vec<AreaProfile>,
}

impl Default for CrimeDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CrimeDataGenerator {
    /// Generator over [`SAN_FRANCISCO_AREAS`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_areas(SAN_FRANCISCO_AREAS.to_vec())
    }

    /// Generator over a custom area table.
    #[must_use]
    pub const fn with_areas(areas: Vec<AreaProfile>) -> Self {
        Self { areas }
    }

    /// The configured area table.
    #[must_use]
    pub fn areas(&self) -> &[AreaProfile] {
        &self.areas
    }

    /// Generate the dataset for `timeframe` ending at `reference`.
    ///
    /// # Errors
    /// Returns [`DataInitializationError`] when the area table is empty,
    /// when `reference` cannot be shifted back by the window, or when an
    /// hourly profile degenerates to zero.
    pub fn generate(
        &self,
        reference: NaiveDate,
        timeframe: Timeframe,
    ) -> Result<Vec<CrimeRecord>, DataInitializationError> {
        let baseline = self.generate_baseline(reference)?;
        if timeframe == Timeframe::SixMonths {
            return Ok(baseline);
        }
        Ok(apply_timeframe(&baseline, timeframe))
    }

    /// Generate the six-month baseline ending at `reference`.
    ///
    /// # Errors
    /// See [`CrimeDataGenerator::generate`].
    pub fn generate_baseline(
        &self,
        reference: NaiveDate,
    ) -> Result<Vec<CrimeRecord>, DataInitializationError> {
        if self.areas.is_empty() {
            return Err(DataInitializationError::EmptyAreaTable);
        }
        let window = window_ending(reference, Timeframe::SixMonths).ok_or_else(|| {
            DataInitializationError::InvalidReferenceDate {
                reference: reference.to_string(),
                months: Timeframe::SixMonths.months(),
            }
        })?;
        let mut records = Vec::with_capacity(self.areas.len() * RECORDS_PER_AREA);
        for area in &self.areas {
            let mut variation = Variation::new(area_seed(area.name));
            for index in 0..RECORDS_PER_AREA {
                records.push(generate_record(area, index, window, &mut variation)?);
            }
        }
        debug!(
            "generated {} records for {} areas ending {reference}",
            records.len(),
            self.areas.len()
        );
        Ok(records)
    }

    /// Risk level of the configured area closest to `point`.
    #[must_use]
    pub fn nearest_area_risk_level(&self, point: &GeoPoint) -> Option<RiskLevel> {
        nearest_area_risk_level(&self.areas, point)
    }
}

/// Rescale six-month baseline records to `timeframe`.
///
/// Incident counts are multiplied by [`Timeframe::multiplier`] and rounded;
/// the date range is recomputed to end on the record's original end date.
/// The input is left untouched.
#[must_use]
pub fn apply_timeframe(dataset: &[CrimeRecord], timeframe: Timeframe) -> Vec<CrimeRecord> {
    dataset
        .iter()
        .map(|record| {
            let mut scaled = record.clone();
            for stat in &mut scaled.crime_stats {
                stat.incident_count = scale_count(stat.incident_count, timeframe.multiplier());
            }
            scaled.timeframe = window_ending(record.timeframe.end, timeframe).unwrap_or(DateRange {
                start: NaiveDate::MIN,
                end: record.timeframe.end,
            });
            scaled
        })
        .collect()
}

fn window_ending(end: NaiveDate, timeframe: Timeframe) -> Option<DateRange> {
    let start = end.checked_sub_months(Months::new(timeframe.months()))?;
    Some(DateRange { start, end })
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "counts are small, non-negative and rounded before the cast"
)]
fn scale_count(count: u32, multiplier: f64) -> u32 {
    (f64::from(count) * multiplier).round().max(0.0) as u32
}

fn generate_record(
    area: &AreaProfile,
    index: usize,
    window: DateRange,
    variation: &mut Variation,
) -> Result<CrimeRecord, DataInitializationError> {
    let point = record_point(area.center, index, variation);
    let mut crime_stats = Vec::with_capacity(CrimeType::ALL.len() * 3);
    for crime_type in CrimeType::ALL {
        for subtype in crime_type.subtypes() {
            crime_stats.push(generate_stat(area, crime_type, subtype, variation)?);
        }
    }
    let age = TimeDelta::days(i64::from(variation.up_to(MAX_RECORD_AGE_DAYS)));
    let last_updated = window.end.checked_sub_signed(age).unwrap_or(window.end);
    Ok(CrimeRecord {
        id: format!("{}_{index}", area.slug()),
        location: RecordLocation {
            lat: point.lat,
            lng: point.lng,
            neighborhood: area.name.to_owned(),
            land_use: area.land_use,
        },
        grid_cell_id: GridCellId::containing(&point),
        timeframe: window,
        crime_stats,
        risk_level: area.risk_level,
        population_density: area.population_density,
        economic_indicators: area.economic_indicators,
        last_updated,
        data_source: DATA_SOURCE.to_owned(),
    })
}

#[expect(clippy::float_arithmetic, reason = "coordinate offset")]
fn record_point(center: GeoPoint, index: usize, variation: &mut Variation) -> GeoPoint {
    if index == 0 {
        return center;
    }
    let lat = center.lat + variation.signed(JITTER_DEGREES);
    let lng = center.lng + variation.signed(JITTER_DEGREES);
    GeoPoint::new(lat, lng)
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "count model multiplies small positive factors and rounds"
)]
fn generate_stat(
    area: &AreaProfile,
    crime_type: CrimeType,
    subtype: &str,
    variation: &mut Variation,
) -> Result<CrimeStat, DataInitializationError> {
    let base = type_base(crime_type) * risk_factor(area.risk_level);
    let count_factor = MIN_COUNT_FACTOR + COUNT_FACTOR_SPAN * variation.unit();
    let incident_count = (base * count_factor).round().max(0.0) as u32;
    let severity = crime_type.severity_range().lerp(variation.unit());
    let hourly_pattern =
        perturbed_profile(crime_type.baseline_hourly_profile(), variation).ok_or_else(|| {
            DataInitializationError::DegenerateHourlyProfile {
                area: area.name.to_owned(),
                crime_type: crime_type.to_string(),
            }
        })?;
    let confidence = variation.between(MIN_CONFIDENCE, MAX_CONFIDENCE);
    Ok(CrimeStat {
        crime_type,
        subtype: subtype.to_owned(),
        incident_count,
        severity,
        hourly_pattern,
        confidence,
    })
}

/// Perturb each hour by up to ±20 % and renormalize to a distribution.
///
/// Returns `None` when the perturbed profile has no positive mass.
#[expect(clippy::float_arithmetic, reason = "profile perturbation")]
fn perturbed_profile(
    baseline: [f64; HOURS_PER_DAY],
    variation: &mut Variation,
) -> Option<[f64; HOURS_PER_DAY]> {
    let mut pattern = baseline.map(|weight| {
        let factor = 1.0 + variation.signed(HOURLY_PERTURBATION);
        (weight * factor).max(0.0)
    });
    let total: f64 = pattern.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    for p in &mut pattern {
        *p /= total;
    }
    Some(pattern)
}
