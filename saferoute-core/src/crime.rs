//! Crime record model shared by the generator, the service and the engine.
//!
//! Records are immutable once generated. Each [`CrimeStat`] carries an
//! hourly distribution over [`HOURS_PER_DAY`] buckets that sums to `1.0`
//! and a severity inside its [`CrimeType`]'s declared [`SeverityRange`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{GeoPoint, GridCellId};

/// Number of buckets in an hourly pattern.
pub const HOURS_PER_DAY: usize = 24;

/// First hour counted as overnight.
const OVERNIGHT_START: usize = 22;
/// First hour no longer counted as overnight.
const OVERNIGHT_END: usize = 6;

/// Inclusive bounds for a crime type's severity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityRange {
    /// Lowest permitted severity.
    pub min: f64,
    /// Highest permitted severity.
    pub max: f64,
}

impl SeverityRange {
    /// Return whether `severity` lies within the range.
    #[must_use]
    pub fn contains(&self, severity: f64) -> bool {
        (self.min..=self.max).contains(&severity)
    }

    /// Clamp `severity` into the range.
    #[must_use]
    pub const fn clamp(&self, severity: f64) -> f64 {
        severity.clamp(self.min, self.max)
    }

    /// Interpolate between `min` and `max` by `fraction` in `0.0..=1.0`.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "linear interpolation")]
    pub const fn lerp(&self, fraction: f64) -> f64 {
        self.clamp(self.min + (self.max - self.min) * fraction)
    }
}

/// Broad crime category.
///
/// # Examples
/// ```
/// use saferoute_core::CrimeType;
///
/// let violent: CrimeType = "violent".parse().unwrap();
/// assert!(violent.severity_range().contains(8.0));
/// assert_eq!(violent.subtypes(), ["assault", "robbery", "homicide"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrimeType {
    /// Assault, robbery and homicide.
    Violent,
    /// Burglary, theft and vandalism.
    Property,
    /// Pickpocketing, shoplifting and public disturbance.
    Petty,
    /// Car theft, break-ins and hit-and-run.
    Vehicular,
}

impl CrimeType {
    /// Every crime type in generation order.
    pub const ALL: [Self; 4] = [Self::Violent, Self::Property, Self::Petty, Self::Vehicular];

    /// Lowercase label used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Violent => "violent",
            Self::Property => "property",
            Self::Petty => "petty",
            Self::Vehicular => "vehicular",
        }
    }

    /// Declared severity bounds.
    #[must_use]
    pub const fn severity_range(self) -> SeverityRange {
        let (min, max) = match self {
            Self::Violent => (7.0, 10.0),
            Self::Property => (4.0, 7.0),
            Self::Petty => (1.0, 4.0),
            Self::Vehicular => (3.0, 7.0),
        };
        SeverityRange { min, max }
    }

    /// Weight used when banding an area's risk level.
    #[must_use]
    pub const fn risk_weight(self) -> f64 {
        match self {
            Self::Violent => 1.0,
            Self::Property => 0.6,
            Self::Petty => 0.4,
            Self::Vehicular => 0.8,
        }
    }

    /// Subtypes generated for this category.
    #[must_use]
    pub const fn subtypes(self) -> &'static [&'static str] {
        match self {
            Self::Violent => &["assault", "robbery", "homicide"],
            Self::Property => &["burglary", "theft", "vandalism"],
            Self::Petty => &["pickpocketing", "shoplifting", "public_disturbance"],
            Self::Vehicular => &["car_theft", "car_break_in", "hit_and_run"],
        }
    }

    /// Unnormalized relative frequency of incidents per hour of day.
    #[must_use]
    pub const fn baseline_hourly_profile(self) -> [f64; HOURS_PER_DAY] {
        match self {
            Self::Violent => [
                6.0, 5.0, 5.0, 4.0, 3.0, 2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0,
                3.0, 4.0, 4.0, 5.0, 6.0, 7.0, 8.0, 7.0,
            ],
            Self::Property => [
                3.0, 3.0, 2.0, 2.0, 2.0, 1.0, 1.0, 2.0, 3.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0,
                4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 4.0, 3.0,
            ],
            Self::Petty => [
                1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 7.0, 7.0, 7.0,
                7.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0,
            ],
            Self::Vehicular => [
                5.0, 5.0, 5.0, 4.0, 3.0, 2.0, 1.0, 2.0, 3.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0,
                3.0, 4.0, 4.0, 4.0, 4.0, 5.0, 5.0, 5.0,
            ],
        }
    }
}

impl fmt::Display for CrimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} label: {label}")]
pub struct UnknownLabel {
    /// Kind of value being parsed.
    pub kind: &'static str,
    /// Label that failed to parse.
    pub label: String,
}

impl FromStr for CrimeType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLabel {
                kind: "crime type",
                label: s.to_owned(),
            })
    }
}

/// Categorical banding of an area's aggregate crime severity.
///
/// Ordering follows severity, so `max()` over a slice yields the most
/// severe level.
///
/// # Examples
/// ```
/// use saferoute_core::RiskLevel;
///
/// assert_eq!(RiskLevel::from_score(29.0), RiskLevel::Low);
/// assert_eq!(RiskLevel::from_score(80.0), RiskLevel::Critical);
/// assert!(RiskLevel::High > RiskLevel::Medium);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Weighted score below [`RiskLevel::MEDIUM_THRESHOLD`].
    #[default]
    Low,
    /// Weighted score below [`RiskLevel::HIGH_THRESHOLD`].
    Medium,
    /// Weighted score below [`RiskLevel::CRITICAL_THRESHOLD`].
    High,
    /// Everything else.
    Critical,
}

impl RiskLevel {
    /// Lower bound of the medium band.
    pub const MEDIUM_THRESHOLD: f64 = 30.0;
    /// Lower bound of the high band.
    pub const HIGH_THRESHOLD: f64 = 60.0;
    /// Lower bound of the critical band.
    pub const CRITICAL_THRESHOLD: f64 = 80.0;

    /// Every level from least to most severe.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Band a weighted severity score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < Self::MEDIUM_THRESHOLD {
            Self::Low
        } else if score < Self::HIGH_THRESHOLD {
            Self::Medium
        } else if score < Self::CRITICAL_THRESHOLD {
            Self::High
        } else {
            Self::Critical
        }
    }

    /// Multiplier applied to the crime-risk component.
    #[must_use]
    pub const fn crime_multiplier(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 0.8,
            Self::High => 0.6,
            Self::Critical => 0.4,
        }
    }

    /// Whether the level is high or critical.
    #[must_use]
    pub const fn is_elevated(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    /// Lowercase label used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownLabel {
                kind: "risk level",
                label: s.to_owned(),
            })
    }
}

/// Predominant land use around a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandUse {
    /// Mostly housing.
    Residential,
    /// Shops and offices.
    Commercial,
    /// Housing and commerce combined.
    Mixed,
    /// Warehouses, docks and plants.
    Industrial,
    /// Parks and open space.
    Recreational,
}

/// Incident statistics for one crime subtype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeStat {
    /// Broad category.
    #[serde(rename = "type")]
    pub crime_type: CrimeType,
    /// Subtype label, one of [`CrimeType::subtypes`].
    pub subtype: String,
    /// Incidents observed over the record's date range.
    pub incident_count: u32,
    /// Severity inside the category's declared range.
    pub severity: f64,
    /// Probability of an incident falling in each hour; sums to `1.0`.
    pub hourly_pattern: [f64; HOURS_PER_DAY],
    /// Confidence in the statistic, `0..=100`.
    pub confidence: f64,
}

impl CrimeStat {
    /// Probability mass between 22:00 and 05:59.
    #[must_use]
    pub fn overnight_probability(&self) -> f64 {
        self.hourly_pattern
            .iter()
            .enumerate()
            .filter(|(hour, _)| is_overnight_hour(*hour))
            .map(|(_, p)| *p)
            .sum()
    }

    /// Probability of an incident in `hour`, or `None` past 23.
    #[must_use]
    pub fn probability_at(&self, hour: usize) -> Option<f64> {
        self.hourly_pattern.get(hour).copied()
    }
}

const fn is_overnight_hour(hour: usize) -> bool {
    hour >= OVERNIGHT_START || hour < OVERNIGHT_END
}

/// Inclusive calendar window covered by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the window.
    pub start: NaiveDate,
    /// Last day of the window.
    pub end: NaiveDate,
}

/// Where a record was observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordLocation {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Neighborhood the record belongs to.
    pub neighborhood: String,
    /// Predominant land use.
    pub land_use: LandUse,
}

impl RecordLocation {
    /// Coordinates as a [`GeoPoint`].
    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Socio-economic context of an area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicIndicators {
    /// Median household income in USD.
    pub median_income: u32,
    /// Unemployment rate in percent.
    pub unemployment_rate: f64,
    /// Businesses per block.
    pub business_density: f64,
    /// Street lighting infrastructure quality, `0..=100`.
    pub lighting_infrastructure: f64,
}

/// Synthetic crime statistics for one point in an area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeRecord {
    /// Stable identifier, e.g. `mission_0`.
    pub id: String,
    /// Observation point.
    pub location: RecordLocation,
    /// Grid cell containing [`CrimeRecord::location`].
    pub grid_cell_id: GridCellId,
    /// Window the incident counts cover.
    pub timeframe: DateRange,
    /// Per-subtype statistics.
    pub crime_stats: Vec<CrimeStat>,
    /// Risk band of the surrounding area.
    pub risk_level: RiskLevel,
    /// Residents per square mile.
    pub population_density: f64,
    /// Socio-economic indicators of the area.
    pub economic_indicators: EconomicIndicators,
    /// Day the statistics were last refreshed.
    pub last_updated: NaiveDate,
    /// Provenance tag.
    pub data_source: String,
}

impl CrimeRecord {
    /// Sum of incident counts over all stats.
    #[must_use]
    pub fn total_incidents(&self) -> u64 {
        self.crime_stats
            .iter()
            .map(|s| u64::from(s.incident_count))
            .sum()
    }

    /// Whether any stat belongs to `crime_type`.
    #[must_use]
    pub fn has_crime_type(&self, crime_type: CrimeType) -> bool {
        self.crime_stats.iter().any(|s| s.crime_type == crime_type)
    }

    /// Coordinates of the record.
    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        self.location.point()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(29.0, RiskLevel::Low)]
    #[case(30.0, RiskLevel::Medium)]
    #[case(59.0, RiskLevel::Medium)]
    #[case(60.0, RiskLevel::High)]
    #[case(79.0, RiskLevel::High)]
    #[case(80.0, RiskLevel::Critical)]
    fn risk_level_bands(#[case] score: f64, #[case] expected: RiskLevel) {
        assert_eq!(RiskLevel::from_score(score), expected);
    }

    #[rstest]
    fn risk_levels_order_by_severity() {
        let levels = [RiskLevel::Medium, RiskLevel::Critical, RiskLevel::Low];
        assert_eq!(levels.iter().max(), Some(&RiskLevel::Critical));
    }

    #[rstest]
    #[case("violent", CrimeType::Violent)]
    #[case(" Vehicular ", CrimeType::Vehicular)]
    fn parses_crime_type_labels(#[case] label: &str, #[case] expected: CrimeType) {
        assert_eq!(label.parse::<CrimeType>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_crime_type() {
        let err = "arson".parse::<CrimeType>().expect_err("unknown label");
        assert_eq!(err.to_string(), "unknown crime type label: arson");
    }

    #[rstest]
    fn every_type_has_three_subtypes_and_positive_profile() {
        for crime_type in CrimeType::ALL {
            assert_eq!(crime_type.subtypes().len(), 3);
            assert!(
                crime_type
                    .baseline_hourly_profile()
                    .iter()
                    .all(|w| *w > 0.0)
            );
        }
    }

    #[rstest]
    fn severity_lerp_stays_in_range() {
        let range = CrimeType::Petty.severity_range();
        assert!((range.lerp(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((range.lerp(1.0) - 4.0).abs() < f64::EPSILON);
        assert!((range.lerp(2.0) - 4.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn overnight_probability_sums_night_hours() {
        let mut pattern = [0.0; HOURS_PER_DAY];
        pattern[23] = 0.25;
        pattern[3] = 0.25;
        pattern[12] = 0.5;
        let stat = CrimeStat {
            crime_type: CrimeType::Petty,
            subtype: "shoplifting".into(),
            incident_count: 4,
            severity: 2.0,
            hourly_pattern: pattern,
            confidence: 80.0,
        };
        assert!((stat.overnight_probability() - 0.5).abs() < 1e-12);
        assert_eq!(stat.probability_at(24), None);
    }

    #[rstest]
    fn crime_stat_serialises_type_field() {
        let stat = CrimeStat {
            crime_type: CrimeType::Violent,
            subtype: "assault".into(),
            incident_count: 1,
            severity: 8.0,
            hourly_pattern: [1.0 / 24.0; HOURS_PER_DAY],
            confidence: 70.0,
        };
        let json = serde_json::to_value(&stat).expect("serialise stat");
        assert_eq!(json["type"], "violent");
    }
}
