//! Geographic points, validated locations and the ~1 km grid.
//!
//! Coordinates are WGS84 degrees. Conversions into `geo` types use
//! `x = longitude` and `y = latitude`.

use std::fmt;

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::InvalidInputError;

/// Side length of a grid cell in degrees (about 1.1 km of latitude).
pub const GRID_CELL_DEGREES: f64 = 0.01;

const METRES_PER_KILOMETRE: f64 = 1_000.0;

/// A latitude/longitude pair.
///
/// # Examples
/// ```
/// use saferoute_core::GeoPoint;
///
/// let mission = GeoPoint::new(37.7599, -122.4148);
/// let castro = GeoPoint::new(37.7609, -122.4350);
/// let km = mission.distance_km(&castro);
/// assert!(km > 1.5 && km < 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Construct a point without validation.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Construct a point, rejecting non-finite or out-of-range coordinates.
    ///
    /// # Errors
    /// Returns [`InvalidInputError`] describing the first failed check.
    pub fn validated(lat: f64, lng: f64) -> Result<Self, InvalidInputError> {
        let point = Self::new(lat, lng);
        point.validate()?;
        Ok(point)
    }

    /// Check that both coordinates are finite and within WGS84 bounds.
    ///
    /// # Errors
    /// Returns [`InvalidInputError`] describing the first failed check.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(InvalidInputError::NonFiniteCoordinate {
                lat: self.lat,
                lng: self.lng,
            });
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(InvalidInputError::LatitudeOutOfRange { lat: self.lat });
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(InvalidInputError::LongitudeOutOfRange { lng: self.lng });
        }
        Ok(())
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "unit conversion from metres to kilometres"
    )]
    pub fn distance_km(&self, other: &Self) -> f64 {
        Haversine.distance(Point::from(*self), Point::from(*other)) / METRES_PER_KILOMETRE
    }

    /// Arithmetic midpoint of two points.
    ///
    /// Adequate for the short segments a route is made of; it does not
    /// handle antimeridian crossings.
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new(
            f64::midpoint(self.lat, other.lat),
            f64::midpoint(self.lng, other.lng),
        )
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(point: GeoPoint) -> Self {
        Self::new(point.lng, point.lat)
    }
}

/// A point to score, optionally enriched by the location validator.
///
/// # Examples
/// ```
/// use saferoute_core::Location;
///
/// let location = Location::new(37.7849, -122.4094)
///     .unwrap()
///     .with_neighborhood("Union Square")
///     .with_lighting_level(88.0);
/// assert_eq!(location.neighborhood.as_deref(), Some("Union Square"));
/// assert!(Location::new(f64::NAN, 0.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Coordinates of the location.
    #[serde(flatten)]
    pub point: GeoPoint,
    /// Neighborhood name resolved by the validator, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    /// Street lighting metric for this exact spot (`0..=100`), if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting_level: Option<f64>,
}

impl Location {
    /// Validate coordinates and construct a bare location.
    ///
    /// # Errors
    /// Returns [`InvalidInputError`] for non-finite or out-of-range input.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidInputError> {
        Ok(Self::from_point(GeoPoint::validated(lat, lng)?))
    }

    /// Wrap an existing point without enrichment.
    #[must_use]
    pub const fn from_point(point: GeoPoint) -> Self {
        Self {
            point,
            neighborhood: None,
            lighting_level: None,
        }
    }

    /// Attach a neighborhood name.
    #[must_use]
    pub fn with_neighborhood(mut self, neighborhood: impl Into<String>) -> Self {
        self.neighborhood = Some(neighborhood.into());
        self
    }

    /// Attach a lighting metric, clamped into `0..=100`.
    #[must_use]
    pub fn with_lighting_level(mut self, lighting_level: f64) -> Self {
        self.lighting_level = Some(lighting_level.clamp(0.0, 100.0));
        self
    }

    /// Re-run coordinate validation on a location built from untrusted data.
    ///
    /// # Errors
    /// Returns [`InvalidInputError`] for non-finite or out-of-range input.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        self.point.validate()
    }
}

/// Identifier of the ~1 km² bucket that indexes crime records.
///
/// The id is `grid_{floor(lat × 100)}_{floor(lng × 100)}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridCellId(String);

impl GridCellId {
    /// Return the cell containing `point`.
    #[must_use]
    pub fn containing(point: &GeoPoint) -> Self {
        Self(format!(
            "grid_{}_{}",
            grid_bucket(point.lat),
            grid_bucket(point.lng)
        ))
    }

    /// Wrap a raw identifier, e.g. one received from a caller.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GridCellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    reason = "bucketing floors a bounded coordinate into an integer index"
)]
fn grid_bucket(degrees: f64) -> i64 {
    (degrees / GRID_CELL_DEGREES).floor() as i64
}
