//! Error kinds shared across the SafeRoute crates.
//!
//! Missing crime data and absent cache entries are deliberately not
//! represented here: both have documented default paths.

use thiserror::Error;

/// Caller input rejected before any computation begins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    /// A coordinate was NaN or infinite.
    #[error("coordinates ({lat}, {lng}) must be finite")]
    NonFiniteCoordinate {
        /// Latitude supplied by the caller.
        lat: f64,
        /// Longitude supplied by the caller.
        lng: f64,
    },
    /// Latitude outside `-90.0..=90.0`.
    #[error("latitude {lat} is outside -90..=90")]
    LatitudeOutOfRange {
        /// Offending latitude.
        lat: f64,
    },
    /// Longitude outside `-180.0..=180.0`.
    #[error("longitude {lng} is outside -180..=180")]
    LongitudeOutOfRange {
        /// Offending longitude.
        lng: f64,
    },
    /// A route was submitted without segments.
    #[error("route {route_id} has no segments")]
    EmptyRoute {
        /// Identifier of the empty route.
        route_id: String,
    },
    /// A segment distance was negative or not finite.
    #[error("segment {index} has invalid distance {distance_m} m")]
    InvalidSegmentDistance {
        /// Position of the segment in the route.
        index: usize,
        /// Distance supplied by the caller.
        distance_m: f64,
    },
    /// An hour-of-day query was outside `0..24`.
    #[error("hour {hour} is outside 0..24")]
    HourOutOfRange {
        /// Offending hour.
        hour: u32,
    },
}

/// The synthetic dataset could not be built.
///
/// Initialization failure is fatal for the owning service and is cloned to
/// every caller waiting on the same initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataInitializationError {
    /// The configured area table was empty.
    #[error("area table is empty; nothing to generate")]
    EmptyAreaTable,
    /// Date arithmetic on the reference date overflowed.
    #[error("reference date {reference} cannot be shifted back {months} months")]
    InvalidReferenceDate {
        /// Reference date as supplied.
        reference: String,
        /// Months the generator tried to subtract.
        months: u32,
    },
    /// An hourly profile summed to zero and could not be normalized.
    #[error("hourly profile for {crime_type} in {area} sums to zero")]
    DegenerateHourlyProfile {
        /// Area whose profile failed.
        area: String,
        /// Crime type of the failing profile.
        crime_type: String,
    },
}

/// Errors surfaced by the scoring engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// The request was rejected before scoring.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
    /// The backing dataset failed to initialize.
    #[error("crime data unavailable: {0}")]
    DataInitialization(#[from] DataInitializationError),
    /// An unexpected internal fault while scoring a location.
    #[error("failed to score ({lat}, {lng}): {reason}")]
    Computation {
        /// Latitude of the location being scored.
        lat: f64,
        /// Longitude of the location being scored.
        lng: f64,
        /// Description of the fault.
        reason: String,
    },
}
