//! Routes as supplied by the routing layer.

use serde::{Deserialize, Serialize};

use crate::{GeoPoint, InvalidInputError, Location, SafetyScore};

/// How a route is travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    /// On foot.
    Walking,
    /// By car.
    Driving,
    /// By bicycle.
    Cycling,
    /// By public transport.
    Transit,
}

/// One leg of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    /// Where the segment begins.
    pub start: Location,
    /// Where the segment ends.
    pub end: Location,
    /// Length in metres.
    pub distance_m: f64,
    /// Expected travel time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_s: Option<f64>,
    /// Score at the segment midpoint, once computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<SafetyScore>,
}

impl RouteSegment {
    /// Create an unscored segment.
    #[must_use]
    pub const fn new(start: Location, end: Location, distance_m: f64) -> Self {
        Self {
            start,
            end,
            distance_m,
            duration_s: None,
            safety_score: None,
        }
    }

    /// Point at which the segment is scored.
    #[must_use]
    pub fn midpoint(&self) -> GeoPoint {
        self.start.point.midpoint(&self.end.point)
    }
}

/// An ordered sequence of segments.
///
/// # Examples
/// ```
/// use saferoute_core::{Location, Route, RouteSegment, TravelMode};
///
/// let a = Location::new(37.78, -122.41).unwrap();
/// let b = Location::new(37.79, -122.41).unwrap();
/// let route = Route::new("r1", TravelMode::Walking, vec![RouteSegment::new(a, b, 1_100.0)]);
/// assert!(route.validate().is_ok());
/// assert!((route.total_distance_m() - 1_100.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Caller-assigned identifier.
    pub id: String,
    /// How the route is travelled.
    pub travel_mode: TravelMode,
    /// Segments in travel order.
    pub segments: Vec<RouteSegment>,
    /// Aggregated score, once computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<SafetyScore>,
}

impl Route {
    /// Create an unscored route.
    #[must_use]
    pub fn new(id: impl Into<String>, travel_mode: TravelMode, segments: Vec<RouteSegment>) -> Self {
        Self {
            id: id.into(),
            travel_mode,
            segments,
            safety_score: None,
        }
    }

    /// Reject empty routes, invalid endpoints and bad distances.
    ///
    /// # Errors
    /// Returns [`InvalidInputError`] for the first problem found.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        if self.segments.is_empty() {
            return Err(InvalidInputError::EmptyRoute {
                route_id: self.id.clone(),
            });
        }
        for (index, segment) in self.segments.iter().enumerate() {
            segment.start.validate()?;
            segment.end.validate()?;
            if !segment.distance_m.is_finite() || segment.distance_m < 0.0 {
                return Err(InvalidInputError::InvalidSegmentDistance {
                    index,
                    distance_m: segment.distance_m,
                });
            }
        }
        Ok(())
    }

    /// Sum of segment distances in metres.
    #[must_use]
    pub fn total_distance_m(&self) -> f64 {
        self.segments.iter().map(|s| s.distance_m).sum()
    }
}
