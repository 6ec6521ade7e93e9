//! Live environmental signals and the additive score adjustment they imply.
//!
//! Real feeds (weather, traffic, incident dispatch) stay outside the
//! engine. [`SimulatedEnvironment`] produces plausible conditions that are
//! stable within one hour at one place, so repeated real-time queries agree.

use chrono::{Datelike, NaiveDateTime, Timelike};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use saferoute_core::GeoPoint;

/// Sky conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    /// Clear sky.
    Clear,
    /// Overcast.
    Cloudy,
    /// Rain.
    Rain,
    /// Fog.
    Fog,
}

/// Weather at the scored point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Sky conditions.
    pub condition: WeatherCondition,
    /// Visibility on a `0..=100` scale.
    pub visibility: f64,
    /// Air temperature in degrees Celsius.
    pub temperature_c: f64,
}

/// Road traffic near the scored point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Traffic {
    /// Congestion on a `0..=100` scale.
    pub congestion: f64,
    /// Incidents currently reported nearby.
    pub active_incidents: u32,
}

/// How crowded the streets are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrowdDensity {
    /// Few people around.
    Low,
    /// Normal foot traffic.
    Medium,
    /// Busy streets.
    High,
}

/// Public events and emergencies near the scored point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalEvents {
    /// An emergency is in progress nearby.
    pub active_emergency: bool,
    /// Street crowding.
    pub crowd_density: CrowdDensity,
    /// Public events in the vicinity.
    pub nearby_events: u32,
}

/// Snapshot of every live signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalConditions {
    /// Weather.
    pub weather: Weather,
    /// Traffic.
    pub traffic: Traffic,
    /// Events.
    pub events: LocalEvents,
}

impl Default for EnvironmentalConditions {
    /// Conditions whose adjustment nets to zero.
    fn default() -> Self {
        Self {
            weather: Weather {
                condition: WeatherCondition::Cloudy,
                visibility: 60.0,
                temperature_c: 15.0,
            },
            traffic: Traffic {
                congestion: 50.0,
                active_incidents: 0,
            },
            events: LocalEvents {
                active_emergency: false,
                crowd_density: CrowdDensity::Low,
                nearby_events: 1,
            },
        }
    }
}

impl EnvironmentalConditions {
    /// Signed points added to a weighted score.
    ///
    /// # Examples
    /// ```
    /// use saferoute_scorer::{EnvironmentalConditions, WeatherCondition};
    ///
    /// let mut conditions = EnvironmentalConditions::default();
    /// assert_eq!(conditions.adjustment(), 0);
    /// conditions.weather.condition = WeatherCondition::Fog;
    /// conditions.weather.visibility = 30.0;
    /// assert_eq!(conditions.adjustment(), -9);
    /// ```
    #[must_use]
    pub fn adjustment(&self) -> i32 {
        let weather = match self.weather.condition {
            WeatherCondition::Clear => 1,
            WeatherCondition::Cloudy => 0,
            WeatherCondition::Rain => -3,
            WeatherCondition::Fog => -4,
        };
        let visibility = if self.weather.visibility < 50.0 {
            -5
        } else if self.weather.visibility > 80.0 {
            2
        } else {
            0
        };
        let temperature = if self.weather.temperature_c < -5.0 || self.weather.temperature_c > 35.0
        {
            -1
        } else {
            0
        };
        let congestion = if self.traffic.congestion > 70.0 {
            1
        } else if self.traffic.congestion < 20.0 {
            -1
        } else {
            0
        };
        let incidents = i32::try_from(self.traffic.active_incidents)
            .unwrap_or(i32::MAX)
            .saturating_mul(-2);
        let emergency = if self.events.active_emergency { -3 } else { 0 };
        let crowd = match self.events.crowd_density {
            CrowdDensity::Low => -1,
            CrowdDensity::Medium => 1,
            CrowdDensity::High => 2,
        };
        let events = i32::try_from(self.events.nearby_events.min(2)).unwrap_or(2);
        [weather, visibility, temperature, congestion, emergency, crowd, events]
            .into_iter()
            .fold(incidents, i32::saturating_add)
    }
}

/// Source of live conditions at a place and time.
pub trait EnvironmentProvider: Send + Sync {
    /// Conditions at `point` at local time `at`.
    fn conditions(&self, point: &GeoPoint, at: NaiveDateTime) -> EnvironmentalConditions;
}

impl<E: EnvironmentProvider + ?Sized> EnvironmentProvider for std::sync::Arc<E> {
    fn conditions(&self, point: &GeoPoint, at: NaiveDateTime) -> EnvironmentalConditions {
        (**self).conditions(point, at)
    }
}

/// Provider that always reports the same conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedEnvironment(pub EnvironmentalConditions);

impl EnvironmentProvider for FixedEnvironment {
    fn conditions(&self, _point: &GeoPoint, _at: NaiveDateTime) -> EnvironmentalConditions {
        self.0
    }
}

/// Deterministic pseudo-random conditions keyed by hour and ~1 km cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedEnvironment;

impl SimulatedEnvironment {
    #[expect(clippy::float_arithmetic, reason = "degree bucketing")]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "coordinates are bounded so buckets fit in i64"
    )]
    fn seed(point: &GeoPoint, at: NaiveDateTime) -> u64 {
        let lat = (point.lat * 100.0).floor() as i64;
        let lng = (point.lng * 100.0).floor() as i64;
        let day = i64::from(at.date().num_days_from_ce());
        let hour = i64::from(at.hour());
        [lat, lng, day, hour]
            .into_iter()
            .fold(0xcbf2_9ce4_8422_2325_u64, |acc, part| {
                (acc ^ part.cast_unsigned()).wrapping_mul(0x0100_0000_01b3)
            })
    }
}

impl EnvironmentProvider for SimulatedEnvironment {
    fn conditions(&self, point: &GeoPoint, at: NaiveDateTime) -> EnvironmentalConditions {
        let mut rng = ChaCha8Rng::seed_from_u64(Self::seed(point, at));
        let hour = at.hour();
        let condition = match rng.gen_range(0..20) {
            0..=9 => WeatherCondition::Clear,
            10..=14 => WeatherCondition::Cloudy,
            15..=17 => WeatherCondition::Rain,
            _ => WeatherCondition::Fog,
        };
        let visibility = match condition {
            WeatherCondition::Fog => rng.gen_range(20.0..50.0),
            WeatherCondition::Rain => rng.gen_range(40.0..80.0),
            WeatherCondition::Clear | WeatherCondition::Cloudy => rng.gen_range(60.0..100.0),
        };
        let rush_hour = matches!(hour, 7..=9 | 16..=19);
        let congestion = if rush_hour {
            rng.gen_range(60.0..95.0)
        } else {
            rng.gen_range(10.0..60.0)
        };
        let crowd_density = match hour {
            0..=5 => CrowdDensity::Low,
            11..=14 | 17..=21 => CrowdDensity::High,
            _ => CrowdDensity::Medium,
        };
        EnvironmentalConditions {
            weather: Weather {
                condition,
                visibility,
                temperature_c: rng.gen_range(6.0..26.0),
            },
            traffic: Traffic {
                congestion,
                active_incidents: u32::from(rng.gen_bool(0.2)),
            },
            events: LocalEvents {
                active_emergency: rng.gen_bool(0.03),
                crowd_density,
                nearby_events: rng.gen_range(0..=3),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use saferoute_core::test_support::local_time;

    #[fixture]
    fn calm() -> EnvironmentalConditions {
        EnvironmentalConditions::default()
    }

    #[rstest]
    fn default_conditions_are_neutral(calm: EnvironmentalConditions) {
        assert_eq!(calm.adjustment(), 0);
    }

    #[rstest]
    #[case(WeatherCondition::Clear, 1)]
    #[case(WeatherCondition::Rain, -3)]
    #[case(WeatherCondition::Fog, -4)]
    fn weather_adjusts(
        mut calm: EnvironmentalConditions,
        #[case] condition: WeatherCondition,
        #[case] expected: i32,
    ) {
        calm.weather.condition = condition;
        assert_eq!(calm.adjustment(), expected);
    }

    #[rstest]
    #[case(49.0, -5)]
    #[case(81.0, 2)]
    #[case(80.0, 0)]
    fn visibility_adjusts(
        mut calm: EnvironmentalConditions,
        #[case] visibility: f64,
        #[case] expected: i32,
    ) {
        calm.weather.visibility = visibility;
        assert_eq!(calm.adjustment(), expected);
    }

    #[rstest]
    #[case(-6.0, -1)]
    #[case(36.0, -1)]
    #[case(35.0, 0)]
    fn temperature_extremes_cost_a_point(
        mut calm: EnvironmentalConditions,
        #[case] temperature: f64,
        #[case] expected: i32,
    ) {
        calm.weather.temperature_c = temperature;
        assert_eq!(calm.adjustment(), expected);
    }

    #[rstest]
    fn traffic_events_and_crowds_combine(mut calm: EnvironmentalConditions) {
        calm.traffic.congestion = 80.0;
        calm.traffic.active_incidents = 2;
        calm.events.active_emergency = true;
        calm.events.crowd_density = CrowdDensity::High;
        calm.events.nearby_events = 5;
        // +1 - 4 - 3 + 2 + 2
        assert_eq!(calm.adjustment(), -2);
    }

    #[rstest]
    fn simulation_is_stable_within_the_hour() {
        let point = GeoPoint::new(37.7599, -122.4148);
        let env = SimulatedEnvironment;
        let a = env.conditions(&point, local_time(2024, 3, 12, 14, 5));
        let b = env.conditions(&point, local_time(2024, 3, 12, 14, 55));
        assert_eq!(a, b);
    }
}
