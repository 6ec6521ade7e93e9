//! Scoring context: when a location is visited and which factors apply.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::{FactorType, TravelMode};

/// Hour at which the weekend-evening penalty starts.
const WEEKEND_EVENING_START: u32 = 20;

/// Coarse bucket of the hour of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    /// 06:00 to 17:59.
    Day,
    /// 18:00 to 21:59.
    Evening,
    /// 22:00 to 05:59.
    Overnight,
}

impl DayPeriod {
    /// Bucket an hour in `0..24`.
    #[must_use]
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            6..=17 => Self::Day,
            18..=21 => Self::Evening,
            _ => Self::Overnight,
        }
    }

    /// Whether the period lies outside daylight hours.
    #[must_use]
    pub const fn is_night(self) -> bool {
        !matches!(self, Self::Day)
    }
}

/// Local wall-clock time of a visit.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use saferoute_core::{DayPeriod, TimeContext};
///
/// let friday_night = NaiveDate::from_ymd_opt(2024, 3, 15)
///     .and_then(|d| d.and_hms_opt(21, 30, 0))
///     .unwrap();
/// let context = TimeContext::new(friday_night);
/// assert_eq!(context.period(), DayPeriod::Evening);
/// assert!(context.is_weekend_evening());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeContext {
    /// Local date and time.
    pub local_time: NaiveDateTime,
    /// Whether the day is a public holiday.
    #[serde(default)]
    pub is_holiday: bool,
}

impl TimeContext {
    /// Context for an ordinary day.
    #[must_use]
    pub const fn new(local_time: NaiveDateTime) -> Self {
        Self {
            local_time,
            is_holiday: false,
        }
    }

    /// Mark the day as a holiday.
    #[must_use]
    pub const fn with_holiday(mut self, is_holiday: bool) -> Self {
        self.is_holiday = is_holiday;
        self
    }

    /// Hour of day in `0..24`.
    #[must_use]
    pub fn hour(&self) -> u32 {
        self.local_time.hour()
    }

    /// Day of the week.
    #[must_use]
    pub fn weekday(&self) -> Weekday {
        self.local_time.weekday()
    }

    /// Bucket of the current hour.
    #[must_use]
    pub fn period(&self) -> DayPeriod {
        DayPeriod::from_hour(self.hour())
    }

    /// Friday, Saturday or a holiday, at or after 20:00.
    #[must_use]
    pub fn is_weekend_evening(&self) -> bool {
        let weekendish = self.is_holiday || matches!(self.weekday(), Weekday::Fri | Weekday::Sat);
        weekendish && self.hour() >= WEEKEND_EVENING_START
    }
}

/// Which components to compute and how the visitor travels.
///
/// Disabled components take their documented defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorFlags {
    /// Include the crime component.
    pub crime: bool,
    /// Include the time-of-day component.
    pub time: bool,
    /// Include the population component.
    pub population: bool,
    /// Include the lighting component.
    pub lighting: bool,
    /// How the visitor travels, if known.
    pub travel_mode: Option<TravelMode>,
}

impl Default for FactorFlags {
    fn default() -> Self {
        Self {
            crime: true,
            time: true,
            population: true,
            lighting: true,
            travel_mode: None,
        }
    }
}

impl FactorFlags {
    /// Set the travel mode.
    #[must_use]
    pub const fn with_travel_mode(mut self, travel_mode: TravelMode) -> Self {
        self.travel_mode = Some(travel_mode);
        self
    }

    /// Disable one component.
    #[must_use]
    pub const fn without(mut self, factor_type: FactorType) -> Self {
        match factor_type {
            FactorType::CrimeRisk => self.crime = false,
            FactorType::TimeFactor => self.time = false,
            FactorType::PopulationDensity => self.population = false,
            FactorType::LightingLevel => self.lighting = false,
        }
        self
    }

    /// Whether `factor_type` is computed.
    #[must_use]
    pub const fn includes(&self, factor_type: FactorType) -> bool {
        match factor_type {
            FactorType::CrimeRisk => self.crime,
            FactorType::TimeFactor => self.time,
            FactorType::PopulationDensity => self.population,
            FactorType::LightingLevel => self.lighting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn at(day: u32, hour: u32) -> TimeContext {
        // March 2024: the 11th is a Monday, the 15th a Friday.
        let time = NaiveDate::from_ymd_opt(2024, 3, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .expect("valid test date");
        TimeContext::new(time)
    }

    #[rstest]
    #[case(5, DayPeriod::Overnight)]
    #[case(6, DayPeriod::Day)]
    #[case(17, DayPeriod::Day)]
    #[case(18, DayPeriod::Evening)]
    #[case(21, DayPeriod::Evening)]
    #[case(22, DayPeriod::Overnight)]
    fn buckets_hours(#[case] hour: u32, #[case] expected: DayPeriod) {
        assert_eq!(DayPeriod::from_hour(hour), expected);
    }

    #[rstest]
    #[case(15, 20, false, true)]
    #[case(16, 23, false, true)]
    #[case(15, 19, false, false)]
    #[case(11, 22, false, false)]
    #[case(11, 22, true, true)]
    fn weekend_evening(
        #[case] day: u32,
        #[case] hour: u32,
        #[case] holiday: bool,
        #[case] expected: bool,
    ) {
        assert_eq!(
            at(day, hour).with_holiday(holiday).is_weekend_evening(),
            expected
        );
    }

    #[rstest]
    fn flags_default_to_everything_enabled() {
        let flags = FactorFlags::default();
        assert!(FactorType::ALL.iter().all(|t| flags.includes(*t)));
        let without = flags.without(FactorType::LightingLevel);
        assert!(!without.includes(FactorType::LightingLevel));
        assert!(without.includes(FactorType::CrimeRisk));
    }
}
