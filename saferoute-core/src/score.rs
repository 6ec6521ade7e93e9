//! Safety scores, their weighted components and explanatory factors.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Clamp a raw score into `0..=100` and round it.
///
/// Non-finite input yields `0`.
///
/// # Examples
/// ```
/// use saferoute_core::clamp_score;
///
/// assert_eq!(clamp_score(49.5), 50);
/// assert_eq!(clamp_score(-3.0), 0);
/// assert_eq!(clamp_score(f64::NAN), 0);
/// ```
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped into 0..=100 before the cast"
)]
pub fn clamp_score(raw: f64) -> u8 {
    if !raw.is_finite() {
        return 0;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

/// Relative weight of each component in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    /// Weight of [`ScoreComponents::crime_risk`].
    pub crime_risk: f64,
    /// Weight of [`ScoreComponents::time_factor`].
    pub time_factor: f64,
    /// Weight of [`ScoreComponents::population_density`].
    pub population_density: f64,
    /// Weight of [`ScoreComponents::lighting_level`].
    pub lighting_level: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            crime_risk: 0.4,
            time_factor: 0.3,
            population_density: 0.2,
            lighting_level: 0.1,
        }
    }
}

impl ComponentWeights {
    /// Weight assigned to `factor_type`.
    #[must_use]
    pub const fn weight(&self, factor_type: FactorType) -> f64 {
        match factor_type {
            FactorType::CrimeRisk => self.crime_risk,
            FactorType::TimeFactor => self.time_factor,
            FactorType::PopulationDensity => self.population_density,
            FactorType::LightingLevel => self.lighting_level,
        }
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        FactorType::ALL.iter().map(|t| self.weight(*t)).sum()
    }
}

/// The four scored components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorType {
    /// Historical crime volume and severity.
    CrimeRisk,
    /// Hour of day and calendar effects.
    TimeFactor,
    /// Population and business activity.
    PopulationDensity,
    /// Street lighting.
    LightingLevel,
}

impl FactorType {
    /// Components in the order they are reported.
    pub const ALL: [Self; 4] = [
        Self::CrimeRisk,
        Self::TimeFactor,
        Self::PopulationDensity,
        Self::LightingLevel,
    ];

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CrimeRisk => "crime risk",
            Self::TimeFactor => "time of day",
            Self::PopulationDensity => "population density",
            Self::LightingLevel => "lighting",
        }
    }
}

/// Direction in which a factor moves the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorImpact {
    /// Value at or above [`FactorImpact::POSITIVE_THRESHOLD`].
    Positive,
    /// Value at or above [`FactorImpact::NEUTRAL_THRESHOLD`].
    Neutral,
    /// Everything lower.
    Negative,
}

impl FactorImpact {
    /// Lowest value considered positive.
    pub const POSITIVE_THRESHOLD: f64 = 70.0;
    /// Lowest value considered neutral.
    pub const NEUTRAL_THRESHOLD: f64 = 40.0;

    /// Classify a component value.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        if value >= Self::POSITIVE_THRESHOLD {
            Self::Positive
        } else if value >= Self::NEUTRAL_THRESHOLD {
            Self::Neutral
        } else {
            Self::Negative
        }
    }
}

/// One component's contribution to a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyFactor {
    /// Component described.
    #[serde(rename = "type")]
    pub factor_type: FactorType,
    /// Direction of the contribution.
    pub impact: FactorImpact,
    /// Weight in the overall blend.
    pub weight: f64,
    /// Component value, `0..=100`.
    pub value: f64,
}

/// Component values, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    /// Crime component.
    pub crime_risk: f64,
    /// Time-of-day component.
    pub time_factor: f64,
    /// Population component.
    pub population_density: f64,
    /// Lighting component.
    pub lighting_level: f64,
}

impl ScoreComponents {
    /// Value of `factor_type`.
    #[must_use]
    pub const fn value(&self, factor_type: FactorType) -> f64 {
        match factor_type {
            FactorType::CrimeRisk => self.crime_risk,
            FactorType::TimeFactor => self.time_factor,
            FactorType::PopulationDensity => self.population_density,
            FactorType::LightingLevel => self.lighting_level,
        }
    }

    /// Weighted blend with the default weights.
    ///
    /// # Examples
    /// ```
    /// use saferoute_core::ScoreComponents;
    ///
    /// let components = ScoreComponents {
    ///     crime_risk: 70.0,
    ///     time_factor: 80.0,
    ///     population_density: 70.0,
    ///     lighting_level: 80.0,
    /// };
    /// assert_eq!(components.weighted_overall(), 74);
    /// ```
    #[must_use]
    pub fn weighted_overall(&self) -> u8 {
        self.weighted_overall_with(&ComponentWeights::default())
    }

    /// Weighted blend with explicit weights.
    #[must_use]
    pub fn weighted_overall_with(&self, weights: &ComponentWeights) -> u8 {
        clamp_score(
            FactorType::ALL
                .iter()
                .map(|t| weighted(self.value(*t), weights.weight(*t)))
                .sum(),
        )
    }

    /// One factor entry per component.
    #[must_use]
    pub fn factors(&self, weights: &ComponentWeights) -> Vec<SafetyFactor> {
        FactorType::ALL
            .iter()
            .map(|t| SafetyFactor {
                factor_type: *t,
                impact: FactorImpact::from_value(self.value(*t)),
                weight: weights.weight(*t),
                value: self.value(*t),
            })
            .collect()
    }
}

#[expect(clippy::float_arithmetic, reason = "weighted blend")]
fn weighted(value: f64, weight: f64) -> f64 {
    value * weight
}

/// Composite safety assessment; higher is safer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyScore {
    /// Final score after any environmental adjustment, `0..=100`.
    pub overall: u8,
    /// Component values.
    #[serde(flatten)]
    pub components: ScoreComponents,
    /// Incidents observed in the scored cell.
    pub historical_incidents: u64,
    /// Confidence in the score, `0..=100`.
    pub confidence_level: u8,
    /// Plain-language summary.
    pub explanation: String,
    /// Per-component breakdown.
    pub factors: Vec<SafetyFactor>,
    /// Signed points added after the weighted blend.
    pub environmental_adjustment: i32,
    /// Local time the score was last computed or refreshed.
    pub last_calculated: NaiveDateTime,
}

impl SafetyScore {
    /// Replace the environmental adjustment, recomputing `overall` from
    /// `base` (the unadjusted weighted blend).
    #[must_use]
    pub fn with_adjustment(mut self, base: u8, adjustment: i32) -> Self {
        self.overall = clamp_score(f64::from(i32::from(base).saturating_add(adjustment)));
        self.environmental_adjustment = adjustment;
        self
    }

    /// Weakest component whose impact is negative, if any.
    #[must_use]
    pub fn dominant_negative_factor(&self) -> Option<&SafetyFactor> {
        self.factors
            .iter()
            .filter(|f| f.impact == FactorImpact::Negative)
            .min_by(|a, b| a.value.total_cmp(&b.value))
    }
}
