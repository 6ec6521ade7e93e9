//! Aggregation of per-segment scores into one route score.

use chrono::NaiveDateTime;
use saferoute_core::{ComponentWeights, SafetyScore, ScoreComponents, clamp_score};

use crate::assessment::explain_route;

/// Combine segment scores into a route score.
///
/// Each item pairs a segment length in metres with its score. The overall
/// score is weighted by distance, falling back to a plain mean when every
/// segment has zero length. Components and confidence are plain means and
/// incident counts are summed. Returns `None` for an empty input.
///
/// # Examples
/// ```
/// use chrono::NaiveDateTime;
/// use saferoute_core::{ComponentWeights, SafetyScore, ScoreComponents};
/// use saferoute_scorer::aggregate_route_scores;
///
/// let segment = |overall| SafetyScore {
///     overall,
///     components: ScoreComponents {
///         crime_risk: 50.0,
///         time_factor: 50.0,
///         population_density: 50.0,
///         lighting_level: 50.0,
///     },
///     historical_incidents: 3,
///     confidence_level: 70,
///     explanation: String::new(),
///     factors: Vec::new(),
///     environmental_adjustment: 0,
///     last_calculated: NaiveDateTime::default(),
/// };
/// let (short, long) = (segment(80), segment(40));
/// let route = aggregate_route_scores(
///     [(100.0, &short), (300.0, &long)],
///     &ComponentWeights::default(),
///     NaiveDateTime::default(),
/// )
/// .unwrap();
/// assert_eq!(route.overall, 50);
/// assert_eq!(route.historical_incidents, 6);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "weighted means")]
pub fn aggregate_route_scores<'a, I>(
    scored: I,
    weights: &ComponentWeights,
    calculated_at: NaiveDateTime,
) -> Option<SafetyScore>
where
    I: IntoIterator<Item = (f64, &'a SafetyScore)>,
{
    let scored: Vec<(f64, &SafetyScore)> = scored.into_iter().collect();
    if scored.is_empty() {
        return None;
    }
    let count = f64::from(u32::try_from(scored.len()).unwrap_or(u32::MAX));
    let mean = |f: &dyn Fn(&SafetyScore) -> f64| {
        scored.iter().map(|(_, s)| f(s)).sum::<f64>() / count
    };

    let total_distance: f64 = scored.iter().map(|(d, _)| d.max(0.0)).sum();
    let overall = if total_distance > 0.0 {
        scored
            .iter()
            .map(|(d, s)| f64::from(s.overall) * d.max(0.0))
            .sum::<f64>()
            / total_distance
    } else {
        mean(&|s| f64::from(s.overall))
    };
    let components = ScoreComponents {
        crime_risk: mean(&|s| s.components.crime_risk),
        time_factor: mean(&|s| s.components.time_factor),
        population_density: mean(&|s| s.components.population_density),
        lighting_level: mean(&|s| s.components.lighting_level),
    };
    let mut route = SafetyScore {
        overall: clamp_score(overall),
        components,
        historical_incidents: scored.iter().map(|(_, s)| s.historical_incidents).sum(),
        confidence_level: clamp_score(mean(&|s| f64::from(s.confidence_level))),
        explanation: String::new(),
        factors: components.factors(weights),
        environmental_adjustment: 0,
        last_calculated: calculated_at,
    };
    let segment_scores: Vec<u8> = scored.iter().map(|(_, s)| s.overall).collect();
    route.explanation = explain_route(&route, &segment_scores);
    Some(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use saferoute_core::FactorType;

    fn score(overall: u8, crime_risk: f64, confidence_level: u8) -> SafetyScore {
        let components = ScoreComponents {
            crime_risk,
            time_factor: 90.0,
            population_density: 85.0,
            lighting_level: 85.0,
        };
        SafetyScore {
            overall,
            components,
            historical_incidents: 10,
            confidence_level,
            explanation: String::new(),
            factors: components.factors(&ComponentWeights::default()),
            environmental_adjustment: 0,
            last_calculated: NaiveDateTime::default(),
        }
    }

    #[fixture]
    fn segments() -> Vec<SafetyScore> {
        vec![score(80, 80.0, 80), score(40, 20.0, 70)]
    }

    #[rstest]
    fn overall_is_distance_weighted(segments: Vec<SafetyScore>) {
        let route = aggregate_route_scores(
            [100.0, 300.0].into_iter().zip(&segments),
            &ComponentWeights::default(),
            NaiveDateTime::default(),
        )
        .expect("non-empty");
        assert_eq!(route.overall, 50);
        assert!((route.components.crime_risk - 50.0).abs() < 1e-9);
        assert_eq!(route.historical_incidents, 20);
        assert_eq!(route.confidence_level, 75);
    }

    #[rstest]
    fn zero_length_route_uses_plain_mean(segments: Vec<SafetyScore>) {
        let route = aggregate_route_scores(
            [0.0, 0.0].into_iter().zip(&segments),
            &ComponentWeights::default(),
            NaiveDateTime::default(),
        )
        .expect("non-empty");
        assert_eq!(route.overall, 60);
    }

    #[rstest]
    fn explanation_counts_segments(segments: Vec<SafetyScore>) {
        let mut with_low = segments;
        with_low.push(score(30, 10.0, 70));
        let route = aggregate_route_scores(
            [100.0, 100.0, 100.0].into_iter().zip(&with_low),
            &ComponentWeights::default(),
            NaiveDateTime::default(),
        )
        .expect("non-empty");
        assert!(
            route
                .explanation
                .contains("1 of 3 segments score below 40 and 1 score 70 or above"),
            "{}",
            route.explanation
        );
        assert!(route.explanation.contains("crime risk"));
        assert_eq!(
            route.dominant_negative_factor().map(|f| f.factor_type),
            Some(FactorType::CrimeRisk)
        );
    }

    #[rstest]
    fn empty_input_yields_none() {
        assert!(
            aggregate_route_scores(
                std::iter::empty::<(f64, &SafetyScore)>(),
                &ComponentWeights::default(),
                NaiveDateTime::default(),
            )
            .is_none()
        );
    }
}
