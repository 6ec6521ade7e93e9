//! Human-facing output around a [`SafetyScore`]: explanation text,
//! recommendations, alerts and calculation metadata.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use saferoute_core::{
    CrimeRecord, DayPeriod, FactorFlags, FactorType, RiskLevel, SafetyFactor,
    SafetyScore, TimeContext, TravelMode,
};

use crate::components::{CellSummary, data_age_days};

/// Component value below which crime-specific advice is given.
const LOW_CRIME_SCORE: f64 = 40.0;
/// Component value below which lighting advice is given at night.
const POOR_LIGHTING: f64 = 70.0;
/// Component value below which an area counts as sparsely populated.
const SPARSE_POPULATION: f64 = 65.0;

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    /// Informational.
    Info,
    /// Take extra care.
    Warning,
    /// Reconsider the trip.
    Critical,
}

/// A condition the visitor should know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyAlert {
    /// Severity.
    pub level: AlertLevel,
    /// Message shown to the visitor.
    pub message: String,
}

impl SafetyAlert {
    fn new(level: AlertLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// How a score was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreMetadata {
    /// Wall time spent scoring, in milliseconds.
    pub calculation_time_ms: f64,
    /// Tags of the data sources consulted.
    pub data_sources_used: Vec<String>,
    /// Notes on what raised or lowered confidence.
    pub confidence_factors: Vec<String>,
}

/// Result of scoring one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationAssessment {
    /// The score.
    pub score: SafetyScore,
    /// Actionable advice, most relevant first.
    pub recommendations: Vec<String>,
    /// Conditions worth flagging.
    pub alerts: Vec<SafetyAlert>,
    /// Calculation metadata.
    pub metadata: ScoreMetadata,
}

fn verdict(overall: u8) -> &'static str {
    match overall {
        70..=u8::MAX => "generally safe",
        40..=69 => "moderately safe; stay alert",
        _ => "higher risk; take extra precautions",
    }
}

fn concern(factor: Option<&SafetyFactor>) -> String {
    factor.map_or_else(
        || "No single factor stands out.".to_owned(),
        |f| format!("Main concern: {}.", f.factor_type.label()),
    )
}

/// Plain-language explanation for a single location.
#[must_use]
pub fn explain_location(score: &SafetyScore, summary: Option<&CellSummary>) -> String {
    let place = summary.map_or("This location", |s| s.neighborhood.as_str());
    let history = match summary {
        Some(s) => format!(
            "{} incidents recorded nearby ({} risk area).",
            s.total_incidents, s.risk_level
        ),
        None => "No crime records cover this location.".to_owned(),
    };
    format!(
        "{place} scores {} and is {}. {history} {}",
        score.overall,
        verdict(score.overall),
        concern(score.dominant_negative_factor())
    )
}

/// Plain-language explanation for a route.
#[must_use]
pub fn explain_route(score: &SafetyScore, segment_scores: &[u8]) -> String {
    let low = segment_scores.iter().filter(|s| **s < 40).count();
    let high = segment_scores.iter().filter(|s| **s >= 70).count();
    format!(
        "Route scores {} and is {}. {low} of {} segments score below 40 and {high} score 70 or above. {}",
        score.overall,
        verdict(score.overall),
        segment_scores.len(),
        concern(score.dominant_negative_factor())
    )
}

fn factor_value(score: &SafetyScore, factor: FactorType) -> f64 {
    score.components.value(factor)
}

/// Advice for the visitor, derived from the weakest components.
#[must_use]
pub fn recommendations(
    score: &SafetyScore,
    summary: Option<&CellSummary>,
    context: Option<&TimeContext>,
    flags: &FactorFlags,
) -> Vec<String> {
    let night = context.is_some_and(|c| c.period().is_night());
    let mut advice = Vec::new();
    if night && factor_value(score, FactorType::LightingLevel) < POOR_LIGHTING {
        advice.push("Stick to well-lit main streets after dark.".to_owned());
    }
    if factor_value(score, FactorType::CrimeRisk) < LOW_CRIME_SCORE {
        advice.push("Avoid isolated side streets and stay where other people are.".to_owned());
    }
    if factor_value(score, FactorType::PopulationDensity) < SPARSE_POPULATION {
        advice.push("The area is sparsely populated; avoid isolated stretches.".to_owned());
    }
    match (flags.travel_mode, summary) {
        (Some(TravelMode::Walking), Some(s)) if s.has_petty => {
            advice.push("Keep valuables out of sight; pickpocketing is reported here.".to_owned());
        }
        (Some(TravelMode::Driving), Some(s)) if s.has_vehicular => {
            advice.push(
                "Park in attended or well-lit lots and leave nothing visible in the car."
                    .to_owned(),
            );
        }
        _ => {}
    }
    if night && score.overall < 60 {
        advice.push("Share your route with someone you trust.".to_owned());
    }
    if advice.is_empty() {
        advice.push("No specific precautions beyond normal awareness.".to_owned());
    }
    advice
}

/// Alerts for the cell risk level, nearby risky areas and overnight travel.
#[must_use]
pub fn alerts(
    summary: Option<&CellSummary>,
    nearby_risky: &[Arc<CrimeRecord>],
    radius_km: f64,
    context: Option<&TimeContext>,
) -> Vec<SafetyAlert> {
    let mut alerts = Vec::new();
    match summary.map(|s| s.risk_level) {
        Some(RiskLevel::Critical) => alerts.push(SafetyAlert::new(
            AlertLevel::Critical,
            "Critical crime risk in this area.",
        )),
        Some(RiskLevel::High) => alerts.push(SafetyAlert::new(
            AlertLevel::Warning,
            "High crime risk in this area.",
        )),
        _ => {}
    }
    let areas: BTreeSet<&str> = nearby_risky
        .iter()
        .map(|r| r.location.neighborhood.as_str())
        .collect();
    if !areas.is_empty() {
        let names: Vec<&str> = areas.into_iter().collect();
        alerts.push(SafetyAlert::new(
            AlertLevel::Warning,
            format!(
                "High-risk areas within {radius_km} km: {}.",
                names.join(", ")
            ),
        ));
    }
    if context.is_some_and(|c| c.period() == DayPeriod::Overnight) {
        alerts.push(SafetyAlert::new(
            AlertLevel::Info,
            "Overnight travel: fewer people and services are around.",
        ));
    }
    alerts
}

/// Notes explaining the confidence level.
#[must_use]
pub fn confidence_factors(
    score: &SafetyScore,
    summary: Option<&CellSummary>,
    today: NaiveDate,
) -> Vec<String> {
    let mut notes = Vec::new();
    match summary {
        Some(s) => {
            notes.push(format!("{} crime records in cell", s.record_count));
            if let Some(mean) = s.mean_confidence {
                notes.push(format!("mean statistic confidence {mean:.0}"));
            }
            notes.push(format!("newest data {} days old", data_age_days(s, today)));
        }
        None => notes.push("no crime records; defaults used".to_owned()),
    }
    let available = score
        .factors
        .iter()
        .filter(|f| f.value > 0.0)
        .count();
    notes.push(format!(
        "{available} of {} factors non-zero",
        score.factors.len()
    ));
    notes
}
