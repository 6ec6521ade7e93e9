//! Trend classification against per-risk-level baselines.

use serde::{Deserialize, Serialize};

use saferoute_core::{CrimeRecord, RiskLevel, Timeframe};

/// Change at or below which a record is improving, in percent.
pub const IMPROVING_THRESHOLD_PERCENT: f64 = -7.0;
/// Change at or above which a record is worsening, in percent.
pub const WORSENING_THRESHOLD_PERCENT: f64 = 10.0;

/// Expected incidents per record over six months for each risk level.
///
/// Hand-tuned constants with no statistical basis; the generator's volumes
/// are calibrated against them.
#[must_use]
pub const fn baseline_incidents(risk_level: RiskLevel) -> f64 {
    match risk_level {
        RiskLevel::Low => 6.0,
        RiskLevel::Medium => 12.0,
        RiskLevel::High => 22.0,
        RiskLevel::Critical => 34.0,
    }
}

/// Direction of a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Fewer incidents than the baseline.
    Improving,
    /// Within the tolerance band.
    Stable,
    /// More incidents than the baseline.
    Worsening,
}

impl TrendDirection {
    /// Classify a percentage change.
    #[must_use]
    pub fn from_change(change_percent: f64) -> Self {
        if change_percent <= IMPROVING_THRESHOLD_PERCENT {
            Self::Improving
        } else if change_percent >= WORSENING_THRESHOLD_PERCENT {
            Self::Worsening
        } else {
            Self::Stable
        }
    }
}

/// Change of a record's incident volume relative to its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// Classification of the change.
    pub direction: TrendDirection,
    /// Signed change in percent, rounded to one decimal place.
    pub change_percent: f64,
}

impl Trend {
    /// Build a trend from a change in percent, rounding to one decimal place.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "rounding to one decimal place")]
    pub fn from_change_percent(change: f64) -> Self {
        let change_percent = (change * 10.0).round() / 10.0;
        Self {
            direction: TrendDirection::from_change(change_percent),
            change_percent,
        }
    }
}

/// Compare `record`'s incidents with the baseline for its risk level,
/// scaled to `timeframe`.
///
/// `record` must already be expressed in `timeframe`.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "percentage change of incident totals"
)]
pub fn calculate_trend(record: &CrimeRecord, timeframe: Timeframe) -> Trend {
    let baseline = baseline_incidents(record.risk_level) * timeframe.multiplier();
    let total = record.total_incidents() as f64;
    Trend::from_change_percent((total - baseline) / baseline * 100.0)
}

/// Trend summary for one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaTrend {
    /// Neighborhood name.
    pub area: String,
    /// Risk band of the area.
    pub risk_level: RiskLevel,
    /// Incidents across the area's records in the window.
    pub total_incidents: u64,
    /// Trend of the area's combined records.
    pub trend: Trend,
}
