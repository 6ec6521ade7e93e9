//! Engine configuration.

use std::time::Duration;

use chrono::TimeDelta;
use saferoute_core::ComponentWeights;

/// Default lifetime of a cached real-time score, in seconds.
const DEFAULT_CACHE_TTL_SECS: i64 = 5 * 60;

/// Default pause between background cache sweeps, in seconds.
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

/// Default radius searched for nearby high-risk areas, in kilometres.
pub const DEFAULT_NEARBY_RISK_RADIUS_KM: f64 = 1.0;

/// Configuration for [`SafetyScoringEngine`](crate::SafetyScoringEngine).
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use saferoute_scorer::EngineConfig;
///
/// let config = EngineConfig::default().with_sweep_interval(Duration::from_secs(5));
/// assert_eq!(config.sweep_interval, Duration::from_secs(5));
/// assert_eq!(config.cache_ttl.num_minutes(), 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// How long a real-time score stays cached, measured on the engine clock.
    pub cache_ttl: TimeDelta,
    /// Pause between background sweeps.
    pub sweep_interval: Duration,
    /// Radius used for nearby-risk alerts.
    pub nearby_risk_radius_km: f64,
    /// Weights of the overall blend.
    pub weights: ComponentWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: TimeDelta::seconds(DEFAULT_CACHE_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            nearby_risk_radius_km: DEFAULT_NEARBY_RISK_RADIUS_KM,
            weights: ComponentWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Set the cache lifetime.
    #[must_use]
    pub const fn with_cache_ttl(mut self, cache_ttl: TimeDelta) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    /// Set the background sweep interval.
    #[must_use]
    pub const fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Set the nearby-risk radius.
    #[must_use]
    pub const fn with_nearby_risk_radius_km(mut self, radius_km: f64) -> Self {
        self.nearby_risk_radius_km = radius_km;
        self
    }

    /// Replace the component weights.
    #[must_use]
    pub const fn with_weights(mut self, weights: ComponentWeights) -> Self {
        self.weights = weights;
        self
    }
}
