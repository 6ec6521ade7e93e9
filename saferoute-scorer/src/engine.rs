//! The safety scoring engine.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use log::{debug, info};
use saferoute_core::{
    Clock, CrimeDataSource, FactorFlags, GridCellId, Location, Route, RouteSegment, SafetyScore,
    ScoringError, SystemClock, TimeContext,
};

use crate::assessment::{
    LocationAssessment, ScoreMetadata, alerts, confidence_factors, explain_location,
    recommendations,
};
use crate::cache::{CacheEntry, CachePoisoned, QuantizedKey, ScoreCache, SweepReport};
use crate::components::{CellSummary, compute_components, confidence_level};
use crate::config::EngineConfig;
use crate::environment::{EnvironmentProvider, SimulatedEnvironment};
use crate::error::RefreshError;
use crate::refresher::RefreshWorker;
use crate::route::aggregate_route_scores;

/// Tag reported when the caller supplied lighting or neighbourhood data.
const LOCATION_METADATA_SOURCE: &str = "location_metadata";
/// Tag reported when the caller supplied a time context.
const TIME_CONTEXT_SOURCE: &str = "time_context";

/// Scores locations and routes from a [`CrimeDataSource`].
///
/// The engine owns a real-time score cache and, once started, a background
/// worker that keeps cached time factors current. Dropping the engine stops
/// the worker.
///
/// # Examples
/// ```
/// use saferoute_core::{CrimeDataSource, CrimeRecord, DataInitializationError, FactorFlags, GeoPoint, Location};
/// use saferoute_scorer::{EngineConfig, SafetyScoringEngine};
/// use std::sync::Arc;
///
/// struct Empty;
///
/// impl CrimeDataSource for Empty {
///     fn records_at(&self, _: &GeoPoint) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
///         Ok(Vec::new())
///     }
///     fn risky_records_within(&self, _: &GeoPoint, _: f64) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
///         Ok(Vec::new())
///     }
/// }
///
/// let engine = SafetyScoringEngine::new(Empty, EngineConfig::default());
/// let location = Location::new(37.7749, -122.4194)?;
/// let assessment = engine.score_location(&location, None, FactorFlags::default())?;
/// // Every component takes its default: 0.4*70 + 0.3*80 + 0.2*70 + 0.1*80.
/// assert_eq!(assessment.score.overall, 74);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SafetyScoringEngine<S> {
    source: S,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    environment: Arc<dyn EnvironmentProvider>,
    cache: Arc<ScoreCache>,
    worker: Mutex<Option<RefreshWorker>>,
}

impl<S: CrimeDataSource> SafetyScoringEngine<S> {
    /// Create an engine using the system clock and simulated environment.
    #[must_use]
    pub fn new(source: S, config: EngineConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let environment: Arc<dyn EnvironmentProvider> = Arc::new(SimulatedEnvironment);
        let cache = Self::build_cache(&config, &clock, &environment);
        Self {
            source,
            config,
            clock,
            environment,
            cache,
            worker: Mutex::new(None),
        }
    }

    fn build_cache(
        config: &EngineConfig,
        clock: &Arc<dyn Clock>,
        environment: &Arc<dyn EnvironmentProvider>,
    ) -> Arc<ScoreCache> {
        Arc::new(ScoreCache::new(
            Arc::clone(clock),
            Arc::clone(environment),
            config.weights,
            config.cache_ttl,
        ))
    }

    /// Replace the clock. Clears the real-time cache.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.stop_worker();
        self.cache = Self::build_cache(&self.config, &clock, &self.environment);
        self.clock = clock;
        self
    }

    /// Replace the environment provider. Clears the real-time cache.
    #[must_use]
    pub fn with_environment(mut self, environment: Arc<dyn EnvironmentProvider>) -> Self {
        self.stop_worker();
        self.cache = Self::build_cache(&self.config, &self.clock, &environment);
        self.environment = environment;
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The backing data source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Score one location.
    ///
    /// # Errors
    /// Returns [`ScoringError::InvalidInput`] for invalid coordinates and
    /// [`ScoringError::DataInitialization`] when the crime dataset could not
    /// be built. A cell without records is scored from defaults.
    pub fn score_location(
        &self,
        location: &Location,
        time_context: Option<&TimeContext>,
        flags: FactorFlags,
    ) -> Result<LocationAssessment, ScoringError> {
        let started = Instant::now();
        location.validate()?;
        let records = self.source.records_at(&location.point)?;
        let summary = CellSummary::from_records(&records);
        let score = self.compute_score(location, summary.as_ref(), time_context, &flags);

        let cell = GridCellId::containing(&location.point);
        let mut nearby = self
            .source
            .risky_records_within(&location.point, self.config.nearby_risk_radius_km)?;
        nearby.retain(|r| r.grid_cell_id != cell);

        let mut data_sources_used = Vec::new();
        if summary.is_some() {
            data_sources_used.push(self.source.source_name().to_owned());
        }
        if location.lighting_level.is_some() || location.neighborhood.is_some() {
            data_sources_used.push(LOCATION_METADATA_SOURCE.to_owned());
        }
        if time_context.is_some() {
            data_sources_used.push(TIME_CONTEXT_SOURCE.to_owned());
        }
        let today = self.clock.now().date();
        Ok(LocationAssessment {
            recommendations: recommendations(&score, summary.as_ref(), time_context, &flags),
            alerts: alerts(
                summary.as_ref(),
                &nearby,
                self.config.nearby_risk_radius_km,
                time_context,
            ),
            metadata: ScoreMetadata {
                calculation_time_ms: elapsed_ms(started),
                data_sources_used,
                confidence_factors: confidence_factors(&score, summary.as_ref(), today),
            },
            score,
        })
    }

    fn compute_score(
        &self,
        location: &Location,
        summary: Option<&CellSummary>,
        time_context: Option<&TimeContext>,
        flags: &FactorFlags,
    ) -> SafetyScore {
        let now = self.clock.now();
        let weights = &self.config.weights;
        let components = compute_components(location, summary, time_context, flags);
        let mut score = SafetyScore {
            overall: components.weighted_overall_with(weights),
            components,
            historical_incidents: summary.map_or(0, |s| s.total_incidents),
            confidence_level: confidence_level(summary, &components, now.date()),
            explanation: String::new(),
            factors: components.factors(weights),
            environmental_adjustment: 0,
            last_calculated: now,
        };
        score.explanation = explain_location(&score, summary);
        score
    }

    /// Score every segment at its midpoint and aggregate the route.
    ///
    /// Returns a copy of `route` with each segment's and the route's
    /// `safety_score` filled in. Segments are scored with the route's travel
    /// mode.
    ///
    /// # Errors
    /// Returns [`ScoringError::InvalidInput`] for an empty route, invalid
    /// endpoints or a negative or non-finite distance, and any error raised
    /// while scoring a segment.
    pub fn score_route(
        &self,
        route: &Route,
        time_context: Option<&TimeContext>,
    ) -> Result<Route, ScoringError> {
        route.validate()?;
        let flags = FactorFlags::default().with_travel_mode(route.travel_mode);
        let mut scored = route.clone();
        for segment in &mut scored.segments {
            let location = segment_location(segment);
            let assessment = self.score_location(&location, time_context, flags)?;
            segment.safety_score = Some(assessment.score);
        }
        scored.safety_score = aggregate_route_scores(
            scored
                .segments
                .iter()
                .filter_map(|s| s.safety_score.as_ref().map(|score| (s.distance_m, score))),
            &self.config.weights,
            self.clock.now(),
        );
        debug!(
            "scored route {} ({} segments)",
            scored.id,
            scored.segments.len()
        );
        Ok(scored)
    }

    /// Real-time score for `location`, served from the cache when fresh.
    ///
    /// A miss, an expired entry or `force_refresh` runs the full algorithm
    /// at `time_context`, or at the engine clock's current time when no
    /// context is given. A cache hit, like a background sweep, recomputes
    /// the time factor and environmental adjustment against the clock.
    ///
    /// # Errors
    /// Returns [`ScoringError::InvalidInput`] for invalid coordinates,
    /// [`ScoringError::DataInitialization`] when the dataset could not be
    /// built on a miss, and [`ScoringError::Computation`] when the cache lock
    /// was poisoned.
    pub fn get_real_time_score(
        &self,
        location: &Location,
        time_context: Option<&TimeContext>,
        force_refresh: bool,
    ) -> Result<SafetyScore, ScoringError> {
        location.validate()?;
        let key = QuantizedKey::from_point(&location.point);
        let now = self.cache.now();
        let poisoned = |_: CachePoisoned| ScoringError::Computation {
            lat: location.point.lat,
            lng: location.point.lng,
            reason: "score cache lock poisoned".to_owned(),
        };

        if !force_refresh
            && let Some(entry) = self.cache.live_entry(key, now).map_err(poisoned)?
        {
            let score = self.cache.refresh(&entry, now);
            if !self
                .cache
                .write_back(key, entry.created_at, &score)
                .map_err(poisoned)?
            {
                debug!("cached score for {key:?} was replaced during refresh");
            }
            return Ok(score);
        }
        debug!("real-time cache miss for {key:?} (forced: {force_refresh})");

        let context = time_context.copied().unwrap_or_else(|| TimeContext::new(now));
        let flags = FactorFlags::default();
        let records = self.source.records_at(&location.point)?;
        let summary = CellSummary::from_records(&records);
        let base = self.compute_score(location, summary.as_ref(), Some(&context), &flags);
        let mut entry = CacheEntry {
            point: location.point,
            current: base.clone(),
            base,
            overnight_probability: summary.and_then(|s| s.overnight_probability),
            time_enabled: flags.time,
            is_holiday: context.is_holiday,
            created_at: now,
            expires_at: self.cache.expiry_for(now),
        };
        let score = self.cache.evaluate(&entry, &context, now);
        entry.current = score.clone();
        self.cache.insert(key, entry).map_err(poisoned)?;
        Ok(score)
    }

    /// Most recent cached real-time score for `location`, without
    /// refreshing it or checking expiry.
    #[must_use]
    pub fn cached_score(&self, location: &Location) -> Option<SafetyScore> {
        self.cache.peek(QuantizedKey::from_point(&location.point))
    }

    /// Run one cache sweep synchronously.
    pub fn sweep_cache(&self) -> SweepReport {
        self.cache.sweep()
    }

    /// Number of cached real-time scores, expired ones included until the
    /// next sweep.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached real-time score.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Start the background sweep worker. Does nothing when it is running.
    ///
    /// # Errors
    /// Returns [`RefreshError::Spawn`] when the worker thread cannot be
    /// created.
    pub fn start_background_refresh(&self) -> Result<(), RefreshError> {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            debug!("cache refresh worker already running");
            return Ok(());
        }
        *slot = Some(RefreshWorker::spawn(
            Arc::clone(&self.cache),
            self.config.sweep_interval,
        )?);
        Ok(())
    }

    /// Stop the background sweep worker. Does nothing when it is idle.
    pub fn stop_background_refresh(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            worker.stop();
        }
    }

    /// Whether the background sweep worker is running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl<S> SafetyScoringEngine<S> {
    fn stop_worker(&mut self) {
        let slot = self.worker.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(worker) = slot.take() {
            info!("stopping cache refresh worker");
            worker.stop();
        }
    }
}

impl<S> Drop for SafetyScoringEngine<S> {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

/// Location at which a segment is scored: its midpoint, carrying the
/// start's neighbourhood and the mean of any endpoint lighting levels.
fn segment_location(segment: &RouteSegment) -> Location {
    let mut location = Location::from_point(segment.midpoint());
    location.neighborhood.clone_from(&segment.start.neighborhood);
    location.lighting_level = match (segment.start.lighting_level, segment.end.lighting_level) {
        (Some(a), Some(b)) => Some(mean_of_two(a, b)),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    };
    location
}

#[expect(clippy::float_arithmetic, reason = "midpoint lighting")]
fn mean_of_two(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

#[expect(clippy::float_arithmetic, reason = "seconds to milliseconds")]
fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1_000.0
}
