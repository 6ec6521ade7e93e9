//! Time-bounded cache of real-time scores.
//!
//! Entries hold the unadjusted score plus what is needed to recompute the
//! time factor, so a hit or a sweep never consults crime data again. The
//! map lock is held only for reads and writes; refreshing happens on
//! snapshots and is written back only when the entry was not replaced in
//! the meantime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, warn};
use saferoute_core::{Clock, ComponentWeights, GeoPoint, SafetyScore, TimeContext};

use crate::components::time_factor;
use crate::environment::EnvironmentProvider;

/// Scale applied before rounding coordinates into a key (4 decimals).
const KEY_SCALE: f64 = 10_000.0;

/// Location rounded to four decimal degrees (about 11 m).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct QuantizedKey {
    lat: i64,
    lng: i64,
}

impl QuantizedKey {
    #[expect(clippy::float_arithmetic, reason = "coordinate quantization")]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "validated coordinates scaled by 1e4 fit in i64"
    )]
    pub(crate) fn from_point(point: &GeoPoint) -> Self {
        Self {
            lat: (point.lat * KEY_SCALE).round() as i64,
            lng: (point.lng * KEY_SCALE).round() as i64,
        }
    }
}

/// One cached real-time score.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub(crate) point: GeoPoint,
    /// Score without environmental adjustment, as first computed.
    pub(crate) base: SafetyScore,
    pub(crate) overnight_probability: Option<f64>,
    pub(crate) time_enabled: bool,
    pub(crate) is_holiday: bool,
    /// Most recently refreshed and adjusted score.
    pub(crate) current: SafetyScore,
    pub(crate) created_at: NaiveDateTime,
    pub(crate) expires_at: NaiveDateTime,
}

impl CacheEntry {
    fn is_live(&self, now: NaiveDateTime) -> bool {
        now < self.expires_at
    }
}

/// Outcome of one cache sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries removed because they had expired.
    pub evicted: usize,
    /// Live entries whose time factor and adjustment were refreshed.
    pub refreshed: usize,
}

/// The map lock was poisoned by a panicking thread.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CachePoisoned;

/// Shared between the engine and its refresh worker.
pub(crate) struct ScoreCache {
    entries: Mutex<HashMap<QuantizedKey, CacheEntry>>,
    clock: Arc<dyn Clock>,
    environment: Arc<dyn EnvironmentProvider>,
    weights: ComponentWeights,
    ttl: TimeDelta,
}

impl ScoreCache {
    pub(crate) fn new(
        clock: Arc<dyn Clock>,
        environment: Arc<dyn EnvironmentProvider>,
        weights: ComponentWeights,
        ttl: TimeDelta,
    ) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            environment,
            weights,
            ttl,
        }
    }

    pub(crate) fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub(crate) fn expiry_for(&self, created_at: NaiveDateTime) -> NaiveDateTime {
        created_at
            .checked_add_signed(self.ttl)
            .unwrap_or(NaiveDateTime::MAX)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<QuantizedKey, CacheEntry>>, CachePoisoned> {
        self.entries.lock().map_err(|_| CachePoisoned)
    }

    fn lock_recovering(&self) -> MutexGuard<'_, HashMap<QuantizedKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("score cache lock poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Clone of the entry for `key` if it has not expired at `now`.
    pub(crate) fn live_entry(
        &self,
        key: QuantizedKey,
        now: NaiveDateTime,
    ) -> Result<Option<CacheEntry>, CachePoisoned> {
        Ok(self.lock()?.get(&key).filter(|e| e.is_live(now)).cloned())
    }

    /// Most recent adjusted score for `key`, without refreshing it.
    pub(crate) fn peek(&self, key: QuantizedKey) -> Option<SafetyScore> {
        self.lock_recovering().get(&key).map(|e| e.current.clone())
    }

    pub(crate) fn insert(&self, key: QuantizedKey, entry: CacheEntry) -> Result<(), CachePoisoned> {
        self.lock()?.insert(key, entry);
        Ok(())
    }

    /// Store `score` as the current score unless the entry was replaced.
    pub(crate) fn write_back(
        &self,
        key: QuantizedKey,
        created_at: NaiveDateTime,
        score: &SafetyScore,
    ) -> Result<bool, CachePoisoned> {
        Ok(Self::write_back_locked(
            &mut *self.lock()?,
            key,
            created_at,
            score,
        ))
    }

    fn write_back_locked(
        entries: &mut HashMap<QuantizedKey, CacheEntry>,
        key: QuantizedKey,
        created_at: NaiveDateTime,
        score: &SafetyScore,
    ) -> bool {
        match entries.get_mut(&key) {
            Some(entry) if entry.created_at == created_at => {
                entry.current = score.clone();
                true
            }
            _ => false,
        }
    }

    /// Recompute the time factor and environmental adjustment at `now`.
    ///
    /// Crime, population and lighting components are carried over from the
    /// entry's base score, so lighting keeps the day floor or night cap of
    /// the hour the entry was created; only the time factor, the overall
    /// score and the environmental adjustment follow the clock.
    pub(crate) fn refresh(&self, entry: &CacheEntry, now: NaiveDateTime) -> SafetyScore {
        let context = TimeContext::new(now).with_holiday(entry.is_holiday);
        self.evaluate(entry, &context, now)
    }

    /// Adjusted score with the time factor and environment evaluated at
    /// `context`, stamped as calculated at `now`.
    pub(crate) fn evaluate(
        &self,
        entry: &CacheEntry,
        context: &TimeContext,
        now: NaiveDateTime,
    ) -> SafetyScore {
        let mut components = entry.base.components;
        if entry.time_enabled {
            components.time_factor = time_factor(Some(context), entry.overnight_probability);
        }
        let base_overall = components.weighted_overall_with(&self.weights);
        let adjustment = self
            .environment
            .conditions(&entry.point, context.local_time)
            .adjustment();
        SafetyScore {
            components,
            factors: components.factors(&self.weights),
            last_calculated: now,
            ..entry.base.clone()
        }
        .with_adjustment(base_overall, adjustment)
    }

    /// Evict expired entries and refresh live ones in place.
    pub(crate) fn sweep(&self) -> SweepReport {
        let now = self.now();
        let (evicted, snapshot): (usize, Vec<(QuantizedKey, CacheEntry)>) = {
            let mut entries = self.lock_recovering();
            let before = entries.len();
            entries.retain(|_, e| e.is_live(now));
            let evicted = before.saturating_sub(entries.len());
            if evicted > 0 {
                debug!("evicted {evicted} expired real-time scores");
            }
            (evicted, entries.iter().map(|(k, e)| (*k, e.clone())).collect())
        };
        let refreshed: Vec<(QuantizedKey, NaiveDateTime, SafetyScore)> = snapshot
            .iter()
            .map(|(key, entry)| (*key, entry.created_at, self.refresh(entry, now)))
            .collect();
        let mut entries = self.lock_recovering();
        let written = refreshed
            .iter()
            .filter(|(key, created_at, score)| {
                Self::write_back_locked(&mut entries, *key, *created_at, score)
            })
            .count();
        SweepReport {
            evicted,
            refreshed: written,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock_recovering().len()
    }

    pub(crate) fn clear(&self) {
        self.lock_recovering().clear();
    }
}
