//! Test-only, in-memory `CrimeDataSource` and clock implementations used by
//! unit and behaviour tests.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::{
    Clock, CrimeDataSource, CrimeRecord, CrimeStat, CrimeType, DataInitializationError, DateRange,
    EconomicIndicators, GeoPoint, GridCellId, HOURS_PER_DAY, LandUse, RecordLocation, RiskLevel,
};

/// In-memory `CrimeDataSource` used in tests.
///
/// The source performs a linear scan and is intended only for small datasets.
#[derive(Default, Debug)]
pub struct MemoryCrimeSource {
    records: Vec<Arc<CrimeRecord>>,
}

impl MemoryCrimeSource {
    /// Create a source from a collection of records.
    #[must_use]
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = CrimeRecord>,
    {
        Self {
            records: records.into_iter().map(Arc::new).collect(),
        }
    }
}

impl CrimeDataSource for MemoryCrimeSource {
    fn records_at(
        &self,
        point: &GeoPoint,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        let cell = GridCellId::containing(point);
        Ok(self
            .records
            .iter()
            .filter(|r| r.grid_cell_id == cell)
            .cloned()
            .collect())
    }

    fn risky_records_within(
        &self,
        point: &GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.risk_level.is_elevated() && r.point().distance_km(point) <= radius_km)
            .cloned()
            .collect())
    }

    fn source_name(&self) -> &str {
        "memory"
    }
}

/// `CrimeDataSource` whose dataset never initializes.
#[derive(Debug, Clone)]
pub struct FailingCrimeSource(pub DataInitializationError);

impl CrimeDataSource for FailingCrimeSource {
    fn records_at(
        &self,
        _point: &GeoPoint,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        Err(self.0.clone())
    }

    fn risky_records_within(
        &self,
        _point: &GeoPoint,
        _radius_km: f64,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        Err(self.0.clone())
    }
}

/// Settable `Clock` for deterministic expiry tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    #[must_use]
    pub const fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build a local date-time, panicking on invalid test input.
///
/// # Panics
/// Panics when the components do not form a valid date and time.
#[must_use]
#[expect(clippy::expect_used, reason = "test helper with literal input")]
pub fn local_time(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .expect("valid test date-time")
}

/// A stat with a flat hourly pattern and mid-range severity.
#[must_use]
pub fn uniform_stat(crime_type: CrimeType, incident_count: u32, confidence: f64) -> CrimeStat {
    let subtype = crime_type.subtypes().first().copied().unwrap_or("unknown");
    CrimeStat {
        crime_type,
        subtype: subtype.to_owned(),
        incident_count,
        severity: crime_type.severity_range().lerp(0.5),
        hourly_pattern: [1.0 / 24.0; HOURS_PER_DAY],
        confidence,
    }
}

/// A record at `point` with neutral indicators and no stats.
#[must_use]
pub fn record_at(id: &str, point: GeoPoint, risk_level: RiskLevel) -> CrimeRecord {
    let day = local_time(2024, 3, 1, 0, 0).date();
    CrimeRecord {
        id: id.to_owned(),
        location: RecordLocation {
            lat: point.lat,
            lng: point.lng,
            neighborhood: "Testville".to_owned(),
            land_use: LandUse::Mixed,
        },
        grid_cell_id: GridCellId::containing(&point),
        timeframe: DateRange {
            start: day,
            end: day,
        },
        crime_stats: Vec::new(),
        risk_level,
        population_density: 3_000.0,
        economic_indicators: EconomicIndicators {
            median_income: 80_000,
            unemployment_rate: 4.0,
            business_density: 5.0,
            lighting_infrastructure: 70.0,
        },
        last_updated: day,
        data_source: "test".to_owned(),
    }
}
