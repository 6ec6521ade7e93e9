//! In-memory crime data service.
//!
//! [`CrimeDataService`] materializes the generator's six-month baseline the
//! first time any query needs it and answers every later query from three
//! indices: by id, by grid cell and an R\*-tree over record coordinates.
//! Initialization runs at most once, even when several threads ask for data
//! at the same time; its outcome, success or failure, is shared by all
//! callers.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use log::{info, warn};
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

use saferoute_core::{
    CrimeDataSource, CrimeRecord, CrimeStat, CrimeType, DataInitializationError, GeoPoint,
    GridCellId, HOURS_PER_DAY, InvalidInputError, Location, RiskLevel, Timeframe,
};

use crate::QueryError;
use crate::generator::{
    AreaTrend, CrimeDataGenerator, DATA_SOURCE, Trend, apply_timeframe, area_matches,
    calculate_trend, normalize_area_query,
};

/// Kilometres per degree of latitude.
const KM_PER_DEGREE: f64 = 111.32;

/// Optional filters for [`CrimeDataService::get_statistics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsFilter {
    /// Case-insensitive neighborhood substring, percent-decoded.
    pub area: Option<String>,
    /// Restrict to one crime category.
    pub crime_type: Option<CrimeType>,
    /// Rescale counts to this window; six months when absent.
    pub timeframe: Option<Timeframe>,
}

impl StatisticsFilter {
    /// Restrict to an area.
    #[must_use]
    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    /// Restrict to a crime category.
    #[must_use]
    pub const fn with_crime_type(mut self, crime_type: CrimeType) -> Self {
        self.crime_type = Some(crime_type);
        self
    }

    /// Rescale to a window.
    #[must_use]
    pub const fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }
}

/// Weighted severity of a set of stats: the sum of
/// `incident_count × severity × risk_weight` over the sum of weights.
///
/// Returns `None` for an empty set.
///
/// # Examples
/// ```
/// use saferoute_core::{CrimeType, RiskLevel};
/// use saferoute_core::test_support::uniform_stat;
/// use saferoute_data::weighted_severity_score;
///
/// let mut stat = uniform_stat(CrimeType::Violent, 4, 80.0);
/// stat.severity = 8.0;
/// let score = weighted_severity_score([&stat]).unwrap();
/// assert_eq!(RiskLevel::from_score(score), RiskLevel::Medium);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "weighted average")]
pub fn weighted_severity_score<'a, I>(stats: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a CrimeStat>,
{
    let (weighted, total_weight) = stats.into_iter().fold((0.0, 0.0), |(sum, weight), s| {
        let w = s.crime_type.risk_weight();
        (
            sum + f64::from(s.incident_count) * s.severity * w,
            weight + w,
        )
    });
    (total_weight > 0.0).then(|| weighted / total_weight)
}

#[derive(Debug, Clone)]
struct IndexedRecord {
    position: [f64; 2],
    record: Arc<CrimeRecord>,
}

impl RTreeObject for IndexedRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

#[derive(Debug)]
struct CrimeIndex {
    records: Vec<Arc<CrimeRecord>>,
    by_id: HashMap<String, Arc<CrimeRecord>>,
    by_cell: HashMap<GridCellId, Vec<Arc<CrimeRecord>>>,
    tree: RTree<IndexedRecord>,
}

impl CrimeIndex {
    fn build(records: Vec<CrimeRecord>) -> Self {
        let records: Vec<Arc<CrimeRecord>> = records.into_iter().map(Arc::new).collect();
        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_cell: HashMap<GridCellId, Vec<Arc<CrimeRecord>>> = HashMap::new();
        for record in &records {
            by_id.insert(record.id.clone(), Arc::clone(record));
            by_cell
                .entry(record.grid_cell_id.clone())
                .or_default()
                .push(Arc::clone(record));
        }
        let tree = RTree::bulk_load(
            records
                .iter()
                .map(|record| IndexedRecord {
                    position: [record.location.lng, record.location.lat],
                    record: Arc::clone(record),
                })
                .collect(),
        );
        Self {
            records,
            by_id,
            by_cell,
            tree,
        }
    }

    fn within(&self, point: &GeoPoint, radius_km: f64) -> Vec<Arc<CrimeRecord>> {
        let envelope = search_envelope(point, radius_km);
        let mut found: Vec<Arc<CrimeRecord>> = self
            .tree
            .locate_in_envelope(&envelope)
            .filter(|entry| entry.record.point().distance_km(point) <= radius_km)
            .map(|entry| Arc::clone(&entry.record))
            .collect();
        // Tree order depends on bulk loading; sort for stable output.
        found.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        found
    }
}

/// Degree box enclosing a circle of `radius_km` around `point`.
#[expect(clippy::float_arithmetic, reason = "degree conversion")]
fn search_envelope(point: &GeoPoint, radius_km: f64) -> AABB<[f64; 2]> {
    let radius = radius_km.max(0.0);
    let lat_delta = radius / KM_PER_DEGREE;
    let cos_lat = point.lat.to_radians().cos();
    let lng_delta = if cos_lat > f64::EPSILON {
        (radius / (KM_PER_DEGREE * cos_lat)).min(180.0)
    } else {
        180.0
    };
    AABB::from_corners(
        [point.lng - lng_delta, point.lat - lat_delta],
        [point.lng + lng_delta, point.lat + lat_delta],
    )
}

/// Serves crime queries from a lazily materialized, immutable dataset.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use saferoute_core::{Location, RiskLevel};
/// use saferoute_data::{CrimeDataGenerator, CrimeDataService};
///
/// let reference = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let service = CrimeDataService::new(CrimeDataGenerator::new(), reference);
/// let mission = Location::new(37.7599, -122.4148).unwrap();
/// assert!(!service.get_by_location(&mission).unwrap().is_empty());
///
/// let ocean = Location::new(0.0, 0.0).unwrap();
/// assert_eq!(service.calculate_risk_level(&ocean).unwrap(), RiskLevel::Low);
/// ```
#[derive(Debug)]
pub struct CrimeDataService {
    generator: CrimeDataGenerator,
    reference_date: NaiveDate,
    index: OnceLock<Result<CrimeIndex, DataInitializationError>>,
}

impl CrimeDataService {
    /// Create a service; no data is generated until the first query.
    #[must_use]
    pub const fn new(generator: CrimeDataGenerator, reference_date: NaiveDate) -> Self {
        Self {
            generator,
            reference_date,
            index: OnceLock::new(),
        }
    }

    /// Date the dataset ends on.
    #[must_use]
    pub const fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Whether the dataset has been materialized (or failed to be).
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.index.get().is_some()
    }

    /// Materialize the dataset now instead of on first query.
    ///
    /// # Errors
    /// Returns the shared [`DataInitializationError`] when generation failed.
    pub fn initialize(&self) -> Result<(), DataInitializationError> {
        self.index().map(|_| ())
    }

    fn index(&self) -> Result<&CrimeIndex, DataInitializationError> {
        self.index
            .get_or_init(|| {
                let outcome = self
                    .generator
                    .generate_baseline(self.reference_date)
                    .map(CrimeIndex::build);
                match &outcome {
                    Ok(index) => info!(
                        "materialized {} crime records across {} grid cells",
                        index.records.len(),
                        index.by_cell.len()
                    ),
                    Err(err) => warn!("crime data initialization failed: {err}"),
                }
                outcome
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Every record, in generation order.
    ///
    /// # Errors
    /// Returns the shared [`DataInitializationError`] when generation failed.
    pub fn records(&self) -> Result<&[Arc<CrimeRecord>], DataInitializationError> {
        Ok(&self.index()?.records)
    }

    /// Records in the grid cell containing `location`.
    ///
    /// # Errors
    /// Returns the shared [`DataInitializationError`] when generation failed.
    pub fn get_by_location(
        &self,
        location: &Location,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        self.get_by_grid_cell(&GridCellId::containing(&location.point))
    }

    /// Records in grid cell `id`.
    ///
    /// # Errors
    /// Returns the shared [`DataInitializationError`] when generation failed.
    pub fn get_by_grid_cell(
        &self,
        id: &GridCellId,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        Ok(self.index()?.by_cell.get(id).cloned().unwrap_or_default())
    }

    /// The record with identifier `id`, if any.
    ///
    /// # Errors
    /// Returns the shared [`DataInitializationError`] when generation failed.
    pub fn get_by_id(&self, id: &str) -> Result<Option<Arc<CrimeRecord>>, DataInitializationError> {
        Ok(self.index()?.by_id.get(id).cloned())
    }

    /// Records whose neighborhood contains `area`, ignoring case; `area` may
    /// be percent-encoded.
    ///
    /// # Errors
    /// Returns the shared [`DataInitializationError`] when generation failed.
    pub fn get_by_area(
        &self,
        area: &str,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        let query = normalize_area_query(area);
        Ok(self
            .index()?
            .records
            .iter()
            .filter(|r| area_matches(&r.location.neighborhood, &query))
            .cloned()
            .collect())
    }

    /// Flattened stats of the records matching `filter`, rescaled to its
    /// timeframe.
    ///
    /// # Errors
    /// Returns the shared [`DataInitializationError`] when generation failed.
    pub fn get_statistics(
        &self,
        filter: &StatisticsFilter,
    ) -> Result<Vec<CrimeStat>, DataInitializationError> {
        let area_query = filter.area.as_deref().map(normalize_area_query);
        let matching: Vec<CrimeRecord> = self
            .index()?
            .records
            .iter()
            .filter(|r| {
                area_query
                    .as_deref()
                    .is_none_or(|q| area_matches(&r.location.neighborhood, q))
            })
            .map(|r| CrimeRecord::clone(r))
            .collect();
        let timeframe = filter.timeframe.unwrap_or_default();
        let scaled = if timeframe == Timeframe::SixMonths {
            matching
        } else {
            apply_timeframe(&matching, timeframe)
        };
        Ok(scaled
            .into_iter()
            .flat_map(|r| r.crime_stats)
            .filter(|s| filter.crime_type.is_none_or(|t| s.crime_type == t))
            .collect())
    }

    /// Risk band of the stats in `location`'s grid cell; low when the cell
    /// has no data.
    ///
    /// # Errors
    /// Returns the shared [`DataInitializationError`] when generation failed.
    pub fn calculate_risk_level(
        &self,
        location: &Location,
    ) -> Result<RiskLevel, DataInitializationError> {
        let records = self.get_by_location(location)?;
        let score = weighted_severity_score(records.iter().flat_map(|r| r.crime_stats.iter()));
        Ok(score.map_or(RiskLevel::Low, RiskLevel::from_score))
    }

    /// Mean probability of an incident during `hour` across the stats in
    /// `location`'s grid cell; `0.0` when the cell has no data.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidInput`] when `hour` is 24 or more and
    /// [`QueryError::Unavailable`] when generation failed.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "mean of probabilities"
    )]
    pub fn get_crime_pattern_by_time(
        &self,
        location: &Location,
        hour: u32,
    ) -> Result<f64, QueryError> {
        let slot = usize::try_from(hour)
            .ok()
            .filter(|h| *h < HOURS_PER_DAY)
            .ok_or(InvalidInputError::HourOutOfRange { hour })?;
        let records = self.get_by_location(location)?;
        let probabilities: Vec<f64> = records
            .iter()
            .flat_map(|r| r.crime_stats.iter())
            .filter_map(|s| s.probability_at(slot))
            .collect();
        if probabilities.is_empty() {
            return Ok(0.0);
        }
        Ok(probabilities.iter().sum::<f64>() / probabilities.len() as f64)
    }

    /// High or critical risk records within `radius_km` of `location`.
    ///
    /// # Errors
    /// Returns the shared [`DataInitializationError`] when generation failed.
    pub fn get_nearby_risky_areas(
        &self,
        location: &Location,
        radius_km: f64,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        self.risky_records_within(&location.point, radius_km)
    }

    /// Per-area trend summaries for `timeframe`, in area-table order.
    ///
    /// The area's change is the mean change of its records.
    ///
    /// # Errors
    /// Returns the shared [`DataInitializationError`] when generation failed.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "mean of percentage changes"
    )]
    pub fn area_trends(
        &self,
        timeframe: Timeframe,
    ) -> Result<Vec<AreaTrend>, DataInitializationError> {
        let index = self.index()?;
        let mut trends = Vec::with_capacity(self.generator.areas().len());
        for area in self.generator.areas() {
            let baseline: Vec<CrimeRecord> = index
                .records
                .iter()
                .filter(|r| r.location.neighborhood == area.name)
                .map(|r| CrimeRecord::clone(r))
                .collect();
            if baseline.is_empty() {
                continue;
            }
            let scaled = apply_timeframe(&baseline, timeframe);
            let change_sum: f64 = scaled
                .iter()
                .map(|r| calculate_trend(r, timeframe).change_percent)
                .sum();
            trends.push(AreaTrend {
                area: area.name.to_owned(),
                risk_level: area.risk_level,
                total_incidents: scaled.iter().map(CrimeRecord::total_incidents).sum(),
                trend: Trend::from_change_percent(change_sum / scaled.len() as f64),
            });
        }
        Ok(trends)
    }
}

impl CrimeDataSource for CrimeDataService {
    fn records_at(
        &self,
        point: &GeoPoint,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        self.get_by_grid_cell(&GridCellId::containing(point))
    }

    fn risky_records_within(
        &self,
        point: &GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        let mut found = self.index()?.within(point, radius_km);
        found.retain(|r| r.risk_level.is_elevated());
        Ok(found)
    }

    fn source_name(&self) -> &str {
        DATA_SOURCE
    }
}
