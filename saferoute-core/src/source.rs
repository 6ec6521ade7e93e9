//! Read access to crime records for the scoring engine.

use std::sync::Arc;

use crate::{CrimeRecord, DataInitializationError, GeoPoint};

/// Query crime records around a point.
///
/// Implementations must be thread-safe (`Send` + `Sync`) so the engine and
/// its background refresher can share one source. Records are returned as
/// shared immutable values; an empty vector means "no data" and is not an
/// error.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use saferoute_core::{CrimeDataSource, CrimeRecord, DataInitializationError, GeoPoint};
///
/// struct Empty;
///
/// impl CrimeDataSource for Empty {
///     fn records_at(&self, _point: &GeoPoint) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
///         Ok(Vec::new())
///     }
///
///     fn risky_records_within(
///         &self,
///         _point: &GeoPoint,
///         _radius_km: f64,
///     ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
///         Ok(Vec::new())
///     }
/// }
///
/// let records = Empty.records_at(&GeoPoint::new(0.0, 0.0)).unwrap();
/// assert!(records.is_empty());
/// assert_eq!(Empty.source_name(), "synthetic");
/// ```
pub trait CrimeDataSource: Send + Sync {
    /// Records in the grid cell containing `point`.
    ///
    /// # Errors
    /// Returns [`DataInitializationError`] when the backing dataset could
    /// not be built.
    fn records_at(&self, point: &GeoPoint)
    -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError>;

    /// High or critical risk records within `radius_km` of `point`.
    ///
    /// # Errors
    /// Returns [`DataInitializationError`] when the backing dataset could
    /// not be built.
    fn risky_records_within(
        &self,
        point: &GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError>;

    /// Tag reported in score metadata.
    fn source_name(&self) -> &str {
        "synthetic"
    }
}

impl<S: CrimeDataSource + ?Sized> CrimeDataSource for Arc<S> {
    fn records_at(
        &self,
        point: &GeoPoint,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        (**self).records_at(point)
    }

    fn risky_records_within(
        &self,
        point: &GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<Arc<CrimeRecord>>, DataInitializationError> {
        (**self).risky_records_within(point, radius_km)
    }

    fn source_name(&self) -> &str {
        (**self).source_name()
    }
}
