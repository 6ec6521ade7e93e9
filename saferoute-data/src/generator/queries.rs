//! Attribute and spatial filters over a generated dataset.
//!
//! These are linear scans suited to the generator's small output; the
//! service answers the same questions from its indices.

use percent_encoding::percent_decode_str;

use saferoute_core::{CrimeRecord, GeoPoint, GridCellId, RiskLevel};

use super::AreaProfile;

/// Decode a caller-supplied area name: percent escapes and `+` become
/// text, surrounding whitespace is dropped and case is folded.
#[must_use]
pub fn normalize_area_query(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8_lossy()
        .trim()
        .to_lowercase()
}

/// Whether `neighborhood` matches an already normalized area query.
#[must_use]
pub fn area_matches(neighborhood: &str, normalized_query: &str) -> bool {
    neighborhood.to_lowercase().contains(normalized_query)
}

/// Records whose neighborhood contains `area`, ignoring case.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use saferoute_core::Timeframe;
/// use saferoute_data::generator::{CrimeDataGenerator, by_area};
///
/// let reference = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// let records = CrimeDataGenerator::new().generate(reference, Timeframe::SixMonths).unwrap();
/// let mission: Vec<_> = by_area(&records, "mission%20district").collect();
/// assert_eq!(mission.len(), 3);
/// ```
pub fn by_area<'a>(
    records: &'a [CrimeRecord],
    area: &str,
) -> impl Iterator<Item = &'a CrimeRecord> + 'a {
    let query = normalize_area_query(area);
    records
        .iter()
        .filter(move |r| area_matches(&r.location.neighborhood, &query))
}

/// Records in exactly the grid cell `grid_id`.
pub fn by_grid_id<'a>(
    records: &'a [CrimeRecord],
    grid_id: &'a GridCellId,
) -> impl Iterator<Item = &'a CrimeRecord> + 'a {
    records.iter().filter(move |r| &r.grid_cell_id == grid_id)
}

/// Records within `radius_km` of `point` by great-circle distance.
pub fn by_coordinates<'a>(
    records: &'a [CrimeRecord],
    point: GeoPoint,
    radius_km: f64,
) -> impl Iterator<Item = &'a CrimeRecord> + 'a {
    records
        .iter()
        .filter(move |r| r.point().distance_km(&point) <= radius_km)
}

/// Risk level of the configured area whose centre is closest to `point`.
///
/// Returns `None` only for an empty table.
#[must_use]
pub fn nearest_area_risk_level(areas: &[AreaProfile], point: &GeoPoint) -> Option<RiskLevel> {
    areas
        .iter()
        .map(|a| (a.center.distance_km(point), a.risk_level))
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, level)| level)
}
