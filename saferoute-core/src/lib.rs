//! Core domain types for the SafeRoute engine.
//!
//! The crate defines the vocabulary shared by the generator, the data
//! service and the scoring engine: validated locations and grid cells, the
//! crime record model, safety scores and their factors, routes, and the two
//! seams the engine depends on ([`CrimeDataSource`] and [`Clock`]).
//!
//! Constructors that accept caller input return `Result` so invalid
//! coordinates surface as [`InvalidInputError`] before any computation runs.
//!
//! # Examples
//!
//! ```
//! use saferoute_core::{GridCellId, Location};
//!
//! # fn main() -> Result<(), saferoute_core::InvalidInputError> {
//! let location = Location::new(37.7599, -122.4148)?;
//! let cell = GridCellId::containing(&location.point);
//! assert_eq!(cell.as_str(), "grid_3775_-12242");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod clock;
mod context;
mod crime;
mod error;
mod location;
mod route;
mod score;
mod source;
mod timeframe;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use clock::{Clock, SystemClock};
pub use context::{DayPeriod, FactorFlags, TimeContext};
pub use crime::{
    CrimeRecord, CrimeStat, CrimeType, DateRange, EconomicIndicators, HOURS_PER_DAY, LandUse,
    RecordLocation, RiskLevel, SeverityRange, UnknownLabel,
};
pub use error::{DataInitializationError, InvalidInputError, ScoringError};
pub use location::{GRID_CELL_DEGREES, GeoPoint, GridCellId, Location};
pub use route::{Route, RouteSegment, TravelMode};
pub use score::{
    ComponentWeights, FactorImpact, FactorType, SafetyFactor, SafetyScore, ScoreComponents,
    clamp_score,
};
pub use source::CrimeDataSource;
pub use timeframe::Timeframe;
