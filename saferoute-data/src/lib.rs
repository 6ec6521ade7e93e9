//! Synthetic crime data for the SafeRoute engine.
//!
//! Responsibilities:
//! - Generate a deterministic crime dataset for a fixed table of areas.
//! - Materialize it once and answer location, grid, area and aggregate
//!   queries from in-memory indices.
//!
//! Boundaries:
//! - Do not encode scoring rules (live in `saferoute-scorer`).
//! - No I/O and no persistence; the dataset lives for the process.
//!
//! Invariants:
//! - Identical inputs produce identical datasets.
//! - Every hourly pattern sums to `1.0`; every severity lies inside its
//!   crime type's declared range.
//! - No global mutable state.

#![forbid(unsafe_code)]

mod error;
pub mod generator;
mod service;

pub use error::QueryError;
pub use generator::{CrimeDataGenerator, RECORDS_PER_AREA, Trend, TrendDirection};
pub use service::{CrimeDataService, StatisticsFilter, weighted_severity_score};
