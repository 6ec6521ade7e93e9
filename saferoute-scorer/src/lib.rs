//! Safety scoring for locations and routes.
//!
//! The crate provides three layers over a
//! [`CrimeDataSource`](saferoute_core::CrimeDataSource):
//! - **Single-location scoring** blends crime risk, time of day, population
//!   density and lighting into a weighted `0..=100` score with factors,
//!   an explanation, recommendations and alerts.
//! - **Route scoring** scores every segment at its midpoint and aggregates
//!   the results, weighting the overall score by segment distance.
//! - **Real-time scoring** caches scores for five minutes, refreshes the
//!   time-sensitive factor on every hit and applies an additive adjustment
//!   from live environmental conditions. A background worker sweeps the
//!   cache on a fixed interval.
//!
//! # Examples
//!
//! ```no_run
//! use chrono::Local;
//! use saferoute_core::{FactorFlags, Location, TimeContext};
//! use saferoute_data::{CrimeDataGenerator, CrimeDataService};
//! use saferoute_scorer::{EngineConfig, SafetyScoringEngine};
//!
//! let today = Local::now().date_naive();
//! let service = CrimeDataService::new(CrimeDataGenerator::new(), today);
//! let engine = SafetyScoringEngine::new(service, EngineConfig::default());
//! engine.start_background_refresh().expect("spawn refresh worker");
//!
//! let mission = Location::new(37.7599, -122.4148).expect("valid coordinates");
//! let now = TimeContext::new(Local::now().naive_local());
//! let assessment = engine
//!     .score_location(&mission, Some(&now), FactorFlags::default())
//!     .expect("score location");
//! println!("{}", assessment.score.explanation);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod assessment;
mod cache;
pub mod components;
mod config;
mod engine;
mod environment;
mod error;
mod refresher;
mod route;

pub use assessment::{AlertLevel, LocationAssessment, SafetyAlert, ScoreMetadata};
pub use cache::SweepReport;
pub use config::{DEFAULT_NEARBY_RISK_RADIUS_KM, EngineConfig};
pub use engine::SafetyScoringEngine;
pub use environment::{
    CrowdDensity, EnvironmentProvider, EnvironmentalConditions, FixedEnvironment, LocalEvents,
    SimulatedEnvironment, Traffic, Weather, WeatherCondition,
};
pub use error::RefreshError;
pub use route::aggregate_route_scores;

#[cfg(test)]
mod tests;
