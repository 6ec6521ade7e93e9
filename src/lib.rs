//! Facade crate for the SafeRoute safety-scoring engine.
//!
//! This crate re-exports the core domain types and exposes the synthetic
//! dataset and the scoring engine behind feature flags.

#![forbid(unsafe_code)]

pub use saferoute_core::{
    Clock, ComponentWeights, CrimeDataSource, CrimeRecord, CrimeStat, CrimeType,
    DataInitializationError, FactorFlags, FactorType, GeoPoint, InvalidInputError, Location,
    RiskLevel, Route, RouteSegment, SafetyFactor, SafetyScore, ScoreComponents, ScoringError,
    SystemClock, TimeContext, Timeframe, TravelMode,
};

#[cfg(feature = "data")]
pub use saferoute_data::{CrimeDataGenerator, CrimeDataService, QueryError, StatisticsFilter};

#[cfg(feature = "scorer")]
pub use saferoute_scorer::{
    EngineConfig, EnvironmentProvider, EnvironmentalConditions, LocationAssessment,
    SafetyScoringEngine,
};
