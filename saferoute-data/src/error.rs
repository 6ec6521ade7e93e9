//! Error raised by [`CrimeDataService`](crate::CrimeDataService) queries.

use saferoute_core::{DataInitializationError, InvalidInputError, ScoringError};
use thiserror::Error;

/// A data query could not be answered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The query arguments were rejected.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
    /// The dataset failed to initialize.
    #[error("crime data unavailable: {0}")]
    Unavailable(#[from] DataInitializationError),
}

impl From<QueryError> for ScoringError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidInput(source) => Self::InvalidInput(source),
            QueryError::Unavailable(source) => Self::DataInitialization(source),
        }
    }
}
