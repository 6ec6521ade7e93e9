//! Error types emitted by the SafeRoute CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use saferoute_core::{DataInitializationError, InvalidInputError, ScoringError, UnknownLabel};
use thiserror::Error;

/// Errors emitted by the SafeRoute CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Long flag name of the option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// Coordinates supplied on the command line are out of range.
    #[error("invalid location: {0}")]
    InvalidLocation(#[from] InvalidInputError),
    /// A categorical option did not name a known value.
    #[error(transparent)]
    UnknownLabel(#[from] UnknownLabel),
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Argument the path was supplied through.
        field: &'static str,
        /// Path as given.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Argument the path was supplied through.
        field: &'static str,
        /// Path as given.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Argument the path was supplied through.
        field: &'static str,
        /// Path as given.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Opening the route file failed.
    #[error("failed to open route at {path:?}: {source}")]
    OpenRoute {
        /// Route file path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// Route JSON could not be decoded.
    #[error("failed to parse route JSON at {path:?}: {source}")]
    ParseRoute {
        /// Route file path.
        path: Utf8PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The synthetic dataset could not be materialized.
    #[error("failed to build the crime dataset: {0}")]
    Dataset(#[from] DataInitializationError),
    /// The engine rejected or failed to score the request.
    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
