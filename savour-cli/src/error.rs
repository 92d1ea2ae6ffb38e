//! Error types emitted by the Savour CLI.
//!
//! Keep this error type reasonably small, as CLI helpers return
//! `Result<_, CliError>` throughout.

use std::sync::Arc;

use camino::Utf8PathBuf;
use savour_core::{
    IdentifierError, OpenAtError, RatingError, ReviewVerdict, SqliteCatalogError, VenueId,
};
use savour_scorer::{ConfigError, RankError};
use thiserror::Error;

/// Errors emitted by the Savour CLI.
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
        field: &'static str,
        env: &'static str,
    },
    /// A user or venue key is blank.
    #[error("invalid --{field}: {source}")]
    InvalidIdentifier {
        field: &'static str,
        #[source]
        source: IdentifierError,
    },
    /// The rating is out of range or not a number.
    #[error("invalid --{field}: {source}")]
    InvalidRating {
        field: &'static str,
        #[source]
        source: RatingError,
    },
    /// The opening-time facet could not be parsed.
    #[error("invalid --{field}: {source}")]
    InvalidOpenAt {
        field: &'static str,
        #[source]
        source: OpenAtError,
    },
    /// The engine settings cannot produce a ranking.
    #[error("invalid engine settings: {0}")]
    InvalidEngineConfig(#[from] ConfigError),
    /// A source path does not exist.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A source path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A source path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite catalogue failed.
    #[error("failed to open catalogue at {path:?}: {source}")]
    OpenCatalog {
        path: Utf8PathBuf,
        #[source]
        source: SqliteCatalogError,
    },
    /// Writing to the SQLite catalogue failed.
    #[error("failed to update catalogue at {path:?}: {source}")]
    UpdateCatalog {
        path: Utf8PathBuf,
        #[source]
        source: SqliteCatalogError,
    },
    /// The review gate refused the review, so the rating was not stored.
    #[error("review for {venue} was rejected as {verdict}")]
    ReviewRejected {
        venue: VenueId,
        verdict: ReviewVerdict,
    },
    /// Opening the venue file failed.
    #[error("failed to open venue file {path:?}: {source}")]
    OpenVenues {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The venue file was not a JSON array of venue records.
    #[error("failed to parse venue file {path:?}: {source}")]
    ParseVenues {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Ranking failed.
    #[error("ranking failed: {source}")]
    Rank {
        #[source]
        source: RankError,
    },
    /// Serialising a command report failed.
    #[error("failed to serialise report: {0}")]
    SerialiseReport(#[source] serde_json::Error),
    /// Writing a command report failed.
    #[error("failed to write report: {0}")]
    WriteReport(#[source] std::io::Error),
}
