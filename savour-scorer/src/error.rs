//! Error types raised while ranking a candidate batch.
#![forbid(unsafe_code)]

use savour_core::{SourceError, VenueField, VenueId};
use thiserror::Error;

/// Input records do not fit the feature schema.
///
/// Fatal for the request. The engine never patches or skips a bad record,
/// since one partial row would skew the statistics of the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaMismatch {
    /// A record lacks a value the schema turns into a column.
    #[error("venue {venue} has no value for {field}")]
    MissingField {
        /// Offending venue.
        venue: VenueId,
        /// Field without a value.
        field: VenueField,
    },
    /// A record's optional field set differs from the rest of the batch.
    #[error("venue {venue} carries fields {found:?} but the batch carries {expected:?}")]
    FieldSetDiffers {
        /// Offending venue.
        venue: VenueId,
        /// Field set of the first record in the batch.
        expected: Vec<String>,
        /// Field set of the offending record.
        found: Vec<String>,
    },
    /// A continuous value was NaN or infinite.
    #[error("venue {venue} has a non-finite {field}")]
    NonFiniteValue {
        /// Offending venue.
        venue: VenueId,
        /// Field with the bad value.
        field: VenueField,
    },
    /// The same venue appeared twice in one candidate batch.
    #[error("venue {venue} appears more than once in the candidate batch")]
    DuplicateVenue {
        /// Repeated venue.
        venue: VenueId,
    },
    /// A profile and a feature matrix disagree on width.
    #[error("profile has {found} weights but the schema defines {expected} columns")]
    DimensionMismatch {
        /// Column count of the feature matrix.
        expected: usize,
        /// Width of the profile.
        found: usize,
    },
}

/// Errors returned by [`RecommendationEngine`](crate::RecommendationEngine).
#[derive(Debug, Error)]
pub enum RankError {
    /// Candidate or history records did not fit the schema.
    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatch),
    /// Fetching candidates or history failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Errors raised when validating an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A result limit of zero can never return a venue.
    #[error("top_n must be at least 1")]
    ZeroTopN,
}
