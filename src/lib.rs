//! Facade crate for the Savour venue-ranking engine.
//!
//! This crate re-exports the core domain types and exposes the scorer and the
//! SQLite catalogue behind feature flags.

#![forbid(unsafe_code)]

pub use savour_core::{
    AttributeFlag, BackendError, CandidateSource, FacetFilter, FeatureSchema, FieldDescriptor,
    FieldTreatment, IdentifierError, OpenAt, OpenAtError, OpeningHours, RatingError, RatingEvent, RatingHistorySource, ReviewGate,
    ReviewVerdict, SchemaError, SourceError, UserId, VenueField, VenueId, VenueRecord, Vocabulary, WeeklyHours,
};

#[cfg(feature = "store-sqlite")]
pub use savour_core::{RecordOutcome, SqliteCatalog, SqliteCatalogError};

#[cfg(feature = "scorer")]
pub use savour_scorer::{
    DEFAULT_TOP_N, EngineConfig, FallbackReason, HistoryScope, RankError, RankRequest,
    RankedVenue, Ranking, RankingStrategy, RecommendationEngine, SchemaMismatch,
};
