//! Core domain types for the Savour venue ranking engine.
//!
//! These models describe the inputs the scoring engine consumes: venue
//! records, rating events, and the versioned feature schema that maps one to
//! numeric columns. The crate also defines the seams to the engine's
//! external collaborators (candidate and history sources, and the review
//! gate) and, behind `store-sqlite`, a SQLite catalogue implementing them.
//! Constructors return `Result` to surface invalid input early.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod filter;
pub mod hours;
pub mod ids;
pub mod rating;
pub mod review_gate;
pub mod schema;
pub mod source;
pub mod store;
pub mod venue;
pub mod vocabulary;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use filter::FacetFilter;
pub use hours::{OpenAt, OpenAtError, OpeningHours, WeeklyHours};
pub use ids::{IdentifierError, UserId, VenueId};
pub use rating::{MAX_RATING, MIN_RATING, RatingError, RatingEvent};
pub use review_gate::{ReviewGate, ReviewVerdict};
pub use schema::{FeatureSchema, FieldDescriptor, FieldTreatment, SchemaError, VenueField};
pub use source::{BackendError, CandidateSource, RatingHistorySource, SourceError};
pub use venue::{AttributeFlag, VenueRecord};
pub use vocabulary::Vocabulary;

#[cfg(feature = "store-sqlite")]
pub use store::{RecordOutcome, SqliteCatalog, SqliteCatalogError};
