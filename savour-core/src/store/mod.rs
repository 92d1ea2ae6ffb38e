//! Persistent catalogue implementations of the source traits.
//!
//! The SQLite catalogue stores venues and screened ratings, and serves them
//! back through [`CandidateSource`](crate::CandidateSource) and
//! [`RatingHistorySource`](crate::RatingHistorySource).

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{RecordOutcome, SqliteCatalog, SqliteCatalogError};
