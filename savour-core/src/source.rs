//! External collaborators that supply candidates and rating history.
//!
//! The scoring engine never performs I/O itself. Callers resolve these
//! sources first and hand the materialised data to the engine.

use thiserror::Error;

use crate::{FacetFilter, RatingEvent, VenueRecord};

/// Boxed error raised by a backing store.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors reported by a [`CandidateSource`] or [`RatingHistorySource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backing store failed.
    #[error("failed to {operation}")]
    Backend {
        /// Description of the failed operation.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: BackendError,
    },
}

impl SourceError {
    /// Wrap a backend failure.
    pub fn backend(operation: &'static str, source: impl Into<BackendError>) -> Self {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }
}

/// Supply the facet-filtered candidate batch for one request.
///
/// The returned order carries no meaning before scoring, but it must be
/// stable for identical inputs so tie-breaks stay deterministic.
///
/// # Examples
///
/// ```rust
/// use savour_core::{CandidateSource, FacetFilter, SourceError, VenueId, VenueRecord};
///
/// struct Fixed(Vec<VenueRecord>);
///
/// impl CandidateSource for Fixed {
///     fn fetch_candidates(&self, filter: &FacetFilter) -> Result<Vec<VenueRecord>, SourceError> {
///         Ok(self.0.iter().filter(|v| filter.matches(v)).cloned().collect())
///     }
/// }
///
/// let source = Fixed(vec![VenueRecord::new(VenueId::new("a").unwrap(), 4.0, 3)]);
/// let batch = source.fetch_candidates(&FacetFilter::new().with_min_rating(4.5))?;
/// assert!(batch.is_empty());
/// # Ok::<(), SourceError>(())
/// ```
pub trait CandidateSource {
    /// Return every venue matching `filter`.
    ///
    /// # Errors
    /// Returns [`SourceError`] when the backing store cannot be read.
    fn fetch_candidates(&self, filter: &FacetFilter) -> Result<Vec<VenueRecord>, SourceError>;
}

/// Supply the rating history the profile is fitted from.
///
/// Implementations may return every user's ratings; consumers must not
/// assume the collection is pre-filtered.
pub trait RatingHistorySource {
    /// Return the stored rating events.
    ///
    /// # Errors
    /// Returns [`SourceError`] when the backing store cannot be read.
    fn fetch_rating_history(&self) -> Result<Vec<RatingEvent>, SourceError>;
}
