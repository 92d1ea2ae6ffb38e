//! Test-only, in-memory sources and gates used by unit and behaviour tests.

use crate::{
    CandidateSource, FacetFilter, RatingEvent, RatingHistorySource, ReviewGate, ReviewVerdict,
    SourceError, VenueRecord,
};

/// In-memory catalogue implementing both source traits.
///
/// The catalogue performs a linear scan and is intended only for small
/// datasets.
#[derive(Default, Debug, Clone)]
pub struct MemoryCatalog {
    venues: Vec<VenueRecord>,
    ratings: Vec<RatingEvent>,
}

impl MemoryCatalog {
    /// Create a catalogue from venues and ratings.
    pub fn new<V, R>(venues: V, ratings: R) -> Self
    where
        V: IntoIterator<Item = VenueRecord>,
        R: IntoIterator<Item = RatingEvent>,
    {
        Self {
            venues: venues.into_iter().collect(),
            ratings: ratings.into_iter().collect(),
        }
    }

    /// Create a catalogue with venues and no ratings.
    pub fn with_venues<V>(venues: V) -> Self
    where
        V: IntoIterator<Item = VenueRecord>,
    {
        Self::new(venues, std::iter::empty())
    }
}

impl CandidateSource for MemoryCatalog {
    fn fetch_candidates(&self, filter: &FacetFilter) -> Result<Vec<VenueRecord>, SourceError> {
        Ok(self
            .venues
            .iter()
            .filter(|venue| filter.matches(venue))
            .cloned()
            .collect())
    }
}

impl RatingHistorySource for MemoryCatalog {
    fn fetch_rating_history(&self) -> Result<Vec<RatingEvent>, SourceError> {
        Ok(self.ratings.clone())
    }
}

/// `ReviewGate` returning the same verdict for every text.
#[derive(Debug, Copy, Clone)]
pub struct FixedVerdictGate(pub ReviewVerdict);

impl ReviewGate for FixedVerdictGate {
    fn classify(&self, _text: &str) -> ReviewVerdict {
        self.0
    }
}

/// Source that always fails, for exercising error propagation.
#[derive(Debug, Copy, Clone, Default)]
pub struct FailingSource;

impl CandidateSource for FailingSource {
    fn fetch_candidates(&self, _filter: &FacetFilter) -> Result<Vec<VenueRecord>, SourceError> {
        Err(SourceError::backend(
            "fetch candidates",
            std::io::Error::other("catalogue offline"),
        ))
    }
}

impl RatingHistorySource for FailingSource {
    fn fetch_rating_history(&self) -> Result<Vec<RatingEvent>, SourceError> {
        Err(SourceError::backend(
            "fetch rating history",
            std::io::Error::other("history offline"),
        ))
    }
}
