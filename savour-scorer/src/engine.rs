//! Request-level orchestration: normalise, fit, score, or fall back.
//!
//! The engine holds no mutable state. One instance can serve concurrent
//! requests from many threads; each request builds its own matrix and
//! profile and discards them once the ranking is returned.

use std::fmt;
use std::num::NonZeroUsize;

use log::debug;
use savour_core::{
    CandidateSource, FacetFilter, FeatureSchema, RatingEvent, RatingHistorySource, UserId,
    VenueField, VenueId, VenueRecord,
};

use crate::{
    ConfigError, FeatureMatrix, HistoryScope, ProfileFitter, RankError, SchemaMismatch,
    ScoredVenue, Scores, popularity_order, score_candidates,
};

/// Result limit applied when the caller does not choose one.
pub const DEFAULT_TOP_N: usize = 500;

/// Settings shared by every request an engine serves.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Layout of the feature vector.
    pub schema: FeatureSchema,
    /// Which ratings may shape a profile.
    pub scope: HistoryScope,
    /// Default maximum number of venues per ranking.
    pub top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema: FeatureSchema::reference(),
            scope: HistoryScope::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl EngineConfig {
    /// Check the configuration can produce a ranking.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroTopN`] when `top_n` is zero.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        Ok(())
    }
}

/// Why a request fell back to popularity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackReason {
    /// None of the user's ratings fell inside the history scope. This
    /// includes users with no ratings and empty candidate batches.
    NoHistoryOverlap,
    /// The fitted profile's weights summed to zero.
    ZeroWeightSum,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHistoryOverlap => f.write_str("no rating history overlaps the candidates"),
            Self::ZeroWeightSum => f.write_str("profile weights sum to zero"),
        }
    }
}

/// How a [`Ranking`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "kebab-case")]
pub enum RankingStrategy {
    /// Ordered by score against the user's fitted profile.
    Personalised,
    /// Ordered by average rating.
    Popularity(FallbackReason),
}

impl fmt::Display for RankingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Personalised => f.write_str("personalised"),
            Self::Popularity(reason) => write!(f, "popularity ({reason})"),
        }
    }
}

/// One entry of a [`Ranking`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RankedVenue {
    /// Candidate venue.
    pub venue: VenueId,
    /// Personalised score; absent for popularity rankings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Ordered venues for one request, best first.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Ranking {
    strategy: RankingStrategy,
    venues: Vec<RankedVenue>,
}

impl Ranking {
    fn personalised(scored: Vec<ScoredVenue>) -> Self {
        Self {
            strategy: RankingStrategy::Personalised,
            venues: scored
                .into_iter()
                .map(|entry| RankedVenue {
                    venue: entry.venue,
                    score: Some(entry.score),
                })
                .collect(),
        }
    }

    fn popularity(reason: FallbackReason, venues: Vec<VenueId>) -> Self {
        Self {
            strategy: RankingStrategy::Popularity(reason),
            venues: venues
                .into_iter()
                .map(|venue| RankedVenue { venue, score: None })
                .collect(),
        }
    }

    /// How the ranking was produced.
    #[must_use]
    pub const fn strategy(&self) -> RankingStrategy {
        self.strategy
    }

    /// Whether the ranking used the user's profile.
    #[must_use]
    pub const fn is_personalised(&self) -> bool {
        matches!(self.strategy, RankingStrategy::Personalised)
    }

    /// Ranked entries, best first.
    #[must_use]
    pub fn entries(&self) -> &[RankedVenue] {
        &self.venues
    }

    /// Venue ids, best first.
    pub fn venue_ids(&self) -> impl Iterator<Item = &VenueId> + '_ {
        self.venues.iter().map(|entry| &entry.venue)
    }

    /// Consume the ranking, keeping only the venue ids.
    #[must_use]
    pub fn into_venue_ids(self) -> Vec<VenueId> {
        self.venues.into_iter().map(|entry| entry.venue).collect()
    }

    /// Number of ranked venues.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.venues.len()
    }

    /// Whether nothing was ranked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}

/// Inputs for one ranking request.
///
/// # Examples
/// ```
/// use std::num::NonZeroUsize;
///
/// use savour_core::UserId;
/// use savour_scorer::{RankRequest, RecommendationEngine};
///
/// let user = UserId::new("diner").unwrap();
/// let limit = NonZeroUsize::new(20).unwrap();
/// let request = RankRequest::new(&user, &[], &[]).with_top_n(limit);
/// let ranking = RecommendationEngine::default().rank_request(&request).unwrap();
/// assert!(ranking.is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RankRequest<'a> {
    user: &'a UserId,
    candidates: &'a [VenueRecord],
    history: &'a [RatingEvent],
    rated_venues: &'a [VenueRecord],
    top_n: Option<NonZeroUsize>,
}

impl<'a> RankRequest<'a> {
    /// Rank `candidates` for `user` given the full rating history.
    #[must_use]
    pub const fn new(
        user: &'a UserId,
        candidates: &'a [VenueRecord],
        history: &'a [RatingEvent],
    ) -> Self {
        Self {
            user,
            candidates,
            history,
            rated_venues: &[],
            top_n: None,
        }
    }

    /// Supply records of rated venues outside the batch, used under
    /// [`HistoryScope::FullHistory`].
    #[must_use]
    pub const fn with_rated_venues(mut self, rated_venues: &'a [VenueRecord]) -> Self {
        self.rated_venues = rated_venues;
        self
    }

    /// Override the engine's result limit for this request.
    #[must_use]
    pub const fn with_top_n(mut self, top_n: NonZeroUsize) -> Self {
        self.top_n = Some(top_n);
        self
    }
}

/// Ranks candidate venues for a user.
///
/// # Examples
/// ```
/// use savour_core::{RatingEvent, UserId, VenueId, VenueRecord};
/// use savour_scorer::{RankingStrategy, RecommendationEngine};
///
/// let venue = |key: &str, rating, count| {
///     VenueRecord::new(VenueId::new(key).unwrap(), rating, count)
///         .with_price_tier(2)
///         .with_all_flags(false)
/// };
/// let candidates = [venue("b", 3.0, 10), venue("a", 4.5, 100)];
/// let user = UserId::new("diner").unwrap();
/// let history = [RatingEvent::new(user.clone(), VenueId::new("a").unwrap(), 5.0, 0).unwrap()];
///
/// let ranking = RecommendationEngine::default()
///     .rank(&user, &candidates, &history)
///     .unwrap();
/// assert_eq!(ranking.strategy(), RankingStrategy::Personalised);
/// let order: Vec<_> = ranking.venue_ids().map(VenueId::as_str).collect();
/// assert_eq!(order, ["a", "b"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: EngineConfig,
    fitter: ProfileFitter,
}

impl RecommendationEngine {
    /// Build an engine from a validated configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the configuration is unusable.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fitter = ProfileFitter::new(config.scope);
        Ok(Self { config, fitter })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rank `candidates` for `user` with the configured limit.
    ///
    /// # Errors
    /// Returns [`RankError::SchemaMismatch`] when a record does not fit the
    /// schema. The check runs before any fallback decision.
    pub fn rank(
        &self,
        user: &UserId,
        candidates: &[VenueRecord],
        history: &[RatingEvent],
    ) -> Result<Ranking, RankError> {
        self.rank_request(&RankRequest::new(user, candidates, history))
    }

    /// Rank with rated-venue records available for the full-history scope.
    ///
    /// # Errors
    /// See [`RecommendationEngine::rank`].
    pub fn rank_with_reference(
        &self,
        user: &UserId,
        candidates: &[VenueRecord],
        history: &[RatingEvent],
        rated_venues: &[VenueRecord],
    ) -> Result<Ranking, RankError> {
        self.rank_request(
            &RankRequest::new(user, candidates, history).with_rated_venues(rated_venues),
        )
    }

    /// Rank a fully described request.
    ///
    /// # Errors
    /// See [`RecommendationEngine::rank`].
    pub fn rank_request(&self, request: &RankRequest<'_>) -> Result<Ranking, RankError> {
        let top_n = request
            .top_n
            .map_or(self.config.top_n, NonZeroUsize::get);
        debug!(
            "ranking {} candidates for {} (top {top_n})",
            request.candidates.len(),
            request.user
        );
        if request.candidates.is_empty() {
            return Ok(Ranking::popularity(FallbackReason::NoHistoryOverlap, Vec::new()));
        }

        let matrix = FeatureMatrix::from_batch(&self.config.schema, request.candidates)?;
        ensure_rankable_ratings(request.candidates)?;
        let Some(profile) = self.fitter.fit(
            request.user,
            &matrix,
            request.history,
            request.rated_venues,
        )?
        else {
            return Ok(fall_back(request, top_n, FallbackReason::NoHistoryOverlap));
        };

        match score_candidates(&matrix, &profile, top_n)? {
            Scores::Ranked(scored) => {
                debug!("personalised ranking for {} holds {} venues", request.user, scored.len());
                Ok(Ranking::personalised(scored))
            }
            Scores::ZeroWeightSum => Ok(fall_back(request, top_n, FallbackReason::ZeroWeightSum)),
        }
    }

    /// Fetch candidates and history from their sources, then rank.
    ///
    /// Under [`HistoryScope::FullHistory`] the candidate source is queried a
    /// second time with an empty filter to resolve rated venues outside the
    /// batch.
    ///
    /// # Errors
    /// Returns [`RankError::Source`] when a source fails, otherwise as
    /// [`RecommendationEngine::rank`].
    pub fn rank_from_sources(
        &self,
        user: &UserId,
        filter: &FacetFilter,
        candidates: &dyn CandidateSource,
        history: &dyn RatingHistorySource,
    ) -> Result<Ranking, RankError> {
        let batch = candidates.fetch_candidates(filter)?;
        let events = history.fetch_rating_history()?;
        let rated_venues = match self.config.scope {
            HistoryScope::CandidateBatch => Vec::new(),
            HistoryScope::FullHistory => candidates.fetch_candidates(&FacetFilter::default())?,
        };
        self.rank_with_reference(user, &batch, &events, &rated_venues)
    }
}

/// The fallback orders by average rating whether or not the schema turns it
/// into a column, so every candidate needs a finite one.
fn ensure_rankable_ratings(candidates: &[VenueRecord]) -> Result<(), SchemaMismatch> {
    candidates
        .iter()
        .find(|record| !record.average_rating.is_finite())
        .map_or(Ok(()), |record| {
            Err(SchemaMismatch::NonFiniteValue {
                venue: record.id.clone(),
                field: VenueField::AverageRating,
            })
        })
}

fn fall_back(request: &RankRequest<'_>, top_n: usize, reason: FallbackReason) -> Ranking {
    debug!("falling back to popularity for {}: {reason}", request.user);
    Ranking::popularity(reason, popularity_order(request.candidates, top_n))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use savour_core::test_support::{FailingSource, MemoryCatalog};
    use savour_core::{AttributeFlag, FieldDescriptor, FieldTreatment, SourceError};

    use super::*;
    use crate::test_fixtures::{id, rated, user, venue};

    fn ids(ranking: &Ranking) -> Vec<&str> {
        ranking.venue_ids().map(VenueId::as_str).collect()
    }

    #[rstest]
    fn rejects_zero_top_n() {
        let config = EngineConfig {
            top_n: 0,
            ..EngineConfig::default()
        };
        assert_eq!(
            RecommendationEngine::new(config).map(|_| ()),
            Err(ConfigError::ZeroTopN)
        );
    }

    #[rstest]
    fn personalises_towards_rated_venue() {
        let candidates = vec![venue("b", 3.0, 10), venue("a", 4.5, 100)];
        let ranking = RecommendationEngine::default()
            .rank(&user("u"), &candidates, &[rated("u", "a", 5.0)])
            .expect("rank");
        assert_eq!(ranking.strategy(), RankingStrategy::Personalised);
        assert_eq!(ids(&ranking), vec!["a", "b"]);
        assert!(ranking.entries().iter().all(|entry| entry.score.is_some()));
    }

    #[rstest]
    fn falls_back_without_overlapping_history() {
        let candidates = vec![venue("ok", 3.5, 10), venue("best", 4.8, 3), venue("meh", 2.0, 90)];
        let ranking = RecommendationEngine::default()
            .rank(&user("u"), &candidates, &[rated("u", "elsewhere", 5.0)])
            .expect("rank");
        assert_eq!(
            ranking.strategy(),
            RankingStrategy::Popularity(FallbackReason::NoHistoryOverlap)
        );
        assert_eq!(ids(&ranking), vec!["best", "ok", "meh"]);
        assert!(ranking.entries().iter().all(|entry| entry.score.is_none()));
    }

    fn review_count_engine() -> RecommendationEngine {
        let schema = FeatureSchema::new(
            2,
            vec![FieldDescriptor::new(
                VenueField::ReviewCount,
                FieldTreatment::Normalised,
            )],
        )
        .expect("schema");
        RecommendationEngine::new(EngineConfig {
            schema,
            ..EngineConfig::default()
        })
        .expect("engine")
    }

    #[rstest]
    fn falls_back_when_weights_cancel() {
        let engine = review_count_engine();
        let candidates = vec![venue("x", 3.0, 10), venue("y", 4.0, 20)];
        let history = [rated("u", "x", 5.0), rated("u", "y", 5.0)];
        let ranking = engine.rank(&user("u"), &candidates, &history).expect("rank");
        assert_eq!(
            ranking.strategy(),
            RankingStrategy::Popularity(FallbackReason::ZeroWeightSum)
        );
        assert_eq!(ids(&ranking), vec!["y", "x"]);
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_non_finite_ratings_outside_the_schema(#[case] bad: f64) {
        let candidates: Vec<_> = (0..200_u32)
            .zip([3.5, bad, 4.5].into_iter().cycle())
            .map(|(n, rating)| venue(&format!("v{n}"), rating, n))
            .collect();
        let err = review_count_engine()
            .rank(&user("nobody"), &candidates, &[])
            .expect_err("non-finite rating");
        assert!(matches!(
            err,
            RankError::SchemaMismatch(SchemaMismatch::NonFiniteValue {
                field: VenueField::AverageRating,
                ..
            })
        ));
    }

    #[rstest]
    fn empty_batch_returns_empty_ranking() {
        let ranking = RecommendationEngine::default()
            .rank(&user("u"), &[], &[rated("u", "a", 5.0)])
            .expect("rank");
        assert!(ranking.is_empty());
    }

    #[rstest]
    fn schema_is_checked_before_fallback() {
        let candidates = vec![venue("a", 4.0, 1), VenueRecord::new(id("b"), 3.0, 2)];
        let err = RecommendationEngine::default()
            .rank(&user("nobody"), &candidates, &[])
            .expect_err("schema mismatch");
        assert!(matches!(
            err,
            RankError::SchemaMismatch(SchemaMismatch::FieldSetDiffers { .. })
        ));
    }

    #[rstest]
    fn request_limit_overrides_config() {
        let candidates = vec![venue("a", 4.0, 1), venue("b", 3.0, 2), venue("c", 2.0, 3)];
        let user = user("u");
        let request = RankRequest::new(&user, &candidates, &[])
            .with_top_n(NonZeroUsize::new(1).expect("non-zero"));
        let ranking = RecommendationEngine::default()
            .rank_request(&request)
            .expect("rank");
        assert_eq!(ids(&ranking), vec!["a"]);
    }

    #[rstest]
    fn full_history_scope_uses_ratings_outside_the_batch() {
        let engine = RecommendationEngine::new(EngineConfig {
            scope: HistoryScope::FullHistory,
            ..EngineConfig::default()
        })
        .expect("engine");
        let candidates = vec![venue("b", 3.0, 10), venue("a", 4.5, 100)];
        let history = [rated("u", "twin", 5.0)];
        let reference = [venue("twin", 4.5, 100)];

        let scoped = RecommendationEngine::default()
            .rank_with_reference(&user("u"), &candidates, &history, &reference)
            .expect("rank");
        assert!(!scoped.is_personalised());

        let full = engine
            .rank_with_reference(&user("u"), &candidates, &history, &reference)
            .expect("rank");
        assert!(full.is_personalised());
        assert_eq!(ids(&full), vec!["a", "b"]);
    }

    #[rstest]
    fn ranks_from_sources() {
        let catalog = MemoryCatalog::new(
            [
                venue("dine-in", 4.9, 50),
                venue("delivers", 3.9, 40).with_flag(AttributeFlag::Delivery, true),
                venue("also-delivers", 4.2, 10).with_flag(AttributeFlag::Delivery, true),
            ],
            [rated("u", "dine-in", 5.0)],
        );
        let filter = FacetFilter::new().requiring(AttributeFlag::Delivery);
        let ranking = RecommendationEngine::default()
            .rank_from_sources(&user("u"), &filter, &catalog, &catalog)
            .expect("rank");
        assert_eq!(
            ranking.strategy(),
            RankingStrategy::Popularity(FallbackReason::NoHistoryOverlap)
        );
        assert_eq!(ids(&ranking), vec!["also-delivers", "delivers"]);
    }

    #[rstest]
    fn source_failures_surface() {
        let err = RecommendationEngine::default()
            .rank_from_sources(&user("u"), &FacetFilter::new(), &FailingSource, &FailingSource)
            .expect_err("source failure");
        assert!(matches!(err, RankError::Source(SourceError::Backend { .. })));
    }

    #[rstest]
    fn strategy_serialises_with_reason() {
        let json = serde_json::to_value(RankingStrategy::Popularity(FallbackReason::ZeroWeightSum))
            .expect("serialise");
        assert_eq!(
            json,
            serde_json::json!({ "kind": "popularity", "reason": "zero-weight-sum" })
        );
    }
}
