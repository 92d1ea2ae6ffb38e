//! Personalised venue ranking.
//!
//! A request flows through four stages:
//! - **Normalisation** turns the candidate batch into a [`FeatureMatrix`],
//!   z-scoring continuous columns against the batch's own mean and sample
//!   standard deviation.
//! - **Profile fitting** sums the feature vectors of venues the user rated,
//!   each weighted by the rating, into a [`UserProfile`].
//! - **Scoring** takes the dot product of each candidate with the profile,
//!   divides by the profile's weight sum, and sorts descending.
//! - **Fallback** orders candidates by average rating when no profile can
//!   be fitted or its weights sum to zero.
//!
//! [`RecommendationEngine`] wires the stages together and reports which
//! [`RankingStrategy`] produced each [`Ranking`].

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod engine;
mod error;
mod fallback;
mod normaliser;
mod profile;
mod scorer;

#[cfg(test)]
mod test_fixtures;

pub use engine::{
    DEFAULT_TOP_N, EngineConfig, FallbackReason, RankRequest, RankedVenue, Ranking,
    RankingStrategy, RecommendationEngine,
};
pub use error::{ConfigError, RankError, SchemaMismatch};
pub use fallback::popularity_order;
pub use normaliser::{BatchStatistics, ColumnStatistics, FeatureMatrix};
pub use profile::{HistoryScope, ProfileFitter, UserProfile};
pub use scorer::{ScoredVenue, Scores, score_candidates};
