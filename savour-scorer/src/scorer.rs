//! Linear scoring of a normalised batch against a profile.

use std::cmp::Ordering;

use savour_core::VenueId;

use crate::{FeatureMatrix, SchemaMismatch, UserProfile};

/// A candidate with its personalised score.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScoredVenue {
    /// Candidate venue.
    pub venue: VenueId,
    /// Dot product of the venue's features and the profile, divided by the
    /// profile's weight sum.
    pub score: f64,
}

/// Outcome of [`score_candidates`].
#[derive(Debug, Clone, PartialEq)]
pub enum Scores {
    /// Venues in descending score order, truncated to the requested limit.
    Ranked(Vec<ScoredVenue>),
    /// The profile's weights sum to zero (or overflow), so scores cannot be
    /// normalised and the caller should fall back.
    ZeroWeightSum,
}

/// Score every venue in `matrix` against `profile` and keep the best
/// `top_n`.
///
/// Ties keep batch order. The weight sum is used as-is, so a negative sum
/// inverts the order the raw dot products would give.
///
/// # Errors
/// Returns [`SchemaMismatch::DimensionMismatch`] when the profile's width
/// differs from the matrix's.
///
/// # Examples
/// ```
/// use savour_core::{FeatureSchema, FieldDescriptor, FieldTreatment, UserId, VenueField, VenueId, VenueRecord};
/// use savour_scorer::{FeatureMatrix, Scores, UserProfile, score_candidates};
///
/// let schema = FeatureSchema::new(
///     1,
///     vec![FieldDescriptor::new(VenueField::ReviewCount, FieldTreatment::Passthrough)],
/// )
/// .unwrap();
/// let batch = [
///     VenueRecord::new(VenueId::new("quiet").unwrap(), 4.0, 3),
///     VenueRecord::new(VenueId::new("busy").unwrap(), 4.0, 30),
/// ];
/// let matrix = FeatureMatrix::from_batch(&schema, &batch).unwrap();
/// let profile = UserProfile::new(UserId::new("u").unwrap(), vec![2.0]);
/// let Scores::Ranked(ranked) = score_candidates(&matrix, &profile, 10).unwrap() else {
///     panic!("non-zero weights always rank");
/// };
/// assert_eq!(ranked[0].venue.as_str(), "busy");
/// assert_eq!(ranked[0].score, 30.0);
/// ```
pub fn score_candidates(
    matrix: &FeatureMatrix,
    profile: &UserProfile,
    top_n: usize,
) -> Result<Scores, SchemaMismatch> {
    if profile.dimension() != matrix.dimension() {
        return Err(SchemaMismatch::DimensionMismatch {
            expected: matrix.dimension(),
            found: profile.dimension(),
        });
    }
    let weight_sum = profile.weight_sum();
    if weight_sum == 0.0 || !weight_sum.is_finite() {
        return Ok(Scores::ZeroWeightSum);
    }
    let mut scored: Vec<ScoredVenue> = matrix
        .rows()
        .map(|(venue, features)| ScoredVenue {
            venue: venue.clone(),
            score: normalised_dot(features, profile.weights(), weight_sum),
        })
        .collect();
    scored.sort_by(|left, right| descending(left.score, right.score));
    scored.truncate(top_n);
    Ok(Scores::Ranked(scored))
}

#[expect(
    clippy::float_arithmetic,
    reason = "scores are a weighted sum divided by the weight total"
)]
fn normalised_dot(features: &[f64], weights: &[f64], weight_sum: f64) -> f64 {
    let raw: f64 = features
        .iter()
        .zip(weights)
        .map(|(feature, weight)| feature * weight)
        .sum();
    raw / weight_sum
}

/// Descending order for finite scores. Equal values compare equal so a stable
/// sort keeps their input order.
pub(crate) fn descending(left: f64, right: f64) -> Ordering {
    right.partial_cmp(&left).unwrap_or(Ordering::Equal)
}
