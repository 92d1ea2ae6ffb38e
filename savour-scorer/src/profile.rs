//! Rating-weighted user profiles.
//!
//! A profile is the sum of the normalised feature vectors of the venues a
//! user rated, each multiplied by the rating given. It is rebuilt for every
//! request and never persisted.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use savour_core::{RatingEvent, UserId, VenueId, VenueRecord};

use crate::{FeatureMatrix, SchemaMismatch};

/// Which rating events may contribute to a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryScope {
    /// Only ratings of venues inside the current candidate batch count.
    #[default]
    CandidateBatch,
    /// Every rating counts. Rated venues outside the batch are projected
    /// with the batch's statistics, so the caller must supply their records.
    FullHistory,
}

impl HistoryScope {
    /// Kebab-case name used on the command line and in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CandidateBatch => "candidate-batch",
            Self::FullHistory => "full-history",
        }
    }
}

impl fmt::Display for HistoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "candidate-batch" => Ok(Self::CandidateBatch),
            "full-history" => Ok(Self::FullHistory),
            other => Err(format!(
                "unknown history scope '{other}', expected candidate-batch or full-history"
            )),
        }
    }
}

/// Preference weights for one user, one per feature column.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    user: UserId,
    weights: Vec<f64>,
    contributions: usize,
}

impl UserProfile {
    /// Build a profile from explicit weights.
    #[must_use]
    pub const fn new(user: UserId, weights: Vec<f64>) -> Self {
        Self {
            user,
            weights,
            contributions: 0,
        }
    }

    /// Owner of the profile.
    #[must_use]
    pub const fn user(&self) -> &UserId {
        &self.user
    }

    /// Weights in column order.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of weights.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.weights.len()
    }

    /// Number of rating events folded into the profile.
    #[must_use]
    pub const fn contributions(&self) -> usize {
        self.contributions
    }

    /// Sum of all weights, the divisor applied to every raw score.
    #[must_use]
    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// The same profile with every weight multiplied by `factor`.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "weights are scaled in place")]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            user: self.user.clone(),
            weights: self.weights.iter().map(|weight| weight * factor).collect(),
            contributions: self.contributions,
        }
    }
}

/// Folds a user's rating history into a [`UserProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileFitter {
    scope: HistoryScope,
}

impl ProfileFitter {
    /// Create a fitter for the given scope.
    #[must_use]
    pub const fn new(scope: HistoryScope) -> Self {
        Self { scope }
    }

    /// Scope the fitter applies.
    #[must_use]
    pub const fn scope(self) -> HistoryScope {
        self.scope
    }

    /// Fit a profile for `user` against a normalised candidate batch.
    ///
    /// Every rating event contributes separately, so a venue rated twice is
    /// counted twice. `rated_venues` is consulted only under
    /// [`HistoryScope::FullHistory`]; ratings whose venue is neither a
    /// candidate nor supplied there are skipped. Returns `Ok(None)` when no
    /// rating contributes.
    ///
    /// # Errors
    /// Returns [`SchemaMismatch`] when a rated venue outside the batch does
    /// not fit the batch's field set.
    pub fn fit(
        self,
        user: &UserId,
        candidates: &FeatureMatrix,
        history: &[RatingEvent],
        rated_venues: &[VenueRecord],
    ) -> Result<Option<UserProfile>, SchemaMismatch> {
        let reference: HashMap<&VenueId, &VenueRecord> = match self.scope {
            HistoryScope::CandidateBatch => HashMap::new(),
            HistoryScope::FullHistory => rated_venues
                .iter()
                .map(|record| (&record.id, record))
                .collect(),
        };
        let mut weights = vec![0.0; candidates.dimension()];
        let mut contributions = 0_usize;
        let mut skipped = 0_usize;
        for event in history.iter().filter(|event| event.user() == user) {
            let row: Cow<'_, [f64]> = match candidates.row(event.venue()) {
                Some(row) => Cow::Borrowed(row),
                None => match reference.get(event.venue()) {
                    Some(record) => Cow::Owned(candidates.statistics().project(record)?),
                    None => {
                        skipped += 1;
                        continue;
                    }
                },
            };
            accumulate(&mut weights, event.rating(), &row);
            contributions += 1;
        }
        debug!(
            "fitted profile for {user} from {contributions} ratings, {skipped} outside {} scope",
            self.scope
        );
        if contributions == 0 {
            return Ok(None);
        }
        Ok(Some(UserProfile {
            user: user.clone(),
            weights,
            contributions,
        }))
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "profile weights are rating-weighted feature sums"
)]
fn accumulate(weights: &mut [f64], rating: f64, row: &[f64]) {
    for (weight, feature) in weights.iter_mut().zip(row) {
        *weight += rating * feature;
    }
}
