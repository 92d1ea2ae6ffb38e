#![expect(
    clippy::expect_used,
    reason = "tests should fail fast when setup breaks"
)]

//! Property checks for ranking invariants.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use savour_core::{AttributeFlag, FeatureSchema, RatingEvent, UserId, VenueId, VenueRecord};
use savour_scorer::{
    EngineConfig, FeatureMatrix, RecommendationEngine, Scores, UserProfile, popularity_order,
    score_candidates,
};

fn venue_strategy() -> impl Strategy<Value = (f64, u32, u8, Vec<bool>)> {
    (
        1.0_f64..=5.0,
        0_u32..5_000,
        1_u8..=4,
        prop::collection::vec(any::<bool>(), AttributeFlag::ALL.len()),
    )
}

fn batch_strategy() -> impl Strategy<Value = Vec<VenueRecord>> {
    prop::collection::vec(venue_strategy(), 0..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(position, (rating, count, tier, flags))| {
                let id = VenueId::new(format!("venue-{position}")).expect("venue id");
                AttributeFlag::ALL.into_iter().zip(flags).fold(
                    VenueRecord::new(id, rating, count).with_price_tier(tier),
                    |record, (flag, set)| record.with_flag(flag, set),
                )
            })
            .collect()
    })
}

/// Ratings by the diner for a subset of batch positions, plus noise from
/// another user.
fn history_for(batch: &[VenueRecord], picks: &[(usize, f64)]) -> Vec<RatingEvent> {
    let diner = UserId::new("diner").expect("user id");
    let other = UserId::new("someone-else").expect("user id");
    picks
        .iter()
        .filter_map(|(position, rating)| {
            batch.get(*position).map(|record| (record.id.clone(), *rating))
        })
        .flat_map(|(venue, rating)| {
            [
                RatingEvent::new(diner.clone(), venue.clone(), rating, 0).expect("rating"),
                RatingEvent::new(other.clone(), venue, 1.0, 0).expect("rating"),
            ]
        })
        .collect()
}

fn picks_strategy() -> impl Strategy<Value = Vec<(usize, f64)>> {
    prop::collection::vec((0_usize..40, 1.0_f64..=5.0), 0..6)
}

fn engine(top_n: usize) -> RecommendationEngine {
    RecommendationEngine::new(EngineConfig {
        top_n,
        ..EngineConfig::default()
    })
    .expect("valid config")
}

fn diner() -> UserId {
    UserId::new("diner").expect("user id")
}

const SCORE_TOLERANCE: f64 = 1e-9;

/// Whether `left` is no worse than `right` once rounding noise is ignored.
#[expect(clippy::float_arithmetic, reason = "compares scores with a tolerance")]
fn at_least_within_tolerance(left: f64, right: f64) -> bool {
    left >= right - SCORE_TOLERANCE * (1.0 + right.abs())
}

fn ranked(scores: Scores) -> Vec<(VenueId, f64)> {
    match scores {
        Scores::Ranked(entries) => entries
            .into_iter()
            .map(|entry| (entry.venue, entry.score))
            .collect(),
        Scores::ZeroWeightSum => panic!("positive weights cannot sum to zero"),
    }
}

proptest! {
    #[test]
    fn ranking_is_a_bounded_subset_without_duplicates(
        batch in batch_strategy(),
        picks in picks_strategy(),
        top_n in 1_usize..60,
    ) {
        let history = history_for(&batch, &picks);
        let ranking = engine(top_n).rank(&diner(), &batch, &history).expect("rank");
        let ids: Vec<&VenueId> = ranking.venue_ids().collect();
        let candidates: HashSet<&VenueId> = batch.iter().map(|record| &record.id).collect();
        let unique: HashSet<&VenueId> = ids.iter().copied().collect();

        prop_assert_eq!(ids.len(), top_n.min(batch.len()));
        prop_assert_eq!(unique.len(), ids.len());
        prop_assert!(unique.is_subset(&candidates));
    }

    #[test]
    fn empty_history_matches_popularity_order(
        batch in batch_strategy(),
        top_n in 1_usize..60,
    ) {
        let ranking = engine(top_n).rank(&diner(), &batch, &[]).expect("rank");
        prop_assert!(!ranking.is_personalised());
        prop_assert_eq!(ranking.into_venue_ids(), popularity_order(&batch, top_n));
    }

    #[test]
    fn ranking_is_deterministic(
        batch in batch_strategy(),
        picks in picks_strategy(),
    ) {
        let history = history_for(&batch, &picks);
        let ranker = engine(500);
        let first = ranker.rank(&diner(), &batch, &history).expect("rank");
        let second = ranker.rank(&diner(), &batch, &history).expect("rank");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn power_of_two_rescaling_keeps_order(
        batch in batch_strategy(),
        weights in prop::collection::vec(-5.0_f64..5.0, 17),
        exponent in -8_i32..8,
    ) {
        let matrix = FeatureMatrix::from_batch(&FeatureSchema::reference(), &batch)
            .expect("normalise");
        let profile = UserProfile::new(diner(), weights);
        let scaled = profile.scaled(2.0_f64.powi(exponent));
        let base = score_candidates(&matrix, &profile, 500).expect("score");
        let rescaled = score_candidates(&matrix, &scaled, 500).expect("score");
        match (base, rescaled) {
            (Scores::Ranked(left), Scores::Ranked(right)) => {
                let left_ids: Vec<_> = left.into_iter().map(|entry| entry.venue).collect();
                let right_ids: Vec<_> = right.into_iter().map(|entry| entry.venue).collect();
                prop_assert_eq!(left_ids, right_ids);
            }
            (Scores::ZeroWeightSum, Scores::ZeroWeightSum) => {}
            (left, right) => prop_assert!(false, "outcomes diverged: {left:?} vs {right:?}"),
        }
    }

    #[test]
    fn positive_rescaling_keeps_scores_within_tolerance(
        batch in batch_strategy(),
        weights in prop::collection::vec(0.1_f64..5.0, 17),
        factor in prop_oneof![Just(3.0_f64), 0.01_f64..100.0],
    ) {
        let matrix = FeatureMatrix::from_batch(&FeatureSchema::reference(), &batch)
            .expect("normalise");
        let profile = UserProfile::new(diner(), weights);
        let base = ranked(score_candidates(&matrix, &profile, 500).expect("score"));
        let rescaled = ranked(
            score_candidates(&matrix, &profile.scaled(factor), 500).expect("score"),
        );
        prop_assert_eq!(base.len(), rescaled.len());

        let base_scores: HashMap<&VenueId, f64> =
            base.iter().map(|(venue, score)| (venue, *score)).collect();
        for (venue, score) in &rescaled {
            let original = base_scores.get(venue).copied().expect("same venues");
            prop_assert!(at_least_within_tolerance(*score, original));
            prop_assert!(at_least_within_tolerance(original, *score));
        }
        for pair in rescaled.windows(2) {
            if let [(higher, _), (lower, _)] = pair {
                let higher = base_scores.get(higher).copied().expect("same venues");
                let lower = base_scores.get(lower).copied().expect("same venues");
                prop_assert!(at_least_within_tolerance(higher, lower));
            }
        }
    }

    #[test]
    fn concurrent_requests_match_sequential(
        batch in batch_strategy(),
        picks in picks_strategy(),
    ) {
        let history = history_for(&batch, &picks);
        let ranker = engine(500);
        let users = [diner(), UserId::new("someone-else").expect("user id")];
        let sequential: Vec<_> = users
            .iter()
            .map(|user| ranker.rank(user, &batch, &history).expect("rank"))
            .collect();
        let shared = &ranker;
        let candidates = batch.as_slice();
        let events = history.as_slice();
        let concurrent: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = users
                .iter()
                .map(|user| {
                    scope.spawn(move || shared.rank(user, candidates, events).expect("rank"))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("thread completes"))
                .collect()
        });
        prop_assert_eq!(sequential, concurrent);
    }
}

#[test]
fn constant_column_contributes_nothing() {
    let batch: Vec<VenueRecord> = [("a", 4.5), ("b", 3.0), ("c", 4.0)]
        .into_iter()
        .map(|(key, rating)| {
            VenueRecord::new(VenueId::new(key).expect("venue id"), rating, 42)
                .with_price_tier(2)
                .with_all_flags(false)
        })
        .collect();
    let matrix = FeatureMatrix::from_batch(&FeatureSchema::reference(), &batch)
        .expect("normalise");
    for (_, row) in matrix.rows() {
        assert_eq!(row.get(1).copied(), Some(0.0), "review_count column must be zero");
    }

    let mut boosted = vec![1.0; 17];
    if let Some(weight) = boosted.get_mut(1) {
        *weight = 1_000.0;
    }
    let plain = score_candidates(&matrix, &UserProfile::new(diner(), vec![1.0; 17]), 10)
        .expect("score");
    let heavy = score_candidates(&matrix, &UserProfile::new(diner(), boosted), 10)
        .expect("score");
    let order = |scores: Scores| match scores {
        Scores::Ranked(ranked) => ranked.into_iter().map(|entry| entry.venue).collect::<Vec<_>>(),
        Scores::ZeroWeightSum => panic!("weights are positive"),
    };
    assert_eq!(order(plain), order(heavy));
}
