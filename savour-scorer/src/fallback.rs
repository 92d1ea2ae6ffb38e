//! Popularity ordering used when no profile can be fitted.

use savour_core::{VenueId, VenueRecord};

use crate::scorer::descending;

/// Order candidates by average rating, highest first, keeping batch order
/// for ties, and keep the first `top_n`.
///
/// Review counts are ignored, so a venue rated 5.0 once outranks one rated
/// 4.9 a thousand times.
#[must_use]
pub fn popularity_order(candidates: &[VenueRecord], top_n: usize) -> Vec<VenueId> {
    let mut ordered: Vec<&VenueRecord> = candidates.iter().collect();
    ordered.sort_by(|left, right| descending(left.average_rating, right.average_rating));
    ordered
        .into_iter()
        .take(top_n)
        .map(|record| record.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::test_fixtures::{id, venue};

    #[rstest]
    fn orders_by_rating_and_ignores_review_count() {
        let batch = vec![
            venue("steady", 4.9, 1_000),
            venue("once", 5.0, 1),
            venue("weak", 2.5, 400),
        ];
        assert_eq!(
            popularity_order(&batch, 10),
            vec![id("once"), id("steady"), id("weak")]
        );
    }

    #[rstest]
    fn ties_keep_batch_order_and_limit_applies() {
        let batch = vec![venue("b", 4.0, 1), venue("a", 4.0, 2), venue("c", 4.0, 3)];
        assert_eq!(popularity_order(&batch, 2), vec![id("b"), id("a")]);
    }

    #[rstest]
    fn empty_batch_yields_nothing() {
        assert!(popularity_order(&[], 500).is_empty());
    }
}
