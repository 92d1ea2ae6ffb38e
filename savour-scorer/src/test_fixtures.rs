//! Shared builders for unit tests.

use savour_core::{RatingEvent, UserId, VenueId, VenueRecord};

pub(crate) fn id(key: &str) -> VenueId {
    VenueId::new(key).expect("valid venue id")
}

pub(crate) fn user(key: &str) -> UserId {
    UserId::new(key).expect("valid user id")
}

/// A record that satisfies the reference schema: price tier two, every flag
/// unset.
pub(crate) fn venue(key: &str, rating: f64, review_count: u32) -> VenueRecord {
    VenueRecord::new(id(key), rating, review_count)
        .with_price_tier(2)
        .with_all_flags(false)
}

pub(crate) fn rated(user_key: &str, venue_key: &str, rating: f64) -> RatingEvent {
    RatingEvent::new(user(user_key), id(venue_key), rating, 1_700_000_000).expect("valid rating")
}
