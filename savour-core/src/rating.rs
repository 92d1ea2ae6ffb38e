//! Historical ratings used to fit preference profiles.

use thiserror::Error;

use crate::{UserId, VenueId};

/// Lowest star rating a review may carry.
pub const MIN_RATING: f64 = 1.0;
/// Highest star rating a review may carry.
pub const MAX_RATING: f64 = 5.0;

/// Errors returned by [`RatingEvent::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RatingError {
    /// The rating was NaN or infinite.
    #[error("rating must be a finite number")]
    NonFinite,
    /// The rating fell outside the star scale.
    #[error("rating {value} is outside {MIN_RATING}..={MAX_RATING}")]
    OutOfRange {
        /// Rejected value.
        value: f64,
    },
}

/// One user's rating of one venue.
///
/// Events are immutable once created.
///
/// # Examples
/// ```
/// use savour_core::{RatingEvent, UserId, VenueId};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let event = RatingEvent::new(UserId::new("u1")?, VenueId::new("v1")?, 4.5, 1_700_000_000)?;
/// assert_eq!(event.rating(), 4.5);
/// assert!(RatingEvent::new(UserId::new("u1")?, VenueId::new("v1")?, 7.0, 0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "UncheckedRating"))]
pub struct RatingEvent {
    user: UserId,
    venue: VenueId,
    rating: f64,
    timestamp: i64,
}

impl RatingEvent {
    /// Validate and construct a rating.
    ///
    /// `timestamp` is seconds since the Unix epoch.
    ///
    /// # Errors
    /// Returns [`RatingError`] when `rating` is not finite or lies outside
    /// [`MIN_RATING`]`..=`[`MAX_RATING`].
    pub fn new(
        user: UserId,
        venue: VenueId,
        rating: f64,
        timestamp: i64,
    ) -> Result<Self, RatingError> {
        if !rating.is_finite() {
            return Err(RatingError::NonFinite);
        }
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(RatingError::OutOfRange { value: rating });
        }
        Ok(Self {
            user,
            venue,
            rating,
            timestamp,
        })
    }

    /// User who wrote the rating.
    pub const fn user(&self) -> &UserId {
        &self.user
    }

    /// Venue the rating targets.
    pub const fn venue(&self) -> &VenueId {
        &self.venue
    }

    /// Star rating.
    pub const fn rating(&self) -> f64 {
        self.rating
    }

    /// Seconds since the Unix epoch.
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Wire shape validated through [`RatingEvent::new`] on deserialisation.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct UncheckedRating {
    user: UserId,
    venue: VenueId,
    rating: f64,
    timestamp: i64,
}

#[cfg(feature = "serde")]
impl TryFrom<UncheckedRating> for RatingEvent {
    type Error = RatingError;

    fn try_from(raw: UncheckedRating) -> Result<Self, Self::Error> {
        Self::new(raw.user, raw.venue, raw.rating, raw.timestamp)
    }
}
