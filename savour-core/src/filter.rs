//! Facet filters that narrow the catalogue to a candidate batch.
//!
//! Filtering happens before ranking and never looks at a user's history.
//! Every populated facet must match; an empty filter admits every venue.
//!
//! # Examples
//! ```
//! use savour_core::{AttributeFlag, FacetFilter, VenueId, VenueRecord};
//!
//! let filter = FacetFilter::new()
//!     .with_city("leeds")
//!     .with_min_rating(4.0)
//!     .requiring(AttributeFlag::Delivery);
//! let venue = VenueRecord::new(VenueId::new("v").unwrap(), 4.5, 10)
//!     .with_city("Leeds")
//!     .with_flag(AttributeFlag::Delivery, true);
//! assert!(filter.matches(&venue));
//! ```

use std::collections::BTreeSet;

use crate::{AttributeFlag, OpenAt, VenueRecord};

/// Facets a candidate query may constrain.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FacetFilter {
    /// Case-insensitive substring of the venue name.
    pub name: Option<String>,
    /// Case-insensitive substring of the city.
    pub city: Option<String>,
    /// Cuisine tag the venue must carry (case-insensitive).
    pub cuisine: Option<String>,
    /// Ambience tag the venue must carry (case-insensitive).
    pub ambience: Option<String>,
    /// Inclusive lower bound on the average rating.
    pub min_rating: Option<f64>,
    /// Exact price tier.
    pub price_tier: Option<u8>,
    /// Flags that must be known and `true`.
    pub required_flags: BTreeSet<AttributeFlag>,
    /// Moment the venue must be open at. Venues without hours for that day
    /// never match.
    pub open_at: Option<OpenAt>,
}

impl FacetFilter {
    /// Construct a filter that admits every venue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain the name while returning `self` for chaining.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Constrain the city while returning `self` for chaining.
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Constrain the cuisine while returning `self` for chaining.
    #[must_use]
    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = Some(cuisine.into());
        self
    }

    /// Constrain the ambience while returning `self` for chaining.
    #[must_use]
    pub fn with_ambience(mut self, ambience: impl Into<String>) -> Self {
        self.ambience = Some(ambience.into());
        self
    }

    /// Constrain the minimum rating while returning `self` for chaining.
    #[must_use]
    pub fn with_min_rating(mut self, rating: f64) -> Self {
        self.min_rating = Some(rating);
        self
    }

    /// Constrain the price tier while returning `self` for chaining.
    #[must_use]
    pub fn with_price_tier(mut self, tier: u8) -> Self {
        self.price_tier = Some(tier);
        self
    }

    /// Require a flag while returning `self` for chaining.
    #[must_use]
    pub fn requiring(mut self, flag: AttributeFlag) -> Self {
        self.required_flags.insert(flag);
        self
    }

    /// Require the venue to be open at `moment` while returning `self` for
    /// chaining.
    #[must_use]
    pub fn with_open_at(mut self, moment: OpenAt) -> Self {
        self.open_at = Some(moment);
        self
    }

    /// Report whether `venue` satisfies every populated facet.
    pub fn matches(&self, venue: &VenueRecord) -> bool {
        contains_folded(self.name.as_deref(), &venue.name)
            && contains_folded(self.city.as_deref(), &venue.city)
            && has_tag(self.cuisine.as_deref(), &venue.cuisines)
            && has_tag(self.ambience.as_deref(), &venue.ambiences)
            && self
                .min_rating
                .is_none_or(|min| venue.average_rating >= min)
            && self
                .price_tier
                .is_none_or(|tier| venue.price_tier == Some(tier))
            && self
                .required_flags
                .iter()
                .all(|flag| venue.flag(*flag) == Some(true))
            && self
                .open_at
                .is_none_or(|at| venue.hours.is_open_at(at.weekday, at.time))
    }
}

fn contains_folded(needle: Option<&str>, haystack: &str) -> bool {
    needle.is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
}

fn has_tag(wanted: Option<&str>, tags: &[String]) -> bool {
    wanted.is_none_or(|w| tags.iter().any(|tag| tag.eq_ignore_ascii_case(w)))
}
