//! Venue records as supplied by the catalogue query layer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Weekday;

use crate::{OpeningHours, VenueId, WeeklyHours};

/// Boolean amenities a venue may advertise.
///
/// The declaration order is the column order used by
/// [`FeatureSchema::reference`](crate::FeatureSchema::reference).
///
/// # Examples
/// ```
/// use savour_core::AttributeFlag;
///
/// assert_eq!(AttributeFlag::OutdoorSeating.as_str(), "outdoor_seating");
/// assert_eq!("delivery".parse::<AttributeFlag>(), Ok(AttributeFlag::Delivery));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AttributeFlag {
    /// Suitable for children.
    GoodForKids,
    /// Suitable for groups.
    GoodForGroups,
    /// Offers take-away.
    TakeOut,
    /// Accepts reservations.
    Reservations,
    /// Offers delivery.
    Delivery,
    /// Has outdoor seating.
    OutdoorSeating,
    /// Step-free access.
    WheelchairAccessible,
    /// Has bike parking.
    BikeParking,
    /// Accepts credit cards.
    CreditCardsAccepted,
    /// Serves alcohol.
    Alcohol,
    /// Runs a happy hour.
    HappyHour,
    /// Admits dogs.
    DogsAllowed,
    /// Follows sustainable practices.
    Sustainable,
    /// Has parking.
    Parking,
}

impl AttributeFlag {
    /// Every flag in declaration order.
    pub const ALL: [Self; 14] = [
        Self::GoodForKids,
        Self::GoodForGroups,
        Self::TakeOut,
        Self::Reservations,
        Self::Delivery,
        Self::OutdoorSeating,
        Self::WheelchairAccessible,
        Self::BikeParking,
        Self::CreditCardsAccepted,
        Self::Alcohol,
        Self::HappyHour,
        Self::DogsAllowed,
        Self::Sustainable,
        Self::Parking,
    ];

    /// Return the flag as a snake case `&str`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GoodForKids => "good_for_kids",
            Self::GoodForGroups => "good_for_groups",
            Self::TakeOut => "take_out",
            Self::Reservations => "reservations",
            Self::Delivery => "delivery",
            Self::OutdoorSeating => "outdoor_seating",
            Self::WheelchairAccessible => "wheelchair_accessible",
            Self::BikeParking => "bike_parking",
            Self::CreditCardsAccepted => "credit_cards_accepted",
            Self::Alcohol => "alcohol",
            Self::HappyHour => "happy_hour",
            Self::DogsAllowed => "dogs_allowed",
            Self::Sustainable => "sustainable",
            Self::Parking => "parking",
        }
    }
}

impl fmt::Display for AttributeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|flag| flag.as_str() == wanted)
            .ok_or_else(|| format!("unknown attribute flag '{s}'"))
    }
}

/// A venue eligible for ranking.
///
/// A flag missing from [`VenueRecord::flags`] is unknown rather than `false`.
/// Every record in one batch must carry the same flag set.
///
/// # Examples
/// ```
/// use savour_core::{AttributeFlag, VenueId, VenueRecord};
///
/// let venue = VenueRecord::new(VenueId::new("v1").unwrap(), 4.5, 120)
///     .with_price_tier(2)
///     .with_flag(AttributeFlag::Delivery, true);
/// assert_eq!(venue.flag(AttributeFlag::Delivery), Some(true));
/// assert_eq!(venue.flag(AttributeFlag::Parking), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VenueRecord {
    /// Unique business key.
    pub id: VenueId,
    /// Display name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    /// City the venue trades in.
    #[cfg_attr(feature = "serde", serde(default))]
    pub city: String,
    /// Mean star rating across all reviews.
    pub average_rating: f64,
    /// Number of reviews behind [`VenueRecord::average_rating`].
    pub review_count: u32,
    /// Price tier, `1` (cheapest) to `4`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub price_tier: Option<u8>,
    /// Known amenity flags.
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: BTreeMap<AttributeFlag, bool>,
    /// Cuisine tags, used for filtering only.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cuisines: Vec<String>,
    /// Ambience tags, used for filtering only.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ambiences: Vec<String>,
    /// Opening hours, used for filtering only.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hours: WeeklyHours,
}

impl VenueRecord {
    /// Construct a record with the continuous fields set and everything else
    /// empty.
    pub fn new(id: VenueId, average_rating: f64, review_count: u32) -> Self {
        Self {
            id,
            name: String::new(),
            city: String::new(),
            average_rating,
            review_count,
            price_tier: None,
            flags: BTreeMap::new(),
            cuisines: Vec::new(),
            ambiences: Vec::new(),
            hours: WeeklyHours::default(),
        }
    }

    /// Set the display name while returning `self` for chaining.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the city while returning `self` for chaining.
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    /// Set the price tier while returning `self` for chaining.
    #[must_use]
    pub fn with_price_tier(mut self, tier: u8) -> Self {
        self.price_tier = Some(tier);
        self
    }

    /// Record a flag value while returning `self` for chaining.
    #[must_use]
    pub fn with_flag(mut self, flag: AttributeFlag, value: bool) -> Self {
        self.flags.insert(flag, value);
        self
    }

    /// Record every flag in [`AttributeFlag::ALL`] with the same value.
    #[must_use]
    pub fn with_all_flags(mut self, value: bool) -> Self {
        self.flags = AttributeFlag::ALL.into_iter().map(|f| (f, value)).collect();
        self
    }

    /// Add a cuisine tag while returning `self` for chaining.
    #[must_use]
    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisines.push(cuisine.into());
        self
    }

    /// Add an ambience tag while returning `self` for chaining.
    #[must_use]
    pub fn with_ambience(mut self, ambience: impl Into<String>) -> Self {
        self.ambiences.push(ambience.into());
        self
    }

    /// Set one day's opening hours while returning `self` for chaining.
    #[must_use]
    pub fn with_hours(mut self, day: Weekday, hours: OpeningHours) -> Self {
        self.hours = self.hours.with_day(day, hours);
        self
    }

    /// Return a flag's value, or `None` when it is unknown.
    pub fn flag(&self, flag: AttributeFlag) -> Option<bool> {
        self.flags.get(&flag).copied()
    }

    /// Iterate over the flags this record carries, in column order.
    pub fn flag_set(&self) -> impl Iterator<Item = AttributeFlag> + '_ {
        self.flags.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("wheelchair_accessible", AttributeFlag::WheelchairAccessible)]
    #[case("Happy-Hour", AttributeFlag::HappyHour)]
    #[case(" parking ", AttributeFlag::Parking)]
    fn flags_parse_loosely(#[case] raw: &str, #[case] expected: AttributeFlag) {
        assert_eq!(raw.parse::<AttributeFlag>(), Ok(expected));
    }

    #[rstest]
    fn unknown_flag_is_rejected() {
        let err = "jukebox".parse::<AttributeFlag>().unwrap_err();
        assert!(err.contains("unknown attribute flag"));
    }

    #[rstest]
    fn display_matches_as_str() {
        for flag in AttributeFlag::ALL {
            assert_eq!(flag.to_string(), flag.as_str());
        }
    }

    #[rstest]
    fn flag_set_is_ordered_by_declaration() {
        let venue = VenueRecord::new(VenueId::new("v").unwrap(), 3.0, 1)
            .with_flag(AttributeFlag::Parking, false)
            .with_flag(AttributeFlag::GoodForKids, true);
        let flags: Vec<_> = venue.flag_set().collect();
        assert_eq!(flags, vec![AttributeFlag::GoodForKids, AttributeFlag::Parking]);
    }
}
