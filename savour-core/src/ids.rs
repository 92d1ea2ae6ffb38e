//! Opaque identifiers for venues and users.
//!
//! Both identifiers wrap the catalogue's string keys. Constructors reject
//! blank keys so an empty string never silently matches another record.
//!
//! # Examples
//! ```
//! use savour_core::{UserId, VenueId};
//!
//! let venue = VenueId::new("mhrW9Vy2oRz1TbhnP3nzbQ").expect("valid venue id");
//! let user = UserId::new("u-42").expect("valid user id");
//! assert_eq!(venue.as_str(), "mhrW9Vy2oRz1TbhnP3nzbQ");
//! assert_eq!(user.to_string(), "u-42");
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors returned when constructing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The key was empty or contained only whitespace.
    #[error("{kind} identifier must not be blank")]
    Blank {
        /// Which identifier was being constructed.
        kind: &'static str,
    },
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a key.
            ///
            /// # Errors
            /// Returns [`IdentifierError::Blank`] when the key is empty or
            /// whitespace only.
            pub fn new(key: impl Into<String>) -> Result<Self, IdentifierError> {
                let key = key.into();
                if key.trim().is_empty() {
                    return Err(IdentifierError::Blank { kind: $kind });
                }
                Ok(Self(key))
            }

            /// Borrow the underlying key.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

string_id!(
    /// Unique business key of a venue.
    VenueId,
    "venue"
);

string_id!(
    /// Identity of a person who rates venues.
    UserId,
    "user"
);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn blank_keys_are_rejected(#[case] key: &str) {
        assert_eq!(
            VenueId::new(key),
            Err(IdentifierError::Blank { kind: "venue" })
        );
        assert_eq!(UserId::new(key), Err(IdentifierError::Blank { kind: "user" }));
    }

    #[rstest]
    fn parsing_round_trips_through_display() {
        let id: VenueId = "abc".parse().unwrap();
        assert_eq!(id.to_string(), "abc");
    }

    #[rstest]
    fn ordering_follows_the_key() {
        let a = VenueId::new("a").unwrap();
        let b = VenueId::new("b").unwrap();
        assert!(a < b);
    }
}
