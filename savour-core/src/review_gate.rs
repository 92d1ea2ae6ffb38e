//! Screening of review text before a rating is stored.
//!
//! The gate wraps an externally trained text classifier that is loaded once
//! and reused. It decides only whether a review may enter storage; it plays
//! no part in ranking.

use std::fmt;

/// Classifier outcome for one review text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReviewVerdict {
    /// Written by a person; may be stored.
    Genuine,
    /// Likely produced by a text generator; must be rejected.
    MachineGenerated,
}

impl ReviewVerdict {
    /// Whether a review with this verdict may be stored.
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Genuine)
    }
}

impl fmt::Display for ReviewVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Genuine => f.write_str("genuine"),
            Self::MachineGenerated => f.write_str("machine-generated"),
        }
    }
}

/// Classify review text before it is accepted into storage.
///
/// Implementations are long-lived services shared across requests, so they
/// must be `Send + Sync`. The method is infallible: a classifier that cannot
/// reach a decision should answer [`ReviewVerdict::MachineGenerated`] so
/// unscreened text never reaches the rating history.
///
/// # Examples
///
/// ```rust
/// use savour_core::{ReviewGate, ReviewVerdict};
///
/// struct ShoutingDetector;
///
/// impl ReviewGate for ShoutingDetector {
///     fn classify(&self, text: &str) -> ReviewVerdict {
///         if text.chars().any(char::is_lowercase) {
///             ReviewVerdict::Genuine
///         } else {
///             ReviewVerdict::MachineGenerated
///         }
///     }
/// }
///
/// assert!(ShoutingDetector.classify("Lovely noodles").is_accepted());
/// ```
pub trait ReviewGate: Send + Sync {
    /// Return the verdict for `text`.
    fn classify(&self, text: &str) -> ReviewVerdict;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ReviewVerdict::Genuine, true)]
    #[case(ReviewVerdict::MachineGenerated, false)]
    fn only_genuine_reviews_are_accepted(#[case] verdict: ReviewVerdict, #[case] expected: bool) {
        assert_eq!(verdict.is_accepted(), expected);
    }
}
