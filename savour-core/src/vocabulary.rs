//! Injected tables of known cuisine and ambience names.
//!
//! Catalogue taxonomies change independently of the feature schema, so the
//! accepted tag names live in data rather than in code.
//!
//! # Examples
//! ```
//! use savour_core::Vocabulary;
//!
//! let cuisines = Vocabulary::new(["Thai", "Sushi Bars", "thai"]);
//! assert_eq!(cuisines.len(), 2);
//! assert_eq!(cuisines.canonical("THAI"), Some("Thai"));
//! assert_eq!(cuisines.canonical("Pizza"), None);
//! ```

use std::collections::BTreeMap;

/// Case-insensitive set of tag names that preserves the first spelling seen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Vocabulary {
    terms: BTreeMap<String, String>,
}

impl Vocabulary {
    /// Build a vocabulary from names; blank names are ignored.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut terms = BTreeMap::new();
        for name in names {
            let owned: String = name.into();
            let trimmed = owned.trim();
            if trimmed.is_empty() {
                continue;
            }
            terms
                .entry(trimmed.to_lowercase())
                .or_insert_with(|| trimmed.to_owned());
        }
        Self { terms }
    }

    /// Return the canonical spelling of `name`, if known.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.terms.get(&name.trim().to_lowercase()).map(String::as_str)
    }

    /// Split `names` into canonical known terms and unknown leftovers.
    pub fn partition<'a, I>(&self, names: I) -> (Vec<String>, Vec<String>)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for name in names {
            match self.canonical(name) {
                Some(term) if !known.iter().any(|k: &String| k == term) => {
                    known.push(term.to_owned());
                }
                Some(_) => {}
                None => unknown.push(name.clone()),
            }
        }
        (known, unknown)
    }

    /// Iterate over canonical spellings in case-folded order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.terms.values().map(String::as_str)
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether no terms are known.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn first_spelling_wins() {
        let vocabulary = Vocabulary::new(["Hot Pot", "hot pot", " HOT POT "]);
        assert_eq!(vocabulary.iter().collect::<Vec<_>>(), vec!["Hot Pot"]);
    }

    #[rstest]
    fn blank_names_are_ignored() {
        let vocabulary = Vocabulary::new(["", "  "]);
        assert!(vocabulary.is_empty());
    }

    #[rstest]
    fn partition_canonicalises_and_deduplicates() {
        let vocabulary = Vocabulary::new(["Thai", "Greek"]);
        let tags = vec!["thai".to_owned(), "Jukebox".to_owned(), "THAI".to_owned()];
        let (known, unknown) = vocabulary.partition(&tags);
        assert_eq!(known, vec!["Thai".to_owned()]);
        assert_eq!(unknown, vec!["Jukebox".to_owned()]);
    }
}
