//! Immutable string↔id vocabulary with named special tokens.
//!
//! Ids are 1-based and dense: the first entry gets id 1, and every id in
//! `1..=len` names exactly one string. Id 0 never appears in valid data.
//!
//! ## Identity, Not Equality
//!
//! A [`Vocabulary`] is cheaply clonable (`Arc` inside) and every clone is
//! *the same instance*. The streaming merge engine compares instances, not
//! contents: two separate builds can agree on content today and diverge in
//! provenance tomorrow, which would silently change what every token id
//! means. [`Vocabulary::same_instance`] is the check.
//!
//! ## Determinism
//!
//! [`VocabularyBuilder`] assigns ids deterministically: special tokens first,
//! in the order they were declared, then surviving corpus tokens in
//! lexicographic order. Two builds from identical input produce identical
//! id assignments.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::TokenId;

#[derive(Debug)]
struct VocabInner {
    /// Index 0 is a filler so that id `i` lives at `id_to_string[i]`.
    id_to_string: Vec<String>,
    string_to_id: HashMap<String, TokenId>,
    frequencies: Vec<u64>,
    specials: BTreeMap<String, TokenId>,
}

/// An immutable, shared token vocabulary.
///
/// ```rust
/// use strata::VocabularyBuilder;
///
/// let mut builder = VocabularyBuilder::new();
/// builder.add_special("<unk>");
/// builder.count("cat");
/// builder.count("cat");
/// builder.count("ant");
/// let vocab = builder.build(1);
///
/// assert_eq!(vocab.id("<unk>"), Some(1)); // specials first
/// assert_eq!(vocab.id("ant"), Some(2));   // then lexicographic
/// assert_eq!(vocab.id("cat"), Some(3));
/// assert_eq!(vocab.token(3), Some("cat"));
/// assert_eq!(vocab.frequency(3), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct Vocabulary {
    inner: Arc<VocabInner>,
}

impl Vocabulary {
    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.id_to_string.len() - 1
    }

    /// Whether the vocabulary has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The id of `token`, if present.
    #[must_use]
    pub fn id(&self, token: &str) -> Option<TokenId> {
        self.inner.string_to_id.get(token).copied()
    }

    /// The string for `id` (1-based), if in range.
    #[must_use]
    pub fn token(&self, id: TokenId) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.inner.id_to_string.get(id as usize).map(String::as_str)
    }

    /// The observed frequency of `id` (specials count as 0), if in range.
    #[must_use]
    pub fn frequency(&self, id: TokenId) -> Option<u64> {
        if id == 0 {
            return None;
        }
        self.inner.frequencies.get(id as usize).copied()
    }

    /// The id of a named special token, if declared.
    #[must_use]
    pub fn special(&self, name: &str) -> Option<TokenId> {
        self.inner.specials.get(name).copied()
    }

    /// Whether `self` and `other` are the same instance.
    ///
    /// This is pointer identity on the shared allocation, not content
    /// comparison.
    #[must_use]
    pub fn same_instance(&self, other: &Vocabulary) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A one-entry vocabulary holding only `<unk>`, used for placeholder
    /// levels that carry no real token identity.
    #[must_use]
    pub fn unknown_only() -> Vocabulary {
        let mut builder = VocabularyBuilder::new();
        builder.add_special("<unk>");
        builder.build(1)
    }
}

/// Deterministic [`Vocabulary`] builder: frequency counting plus a
/// minimum-frequency cutoff.
#[derive(Debug, Default)]
pub struct VocabularyBuilder {
    /// Declaration order matters; ids for specials follow it.
    specials: Vec<String>,
    /// BTreeMap so corpus-token iteration is lexicographic, hence
    /// deterministic.
    counts: BTreeMap<String, u64>,
}

impl VocabularyBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a special token. Ignored if already declared.
    pub fn add_special(&mut self, name: &str) {
        if !self.specials.iter().any(|s| s == name) {
            self.specials.push(name.to_string());
        }
    }

    /// Count one occurrence of `token`.
    pub fn count(&mut self, token: &str) {
        *self.counts.entry(token.to_string()).or_insert(0) += 1;
    }

    /// Count every token produced by `tokens`.
    pub fn count_all<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            self.count(token.as_ref());
        }
    }

    /// Build the vocabulary, keeping corpus tokens with frequency
    /// `>= min_frequency`. Specials are always kept and never counted.
    #[must_use]
    pub fn build(self, min_frequency: u64) -> Vocabulary {
        let mut id_to_string = vec![String::new()]; // filler so ids are 1-based
        let mut string_to_id = HashMap::new();
        let mut frequencies = vec![0];
        let mut specials = BTreeMap::new();

        for name in self.specials {
            let id = id_to_string.len() as TokenId;
            string_to_id.insert(name.clone(), id);
            specials.insert(name.clone(), id);
            id_to_string.push(name);
            frequencies.push(0);
        }

        // BTreeMap iteration is lexicographic already.
        for (token, freq) in self.counts {
            if freq < min_frequency || string_to_id.contains_key(&token) {
                continue;
            }
            let id = id_to_string.len() as TokenId;
            string_to_id.insert(token.clone(), id);
            id_to_string.push(token);
            frequencies.push(freq);
        }

        Vocabulary {
            inner: Arc::new(VocabInner {
                id_to_string,
                string_to_id,
                frequencies,
                specials,
            }),
        }
    }
}
