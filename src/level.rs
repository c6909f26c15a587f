//! Segmentation levels.
//!
//! A level is a granularity at which the same text span is partitioned:
//! every byte belongs to exactly one character, every character to exactly
//! one word, and so on up to the whole document. The enum's ordering follows
//! coarseness, so `Level::Byte < Level::Word < Level::Document`.

/// A granularity at which text is segmented.
///
/// Ordered fine to coarse. The ordering is meaningful: an alignment always
/// maps a finer level onto a coarser one.
///
/// ```rust
/// use strata::Level;
///
/// assert!(Level::Byte < Level::Word);
/// assert!(Level::Sentence < Level::Document);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    /// Single bytes of the (cleaned) text.
    Byte,
    /// Unicode extended grapheme clusters.
    Character,
    /// Words, per UAX #29 word segmentation or a custom tokenizer.
    Word,
    /// Sentences, per UAX #29 sentence segmentation.
    Sentence,
    /// Paragraphs (blank-line separated blocks).
    Paragraph,
    /// Whole documents.
    Document,
}

impl Level {
    /// All levels, fine to coarse.
    pub const ALL: [Level; 6] = [
        Level::Byte,
        Level::Character,
        Level::Word,
        Level::Sentence,
        Level::Paragraph,
        Level::Document,
    ];

    /// The canonical fine/coarse alignment pairs.
    ///
    /// These are the pairs [`Bundle::build_alignments`] builds by default.
    ///
    /// [`Bundle::build_alignments`]: crate::Bundle::build_alignments
    pub const CANONICAL_PAIRS: [(Level, Level); 3] = [
        (Level::Byte, Level::Character),
        (Level::Byte, Level::Word),
        (Level::Character, Level::Word),
    ];

    /// Short lowercase name, matching the offset-field naming
    /// (`byte_offsets`, `word_offsets`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Level::Byte => "byte",
            Level::Character => "character",
            Level::Word => "word",
            Level::Sentence => "sentence",
            Level::Paragraph => "paragraph",
            Level::Document => "document",
        }
    }

    /// Whether `self` is strictly finer than `other`.
    #[must_use]
    pub fn is_finer_than(self, other: Level) -> bool {
        self < other
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coarseness_ordering() {
        assert!(Level::Byte < Level::Character);
        assert!(Level::Character < Level::Word);
        assert!(Level::Word < Level::Sentence);
        assert!(Level::Sentence < Level::Paragraph);
        assert!(Level::Paragraph < Level::Document);
    }

    #[test]
    fn test_canonical_pairs_are_fine_to_coarse() {
        for (fine, coarse) in Level::CANONICAL_PAIRS {
            assert!(fine.is_finer_than(coarse), "{fine} should be finer than {coarse}");
        }
    }

    #[test]
    fn test_display_matches_name() {
        for level in Level::ALL {
            assert_eq!(level.to_string(), level.name());
        }
    }
}
