//! Cross-level alignment: fine→coarse membership maps.
//!
//! A [`CrossMap`] answers "which word contains byte 4021?" in O(1): it is a
//! dense array with one entry per fine-grained token, holding the 1-based
//! index of the coarse unit containing it.
//!
//! ```text
//! bytes:          a   b   c       (byte corpus, 3 tokens)
//! byte_offsets:  [1,  2,  3,  4]
//! word_offsets:  [1,      3,  4]  (words "ab", "c", in byte indices)
//!
//! byte -> word:  [1,  1,  2]
//! ```
//!
//! ## Coarse-Outward Range Fill
//!
//! The map is built by iterating coarse units and filling each one's fine
//! range, not by searching for each fine index. This is linear-total and
//! branch-predictable, and it covers every fine index exactly once when the
//! offsets are well-formed; a slot left unfilled can only mean malformed
//! offsets. A running-boundary scan over fine indices is *not* an acceptable
//! substitute: it has a known off-by-one failure mode that the bijection
//! property test in `tests/` would catch.

use std::collections::BTreeMap;

use tracing::debug;

use crate::bundle::Bundle;
use crate::corpus::{Corpus, LevelBundle};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::offsets::OffsetVec;
use crate::vocab::Vocabulary;

/// A dense fine→coarse membership map.
///
/// `alignment[i]` is the 1-based index of the destination unit containing
/// source token `i` (0-based). No sentinel; the length equals the source
/// token count. A `CrossMap` is a pure derived artifact of a corpus's offset
/// vectors and owns its array outright, so dropping or replacing the corpus
/// never invalidates a handed-out map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrossMap {
    source: Level,
    destination: Level,
    alignment: Vec<u32>,
}

impl CrossMap {
    /// Build the `fine` → `coarse` membership map from one corpus's offset
    /// vectors.
    ///
    /// Both vectors must be populated with at least two entries, and their
    /// trailing sentinels must agree ("same span"). A sentinel mismatch is
    /// the signature of running fine- and coarse-level tokenization over
    /// differently-cleaned text.
    ///
    /// # Errors
    ///
    /// [`Error::MissingOffsets`] or [`Error::SpanMismatch`], naming the
    /// levels and the conflicting sentinel values.
    pub fn build(corpus: &Corpus, fine: Level, coarse: Level) -> Result<Self> {
        let fine_offsets = require_offsets(corpus, fine, fine, coarse)?;
        let coarse_offsets = require_offsets(corpus, coarse, fine, coarse)?;

        let fine_sentinel = fine_offsets.sentinel().unwrap_or(0);
        let coarse_sentinel = coarse_offsets.sentinel().unwrap_or(0);
        if fine_sentinel != coarse_sentinel {
            return Err(Error::SpanMismatch {
                fine,
                coarse,
                fine_sentinel,
                coarse_sentinel,
            });
        }

        let n_fine = fine_offsets.unit_count();
        let mut alignment = vec![0u32; n_fine];
        for c in 0..coarse_offsets.unit_count() {
            // unit_range already yields the 0-based [start, end) token range.
            let range = coarse_offsets.unit_range(c).unwrap_or(0..0);
            let unit = (c + 1) as u32;
            for slot in &mut alignment[range.start.min(n_fine)..range.end.min(n_fine)] {
                *slot = unit;
            }
        }

        debug!(
            fine = %fine,
            coarse = %coarse,
            n_fine,
            n_coarse = coarse_offsets.unit_count(),
            "built cross-level alignment"
        );
        Ok(Self {
            source: fine,
            destination: coarse,
            alignment,
        })
    }

    /// The fine (source) level.
    #[must_use]
    pub fn source(&self) -> Level {
        self.source
    }

    /// The coarse (destination) level.
    #[must_use]
    pub fn destination(&self) -> Level {
        self.destination
    }

    /// The membership array: 1-based destination-unit indices, one per
    /// source token.
    #[must_use]
    pub fn alignment(&self) -> &[u32] {
        &self.alignment
    }

    /// The 1-based destination unit containing source token `index`
    /// (0-based), if in range.
    #[must_use]
    pub fn destination_of(&self, index: usize) -> Option<u32> {
        self.alignment.get(index).copied()
    }
}

impl std::fmt::Display for CrossMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CrossMap {{ {} -> {}, len: {} }}",
            self.source,
            self.destination,
            self.alignment.len()
        )
    }
}

fn require_offsets<'a>(
    corpus: &'a Corpus,
    level: Level,
    fine: Level,
    coarse: Level,
) -> Result<&'a OffsetVec> {
    match corpus.offsets(level) {
        Some(v) if v.as_slice().len() >= 2 => Ok(v),
        _ => Err(Error::MissingOffsets {
            fine,
            coarse,
            missing: level,
        }),
    }
}

impl Bundle {
    /// Build the requested fine→coarse alignments and insert them.
    ///
    /// Pairs whose fine level is absent from the bundle are skipped, as are
    /// pairs already built — calling this twice is a no-op the second time.
    /// Each map is read from the *fine* level's corpus, which records both
    /// its own trivial offsets and the coarse units' starts in its index
    /// space.
    ///
    /// # Errors
    ///
    /// Propagates [`CrossMap::build`] errors for pairs whose levels are
    /// present but whose offset vectors are missing or span-mismatched.
    pub fn build_alignments(&mut self, pairs: &[(Level, Level)]) -> Result<()> {
        for &(fine, coarse) in pairs {
            if !self.has_level(fine) || !self.has_level(coarse) {
                continue;
            }
            if self.alignment(fine, coarse).is_ok() {
                continue;
            }
            let map = CrossMap::build(self.level(fine)?.corpus(), fine, coarse)?;
            self.insert_alignment(map);
        }
        Ok(())
    }

    /// Build the three canonical alignments:
    /// byte→character, byte→word, character→word.
    ///
    /// # Errors
    ///
    /// Same as [`Bundle::build_alignments`].
    pub fn build_canonical_alignments(&mut self) -> Result<()> {
        self.build_alignments(&Level::CANONICAL_PAIRS)
    }

    /// Synthesize placeholder byte/character levels so the canonical
    /// alignments can exist even when the pipeline never tokenized at those
    /// granularities.
    ///
    /// A placeholder copies its offset vectors from whichever real fine
    /// level recorded them (byte from character, character from byte) and
    /// carries no token identity: every token id is `1` against a one-entry
    /// `<unk>` vocabulary. Placeholders are listed in
    /// [`Metadata::placeholder_levels`] so callers and tests can tell them
    /// from genuine levels.
    ///
    /// # Errors
    ///
    /// Structural errors if a copied offset vector fails re-validation
    /// (which would indicate a corrupted source level).
    ///
    /// [`Metadata::placeholder_levels`]: crate::Metadata::placeholder_levels
    pub fn ensure_unit_levels(&mut self) -> Result<()> {
        let candidates = [(Level::Character, Level::Byte), (Level::Byte, Level::Character)];
        for (target, source) in candidates {
            if self.has_level(target) || !self.has_level(source) {
                continue;
            }
            if self.metadata().placeholder_levels.contains(&source) {
                continue;
            }
            let synthesized = synthesize_level(self.level(source)?.corpus(), target)?;
            debug!(target = %target, source = %source, "synthesized placeholder level");
            self.insert_level(target, synthesized);
            self.metadata_mut().placeholder_levels.insert(target);
        }
        Ok(())
    }
}

/// Clone a real corpus's offset vectors into a tokenless placeholder at
/// `target` granularity.
fn synthesize_level(source: &Corpus, target: Level) -> Result<LevelBundle> {
    let n = source.n_tokens();
    let mut raw: BTreeMap<Level, Vec<u32>> = BTreeMap::new();
    for level in Level::ALL {
        if let Some(v) = source.offsets(level) {
            raw.insert(level, v.as_slice().to_vec());
        }
    }
    // The placeholder's own-level vector is trivial: one unit per token.
    raw.insert(target, (1..=n as u32 + 1).collect());

    let corpus = Corpus::build(vec![1; n], raw)?;
    LevelBundle::new(corpus, Vocabulary::unknown_only())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_corpus(word_starts: Vec<u32>, n: usize) -> Corpus {
        let trivial: Vec<u32> = (1..=n as u32 + 1).collect();
        Corpus::build(
            vec![1; n],
            [(Level::Byte, trivial), (Level::Word, word_starts)],
        )
        .unwrap()
    }

    #[test]
    fn test_each_byte_its_own_word() {
        // tokens ["a","b","c"], byte_offsets [1,2,3,4], word_offsets [1,2,3,4]
        let corpus = byte_corpus(vec![1, 2, 3, 4], 3);
        let map = CrossMap::build(&corpus, Level::Byte, Level::Word).unwrap();
        assert_eq!(map.alignment(), &[1, 2, 3]);
    }

    #[test]
    fn test_multi_byte_word() {
        // tokens ["ab","c"]: word_offsets [1,3,4] over 3 bytes
        let corpus = byte_corpus(vec![1, 3, 4], 3);
        let map = CrossMap::build(&corpus, Level::Byte, Level::Word).unwrap();
        assert_eq!(map.alignment(), &[1, 1, 2]);
        assert_eq!(map.destination_of(1), Some(1));
        assert_eq!(map.destination_of(2), Some(2));
        assert_eq!(map.destination_of(3), None);
    }

    #[test]
    fn test_missing_offsets_is_precondition_error() {
        let corpus = Corpus::build(vec![1, 1, 1], []).unwrap();
        let err = CrossMap::build(&corpus, Level::Byte, Level::Word).unwrap_err();
        match err {
            Error::MissingOffsets { fine, coarse, missing } => {
                assert_eq!(fine, Level::Byte);
                assert_eq!(coarse, Level::Word);
                assert_eq!(missing, Level::Byte);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_span_mismatch_rejected() {
        // word_offsets claim a 2-token span inside a 3-token corpus: the
        // inclusive-end style makes [1,3] normalize to sentinel 4 over 3
        // tokens, so force the mismatch through a shorter word span.
        let trivial: Vec<u32> = vec![1, 2, 3, 4];
        let mut corpus = Corpus::build(vec![1, 1, 1], [(Level::Byte, trivial)]).unwrap();
        // Hand-build a word vector over a 2-token span and splice it in.
        let foreign = OffsetVec::from_raw(Level::Word, vec![1, 3], 2).unwrap();
        corpus.set_offsets(Level::Word, foreign);

        let err = CrossMap::build(&corpus, Level::Byte, Level::Word).unwrap_err();
        match err {
            Error::SpanMismatch { fine_sentinel, coarse_sentinel, .. } => {
                assert_eq!(fine_sentinel, 4);
                assert_eq!(coarse_sentinel, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_coverage_is_total() {
        // Irregular word sizes; every byte must land in exactly one word.
        let corpus = byte_corpus(vec![1, 4, 5, 9, 10], 9);
        let map = CrossMap::build(&corpus, Level::Byte, Level::Word).unwrap();
        assert_eq!(map.alignment().len(), 9);
        assert!(map.alignment().iter().all(|&w| w >= 1));
        assert_eq!(map.alignment(), &[1, 1, 1, 2, 3, 3, 3, 3, 4]);
    }
}
