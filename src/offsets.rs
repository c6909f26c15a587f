//! Offset vectors: 1-based unit-start indices into a token sequence.
//!
//! ## The Sentinel Problem
//!
//! An offset vector marks where each unit (word, sentence, ...) starts in a
//! token-id sequence. With a trailing sentinel, unit `i`'s token range is
//! uniformly `[offsets[i], offsets[i+1] - 1]`, even for the last unit:
//!
//! ```text
//! tokens:  ["the", "cat", "sat", "."]        (n = 4)
//! words:   [the cat] [sat .]
//! offsets: [1, 3, 5]
//!           │  │  └─ sentinel = n + 1
//!           │  └─ word 2 starts at token 3
//!           └─ word 1 starts at token 1
//! ```
//!
//! Two sentinel styles circulate in the wild: exclusive-end `n + 1` and
//! inclusive-end `n`, sometimes with a leading `0` or a duplicated first
//! entry. Silently assuming one style is the classic source of off-by-one
//! alignment bugs, so normalization happens exactly once, here, at the
//! boundary: [`OffsetVec::from_raw`] accepts every style and everything
//! downstream (alignment, merge) only ever sees the canonical
//! `[starts..., n + 1]` form.

use crate::error::{Error, Result};
use crate::level::Level;

/// A validated offset vector in canonical form.
///
/// Canonical form is either empty (a chunk that contributed nothing at this
/// level) or `[s_1, ..., s_m, n + 1]`: the 1-based start of each of `m`
/// units followed by a single trailing sentinel one past the token count.
///
/// ```rust
/// use strata::{Level, OffsetVec};
///
/// // Inclusive-end style with a leading zero, over 4 tokens...
/// let v = OffsetVec::from_raw(Level::Word, vec![0, 1, 3, 4], 4).unwrap();
/// // ...normalizes to the canonical exclusive-end style.
/// assert_eq!(v.as_slice(), &[1, 3, 5]);
/// assert_eq!(v.unit_count(), 2);
/// assert_eq!(v.unit_range(0), Some(0..2)); // 0-based token range of unit 0
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetVec {
    offsets: Vec<u32>,
}

impl OffsetVec {
    /// Normalize and validate a raw offset vector over `n_tokens` tokens.
    ///
    /// Accepted foreign styles, all normalized away:
    ///
    /// - leading sentinel `0`;
    /// - a leading entry equal to the first real unit start (`[1, 1, ...]`);
    /// - trailing sentinel `n` (inclusive-end) or `n + 1` (exclusive-end).
    ///
    /// An empty `raw` yields the empty vector. Any other trailing value, a
    /// decreasing pair, or an out-of-range entry is a structural error.
    ///
    /// # Errors
    ///
    /// [`Error::TrailingSentinel`], [`Error::UnsortedOffsets`], or
    /// [`Error::OffsetOutOfRange`], each naming `level` and the offending
    /// values.
    pub fn from_raw(level: Level, raw: Vec<u32>, n_tokens: usize) -> Result<Self> {
        if raw.is_empty() {
            return Ok(Self { offsets: Vec::new() });
        }

        let n = u32::try_from(n_tokens).unwrap_or(u32::MAX);
        let mut offsets = raw;

        // Leading sentinel: 0 is always one; a duplicate of the first real
        // start only counts when something follows it.
        if offsets[0] == 0 || (offsets.len() >= 2 && offsets[0] == offsets[1]) {
            offsets.remove(0);
        }

        // Trailing sentinel: accept n (inclusive-end) or n + 1, emit n + 1.
        let last = *offsets.last().unwrap_or(&0);
        if last == n + 1 {
            // already canonical
        } else if last == n && n > 0 {
            if let Some(tail) = offsets.last_mut() {
                *tail = n + 1;
            }
        } else {
            return Err(Error::TrailingSentinel {
                level,
                expected: n + 1,
                actual: last,
            });
        }

        let vec = Self { offsets };
        vec.validate(level, n_tokens)?;
        Ok(vec)
    }

    /// Wrap already-canonical unit starts, appending the sentinel.
    ///
    /// `starts` must be the 1-based starts of each unit, without sentinels.
    /// Used by segmenters that produce canonical data directly.
    pub(crate) fn from_starts(level: Level, mut starts: Vec<u32>, n_tokens: usize) -> Result<Self> {
        if starts.is_empty() && n_tokens == 0 {
            return Ok(Self { offsets: Vec::new() });
        }
        let n = u32::try_from(n_tokens).unwrap_or(u32::MAX);
        starts.push(n + 1);
        let vec = Self { offsets: starts };
        vec.validate(level, n_tokens)?;
        Ok(vec)
    }

    /// The default single-document vector `[1, n + 1]` over `n_tokens`.
    pub(crate) fn whole_span(n_tokens: usize) -> Self {
        let n = u32::try_from(n_tokens).unwrap_or(u32::MAX);
        Self { offsets: vec![1, n + 1] }
    }

    /// A vector with no units and no sentinel, the merge accumulator's
    /// starting state.
    pub(crate) fn empty() -> Self {
        Self { offsets: Vec::new() }
    }

    fn validate(&self, level: Level, n_tokens: usize) -> Result<()> {
        let n = u32::try_from(n_tokens).unwrap_or(u32::MAX);
        let limit = n + 1;
        for (position, window) in self.offsets.windows(2).enumerate() {
            if window[1] < window[0] {
                return Err(Error::UnsortedOffsets {
                    level,
                    position: position + 1,
                    previous: window[0],
                    value: window[1],
                });
            }
        }
        for (position, &value) in self.offsets.iter().enumerate() {
            if value == 0 || value > limit {
                return Err(Error::OffsetOutOfRange {
                    level,
                    position,
                    value,
                    limit,
                });
            }
        }
        Ok(())
    }

    /// The canonical offsets, 1-based, trailing sentinel included.
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.offsets
    }

    /// Number of units (entries minus the sentinel).
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Whether this vector carries no units at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The trailing sentinel, if the vector is non-empty.
    #[must_use]
    pub fn sentinel(&self) -> Option<u32> {
        self.offsets.last().copied()
    }

    /// The 0-based token range of unit `unit` (0-based), if it exists.
    ///
    /// Equivalent to the 1-based inclusive range
    /// `[offsets[unit], offsets[unit + 1] - 1]` from the data model.
    #[must_use]
    pub fn unit_range(&self, unit: usize) -> Option<std::ops::Range<usize>> {
        if unit + 1 >= self.offsets.len() {
            return None;
        }
        let start = self.offsets[unit] as usize - 1;
        let end = self.offsets[unit + 1] as usize - 1;
        Some(start..end)
    }

    /// Fold another canonical vector onto this one, re-basing by `shift`.
    ///
    /// Pops this vector's stale trailing sentinel (accepting either style
    /// relative to the pre-append token count), copies the chunk's interior
    /// unit starts shifted by `+shift`, and pushes a fresh sentinel for
    /// `new_total` tokens. Sentinels are regenerated, never propagated, so
    /// styles cannot drift across many merges.
    pub(crate) fn extend_rebased(&mut self, chunk: &OffsetVec, shift: u32, new_total: u32) {
        if chunk.is_empty() {
            // Contributed nothing at this level; an empty chunk appends no
            // tokens either, so the existing sentinel is still correct.
            return;
        }
        if let Some(&last) = self.offsets.last() {
            if last == shift || last == shift + 1 {
                self.offsets.pop();
            }
        }
        // All but the chunk's own trailing sentinel are interior unit starts.
        let interior = &chunk.offsets[..chunk.offsets.len() - 1];
        self.offsets.extend(interior.iter().map(|&v| v + shift));
        self.offsets.push(new_total + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_passthrough() {
        let v = OffsetVec::from_raw(Level::Word, vec![1, 3, 5], 4).unwrap();
        assert_eq!(v.as_slice(), &[1, 3, 5]);
        assert_eq!(v.unit_count(), 2);
        assert_eq!(v.sentinel(), Some(5));
    }

    #[test]
    fn test_inclusive_end_style_normalized() {
        // Trailing n instead of n + 1.
        let v = OffsetVec::from_raw(Level::Word, vec![1, 3, 4], 4).unwrap();
        assert_eq!(v.as_slice(), &[1, 3, 5]);
    }

    #[test]
    fn test_leading_zero_dropped() {
        let v = OffsetVec::from_raw(Level::Sentence, vec![0, 1, 4, 7], 6).unwrap();
        assert_eq!(v.as_slice(), &[1, 4, 7]);
    }

    #[test]
    fn test_leading_duplicate_dropped() {
        let v = OffsetVec::from_raw(Level::Sentence, vec![1, 1, 4, 7], 6).unwrap();
        assert_eq!(v.as_slice(), &[1, 4, 7]);
    }

    #[test]
    fn test_empty_is_empty() {
        let v = OffsetVec::from_raw(Level::Word, vec![], 0).unwrap();
        assert!(v.is_empty());
        assert_eq!(v.unit_count(), 0);
        assert_eq!(v.sentinel(), None);
    }

    #[test]
    fn test_bad_sentinel_rejected() {
        let err = OffsetVec::from_raw(Level::Word, vec![1, 3, 9], 4).unwrap_err();
        match err {
            Error::TrailingSentinel { level, expected, actual } => {
                assert_eq!(level, Level::Word);
                assert_eq!(expected, 5);
                assert_eq!(actual, 9);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decreasing_rejected() {
        let err = OffsetVec::from_raw(Level::Word, vec![1, 4, 2, 5], 4).unwrap_err();
        assert!(matches!(err, Error::UnsortedOffsets { .. }));
    }

    #[test]
    fn test_unit_ranges_cover_tokens() {
        let v = OffsetVec::from_raw(Level::Word, vec![1, 3, 4, 6], 5).unwrap();
        assert_eq!(v.unit_range(0), Some(0..2));
        assert_eq!(v.unit_range(1), Some(2..3));
        assert_eq!(v.unit_range(2), Some(3..5));
        assert_eq!(v.unit_range(3), None);
    }

    #[test]
    fn test_extend_rebased_two_chunks() {
        // Chunk A: 3 tokens, words at 1 and 3. Chunk B: 2 tokens, word at 1.
        let mut acc = OffsetVec::from_raw(Level::Word, vec![1, 3, 4], 3).unwrap();
        let b = OffsetVec::from_raw(Level::Word, vec![1, 3], 2).unwrap();
        acc.extend_rebased(&b, 3, 5);
        assert_eq!(acc.as_slice(), &[1, 3, 4, 6]);
        assert_eq!(acc.unit_count(), 3);
    }

    #[test]
    fn test_extend_rebased_from_empty() {
        let mut acc = OffsetVec::from_raw(Level::Word, vec![], 0).unwrap();
        let b = OffsetVec::from_raw(Level::Word, vec![1, 2, 4], 3).unwrap();
        acc.extend_rebased(&b, 0, 3);
        assert_eq!(acc.as_slice(), &[1, 2, 4]);
    }

    #[test]
    fn test_extend_rebased_empty_chunk_is_noop() {
        let mut acc = OffsetVec::from_raw(Level::Word, vec![1, 3, 4], 3).unwrap();
        let empty = OffsetVec::from_raw(Level::Word, vec![], 0).unwrap();
        acc.extend_rebased(&empty, 3, 3);
        assert_eq!(acc.as_slice(), &[1, 3, 4]);
    }
}
