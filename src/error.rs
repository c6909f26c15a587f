//! Error types for strata.
//!
//! Three families, all fatal and none retried:
//!
//! - **Structural**: an offset vector or token-id sequence violates an
//!   invariant. The data that produced it has a bug.
//! - **Precondition**: an alignment or merge was requested over missing or
//!   mismatched inputs. Reported with expected and actual values.
//! - **Lookup**: a level or alignment pair was never built. Reported with
//!   the keys that do exist.
//!
//! Every operation in this crate is pure and deterministic, so retrying
//! without changing the input reproduces the same error.

use crate::level::Level;

/// Errors that can occur while building corpora, alignments, or merges.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An offset vector's trailing sentinel does not match the token count.
    #[error("{level} offsets end with sentinel {actual}, expected {expected} (token count + 1)")]
    TrailingSentinel {
        /// The level whose offset vector is malformed.
        level: Level,
        /// The sentinel value required by the token count.
        expected: u32,
        /// The sentinel value actually found.
        actual: u32,
    },

    /// An offset vector is not non-decreasing.
    #[error("{level} offsets decrease at position {position}: {previous} -> {value}")]
    UnsortedOffsets {
        /// The level whose offset vector is malformed.
        level: Level,
        /// Index of the offending entry.
        position: usize,
        /// The entry before the offending one.
        previous: u32,
        /// The offending entry.
        value: u32,
    },

    /// An offset value is zero or past the sentinel.
    #[error("{level} offsets contain out-of-range value {value} at position {position} (valid range 1..={limit})")]
    OffsetOutOfRange {
        /// The level whose offset vector is malformed.
        level: Level,
        /// Index of the offending entry.
        position: usize,
        /// The offending entry.
        value: u32,
        /// The largest admissible value.
        limit: u32,
    },

    /// A token id exceeds the vocabulary size (ids are 1-based and dense).
    #[error("token id {id} at position {position} exceeds vocabulary size {vocab_len}")]
    TokenIdOutOfRange {
        /// The offending token id.
        id: u32,
        /// Position of the offending id in the token sequence.
        position: usize,
        /// Number of entries in the vocabulary.
        vocab_len: u32,
    },

    /// An alignment needs an offset vector the corpus does not carry.
    #[error("cannot align {fine} -> {coarse}: {missing} offsets absent or too short")]
    MissingOffsets {
        /// Fine side of the requested alignment.
        fine: Level,
        /// Coarse side of the requested alignment.
        coarse: Level,
        /// The level whose offset vector is absent or has fewer than 2 entries.
        missing: Level,
    },

    /// Two offset vectors claim different spans (different trailing sentinels).
    ///
    /// The usual cause: byte- and word-level tokenization ran over
    /// differently-cleaned text.
    #[error("span mismatch aligning {fine} -> {coarse}: {fine} sentinel {fine_sentinel} != {coarse} sentinel {coarse_sentinel}")]
    SpanMismatch {
        /// Fine side of the requested alignment.
        fine: Level,
        /// Coarse side of the requested alignment.
        coarse: Level,
        /// Trailing sentinel of the fine vector.
        fine_sentinel: u32,
        /// Trailing sentinel of the coarse vector.
        coarse_sentinel: u32,
    },

    /// A chunk was built under a different configuration than the accumulator.
    #[error("chunk {chunk} was built under a different configuration than the merge accumulator")]
    ConfigMismatch {
        /// Zero-based ordinal of the offending chunk.
        chunk: usize,
    },

    /// A chunk's vocabulary is not the same instance as the accumulator's.
    ///
    /// Identity, not content: content-equal vocabularies from separate builds
    /// may diverge in provenance and silently corrupt token-id meaning.
    #[error("chunk {chunk} was built against a different vocabulary instance")]
    VocabularyMismatch {
        /// Zero-based ordinal of the offending chunk.
        chunk: usize,
    },

    /// An injected word tokenizer returned a different token count than the
    /// recorded word boundaries.
    ///
    /// Word positions always come from the boundary segmenter; a tokenizer
    /// that splits or merges words would record every coarser offset vector
    /// in the wrong index space.
    #[error("injected word tokenizer produced {actual} tokens for a slice with {expected} word boundaries")]
    TokenizerArity {
        /// Number of word boundaries recorded for the slice.
        expected: usize,
        /// Number of tokens the tokenizer returned.
        actual: usize,
    },

    /// A level is present in some chunks of a stream but not others.
    #[error("level {level} present in some chunks but missing from chunk {chunk}")]
    MissingLevel {
        /// The level whose presence is inconsistent.
        level: Level,
        /// Zero-based ordinal of the offending chunk.
        chunk: usize,
    },

    /// A requested level was never built.
    #[error("level {level} not present; available: {available:?}")]
    LevelNotFound {
        /// The requested level.
        level: Level,
        /// Levels that are present.
        available: Vec<Level>,
    },

    /// A requested alignment pair was never built.
    ///
    /// The fine side is named `requested`, not `source`: thiserror reserves
    /// a field called `source` for the error chain.
    #[error("alignment {requested} -> {destination} not present; available: {available:?}")]
    AlignmentNotFound {
        /// Fine side of the requested pair.
        requested: Level,
        /// Coarse side of the requested pair.
        destination: Level,
        /// Pairs that are present.
        available: Vec<(Level, Level)>,
    },
}

/// Result type for strata operations.
pub type Result<T> = std::result::Result<T, Error>;
