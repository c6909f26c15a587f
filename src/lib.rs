//! # strata
//!
//! Multi-granularity, index-aligned token corpora.
//!
//! ## The Problem
//!
//! Downstream consumers of a text corpus rarely agree on a unit. Span
//! annotations arrive in bytes, evaluation tooling counts characters,
//! language models consume words, and retrieval wants sentences or
//! paragraphs. Re-tokenizing per consumer produces six representations that
//! silently drift apart; what you actually want is *one* corpus represented
//! at every granularity simultaneously, with dense mappings between them:
//!
//! ```text
//! level      token ids                offset vectors (1-based, sentinel n+1)
//! ─────      ─────────                ─────────────────────────────────────
//! byte       [98, 99, 97, ...]        byte [1,2,3,...]  word [1,4,...]
//! word       [17, 4, 9, ...]          word [1,2,3,...]  sentence [1,5,...]
//!
//! "which word contains byte 4021?"  →  alignment_byte_word[4020]  →  57
//! ```
//!
//! Three pieces share one hard problem — keeping start-of-unit index
//! arithmetic, sentinel conventions, and vocabulary identity consistent
//! across levels and across chunk boundaries:
//!
//! - **Segmentation store** ([`Corpus`], [`LevelBundle`]): a flat token-id
//!   sequence plus validated unit-start offset vectors per coarser level.
//! - **Alignment builder** ([`CrossMap`]): fine→coarse membership maps via
//!   coarse-outward range fill.
//! - **Streaming merge** ([`MergeAccumulator`], [`merge_stream`]): folds
//!   per-chunk results into one global result with constant working memory,
//!   re-basing offsets and regenerating sentinels.
//!
//! ## Quick Start
//!
//! ```rust
//! use strata::{process_corpus, Level, PipelineConfig};
//!
//! let config = PipelineConfig::default().with_levels(&[Level::Byte, Level::Word]);
//! let bundle = process_corpus(&["The cat sat.", "On the mat."], &config).unwrap();
//!
//! // Word-level token ids, with document boundaries in word indices.
//! let words = bundle.token_ids(Level::Word).unwrap();
//! let docs = bundle.corpus(Level::Word).unwrap().offsets(Level::Document).unwrap();
//! assert_eq!(docs.unit_count(), 2);
//!
//! // Project any byte index to its containing word, O(1).
//! let map = bundle.alignment(Level::Byte, Level::Word).unwrap();
//! assert_eq!(map.destination_of(4), Some(2)); // byte 5 is inside word 2
//! assert!(!words.is_empty());
//! ```
//!
//! ## Streaming
//!
//! For corpora that do not fit in memory, build the vocabulary in a first
//! constant-memory counting pass, then process bounded chunks through a
//! cooperative iterator:
//!
//! ```rust
//! use strata::{build_vocabulary, chunk_documents, process_stream, Level, PipelineConfig};
//!
//! let docs = ["one two three four five six", "seven eight"];
//! let config = PipelineConfig::default();
//! let vocab = build_vocabulary(&docs, &config);
//!
//! let chunks = chunk_documents(&docs, 12);
//! let streamed = process_stream(chunks, &vocab, &config).unwrap();
//!
//! // Identical to the one-shot run: same ids, same document offsets.
//! let one_shot = strata::process_corpus(&docs, &config).unwrap();
//! assert_eq!(
//!     streamed.token_ids(Level::Word).unwrap(),
//!     one_shot.token_ids(Level::Word).unwrap()
//! );
//! ```
//!
//! ## Invariants
//!
//! Every offset vector in every corpus, from every code path, is
//! non-decreasing and ends with sentinel `n_tokens + 1`. Foreign sentinel
//! styles (leading `0`, trailing `n`) are normalized once at the boundary
//! ([`OffsetVec::from_raw`]); violations are structural errors, never
//! warnings. Merges additionally require configuration equality and
//! vocabulary *instance* identity across chunks.

mod align;
mod bundle;
mod corpus;
mod error;
mod level;
mod merge;
mod offsets;
mod pipeline;
mod vocab;

pub use align::CrossMap;
pub use bundle::{Bundle, Metadata};
pub use corpus::{Corpus, LevelBundle};
pub use error::{Error, Result};
pub use level::Level;
pub use merge::{merge_stream, MergeAccumulator};
pub use offsets::OffsetVec;
pub use pipeline::{
    build_vocabulary, byte_token, chunk_documents, collapse_whitespace, count_chunk,
    process_chunk, process_corpus, process_stream, ChunkText, Cleaner, PipelineConfig, Tokenizer,
    UNKNOWN_TOKEN,
};
pub use vocab::{Vocabulary, VocabularyBuilder};

/// A 1-based, dense token identifier. `0` never appears in valid data.
pub type TokenId = u32;
