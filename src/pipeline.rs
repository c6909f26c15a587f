//! The chunk processor: raw text in, per-chunk bundles out.
//!
//! This module hosts the seams to the external collaborators (cleaning and
//! tokenization are *injected*, never hard-wired) and the machinery that
//! turns one bounded slice of text into a complete, validated [`Bundle`]:
//!
//! ```text
//! raw slice ──clean──► text ──segment──► words / graphemes / bytes
//!                                   │
//!                                   ▼
//!              per-level corpora with unit-start offset vectors
//!                                   │
//!                                   ▼
//!                            chunk Bundle
//! ```
//!
//! Two entry points compose this:
//!
//! - [`process_corpus`] — one-shot: the whole corpus in memory, one bundle.
//! - [`process_stream`] — constant working memory: a cooperative iterator of
//!   [`ChunkText`] slices, each processed independently against one shared
//!   vocabulary, folded by the merge engine.
//!
//! Everything is pure and single-threaded; the stream is a plain iterator,
//! so a caller that stops pulling stops the whole pipeline with nothing
//! left running.

use std::sync::Arc;

use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::bundle::Bundle;
use crate::corpus::{Corpus, LevelBundle};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::merge::MergeAccumulator;
use crate::offsets::OffsetVec;
use crate::vocab::{Vocabulary, VocabularyBuilder};
use crate::TokenId;

/// A pure text-rewriting function applied before tokenization.
///
/// Must preserve encoding validity; everything downstream assumes valid
/// UTF-8.
pub type Cleaner = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A pure word-level tokenizer.
///
/// The built-in default is UAX #29 word segmentation; inject an
/// implementation to override token *identity* at the word level
/// (lowercasing, stemming, normalization). Word *positions* always derive
/// from UAX #29, since a plain token list carries no positions, so an
/// injected tokenizer must return exactly one token per UAX #29 word; a
/// count mismatch is rejected with [`Error::TokenizerArity`].
pub trait Tokenizer: Send + Sync {
    /// Split `text` into word tokens, one per word boundary.
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// The name of the unknown-token special every run's vocabulary carries.
pub const UNKNOWN_TOKEN: &str = "<unk>";

/// Configuration for one pipeline run.
///
/// The merge engine compares configurations with `==`; the cleaner and
/// tokenizer seams compare by instance (`Arc::ptr_eq`), since closures have
/// no structural equality.
#[derive(Clone)]
pub struct PipelineConfig {
    /// Token granularities to build corpora for. Only [`Level::Byte`],
    /// [`Level::Character`], and [`Level::Word`] carry token identity;
    /// coarser levels exist as offset vectors inside these corpora.
    pub levels: Vec<Level>,
    /// Maximum chunk size in bytes for [`chunk_documents`].
    pub chunk_bytes: usize,
    /// Minimum frequency for a token to enter the vocabulary.
    pub min_frequency: u64,
    /// Special tokens, declared in id-assignment order.
    pub specials: Vec<String>,
    cleaner: Option<Cleaner>,
    word_tokenizer: Option<Arc<dyn Tokenizer>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            levels: vec![Level::Word],
            chunk_bytes: 1 << 20,
            min_frequency: 1,
            specials: vec![UNKNOWN_TOKEN.to_string()],
            cleaner: None,
            word_tokenizer: None,
        }
    }
}

impl PipelineConfig {
    /// Set the granularities to tokenize at.
    #[must_use]
    pub fn with_levels(mut self, levels: &[Level]) -> Self {
        self.levels = levels.to_vec();
        self
    }

    /// Set the chunk size for streaming runs.
    #[must_use]
    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes;
        self
    }

    /// Inject a cleaning function, applied to every slice before
    /// tokenization.
    #[must_use]
    pub fn with_cleaner(mut self, cleaner: Cleaner) -> Self {
        self.cleaner = Some(cleaner);
        self
    }

    /// Inject a word tokenizer, overriding UAX #29 word identity.
    #[must_use]
    pub fn with_word_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.word_tokenizer = Some(tokenizer);
        self
    }

    fn clean(&self, text: &str) -> String {
        match &self.cleaner {
            Some(f) => f(text),
            None => text.to_string(),
        }
    }

    fn words(&self, text: &str) -> Vec<String> {
        match &self.word_tokenizer {
            Some(t) => t.tokenize(text),
            None => text.unicode_words().map(str::to_string).collect(),
        }
    }
}

impl std::fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("levels", &self.levels)
            .field("chunk_bytes", &self.chunk_bytes)
            .field("min_frequency", &self.min_frequency)
            .field("specials", &self.specials)
            .field("cleaner", &self.cleaner.as_ref().map(|_| "<fn>"))
            .field("word_tokenizer", &self.word_tokenizer.as_ref().map(|_| "<dyn>"))
            .finish()
    }
}

impl PartialEq for PipelineConfig {
    fn eq(&self, other: &Self) -> bool {
        let seams_match = match (&self.cleaner, &other.cleaner) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        } && match (&self.word_tokenizer, &other.word_tokenizer) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        seams_match
            && self.levels == other.levels
            && self.chunk_bytes == other.chunk_bytes
            && self.min_frequency == other.min_frequency
            && self.specials == other.specials
    }
}

/// A cleaner that collapses runs of whitespace to single spaces.
#[must_use]
pub fn collapse_whitespace() -> Cleaner {
    Arc::new(|text: &str| {
        let mut out = String::with_capacity(text.len());
        let mut in_ws = false;
        for ch in text.chars() {
            if ch.is_whitespace() && ch != '\n' {
                in_ws = true;
            } else {
                if in_ws && !out.is_empty() {
                    out.push(' ');
                }
                in_ws = false;
                out.push(ch);
            }
        }
        out
    })
}

/// One bounded slice of raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkText {
    /// The slice text.
    pub text: String,
    /// Whether this slice ends a document; the next slice starts a new one.
    pub ends_document: bool,
}

/// Split documents into bounded slices for streaming.
///
/// Slices are at most `chunk_bytes` long, cut at char boundaries and
/// snapped back to the last whitespace where possible so words and
/// grapheme clusters are not severed. The last slice of each document is
/// flagged `ends_document`.
#[must_use]
pub fn chunk_documents<S: AsRef<str>>(documents: &[S], chunk_bytes: usize) -> Vec<ChunkText> {
    let mut chunks = Vec::new();
    for doc in documents {
        let text = doc.as_ref();
        if text.is_empty() {
            chunks.push(ChunkText {
                text: String::new(),
                ends_document: true,
            });
            continue;
        }
        let mut start = 0;
        while start < text.len() {
            let mut end = (start + chunk_bytes.max(1)).min(text.len());
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            if end < text.len() {
                // Snap back to whitespace so the cut lands between words.
                // The whitespace char itself may be multi-byte (NBSP,
                // ideographic space), so advance by its encoded length.
                let last_ws = text[start..end]
                    .char_indices()
                    .filter(|&(_, ch)| ch.is_whitespace())
                    .last();
                if let Some((ws, ch)) = last_ws {
                    let snapped = start + ws + ch.len_utf8();
                    if snapped > start {
                        end = snapped;
                    }
                }
            }
            if end <= start {
                // A single oversized word; take the char-boundary cut as is.
                end = (start + chunk_bytes.max(1)).min(text.len());
                while !text.is_char_boundary(end) {
                    end += 1;
                }
            }
            chunks.push(ChunkText {
                text: text[start..end].to_string(),
                ends_document: end == text.len(),
            });
            start = end;
        }
    }
    chunks
}

/// The vocabulary string for byte value `b`.
///
/// Bytes are not generally valid UTF-8 on their own, so byte tokens enter
/// the vocabulary in `<0xNN>` form.
#[must_use]
pub fn byte_token(b: u8) -> String {
    format!("<0x{b:02X}>")
}

/// Count one cleaned slice's tokens into `builder`, for all levels in
/// `config`. This is the constant-memory counting pass for streaming runs.
pub fn count_chunk(builder: &mut VocabularyBuilder, text: &str, config: &PipelineConfig) {
    let cleaned = config.clean(text);
    for &level in &config.levels {
        match level {
            Level::Byte => {
                for b in cleaned.bytes() {
                    builder.count(&byte_token(b));
                }
            }
            Level::Character => builder.count_all(cleaned.graphemes(true)),
            Level::Word => builder.count_all(config.words(&cleaned)),
            _ => {}
        }
    }
}

/// Build a run vocabulary over whole documents: specials first (declared
/// order), then counted tokens surviving the frequency cutoff, in
/// lexicographic order. Deterministic: identical input gives byte-identical
/// id assignments.
#[must_use]
pub fn build_vocabulary<S: AsRef<str>>(documents: &[S], config: &PipelineConfig) -> Vocabulary {
    let mut builder = VocabularyBuilder::new();
    for name in &config.specials {
        builder.add_special(name);
    }
    for doc in documents {
        count_chunk(&mut builder, doc.as_ref(), config);
    }
    builder.build(config.min_frequency)
}

/// Positions shared by every level built from one cleaned slice.
struct Segments {
    /// Byte start of each UAX #29 word, with its text.
    words: Vec<(usize, String)>,
    /// Byte start of each grapheme cluster, with its text.
    graphemes: Vec<(usize, String)>,
    /// Byte start of each sentence.
    sentence_starts: Vec<usize>,
    /// Byte start of each paragraph.
    paragraph_starts: Vec<usize>,
}

fn segment(text: &str) -> Segments {
    let words = text
        .unicode_word_indices()
        .map(|(i, w)| (i, w.to_string()))
        .collect();
    let graphemes = text
        .grapheme_indices(true)
        .map(|(i, g)| (i, g.to_string()))
        .collect();

    // Running-offset scan over sentence bounds; whitespace-only "sentences"
    // merge into their predecessor by simply not starting a unit.
    let mut sentence_starts = Vec::new();
    let mut offset = 0;
    for s in text.split_sentence_bounds() {
        if !s.trim().is_empty() {
            sentence_starts.push(offset);
        }
        offset += s.len();
    }

    let mut paragraph_starts = Vec::new();
    let mut offset = 0;
    for p in text.split("\n\n") {
        if !p.trim().is_empty() {
            paragraph_starts.push(offset);
        }
        offset += p.len() + 2;
    }

    Segments {
        words,
        graphemes,
        sentence_starts,
        paragraph_starts,
    }
}

/// Map byte positions to 1-based unit starts over `positions` of the units
/// of this corpus's own granularity. `boundaries` are byte starts of the
/// coarser units; each maps to the first own-unit at or after it. The first
/// start is clamped to 1 so units tile the whole token range.
fn starts_in(positions: &[usize], boundaries: &[usize]) -> Vec<u32> {
    let mut starts = Vec::with_capacity(boundaries.len());
    let mut cursor = 0;
    for &b in boundaries {
        while cursor < positions.len() && positions[cursor] < b {
            cursor += 1;
        }
        let start = cursor.min(positions.len().saturating_sub(1)) as u32 + 1;
        if starts.is_empty() {
            starts.push(1);
        } else if start > *starts.last().unwrap_or(&1) {
            starts.push(start);
        }
    }
    if positions.is_empty() {
        starts.clear();
    }
    starts
}

fn ids_for<'a, I>(tokens: I, vocabulary: &Vocabulary) -> Vec<TokenId>
where
    I: IntoIterator<Item = &'a str>,
{
    let unk = vocabulary.special(UNKNOWN_TOKEN).unwrap_or(1);
    tokens
        .into_iter()
        .map(|t| vocabulary.id(t).unwrap_or(unk))
        .collect()
}

/// The document vector for a chunk: one start (at token 1) if this chunk
/// begins a document, otherwise no starts at all — the unit is continued
/// from the previous chunk and only the sentinel moves.
fn document_starts(starts_document: bool) -> Vec<u32> {
    if starts_document {
        vec![1]
    } else {
        Vec::new()
    }
}

fn build_level_corpus(
    level: Level,
    segments: &Segments,
    text: &str,
    config: &PipelineConfig,
    vocabulary: &Vocabulary,
    starts_document: bool,
) -> Result<Corpus> {
    // Own-granularity byte positions and token ids.
    let (positions, token_ids): (Vec<usize>, Vec<TokenId>) = match level {
        Level::Byte => {
            let positions: Vec<usize> = (0..text.len()).collect();
            let ids = text
                .bytes()
                .map(|b| {
                    let unk = vocabulary.special(UNKNOWN_TOKEN).unwrap_or(1);
                    vocabulary.id(&byte_token(b)).unwrap_or(unk)
                })
                .collect();
            (positions, ids)
        }
        Level::Character => {
            let positions = segments.graphemes.iter().map(|(i, _)| *i).collect();
            let ids = ids_for(segments.graphemes.iter().map(|(_, g)| g.as_str()), vocabulary);
            (positions, ids)
        }
        Level::Word => {
            let positions: Vec<usize> = segments.words.iter().map(|(i, _)| *i).collect();
            let ids = match &config.word_tokenizer {
                Some(_) => {
                    let tokens = config.words(text);
                    if tokens.len() != segments.words.len() {
                        return Err(Error::TokenizerArity {
                            expected: segments.words.len(),
                            actual: tokens.len(),
                        });
                    }
                    ids_for(tokens.iter().map(String::as_str), vocabulary)
                }
                None => ids_for(segments.words.iter().map(|(_, w)| w.as_str()), vocabulary),
            };
            (positions, ids)
        }
        _ => (Vec::new(), Vec::new()),
    };

    let n = token_ids.len();
    let mut corpus = Corpus::build(token_ids, [])?;
    corpus.set_offsets(
        Level::Document,
        OffsetVec::from_starts(Level::Document, document_starts(starts_document), n)?,
    );

    // Own trivial vector: one unit per token.
    let trivial: Vec<u32> = (1..=n as u32).collect();
    corpus.set_offsets(level, OffsetVec::from_starts(level, trivial, n)?);

    // Coarser-unit starts projected into this granularity.
    let grapheme_boundaries: Vec<usize> = segments.graphemes.iter().map(|(i, _)| *i).collect();
    let word_boundaries: Vec<usize> = segments.words.iter().map(|(i, _)| *i).collect();
    let coarser: [(Level, &[usize]); 4] = [
        (Level::Character, &grapheme_boundaries),
        (Level::Word, &word_boundaries),
        (Level::Sentence, &segments.sentence_starts),
        (Level::Paragraph, &segments.paragraph_starts),
    ];
    for (coarse, boundaries) in coarser {
        if coarse <= level {
            continue;
        }
        let starts = starts_in(&positions, boundaries);
        corpus.set_offsets(coarse, OffsetVec::from_starts(coarse, starts, n)?);
    }

    Ok(corpus)
}

/// Process one bounded slice into a complete chunk bundle against a shared
/// vocabulary.
///
/// `starts_document` marks whether this slice begins a new document (true
/// for the first slice and for any slice following one flagged
/// [`ChunkText::ends_document`]).
///
/// # Errors
///
/// Structural errors if a segmenter produces inconsistent offsets, which
/// indicates a misbehaving injected tokenizer.
pub fn process_chunk(
    chunk: &ChunkText,
    starts_document: bool,
    config: &PipelineConfig,
    vocabulary: &Vocabulary,
) -> Result<Bundle> {
    let cleaned = config.clean(&chunk.text);
    let segments = segment(&cleaned);

    let mut bundle = Bundle::new(config.clone());
    for &level in &config.levels {
        if !matches!(level, Level::Byte | Level::Character | Level::Word) {
            continue;
        }
        let corpus = build_level_corpus(
            level,
            &segments,
            &cleaned,
            config,
            vocabulary,
            starts_document,
        )?;
        bundle.insert_level(level, LevelBundle::new(corpus, vocabulary.clone())?);
    }
    debug!(
        bytes = chunk.text.len(),
        levels = bundle.levels().len(),
        "processed chunk"
    );
    Ok(bundle)
}

/// One-shot path: whole corpus in memory, one bundle out.
///
/// Builds the vocabulary over all documents, processes each document as a
/// single slice, assembles the merged corpus, and builds the canonical
/// alignments.
///
/// # Errors
///
/// Structural or precondition errors from corpus and alignment construction.
pub fn process_corpus<S: AsRef<str>>(documents: &[S], config: &PipelineConfig) -> Result<Bundle> {
    let vocabulary = build_vocabulary(documents, config);
    let mut acc = MergeAccumulator::new(vocabulary.clone(), config.clone());
    for doc in documents {
        let chunk = ChunkText {
            text: doc.as_ref().to_string(),
            ends_document: true,
        };
        acc.fold(process_chunk(&chunk, true, config, &vocabulary)?)?;
    }
    let mut bundle = acc.finish()?;
    bundle.build_canonical_alignments()?;
    Ok(bundle)
}

/// Streaming path: constant working memory over a cooperative chunk
/// iterator sharing one prebuilt vocabulary.
///
/// Chunks are processed and folded one at a time; nothing is buffered
/// beyond the accumulator. Alignments are rebuilt on the merged result,
/// never carried over from chunks.
///
/// # Errors
///
/// Merge precondition errors or structural errors from chunk processing.
pub fn process_stream<I>(
    chunks: I,
    vocabulary: &Vocabulary,
    config: &PipelineConfig,
) -> Result<Bundle>
where
    I: IntoIterator<Item = ChunkText>,
{
    let mut acc = MergeAccumulator::new(vocabulary.clone(), config.clone());
    let mut starts_document = true;
    for chunk in chunks {
        let bundle = process_chunk(&chunk, starts_document, config, vocabulary)?;
        starts_document = chunk.ends_document;
        acc.fold(bundle)?;
    }
    let mut bundle = acc.finish()?;
    bundle.build_canonical_alignments()?;
    Ok(bundle)
}
