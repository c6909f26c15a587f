//! The segmentation store: one level's token-id sequence plus unit offsets.
//!
//! A [`Corpus`] holds a flat token-id sequence and, per coarser level, an
//! [`OffsetVec`] marking where that level's units start. All offset vectors
//! index into the *same* token sequence, so a word-level corpus can carry
//! sentence, paragraph, and document offsets all expressed in word indices:
//!
//! ```text
//! token_ids:         [17, 4, 9, 17, 2, 31, 9]       (7 word ids)
//! sentence_offsets:  [1, 4, 8]                      (2 sentences)
//! document_offsets:  [1, 8]                         (1 document)
//! ```
//!
//! Every populated vector's trailing sentinel must equal `n_tokens + 1`.
//! That is the single invariant every consumer (alignment, merge) relies
//! on, so violating it at construction is a hard error, never a warning.

use crate::error::{Error, Result};
use crate::level::Level;
use crate::offsets::OffsetVec;
use crate::vocab::Vocabulary;
use crate::TokenId;

/// A validated token-id sequence with per-level unit offsets.
#[derive(Debug, Clone)]
pub struct Corpus {
    token_ids: Vec<TokenId>,
    byte_offsets: Option<OffsetVec>,
    character_offsets: Option<OffsetVec>,
    word_offsets: Option<OffsetVec>,
    sentence_offsets: Option<OffsetVec>,
    paragraph_offsets: Option<OffsetVec>,
    /// Always present; defaults to the single-document span.
    document_offsets: OffsetVec,
}

impl Corpus {
    /// Build a corpus from raw parts, normalizing and validating every
    /// offset vector.
    ///
    /// `raw_offsets` maps levels to raw offset lists in any accepted
    /// sentinel style (see [`OffsetVec::from_raw`]). Document offsets
    /// default to `[1, n + 1]` (one document) when not provided.
    ///
    /// Runs in O(n) over tokens and offsets; the token sequence is moved,
    /// not copied.
    ///
    /// # Errors
    ///
    /// Structural errors from offset validation, naming the level and the
    /// expected vs. actual sentinel.
    pub fn build<I>(token_ids: Vec<TokenId>, raw_offsets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Level, Vec<u32>)>,
    {
        let n = token_ids.len();
        let mut corpus = Self {
            token_ids,
            byte_offsets: None,
            character_offsets: None,
            word_offsets: None,
            sentence_offsets: None,
            paragraph_offsets: None,
            document_offsets: OffsetVec::whole_span(n),
        };
        for (level, raw) in raw_offsets {
            let vec = OffsetVec::from_raw(level, raw, n)?;
            corpus.set_offsets(level, vec);
        }
        Ok(corpus)
    }

    /// An empty corpus, the merge accumulator's starting point. Unlike
    /// [`Corpus::build`], the document vector starts empty rather than as a
    /// single zero-token document, so the first folded chunk's documents are
    /// not preceded by a phantom one.
    pub(crate) fn empty() -> Self {
        Self {
            token_ids: Vec::new(),
            byte_offsets: None,
            character_offsets: None,
            word_offsets: None,
            sentence_offsets: None,
            paragraph_offsets: None,
            document_offsets: OffsetVec::empty(),
        }
    }

    /// The token-id sequence.
    #[must_use]
    pub fn token_ids(&self) -> &[TokenId] {
        &self.token_ids
    }

    /// Number of tokens.
    #[must_use]
    pub fn n_tokens(&self) -> usize {
        self.token_ids.len()
    }

    /// The offset vector for `level`, if populated.
    ///
    /// This is the one place that maps a level to its offset field;
    /// [`Level::Document`] is always `Some`.
    #[must_use]
    pub fn offsets(&self, level: Level) -> Option<&OffsetVec> {
        match level {
            Level::Byte => self.byte_offsets.as_ref(),
            Level::Character => self.character_offsets.as_ref(),
            Level::Word => self.word_offsets.as_ref(),
            Level::Sentence => self.sentence_offsets.as_ref(),
            Level::Paragraph => self.paragraph_offsets.as_ref(),
            Level::Document => Some(&self.document_offsets),
        }
    }

    /// Levels whose offset vectors are populated, fine to coarse.
    #[must_use]
    pub fn offset_levels(&self) -> Vec<Level> {
        Level::ALL
            .into_iter()
            .filter(|&level| self.offsets(level).is_some())
            .collect()
    }

    pub(crate) fn set_offsets(&mut self, level: Level, vec: OffsetVec) {
        match level {
            Level::Byte => self.byte_offsets = Some(vec),
            Level::Character => self.character_offsets = Some(vec),
            Level::Word => self.word_offsets = Some(vec),
            Level::Sentence => self.sentence_offsets = Some(vec),
            Level::Paragraph => self.paragraph_offsets = Some(vec),
            Level::Document => self.document_offsets = vec,
        }
    }

    pub(crate) fn offsets_mut(&mut self, level: Level) -> Option<&mut OffsetVec> {
        match level {
            Level::Byte => self.byte_offsets.as_mut(),
            Level::Character => self.character_offsets.as_mut(),
            Level::Word => self.word_offsets.as_mut(),
            Level::Sentence => self.sentence_offsets.as_mut(),
            Level::Paragraph => self.paragraph_offsets.as_mut(),
            Level::Document => Some(&mut self.document_offsets),
        }
    }

    pub(crate) fn append_token_ids(&mut self, ids: &[TokenId]) {
        self.token_ids.extend_from_slice(ids);
    }
}

/// One segmentation level's complete artifact: a corpus plus the vocabulary
/// its token ids refer to.
///
/// Construction validates that every token id is in `1..=vocab.len()`
/// (ids are 1-based and dense).
#[derive(Debug, Clone)]
pub struct LevelBundle {
    corpus: Corpus,
    vocabulary: Vocabulary,
}

impl LevelBundle {
    /// Bind a corpus to its vocabulary, checking the token-id bound.
    ///
    /// # Errors
    ///
    /// [`Error::TokenIdOutOfRange`] naming the first offending id.
    pub fn new(corpus: Corpus, vocabulary: Vocabulary) -> Result<Self> {
        let vocab_len = vocabulary.len() as u32;
        for (position, &id) in corpus.token_ids().iter().enumerate() {
            if id == 0 || id > vocab_len {
                return Err(Error::TokenIdOutOfRange {
                    id,
                    position,
                    vocab_len,
                });
            }
        }
        Ok(Self { corpus, vocabulary })
    }

    /// The corpus.
    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// The vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}
