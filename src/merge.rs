//! Streaming merge: fold per-chunk bundles into one global bundle.
//!
//! A corpus too large for memory is processed in bounded chunks, each chunk
//! producing a complete [`Bundle`] against one shared [`Vocabulary`]. The
//! [`MergeAccumulator`] folds those bundles, in order, into a single bundle
//! that is indistinguishable from a one-shot whole-corpus run:
//!
//! ```text
//! chunk 0: tokens [..5]   words [1,3,4,6]
//! chunk 1: tokens [..3]   words [1,2,4]
//!                              │
//!                              ▼  shift by 5, drop chunk sentinels,
//!                                 regenerate one fresh sentinel
//! merged:  tokens [..8]   words [1,3,4,6,7,9]
//! ```
//!
//! Working memory is the accumulator itself; each chunk bundle is consumed
//! and dropped after folding. The fold is a cooperative iterator consumer:
//! nothing runs in the background, so abandoning the iterator stops the
//! producer with no leaked resources.
//!
//! Alignments are never merged. A per-chunk byte→word map is not a valid
//! partial result (chunk-local word indices collide across chunks), so
//! [`merge_stream`] rebuilds all alignments from the merged offsets.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::bundle::Bundle;
use crate::corpus::{Corpus, LevelBundle};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::pipeline::PipelineConfig;
use crate::vocab::Vocabulary;

/// Folds an ordered sequence of chunk bundles into one merged bundle.
///
/// Every chunk must have been built under the accumulator's configuration
/// and against *the same vocabulary instance* — identity, not content
/// equality. Either mismatch means the caller mixed runs, which would
/// silently corrupt token-id meaning, so both are fatal.
#[derive(Debug)]
pub struct MergeAccumulator {
    vocabulary: Vocabulary,
    config: PipelineConfig,
    levels: BTreeMap<Level, Corpus>,
    chunks_folded: usize,
}

impl MergeAccumulator {
    /// An empty accumulator expecting chunks built under `config` against
    /// `vocabulary`.
    #[must_use]
    pub fn new(vocabulary: Vocabulary, config: PipelineConfig) -> Self {
        Self {
            vocabulary,
            config,
            levels: BTreeMap::new(),
            chunks_folded: 0,
        }
    }

    /// Fold one chunk bundle into the accumulator.
    ///
    /// Placeholder levels in the chunk are skipped; they carry no token
    /// identity and are re-synthesized on the merged result if wanted.
    ///
    /// # Errors
    ///
    /// [`Error::ConfigMismatch`], [`Error::VocabularyMismatch`],
    /// [`Error::MissingLevel`] (a level or offset field present in some
    /// chunks but not others).
    pub fn fold(&mut self, chunk: Bundle) -> Result<()> {
        let ordinal = self.chunks_folded;

        if chunk.metadata().config != self.config {
            return Err(Error::ConfigMismatch { chunk: ordinal });
        }

        let chunk_levels: Vec<Level> = chunk
            .levels()
            .into_iter()
            .filter(|level| !chunk.is_placeholder(*level))
            .collect();

        for &level in &chunk_levels {
            if !chunk.level(level)?.vocabulary().same_instance(&self.vocabulary) {
                return Err(Error::VocabularyMismatch { chunk: ordinal });
            }
        }

        if ordinal > 0 {
            // The level set is fixed by the first chunk. Dropping a level
            // silently would leave inconsistent token counts across levels.
            for &level in self.levels.keys() {
                if !chunk_levels.contains(&level) {
                    return Err(Error::MissingLevel { level, chunk: ordinal });
                }
            }
            for &level in &chunk_levels {
                if !self.levels.contains_key(&level) {
                    return Err(Error::MissingLevel { level, chunk: 0 });
                }
            }
        }

        for &level in &chunk_levels {
            let incoming = chunk.level(level)?.corpus();
            let acc = self.levels.entry(level).or_insert_with(Corpus::empty);
            fold_corpus(acc, incoming, ordinal)?;
            trace!(
                chunk = ordinal,
                level = %level,
                tokens = acc.n_tokens(),
                "folded chunk level"
            );
        }

        self.chunks_folded += 1;
        debug!(chunk = ordinal, levels = chunk_levels.len(), "folded chunk");
        Ok(())
    }

    /// Number of chunks folded so far.
    #[must_use]
    pub fn chunks_folded(&self) -> usize {
        self.chunks_folded
    }

    /// Finish the fold, producing the merged bundle.
    ///
    /// Alignments are *not* built here; call
    /// [`Bundle::build_canonical_alignments`] (as [`merge_stream`] does) so
    /// they derive from the final, correctly re-based offsets.
    ///
    /// # Errors
    ///
    /// Token-id bound errors if a folded corpus disagrees with the
    /// vocabulary, which indicates corrupted chunk data.
    pub fn finish(self) -> Result<Bundle> {
        let mut bundle = Bundle::new(self.config);
        for (level, corpus) in self.levels {
            let artifact = LevelBundle::new(corpus, self.vocabulary.clone())?;
            bundle.insert_level(level, artifact);
        }
        bundle.metadata_mut().chunks_merged = self.chunks_folded;
        Ok(bundle)
    }
}

/// Append one chunk-level corpus onto the accumulator corpus, re-basing
/// every offset vector by the pre-append token count.
fn fold_corpus(acc: &mut Corpus, incoming: &Corpus, ordinal: usize) -> Result<()> {
    let shift = acc.n_tokens() as u32;
    acc.append_token_ids(incoming.token_ids());
    let new_total = acc.n_tokens() as u32;

    for field in Level::ALL {
        let Some(chunk_vec) = incoming.offsets(field) else {
            // An offset field the accumulator carries must not vanish
            // mid-stream; an empty vector is the way to contribute nothing.
            if field != Level::Document && acc.offsets(field).is_some() {
                return Err(Error::MissingLevel { level: field, chunk: ordinal });
            }
            continue;
        };
        if acc.offsets(field).is_none() {
            if ordinal > 0 && field != Level::Document {
                return Err(Error::MissingLevel { level: field, chunk: 0 });
            }
            acc.set_offsets(field, crate::offsets::OffsetVec::empty());
        }
        if let Some(acc_vec) = acc.offsets_mut(field) {
            acc_vec.extend_rebased(chunk_vec, shift, new_total);
        }
    }
    Ok(())
}

/// Fold every bundle in `chunks` and rebuild the canonical alignments.
///
/// The first chunk seeds the reference configuration and vocabulary; all
/// later chunks must match it. A single-chunk stream produces a bundle
/// identical to the non-streaming path.
///
/// # Errors
///
/// Merge precondition errors from [`MergeAccumulator::fold`], or alignment
/// errors from the rebuild. An empty stream yields an empty default bundle.
pub fn merge_stream<I>(chunks: I) -> Result<Bundle>
where
    I: IntoIterator<Item = Bundle>,
{
    let mut iter = chunks.into_iter();
    let Some(first) = iter.next() else {
        return Ok(Bundle::new(PipelineConfig::default()));
    };

    let vocabulary = first
        .levels()
        .first()
        .and_then(|&level| first.vocabulary(level).ok())
        .cloned()
        .unwrap_or_else(Vocabulary::unknown_only);

    let mut acc = MergeAccumulator::new(vocabulary, first.metadata().config.clone());
    acc.fold(first)?;
    for chunk in iter {
        acc.fold(chunk)?;
    }

    let mut merged = acc.finish()?;
    merged.clear_alignments();
    merged.build_canonical_alignments()?;
    Ok(merged)
}
