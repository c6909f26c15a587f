//! The bundle: all levels, alignments, and metadata for one corpus run.
//!
//! A [`Bundle`] is the externally visible aggregate the pipeline produces.
//! Levels and alignments are only ever added, never removed or mutated in
//! place, so references handed out earlier stay meaningful for the life of
//! the bundle.

use std::collections::{BTreeMap, BTreeSet};

use crate::align::CrossMap;
use crate::corpus::{Corpus, LevelBundle};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::pipeline::PipelineConfig;
use crate::vocab::Vocabulary;
use crate::TokenId;

/// Run metadata carried alongside the levels.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// The configuration the bundle was produced under.
    pub config: PipelineConfig,
    /// Levels that are synthesized placeholders, not genuine tokenizations.
    pub placeholder_levels: BTreeSet<Level>,
    /// Number of chunks folded into this bundle (0 for a one-shot run).
    pub chunks_merged: usize,
    /// Free-form annotations.
    pub extras: BTreeMap<String, String>,
}

/// All segmentation levels, their alignments, and run metadata for one
/// corpus.
///
/// ```rust
/// use strata::{Bundle, Level, PipelineConfig};
///
/// let bundle = Bundle::new(PipelineConfig::default());
/// assert!(!bundle.has_level(Level::Word));
/// assert!(bundle.token_ids(Level::Word).is_err()); // lookup error, lists keys
/// ```
#[derive(Debug, Clone)]
pub struct Bundle {
    levels: BTreeMap<Level, LevelBundle>,
    alignments: BTreeMap<(Level, Level), CrossMap>,
    metadata: Metadata,
}

impl Bundle {
    /// An empty bundle under `config`.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            levels: BTreeMap::new(),
            alignments: BTreeMap::new(),
            metadata: Metadata {
                config,
                ..Metadata::default()
            },
        }
    }

    /// Whether `level` is present (genuine or placeholder).
    #[must_use]
    pub fn has_level(&self, level: Level) -> bool {
        self.levels.contains_key(&level)
    }

    /// Whether `level` is present and a synthesized placeholder.
    #[must_use]
    pub fn is_placeholder(&self, level: Level) -> bool {
        self.has_level(level) && self.metadata.placeholder_levels.contains(&level)
    }

    /// The level's complete artifact.
    ///
    /// # Errors
    ///
    /// [`Error::LevelNotFound`] listing the levels that are present.
    pub fn level(&self, level: Level) -> Result<&LevelBundle> {
        self.levels.get(&level).ok_or_else(|| Error::LevelNotFound {
            level,
            available: self.levels.keys().copied().collect(),
        })
    }

    /// The level's corpus.
    ///
    /// # Errors
    ///
    /// [`Error::LevelNotFound`].
    pub fn corpus(&self, level: Level) -> Result<&Corpus> {
        Ok(self.level(level)?.corpus())
    }

    /// The level's token-id sequence.
    ///
    /// # Errors
    ///
    /// [`Error::LevelNotFound`].
    pub fn token_ids(&self, level: Level) -> Result<&[TokenId]> {
        Ok(self.level(level)?.corpus().token_ids())
    }

    /// The level's vocabulary.
    ///
    /// # Errors
    ///
    /// [`Error::LevelNotFound`].
    pub fn vocabulary(&self, level: Level) -> Result<&Vocabulary> {
        Ok(self.level(level)?.vocabulary())
    }

    /// The `source` → `destination` membership map, if built.
    ///
    /// # Errors
    ///
    /// [`Error::AlignmentNotFound`] listing the pairs that are present.
    pub fn alignment(&self, source: Level, destination: Level) -> Result<&CrossMap> {
        self.alignments
            .get(&(source, destination))
            .ok_or_else(|| Error::AlignmentNotFound {
                requested: source,
                destination,
                available: self.alignments.keys().copied().collect(),
            })
    }

    /// Levels present, fine to coarse.
    #[must_use]
    pub fn levels(&self) -> Vec<Level> {
        self.levels.keys().copied().collect()
    }

    /// Alignment pairs present.
    #[must_use]
    pub fn alignment_pairs(&self) -> Vec<(Level, Level)> {
        self.alignments.keys().copied().collect()
    }

    /// Run metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Add a level. Existing levels are never replaced; inserting a level
    /// that is already present is ignored.
    pub(crate) fn insert_level(&mut self, level: Level, artifact: LevelBundle) {
        self.levels.entry(level).or_insert(artifact);
    }

    pub(crate) fn insert_alignment(&mut self, map: CrossMap) {
        self.alignments
            .entry((map.source(), map.destination()))
            .or_insert(map);
    }

    pub(crate) fn clear_alignments(&mut self) {
        self.alignments.clear();
    }
}
