//! Batch annotation of peptide rows, every operation maps rows to annotations one to one and keeps
//! the order. Failures are reported per row so a single malformed peptide does not stop a batch.

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    context::{ContextParameters, join_contexts, site_context},
    error::AnnotationError,
    kinase::{KinaseLibrary, KinaseLibraryParameters, MotifAnnotation},
    position::{ResolverParameters, SiteResolution, ordered_sites, resolve},
    sequence::{ModificationVocabulary, ModifiedSequence, SequenceIndex},
    sequence_motif::SequenceMotifLibrary,
};

/// An input row: a peptide with inline modification markers and its candidate proteins
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct PeptideRow {
    /// The candidate protein identifiers
    pub proteins: Vec<String>,
    /// The peptide with inline modification markers
    pub modified_sequence: String,
}

impl PeptideRow {
    /// Create a row from a `;` separated protein column and a modified sequence
    pub fn new(proteins: &str, modified_sequence: impl Into<String>) -> Self {
        Self {
            proteins: proteins.split(';').map(ToString::to_string).collect(),
            modified_sequence: modified_sequence.into(),
        }
    }
}

/// The positions of a peptide in its proteins, every field is a `;` separated column value
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct PositionAnnotation {
    /// Matched proteins, one entry per occurrence or not found protein
    pub matched_proteins: String,
    /// Start positions, aligned with the matched proteins, `-1` if not found
    pub start_positions: String,
    /// End positions, aligned with the matched proteins, `-1` if not found
    pub end_positions: String,
    /// Site positions, eg `P12345_S6`
    pub site_positions: String,
    /// Site sequence context, aligned with the site positions
    pub site_sequence_contexts: String,
}

/// The sequence context windows of a single row, the input for motif scoring
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ContextRow {
    /// The windows, localization groups are a single entry with `|` separated windows
    pub contexts: Vec<String>,
}

impl ContextRow {
    /// Create a row from a `;` separated context column
    pub fn new(contexts: &str) -> Self {
        Self {
            contexts: contexts
                .split(';')
                .filter(|c| !c.is_empty())
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// All individual windows, localization groups are split up
    pub fn windows(&self) -> impl Iterator<Item = &str> {
        self.contexts.iter().flat_map(|c| c.split('|'))
    }
}

impl From<&PositionAnnotation> for ContextRow {
    fn from(annotation: &PositionAnnotation) -> Self {
        Self::new(&annotation.site_sequence_contexts)
    }
}

/// The shared references and options for resolving positions
#[derive(Clone, Copy, Debug)]
pub struct PositionSettings<'a> {
    /// The protein sequences
    pub index: &'a SequenceIndex,
    /// The recognised modification markers
    pub vocabulary: &'a ModificationVocabulary,
    /// The options for locating peptides
    pub resolver: &'a ResolverParameters,
    /// The options for the sequence context windows
    pub context: &'a ContextParameters,
}

impl PositionAnnotation {
    /// Annotate a single row
    /// # Errors
    /// If the peptide is malformed, or if a context window could not be extracted.
    pub fn annotate(row: &PeptideRow, settings: PositionSettings) -> Result<Self, AnnotationError> {
        let mut peptide = ModifiedSequence::parse(&row.modified_sequence, settings.vocabulary)?;
        if settings.resolver.all_potential_sites {
            peptide = peptide.with_all_potential_sites();
        }
        let resolutions = resolve(
            &peptide,
            row.proteins.iter().map(String::as_str),
            settings.index,
        );
        Self::from_resolutions(&resolutions, settings)
    }

    /// Create the annotation columns from resolved positions
    /// # Errors
    /// If a context window could not be extracted.
    pub fn from_resolutions(
        resolutions: &[SiteResolution],
        settings: PositionSettings,
    ) -> Result<Self, AnnotationError> {
        let sites = ordered_sites(resolutions, settings.resolver);
        let contexts = sites
            .iter()
            .filter_map(|(resolution, site)| {
                settings
                    .index
                    .get(resolution.protein())
                    .map(|sequence| site_context(resolution, site, sequence, settings.context))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            matched_proteins: resolutions.iter().map(SiteResolution::protein).join(";"),
            start_positions: resolutions.iter().map(SiteResolution::start).join(";"),
            end_positions: resolutions.iter().map(SiteResolution::end).join(";"),
            site_positions: sites.iter().map(|(_, site)| site).join(";"),
            site_sequence_contexts: join_contexts(contexts, settings.context),
        })
    }
}

/// Resolve the positions and extract the sequence context windows for all rows
pub fn resolve_positions(
    rows: &[PeptideRow],
    settings: PositionSettings,
) -> Vec<Result<PositionAnnotation, AnnotationError>> {
    rows.iter()
        .map(|row| PositionAnnotation::annotate(row, settings))
        .collect()
}

/// Resolve the positions and extract the sequence context windows for all rows, in parallel
#[cfg(feature = "rayon")]
pub fn par_resolve_positions(
    rows: &[PeptideRow],
    settings: PositionSettings,
) -> Vec<Result<PositionAnnotation, AnnotationError>> {
    rows.par_iter()
        .map(|row| PositionAnnotation::annotate(row, settings))
        .collect()
}

/// Score the context windows of all rows against the kinase library
pub fn score_kinase_motifs(
    rows: &[ContextRow],
    library: &KinaseLibrary,
    parameters: &KinaseLibraryParameters,
) -> Vec<Result<MotifAnnotation, AnnotationError>> {
    rows.iter()
        .map(|row| {
            library
                .score_windows(row.windows(), parameters)
                .map(|matches| MotifAnnotation::from(matches.as_slice()))
        })
        .collect()
}

/// Score the context windows of all rows against the kinase library, in parallel
#[cfg(feature = "rayon")]
pub fn par_score_kinase_motifs(
    rows: &[ContextRow],
    library: &KinaseLibrary,
    parameters: &KinaseLibraryParameters,
) -> Vec<Result<MotifAnnotation, AnnotationError>> {
    rows.par_iter()
        .map(|row| {
            library
                .score_windows(row.windows(), parameters)
                .map(|matches| MotifAnnotation::from(matches.as_slice()))
        })
        .collect()
}

/// The sequence motifs matching the context windows of all rows
pub fn match_sequence_motifs(rows: &[ContextRow], motifs: &SequenceMotifLibrary) -> Vec<String> {
    rows.iter()
        .map(|row| motifs.matches(&row.windows().join(";")))
        .collect()
}
