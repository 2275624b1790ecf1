#![doc = include_str!("../README.md")]

/// Batch operations over peptide rows and the typed row records
pub mod annotate;
pub mod config;
pub mod context;
/// Parse delimiter separated files while keeping track of all necessary info to generate great error messages
pub mod csv;
pub mod error;
pub mod fasta;
mod helper_functions;
pub mod kinase;
pub mod localization;
pub mod position;
pub mod sequence;
pub mod sequence_motif;

/// A subset of the types and functions that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    #[cfg(feature = "rayon")]
    pub use crate::annotate::{par_resolve_positions, par_score_kinase_motifs};
    pub use crate::annotate::{
        ContextRow, PeptideRow, PositionAnnotation, PositionSettings, match_sequence_motifs,
        resolve_positions, score_kinase_motifs,
    };
    pub use crate::config::AnnotationConfig;
    pub use crate::context::{ContextParameters, extract_context};
    pub use crate::error::{AnnotationError, AnnotationErrorKind};
    pub use crate::fasta::FastaFlavour;
    pub use crate::kinase::{
        KinaseLibrary, KinaseLibraryParameters, KinaseMatch, KinaseMotifModel, Metric,
        MotifAnnotation, MotifScore, ScoreDistribution, SortOrder,
    };
    pub use crate::localization::{
        delocalized_sequence, modified_sequence_groups, representative_sequences,
    };
    pub use crate::position::{
        ResolverParameters, Site, SitePosition, SiteResolution, resolve, resolve_peptide,
    };
    pub use crate::sequence::{ModificationVocabulary, ModifiedSequence, SequenceIndex, SiteMarker};
    pub use crate::sequence_motif::SequenceMotifLibrary;
}
