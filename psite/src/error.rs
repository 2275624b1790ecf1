//! The [`AnnotationErrorKind`] which makes it easy for downstream users of the error type to match on the exact error.

use context_error::{BoxedError, ErrorKind};

/// The kind of error that can occur while annotating modification sites. Only hard failures are
/// represented here, soft outcomes (an unknown protein, a too short context window, an empty
/// peptide) are part of the normal results.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum AnnotationErrorKind {
    /// A peptide, protein, or context sequence contains a character outside the amino acid alphabet
    #[default]
    MalformedSequence,
    /// A site position does not fall within the protein sequence it refers to
    InvalidSitePosition,
    /// A reference file could not be opened or read
    Io,
    /// A reference file could be read but does not contain valid data
    Parse,
    /// The configuration could not be read or does not contain valid settings
    Config,
}

impl ErrorKind for AnnotationErrorKind {
    type Settings = ();
    fn descriptor(&self) -> &'static str {
        "error"
    }
    fn ignored(&self, _settings: Self::Settings) -> bool {
        false
    }
    fn is_error(&self, _settings: Self::Settings) -> bool {
        true
    }
}

/// An owned error with its full context
pub type AnnotationError = BoxedError<'static, AnnotationErrorKind>;
