//! Matching sequence context windows against regular expression motifs

use std::path::Path;

use context_error::*;
use itertools::Itertools;
use log::trace;
use regex::Regex;

use crate::{
    csv::{CsvLine, parse_csv},
    error::{AnnotationError, AnnotationErrorKind},
};

/// A named set of regular expression motifs, a motif matches a sequence context window if the
/// expression matches anywhere in the window
#[derive(Clone, Debug, Default)]
pub struct SequenceMotifLibrary {
    motifs: Vec<(String, Regex)>,
}

impl SequenceMotifLibrary {
    /// Create a library from (identifier, regular expression) pairs
    /// # Errors
    /// If any regular expression is invalid.
    pub fn new<'a>(
        motifs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, AnnotationError> {
        motifs
            .into_iter()
            .map(|(identifier, regex)| {
                Regex::new(regex)
                    .map(|regex| (identifier.to_string(), regex))
                    .map_err(|e| {
                        BoxedError::new(
                            AnnotationErrorKind::Parse,
                            "Invalid motif",
                            format!("The regular expression for motif '{identifier}' is invalid: {e}"),
                            Context::show(regex.to_string()),
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|motifs| Self { motifs })
    }

    /// Load a library from a tab separated file with the columns `Identifier` and `Regex`
    /// # Errors
    /// If the file could not be read or contains an invalid regular expression.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnnotationError> {
        let library = Self::from_lines(parse_csv(path, b'\t', None)?)?;
        trace!("Loaded {} sequence motifs", library.len());
        Ok(library)
    }

    /// Read a library from the lines of a motif table
    /// # Errors
    /// If any line could not be read or contains an invalid regular expression.
    pub fn from_lines(
        lines: impl Iterator<Item = Result<CsvLine, AnnotationError>>,
    ) -> Result<Self, AnnotationError> {
        let mut motifs = Vec::new();
        for line in lines {
            let line = line?;
            let identifier = line.index_column("identifier")?;
            let column = line.column_index("regex")?;
            let regex = Regex::new(&line[column]).map_err(|e| {
                BoxedError::new(
                    AnnotationErrorKind::Parse,
                    "Invalid motif",
                    format!("The regular expression for motif '{identifier}' is invalid: {e}"),
                    line.column_context(column).to_owned(),
                )
            })?;
            motifs.push((identifier.to_string(), regex));
        }
        Ok(Self { motifs })
    }

    /// The number of motifs
    pub fn len(&self) -> usize {
        self.motifs.len()
    }

    /// Check if there are no motifs
    pub fn is_empty(&self) -> bool {
        self.motifs.is_empty()
    }

    /// All motifs matching any of the `;` separated windows, sorted and unique, joined by `;`
    pub fn matches(&self, contexts: &str) -> String {
        contexts
            .split(';')
            .filter(|window| !window.is_empty())
            .flat_map(|window| {
                self.motifs
                    .iter()
                    .filter(|(_, regex)| regex.is_match(window))
                    .map(|(identifier, _)| identifier.as_str())
            })
            .sorted()
            .dedup()
            .join(";")
    }
}
