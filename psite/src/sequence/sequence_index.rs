use std::{collections::HashMap, path::Path};

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::AnnotationError,
    fasta::{FastaFlavour, FastaRecord, read_fasta},
};

/// All protein sequences that peptides can be located in, by protein identifier. The index is
/// immutable once built and can be shared between threads freely.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SequenceIndex {
    sequences: HashMap<String, String>,
}

impl SequenceIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a protein sequence. If the identifier is already present the first sequence is kept,
    /// a warning is logged, and `false` is returned.
    pub fn insert(&mut self, identifier: impl Into<String>, sequence: impl Into<String>) -> bool {
        let identifier = identifier.into();
        if self.sequences.contains_key(&identifier) {
            warn!("Duplicate protein identifier '{identifier}', the first sequence is kept");
            false
        } else {
            self.sequences.insert(identifier, sequence.into());
            true
        }
    }

    /// Get the sequence for the given protein identifier
    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.sequences.get(identifier).map(String::as_str)
    }

    /// The number of proteins
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Check if the index contains no proteins
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Iterate over all proteins (in arbitrary order)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sequences
            .iter()
            .map(|(id, sequence)| (id.as_str(), sequence.as_str()))
    }

    /// Build an index from FASTA records, records with a known organism that is different from
    /// the given organism are skipped.
    pub fn from_records(records: impl IntoIterator<Item = FastaRecord>, organism: &str) -> Self {
        let mut index = Self::new();
        for record in records {
            if record
                .organism
                .as_ref()
                .is_none_or(|o| o.eq_ignore_ascii_case(organism))
            {
                index.insert(record.identifier, record.sequence);
            }
        }
        index
    }

    /// Load an index from a FASTA file
    /// # Errors
    /// If the FASTA file could not be read.
    pub fn from_fasta(
        path: impl AsRef<Path>,
        flavour: FastaFlavour,
        organism: &str,
    ) -> Result<Self, AnnotationError> {
        let index = Self::from_records(read_fasta(path, flavour)?, organism);
        trace!("Loaded {} protein sequences", index.len());
        Ok(index)
    }
}

impl<I: Into<String>, S: Into<String>> FromIterator<(I, S)> for SequenceIndex {
    fn from_iter<T: IntoIterator<Item = (I, S)>>(iter: T) -> Self {
        let mut index = Self::new();
        for (identifier, sequence) in iter {
            index.insert(identifier, sequence);
        }
        index
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn first_wins() {
        let index: SequenceIndex = [("P1", "MAGRST"), ("P2", "MKK"), ("P1", "MSSS")]
            .into_iter()
            .collect();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("P1"), Some("MAGRST"));
        assert_eq!(index.get("P3"), None);
    }

    #[test]
    fn organism_filter() {
        let records = vec![
            FastaRecord {
                identifier: "P49841".to_string(),
                organism: Some("human".to_string()),
                sequence: "MSG".to_string(),
            },
            FastaRecord {
                identifier: "Q9WV60".to_string(),
                organism: Some("mouse".to_string()),
                sequence: "MSG".to_string(),
            },
            FastaRecord {
                identifier: "P12345".to_string(),
                organism: None,
                sequence: "MK".to_string(),
            },
        ];
        let index = SequenceIndex::from_records(records, "human");
        assert_eq!(index.len(), 2);
        assert!(index.get("Q9WV60").is_none());
    }
}
