//! Reading protein sequences from FASTA files

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use context_error::*;
use flate2::bufread::GzDecoder;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AnnotationError, AnnotationErrorKind},
    helper_functions::check_extension,
};

/// The header convention of a FASTA file
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum FastaFlavour {
    /// UniProt or MaxQuant style, the identifier is the text up to the first space, and if that
    /// contains `|` (`sp|P12345|NAME_HUMAN`) the second field is used
    #[default]
    UniProt,
    /// PhosphoSitePlus style, the file starts with three lines of preamble, the organism is the
    /// third `|` separated header field and the identifier the fourth
    PhosphoSitePlus,
}

/// A single protein sequence from a FASTA file
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct FastaRecord {
    /// The protein identifier
    pub identifier: String,
    /// The organism, only known for PhosphoSitePlus files
    pub organism: Option<String>,
    /// The full sequence
    pub sequence: String,
}

/// Reduce a UniProt style identifier (`sp|P12345|NAME_HUMAN`) to the accession
pub fn accession(identifier: &str) -> &str {
    identifier.split('|').nth(1).unwrap_or(identifier)
}

/// Read a FASTA file, files ending in `.gz` are decompressed.
/// # Errors
/// If the file could not be opened or read, or if a header is not valid for the given flavour.
pub fn read_fasta(
    path: impl AsRef<Path>,
    flavour: FastaFlavour,
) -> Result<Vec<FastaRecord>, AnnotationError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        BoxedError::new(
            AnnotationErrorKind::Io,
            "Failed reading fasta file",
            format!("Error occurred while opening the file: {e}"),
            Context::default().source(path.to_string_lossy()).to_owned(),
        )
    })?;
    trace!("Reading {flavour:?} fasta file {}", path.display());
    if check_extension(path, "gz") {
        parse_fasta(
            BufReader::new(GzDecoder::new(BufReader::new(file))),
            flavour,
            Some(path),
        )
    } else {
        parse_fasta(BufReader::new(file), flavour, Some(path))
    }
}

/// Parse FASTA records from a reader. Lines are decoded leniently, PhosphoSitePlus files are not
/// always valid UTF-8.
/// # Errors
/// If the reader fails or if a header is not valid for the given flavour.
pub fn parse_fasta(
    reader: impl BufRead,
    flavour: FastaFlavour,
    path: Option<&Path>,
) -> Result<Vec<FastaRecord>, AnnotationError> {
    let source = || {
        path.map_or_else(Context::none, |p| {
            Context::default().source(p.to_string_lossy()).to_owned()
        })
    };
    let skip = match flavour {
        FastaFlavour::UniProt => 0,
        FastaFlavour::PhosphoSitePlus => 3,
    };
    let mut records = Vec::new();
    let mut current: Option<FastaRecord> = None;

    for (line_index, line) in reader.split(b'\n').enumerate().skip(skip) {
        let line = line.map_err(|e| {
            BoxedError::new(
                AnnotationErrorKind::Io,
                "Failed reading fasta file",
                format!("Error occurred while reading line {}: {e}", line_index + 1),
                source(),
            )
        })?;
        let line = String::from_utf8_lossy(&line);
        let line = line.trim_end();
        if let Some(header) = line.strip_prefix('>') {
            records.extend(current.take());
            if !header.is_empty() {
                current = Some(parse_header(header, flavour, line_index, line)?);
            }
        } else if let Some(record) = &mut current {
            record.sequence.extend(
                line.chars()
                    .filter(|c| !c.is_ascii_whitespace() && *c != '*'),
            );
        }
    }
    records.extend(current);
    Ok(records)
}

fn parse_header(
    header: &str,
    flavour: FastaFlavour,
    line_index: usize,
    line: &str,
) -> Result<FastaRecord, AnnotationError> {
    match flavour {
        FastaFlavour::UniProt => {
            let identifier = header.split(' ').next().unwrap_or(header);
            Ok(FastaRecord {
                identifier: accession(identifier).to_string(),
                organism: None,
                sequence: String::new(),
            })
        }
        FastaFlavour::PhosphoSitePlus => {
            let fields: Vec<&str> = header.split('|').collect();
            if fields.len() < 4 {
                return Err(BoxedError::new(
                    AnnotationErrorKind::Parse,
                    "Invalid PhosphoSitePlus fasta header",
                    "A header should contain at least four '|' separated fields, the organism being the third and the accession the fourth",
                    Context::full_line(line_index as u32, line).to_owned(),
                ));
            }
            Ok(FastaRecord {
                identifier: fields[3].trim().to_string(),
                organism: Some(fields[2].trim().to_string()),
                sequence: String::new(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn uniprot() {
        let file = ">sp|P12345|PROT_HUMAN Some protein OS=Homo sapiens\nMAGRST\nSPRLLK\n\n>Q99999 other\nMK*\n>\n";
        let records = parse_fasta(file.as_bytes(), FastaFlavour::UniProt, None).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identifier, "P12345");
        assert_eq!(records[0].sequence, "MAGRSTSPRLLK");
        assert_eq!(records[1].identifier, "Q99999");
        assert_eq!(records[1].sequence, "MK");
    }

    #[test]
    fn phosphositeplus() {
        let file = "date\nlicense\n\n>GSK3B|iso2|human|P49841-2\nMSG\nRP\n>Gsk3b|x|mouse|Q9WV60\nMSG\n";
        let records = parse_fasta(file.as_bytes(), FastaFlavour::PhosphoSitePlus, None).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identifier, "P49841-2");
        assert_eq!(records[0].organism.as_deref(), Some("human"));
        assert_eq!(records[0].sequence, "MSGRP");
        assert_eq!(records[1].organism.as_deref(), Some("mouse"));
    }

    #[test]
    fn invalid_phosphositeplus_header() {
        let file = "a\nb\nc\n>GSK3B|human\nMSG\n";
        assert!(parse_fasta(file.as_bytes(), FastaFlavour::PhosphoSitePlus, None).is_err());
    }

    #[test]
    fn accessions() {
        assert_eq!(accession("sp|P12345|PROT_HUMAN"), "P12345");
        assert_eq!(accession("P12345"), "P12345");
    }
}
