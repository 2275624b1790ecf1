//! The configuration of an annotation run: the reference files and all options

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use context_error::*;
use directories::ProjectDirs;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    context::ContextParameters,
    error::{AnnotationError, AnnotationErrorKind},
    fasta::FastaFlavour,
    kinase::{KinaseLibrary, KinaseLibraryParameters},
    position::ResolverParameters,
    sequence::{ModificationVocabulary, SequenceIndex, alphabet::is_residue},
    sequence_motif::SequenceMotifLibrary,
};

/// All reference files and options for annotating modification sites. Every field has a default,
/// so a configuration file only needs to contain the settings that differ.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// The protein sequences
    pub fasta_file: PathBuf,
    /// The header convention of the protein sequence file
    pub fasta_flavour: FastaFlavour,
    /// Only keep proteins from this organism, if the FASTA file defines organisms
    pub organism: String,
    /// The sequence motifs, tab separated with `Identifier` and `Regex` columns
    pub motifs_file: PathBuf,
    /// The kinase odds ratios, tab separated with `Kinase`, `Position`, `AA`, and `Odds Ratio` columns
    pub kinase_library_motifs_file: PathBuf,
    /// The kinase score distributions, tab separated with `Kinase` and `Score` columns
    pub kinase_library_distributions_file: PathBuf,
    /// Site markers on top of the default vocabulary, as marker and modified residue
    pub extra_site_markers: Vec<(String, char)>,
    /// Neutral markers on top of the default vocabulary
    pub extra_neutral_markers: Vec<String>,
    /// Markers for a phosphorylation on the peptide with an unknown site, on top of the default vocabulary
    pub extra_peptide_markers: Vec<String>,
    /// The options for locating peptides
    pub resolver: ResolverParameters,
    /// The options for the sequence context windows
    pub context: ContextParameters,
    /// The options for reporting kinase matches
    pub kinase_library: KinaseLibraryParameters,
    /// The maximal distance between phosphorylations to group modified sequences
    pub group_tolerance: usize,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            fasta_file: "./PhosphoSitePlus/Phosphosite_seq.fasta".into(),
            fasta_flavour: FastaFlavour::PhosphoSitePlus,
            organism: "human".to_string(),
            motifs_file: "./motifs_all.tsv".into(),
            kinase_library_motifs_file: "./Motif_Odds_Ratios.txt".into(),
            kinase_library_distributions_file: "./Kinase_Score_Distributions.txt".into(),
            extra_site_markers: Vec::new(),
            extra_neutral_markers: Vec::new(),
            extra_peptide_markers: Vec::new(),
            resolver: ResolverParameters::default(),
            context: ContextParameters::default(),
            kinase_library: KinaseLibraryParameters::default(),
            group_tolerance: 2,
        }
    }
}

impl AnnotationConfig {
    /// The location of the per user configuration file, if a home directory can be found
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("de", "tum.mls", "psite-annotation")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Read a configuration from a JSON file
    /// # Errors
    /// If the file could not be opened or is not a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AnnotationError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            BoxedError::new(
                AnnotationErrorKind::Config,
                "Could not open configuration",
                e.to_string(),
                Context::default().source(path.to_string_lossy()).to_owned(),
            )
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            BoxedError::new(
                AnnotationErrorKind::Config,
                "Invalid configuration",
                e.to_string(),
                Context::default()
                    .source(path.to_string_lossy())
                    .line_index(e.line().saturating_sub(1) as u32)
                    .to_owned(),
            )
        })
    }

    /// Read the per user configuration, or the default configuration if there is none
    /// # Errors
    /// If the user configuration exists but is not valid.
    pub fn from_user_config() -> Result<Self, AnnotationError> {
        match Self::user_config_path() {
            Some(path) if path.exists() => {
                info!("Using configuration from {}", path.display());
                Self::from_file(path)
            }
            _ => {
                info!("Using default builtin configuration");
                Ok(Self::default())
            }
        }
    }

    /// Write this configuration as JSON, creating the parent directories if needed
    /// # Errors
    /// If the file could not be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AnnotationError> {
        let path = path.as_ref();
        let error = |e: String| {
            BoxedError::new(
                AnnotationErrorKind::Config,
                "Could not write configuration",
                e,
                Context::default().source(path.to_string_lossy()).to_owned(),
            )
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| error(e.to_string()))?;
        }
        let file = File::create(path).map_err(|e| error(e.to_string()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| error(e.to_string()))
    }

    /// The default vocabulary extended with the configured markers
    /// # Errors
    /// If an extra site marker names a residue outside of the amino acid alphabet.
    pub fn vocabulary(&self) -> Result<ModificationVocabulary, AnnotationError> {
        let mut vocabulary = ModificationVocabulary::default();
        for (marker, residue) in &self.extra_site_markers {
            let symbol = residue.to_ascii_uppercase();
            if !symbol.is_ascii() || !is_residue(symbol as u8) {
                return Err(BoxedError::new(
                    AnnotationErrorKind::Config,
                    "Invalid site marker",
                    format!(
                        "The site marker '{marker}' modifies '{residue}', which is not an amino acid"
                    ),
                    Context::none(),
                ));
            }
            vocabulary.add_site_marker(marker.clone(), symbol as u8);
        }
        for marker in &self.extra_neutral_markers {
            vocabulary.add_neutral_marker(marker.clone());
        }
        for marker in &self.extra_peptide_markers {
            vocabulary.add_peptide_marker(marker.clone());
        }
        Ok(vocabulary)
    }

    /// Load the protein sequences
    /// # Errors
    /// If the FASTA file could not be read.
    pub fn load_sequence_index(&self) -> Result<SequenceIndex, AnnotationError> {
        SequenceIndex::from_fasta(&self.fasta_file, self.fasta_flavour, &self.organism)
    }

    /// Load the kinase library
    /// # Errors
    /// If either of the tables could not be read.
    pub fn load_kinase_library(&self) -> Result<KinaseLibrary, AnnotationError> {
        KinaseLibrary::load(
            &self.kinase_library_motifs_file,
            &self.kinase_library_distributions_file,
        )
    }

    /// Load the sequence motifs
    /// # Errors
    /// If the motif table could not be read.
    pub fn load_sequence_motifs(&self) -> Result<SequenceMotifLibrary, AnnotationError> {
        SequenceMotifLibrary::load(&self.motifs_file)
    }
}
