//! Locating peptides in protein sequences and mapping their modification sites to protein coordinates

use std::{collections::HashSet, fmt::Display};

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::AnnotationError,
    fasta::accession,
    sequence::{ModificationVocabulary, ModifiedSequence, SequenceIndex, SiteMarker},
};

/// The options for resolving peptide positions
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct ResolverParameters {
    /// Keep the site positions in the order they were found (candidate order, then occurrence
    /// order, then marker order), otherwise the site positions are sorted
    pub preserve_input_order: bool,
    /// Drop repeated site positions, keeping the first
    pub deduplicate: bool,
    /// Use every `S`, `T`, `Y`, and `K` as a site instead of the marked residues
    pub all_potential_sites: bool,
}

impl Default for ResolverParameters {
    fn default() -> Self {
        Self {
            preserve_input_order: true,
            deduplicate: false,
            all_potential_sites: false,
        }
    }
}

/// A single residue in a protein
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Site {
    /// The one letter code of the residue
    pub residue: char,
    /// The position in the protein, 1 based
    pub position: usize,
}

impl Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.residue, self.position)
    }
}

/// A modification site in a protein. An ambiguous site has multiple candidate residues, exactly
/// one of which carries the modification. Displays as `P12345_S6` or `P12345_S5|T7`.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct SitePosition {
    /// The protein identifier
    pub protein: String,
    /// The candidate residues, sorted by position, only a single one for a localized site
    pub candidates: Vec<Site>,
}

impl SitePosition {
    /// Check if this site is localized to a single residue
    pub fn is_localized(&self) -> bool {
        self.candidates.len() == 1
    }
}

impl Display for SitePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.protein, self.candidates.iter().join("|"))
    }
}

/// The outcome of locating a peptide in one candidate protein
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum SiteResolution {
    /// A single occurrence of the peptide
    Found {
        /// The protein identifier
        protein: String,
        /// The position of the first residue of the peptide, 1 based
        start: usize,
        /// The position of the last residue of the peptide, 1 based inclusive
        end: usize,
        /// The modification sites of the peptide at this occurrence
        sites: Vec<SitePosition>,
    },
    /// The protein is unknown or does not contain the peptide
    NotFound {
        /// The protein identifier
        protein: String,
    },
}

impl SiteResolution {
    /// The protein identifier
    pub fn protein(&self) -> &str {
        match self {
            Self::Found { protein, .. } | Self::NotFound { protein } => protein,
        }
    }

    /// The start position, or `-1` if the peptide was not found
    pub fn start(&self) -> isize {
        match self {
            Self::Found { start, .. } => *start as isize,
            Self::NotFound { .. } => -1,
        }
    }

    /// The end position, or `-1` if the peptide was not found
    pub fn end(&self) -> isize {
        match self {
            Self::Found { end, .. } => *end as isize,
            Self::NotFound { .. } => -1,
        }
    }

    /// The modification sites, empty if the peptide was not found
    pub fn sites(&self) -> &[SitePosition] {
        match self {
            Self::Found { sites, .. } => sites,
            Self::NotFound { .. } => &[],
        }
    }
}

/// Locate a parsed peptide in all candidate proteins. Candidates are given as identifiers, empty
/// identifiers are skipped and UniProt style identifiers (`sp|P12345|NAME`) are reduced to their
/// accession. The results are in candidate order, and within one protein every (possibly
/// overlapping) occurrence is given from left to right. An empty peptide gives no results.
pub fn resolve<'a>(
    peptide: &ModifiedSequence,
    candidates: impl IntoIterator<Item = &'a str>,
    index: &SequenceIndex,
) -> Vec<SiteResolution> {
    if peptide.is_empty() {
        return Vec::new();
    }
    let bare = peptide.bare().as_bytes();
    let mut resolutions = Vec::new();
    for candidate in candidates.into_iter().map(str::trim) {
        if candidate.is_empty() {
            continue;
        }
        let protein = accession(candidate);
        let Some(sequence) = index.get(protein) else {
            debug!("Unknown protein '{protein}'");
            resolutions.push(SiteResolution::NotFound {
                protein: protein.to_string(),
            });
            continue;
        };
        let before = resolutions.len();
        resolutions.extend(
            sequence
                .as_bytes()
                .windows(bare.len())
                .enumerate()
                .filter(|(_, window)| *window == bare)
                .map(|(offset, _)| SiteResolution::Found {
                    protein: protein.to_string(),
                    start: offset + 1,
                    end: offset + bare.len(),
                    sites: peptide
                        .sites()
                        .iter()
                        .map(|site| site_position(protein, peptide.bare(), site, offset))
                        .collect(),
                }),
        );
        if resolutions.len() == before {
            resolutions.push(SiteResolution::NotFound {
                protein: protein.to_string(),
            });
        }
    }
    resolutions
}

/// Parse a peptide with inline markers and locate it in all candidate proteins, see [`resolve`].
/// # Errors
/// If the peptide is not a valid modified sequence.
pub fn resolve_peptide<'a>(
    peptide: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    index: &SequenceIndex,
    vocabulary: &ModificationVocabulary,
    parameters: &ResolverParameters,
) -> Result<Vec<SiteResolution>, AnnotationError> {
    let mut peptide = ModifiedSequence::parse(peptide, vocabulary)?;
    if parameters.all_potential_sites {
        peptide = peptide.with_all_potential_sites();
    }
    Ok(resolve(&peptide, candidates, index))
}

fn site_position(protein: &str, bare: &str, site: &SiteMarker, start: usize) -> SitePosition {
    SitePosition {
        protein: protein.to_string(),
        candidates: site
            .offsets()
            .iter()
            .map(|offset| Site {
                residue: bare.as_bytes()[*offset] as char,
                position: start + offset + 1,
            })
            .collect(),
    }
}

/// All sites of all occurrences together with the occurrence they belong to, ordered and
/// deduplicated according to the parameters. Sorting and deduplication use the displayed form.
pub fn ordered_sites<'a>(
    resolutions: &'a [SiteResolution],
    parameters: &ResolverParameters,
) -> Vec<(&'a SiteResolution, &'a SitePosition)> {
    let mut sites = resolutions
        .iter()
        .flat_map(|resolution| resolution.sites().iter().map(move |site| (resolution, site)))
        .collect_vec();
    if !parameters.preserve_input_order {
        sites.sort_by_cached_key(|(_, site)| site.to_string());
    }
    if parameters.deduplicate {
        let mut seen = HashSet::new();
        sites.retain(|(_, site)| seen.insert(site.to_string()));
    }
    sites
}

/// All site positions as strings, ordered and deduplicated according to the parameters
pub fn site_position_strings(
    resolutions: &[SiteResolution],
    parameters: &ResolverParameters,
) -> Vec<String> {
    ordered_sites(resolutions, parameters)
        .into_iter()
        .map(|(_, site)| site.to_string())
        .collect()
}
