use std::sync::LazyLock;

use context_error::*;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AnnotationError, AnnotationErrorKind},
    helper_functions::end_of_enclosure,
    sequence::alphabet::{is_modified_residue, is_residue},
};

/// A modification site within a peptide, as offsets (0 based) into the bare peptide
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum SiteMarker {
    /// A site on a single residue
    Localized(usize),
    /// A single modification that could be placed on any of these residues, sorted ascending
    Ambiguous(Vec<usize>),
}

impl SiteMarker {
    /// All candidate offsets for this site
    pub fn offsets(&self) -> &[usize] {
        match self {
            Self::Localized(offset) => std::slice::from_ref(offset),
            Self::Ambiguous(offsets) => offsets,
        }
    }

    /// Check if this site is localized to a single residue
    pub const fn is_localized(&self) -> bool {
        matches!(self, Self::Localized(_))
    }
}

/// The set of inline markers that are recognised in modified sequences. Every marker is either a
/// site marker, which is the full text for a modified residue (eg `S(ph)` or `pS`), a neutral
/// marker which is removed without creating a site (eg `(ox)`), or a peptide level marker, a
/// modification that is not attached to any residue (eg a leading `(ph)`).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ModificationVocabulary {
    /// Sorted longest first, so the longest marker always wins
    markers: Vec<(String, MarkerKind)>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
enum MarkerKind {
    Site(u8),
    Neutral,
    /// Placed on any of the `S`, `T`, or `Y` residues of the peptide
    Peptide,
}

static MAXQUANT: LazyLock<ModificationVocabulary> = LazyLock::new(|| {
    let mut vocabulary = ModificationVocabulary::empty();
    for (marker, residue) in [
        ("K(ac)", b'K'),
        ("K( GlyGly (K) without TMT)", b'K'),
        ("K( GlyGly )", b'K'),
        ("K(GlyGly)", b'K'),
        ("K(Acetyl (K))", b'K'),
        ("C(dbia)", b'C'),
        ("S(ph)", b'S'),
        ("T(ph)", b'T'),
        ("Y(ph)", b'Y'),
        ("S(Phospho (STY))", b'S'),
        ("T(Phospho (STY))", b'T'),
        ("Y(Phospho (STY))", b'Y'),
        ("pS", b'S'),
        ("pT", b'T'),
        ("pY", b'Y'),
    ] {
        vocabulary.add_site_marker(marker, residue);
    }
    for marker in [
        "(ac)",
        "(Acetyl (Protein N-term))",
        "(ox)",
        "(Oxidation (M))",
        "_",
    ] {
        vocabulary.add_neutral_marker(marker);
    }
    for marker in ["(ph)", "(Phospho (STY))"] {
        vocabulary.add_peptide_marker(marker);
    }
    vocabulary
});

impl Default for ModificationVocabulary {
    /// The MaxQuant and in-house marker conventions
    fn default() -> Self {
        MAXQUANT.clone()
    }
}

impl ModificationVocabulary {
    /// A vocabulary without any markers, only lower case residues are recognised as sites
    pub const fn empty() -> Self {
        Self {
            markers: Vec::new(),
        }
    }

    /// Add a marker for a modified residue, the residue is given as its upper case one letter code
    pub fn add_site_marker(&mut self, marker: impl Into<String>, residue: u8) {
        self.insert(marker.into(), MarkerKind::Site(residue.to_ascii_uppercase()));
    }

    /// Add a marker that is removed without creating a site
    pub fn add_neutral_marker(&mut self, marker: impl Into<String>) {
        self.insert(marker.into(), MarkerKind::Neutral);
    }

    /// Add a marker for a modification that is not attached to a residue, it creates a single
    /// site that is ambiguous over all `S`, `T`, and `Y` residues of the peptide
    pub fn add_peptide_marker(&mut self, marker: impl Into<String>) {
        self.insert(marker.into(), MarkerKind::Peptide);
    }

    fn insert(&mut self, marker: String, kind: MarkerKind) {
        if marker.is_empty() {
            return;
        }
        self.markers.retain(|(m, _)| *m != marker);
        let index = self
            .markers
            .partition_point(|(m, _)| m.len() >= marker.len());
        self.markers.insert(index, (marker, kind));
    }

    /// Find the longest marker at the start of the given text
    fn find(&self, text: &str) -> Option<(usize, MarkerKind)> {
        self.markers
            .iter()
            .find(|(marker, _)| text.starts_with(marker.as_str()))
            .map(|(marker, kind)| (marker.len(), *kind))
    }
}

/// A peptide with its modification sites, the result of parsing a sequence with inline markers
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ModifiedSequence {
    bare: String,
    sites: Vec<SiteMarker>,
}

impl ModifiedSequence {
    /// Parse a modified sequence. Residues are upper case one letter codes, modified residues are
    /// written as lower case letters or with any marker from the vocabulary. A localization group
    /// `{...}` contains a single modification that can be on any of the marked residues in the
    /// group. A peptide level marker that is not attached to a residue (`(ph)GRSTSPR`) is a single
    /// site that can be on any of the unmodified `S`, `T`, or `Y` residues. Unknown bracketed
    /// modifications (`(...)` or `[...]`) are removed without creating a site.
    /// # Errors
    /// If the text contains any character that is not a residue or part of a marker, or if a
    /// localization group is empty, nested, or not closed.
    pub fn parse(text: &str, vocabulary: &ModificationVocabulary) -> Result<Self, AnnotationError> {
        let mut bare = String::with_capacity(text.len());
        let mut sites = Vec::new();
        let mut group: Option<(usize, Vec<usize>)> = None;
        let mut peptide_level = Vec::new();
        let bytes = text.as_bytes();
        let mut index = 0;

        while index < bytes.len() {
            if let Some((length, kind)) = vocabulary.find(&text[index..]) {
                match kind {
                    MarkerKind::Site(residue) => {
                        mark(&mut sites, &mut group, bare.len());
                        bare.push(residue as char);
                    }
                    MarkerKind::Neutral => (),
                    MarkerKind::Peptide if group.is_some() => {
                        return Err(malformed(
                            text,
                            index,
                            length,
                            "Invalid localization group",
                            "A localization group cannot contain a modification that is not placed on a residue",
                        ));
                    }
                    MarkerKind::Peptide => peptide_level.push((index, length)),
                }
                index += length;
                continue;
            }
            match bytes[index] {
                b'{' => {
                    if group.is_some() {
                        return Err(malformed(
                            text,
                            index,
                            1,
                            "Nested localization group",
                            "A localization group cannot be opened inside another localization group",
                        ));
                    }
                    group = Some((index, Vec::new()));
                }
                b'}' => match group.take() {
                    None => {
                        return Err(malformed(
                            text,
                            index,
                            1,
                            "Unopened localization group",
                            "This closing bracket does not close any localization group",
                        ));
                    }
                    Some((start, marked)) => match marked.len() {
                        0 => {
                            return Err(malformed(
                                text,
                                start,
                                index + 1 - start,
                                "Empty localization group",
                                "A localization group has to contain at least one modified residue",
                            ));
                        }
                        1 => sites.push(SiteMarker::Localized(marked[0])),
                        _ => sites.push(SiteMarker::Ambiguous(marked)),
                    },
                },
                open @ (b'(' | b'[') => {
                    let close = if open == b'(' { b')' } else { b']' };
                    let end = end_of_enclosure(text, index + 1, open, close).ok_or_else(|| {
                        malformed(
                            text,
                            index,
                            1,
                            "Invalid modification",
                            "No valid closing delimiter",
                        )
                    })?;
                    debug!(
                        "Ignored unknown modification '{}' in '{text}'",
                        &text[index..=end]
                    );
                    index = end;
                }
                residue if is_modified_residue(residue) => {
                    mark(&mut sites, &mut group, bare.len());
                    bare.push(residue.to_ascii_uppercase() as char);
                }
                residue if is_residue(residue) => bare.push(residue as char),
                _ => {
                    let length = text[index..].chars().next().map_or(1, char::len_utf8);
                    return Err(malformed(
                        text,
                        index,
                        length,
                        "Invalid modified sequence",
                        "This character is not an amino acid or part of a known modification",
                    ));
                }
            }
            index += 1;
        }

        if let Some((start, _)) = group {
            return Err(malformed(
                text,
                start,
                1,
                "Unclosed localization group",
                "This localization group is never closed",
            ));
        }

        if let Some((start, length)) = peptide_level.first() {
            let localized = sites
                .iter()
                .filter_map(|site| match site {
                    SiteMarker::Localized(offset) => Some(*offset),
                    SiteMarker::Ambiguous(_) => None,
                })
                .collect::<Vec<_>>();
            let candidates = bare
                .bytes()
                .enumerate()
                .filter(|(offset, residue)| {
                    matches!(residue, b'S' | b'T' | b'Y') && !localized.contains(offset)
                })
                .map(|(offset, _)| offset)
                .collect::<Vec<_>>();
            if candidates.len() < peptide_level.len() {
                return Err(malformed(
                    text,
                    *start,
                    *length,
                    "Unplaceable modification",
                    "There are not enough unmodified S, T, or Y residues to carry this modification",
                ));
            }
            for _ in &peptide_level {
                sites.push(if let [offset] = candidates.as_slice() {
                    SiteMarker::Localized(*offset)
                } else {
                    SiteMarker::Ambiguous(candidates.clone())
                });
            }
        }

        Ok(Self { bare, sites })
    }

    /// Replace all sites by every potential phosphorylation or acetylation site (`S`, `T`, `Y`,
    /// and `K`) as a localized site, cysteine sites are dropped.
    #[must_use]
    pub fn with_all_potential_sites(self) -> Self {
        let sites = self
            .bare
            .bytes()
            .enumerate()
            .filter(|(_, residue)| matches!(residue, b'S' | b'T' | b'Y' | b'K'))
            .map(|(offset, _)| SiteMarker::Localized(offset))
            .collect();
        Self {
            bare: self.bare,
            sites,
        }
    }

    /// The peptide without any markers, in upper case
    pub fn bare(&self) -> &str {
        &self.bare
    }

    /// The sites in order of appearance
    pub fn sites(&self) -> &[SiteMarker] {
        &self.sites
    }

    /// Check if the bare peptide is empty
    pub fn is_empty(&self) -> bool {
        self.bare.is_empty()
    }

    /// The offsets of all localized sites, sorted ascending
    pub fn localized_offsets(&self) -> Vec<usize> {
        let mut offsets: Vec<usize> = self
            .sites
            .iter()
            .filter_map(|site| match site {
                SiteMarker::Localized(offset) => Some(*offset),
                SiteMarker::Ambiguous(_) => None,
            })
            .collect();
        offsets.sort_unstable();
        offsets
    }
}

fn mark(sites: &mut Vec<SiteMarker>, group: &mut Option<(usize, Vec<usize>)>, offset: usize) {
    if let Some((_, marked)) = group {
        marked.push(offset);
    } else {
        sites.push(SiteMarker::Localized(offset));
    }
}

fn malformed(
    text: &str,
    index: usize,
    length: usize,
    short: &'static str,
    long: &'static str,
) -> AnnotationError {
    BoxedError::new(
        AnnotationErrorKind::MalformedSequence,
        short,
        long,
        Context::line(None, text, index, length).to_owned(),
    )
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ModifiedSequence, AnnotationError> {
        ModifiedSequence::parse(text, &ModificationVocabulary::default())
    }

    #[test]
    fn maxquant_markers() {
        let sequence = parse("_(ac)AAS(ph)M(ox)K(GlyGly)pTR_").unwrap();
        assert_eq!(sequence.bare(), "AASMKTR");
        assert_eq!(
            sequence.sites(),
            &[
                SiteMarker::Localized(2),
                SiteMarker::Localized(4),
                SiteMarker::Localized(5)
            ]
        );
        let sequence = parse("S(Phospho (STY))K( GlyGly (K) without TMT)C(dbia)").unwrap();
        assert_eq!(sequence.bare(), "SKC");
        assert_eq!(sequence.sites().len(), 3);
    }

    #[test]
    fn lower_case_sites() {
        let sequence = parse("GRStSPR").unwrap();
        assert_eq!(sequence.bare(), "GRSTSPR");
        assert_eq!(sequence.sites(), &[SiteMarker::Localized(3)]);
        assert_eq!(parse("GRST(ph)SPR").unwrap(), sequence);
    }

    #[test]
    fn localization_groups() {
        let sequence = parse("GR{S(ph)T(ph)}SPR").unwrap();
        assert_eq!(sequence.bare(), "GRSTSPR");
        assert_eq!(sequence.sites(), &[SiteMarker::Ambiguous(vec![2, 3])]);
        assert!(sequence.localized_offsets().is_empty());
        let sequence = parse("G{RsT}SPR").unwrap();
        assert_eq!(sequence.sites(), &[SiteMarker::Localized(2)]);
        assert!(parse("GR{ST}SPR").is_err());
        assert!(parse("GR{s{t}}SPR").is_err());
        assert!(parse("GR{st").is_err());
        assert!(parse("GRst}").is_err());
    }

    #[test]
    fn peptide_level_markers() {
        let sequence = parse("(ph)GRSTSPR").unwrap();
        assert_eq!(sequence.bare(), "GRSTSPR");
        assert_eq!(sequence.sites(), &[SiteMarker::Ambiguous(vec![2, 3, 4])]);
        let sequence = parse("GR(ph)S(ph)TSPR").unwrap();
        assert_eq!(
            sequence.sites(),
            &[SiteMarker::Localized(2), SiteMarker::Ambiguous(vec![3, 4])]
        );
        let sequence = parse("_(Phospho (STY))AAKTR_").unwrap();
        assert_eq!(sequence.sites(), &[SiteMarker::Localized(3)]);
        assert_eq!(
            parse("(ph)GRKPR").unwrap_err().get_kind(),
            &AnnotationErrorKind::MalformedSequence
        );
        assert!(parse("(ph)(ph)GRSPR").is_err());
        assert!(parse("G{R(ph)S}PR").is_err());
    }

    #[test]
    fn unknown_modifications() {
        let sequence = parse("M(Unknown (M))PEP[+80]TIDE").unwrap();
        assert_eq!(sequence.bare(), "MPEPTIDE");
        assert!(sequence.sites().is_empty());
        assert!(parse("PEP(Unknown").is_err());
    }

    #[test]
    fn malformed() {
        let error = parse("GRST;SPR").unwrap_err();
        assert_eq!(error.get_kind(), &AnnotationErrorKind::MalformedSequence);
        assert!(parse("GRSTé").is_err());
        assert!(parse("GR1").is_err());
    }

    #[test]
    fn empty() {
        let sequence = parse("__").unwrap();
        assert!(sequence.is_empty());
        assert!(sequence.sites().is_empty());
    }

    #[test]
    fn all_potential_sites() {
        let sequence = parse("C(dbia)KS(ph)TPYR").unwrap().with_all_potential_sites();
        assert_eq!(
            sequence.localized_offsets(),
            vec![1, 2, 3, 5],
            "{:?}",
            sequence.sites()
        );
    }

    #[test]
    fn custom_vocabulary() {
        let mut vocabulary = ModificationVocabulary::empty();
        vocabulary.add_site_marker("S[Phospho]", b's');
        let sequence = ModifiedSequence::parse("AS[Phospho]K", &vocabulary).unwrap();
        assert_eq!(sequence.sites(), &[SiteMarker::Localized(1)]);
        // Without the vocabulary the tag is an unknown modification
        let sequence =
            ModifiedSequence::parse("AS[Phospho]K", &ModificationVocabulary::empty()).unwrap();
        assert!(sequence.sites().is_empty());
    }
}
