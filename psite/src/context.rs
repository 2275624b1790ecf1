//! Extracting fixed width sequence context windows around modification sites

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use context_error::*;

use crate::{
    error::{AnnotationError, AnnotationErrorKind},
    position::{SitePosition, SiteResolution},
    sequence::alphabet::{PADDING, is_residue},
};

/// The options for extracting sequence context windows
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct ContextParameters {
    /// The number of residues before the site
    pub context_left: usize,
    /// The number of residues after the site
    pub context_right: usize,
    /// Write the site itself in lower case
    pub lowercase_site: bool,
    /// Write other localized sites from the same peptide occurrence in lower case
    pub retain_other_mods: bool,
    /// Only keep the first of identical windows in the joined column
    pub unique: bool,
    /// Sort the windows in the joined column
    pub sorted: bool,
}

impl Default for ContextParameters {
    fn default() -> Self {
        Self::with_half_window(15)
    }
}

impl ContextParameters {
    /// Symmetric windows of `2 * half_window + 1` residues, without any other options
    pub const fn with_half_window(half_window: usize) -> Self {
        Self {
            context_left: half_window,
            context_right: half_window,
            lowercase_site: false,
            retain_other_mods: false,
            unique: false,
            sorted: false,
        }
    }

    /// The width of every window
    pub const fn width(&self) -> usize {
        self.context_left + self.context_right + 1
    }
}

/// Extract the window around the given site (1 based). Positions outside of the protein are
/// filled with `_`, so the window always has the full width. Other modified positions (1 based)
/// that fall in the window are written in lower case.
/// # Errors
/// If the site is outside of the protein, or if the window contains a character that is not an
/// amino acid.
pub fn extract_context(
    protein: &str,
    sequence: &str,
    site: usize,
    modified: &[usize],
    parameters: &ContextParameters,
) -> Result<String, AnnotationError> {
    let bytes = sequence.as_bytes();
    if site == 0 || site > bytes.len() {
        return Err(BoxedError::new(
            AnnotationErrorKind::InvalidSitePosition,
            "Invalid site position",
            format!(
                "Site {site} does not fall within protein '{protein}' of length {}",
                bytes.len()
            ),
            Context::none(),
        ));
    }
    let first = site as isize - parameters.context_left as isize;
    let mut window = String::with_capacity(parameters.width());
    for position in first..=(site + parameters.context_right) as isize {
        if position < 1 || position as usize > bytes.len() {
            window.push(PADDING as char);
            continue;
        }
        let position = position as usize;
        let residue = bytes[position - 1];
        if !is_residue(residue) {
            let offset = window.len();
            let shown = String::from_utf8_lossy(
                &bytes[position - 1..(position - 1 + parameters.context_right + 1).min(bytes.len())],
            );
            let length = shown.chars().next().map_or(1, char::len_utf8);
            return Err(BoxedError::new(
                AnnotationErrorKind::MalformedSequence,
                "Invalid protein sequence",
                format!(
                    "The character at position {position} in protein '{protein}' is not an amino acid"
                ),
                Context::line(None, format!("{window}{shown}"), offset, length).to_owned(),
            ));
        }
        if (position == site && parameters.lowercase_site)
            || (position != site && parameters.retain_other_mods && modified.contains(&position))
        {
            window.push(residue.to_ascii_lowercase() as char);
        } else {
            window.push(residue as char);
        }
    }
    Ok(window)
}

/// Extract the window for a site of a peptide occurrence. A localization group gives one window
/// per candidate residue, joined by `|`. With `retain_other_mods` the other localized sites of the
/// same occurrence are written in lower case.
/// # Errors
/// If any window could not be extracted, see [`extract_context`].
pub fn site_context(
    resolution: &SiteResolution,
    site: &SitePosition,
    sequence: &str,
    parameters: &ContextParameters,
) -> Result<String, AnnotationError> {
    let modified: Vec<usize> = resolution
        .sites()
        .iter()
        .filter(|site| site.is_localized())
        .flat_map(|site| site.candidates.iter().map(|c| c.position))
        .collect();
    site.candidates
        .iter()
        .map(|candidate| {
            extract_context(
                resolution.protein(),
                sequence,
                candidate.position,
                &modified,
                parameters,
            )
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|windows| windows.join("|"))
}

/// Extract the windows for all sites of a single peptide occurrence, see [`site_context`]. A
/// peptide that was not found gives no windows.
/// # Errors
/// If any window could not be extracted, see [`extract_context`].
pub fn occurrence_contexts(
    resolution: &SiteResolution,
    sequence: &str,
    parameters: &ContextParameters,
) -> Result<Vec<String>, AnnotationError> {
    resolution
        .sites()
        .iter()
        .map(|site| site_context(resolution, site, sequence, parameters))
        .collect()
}

/// Join windows into a single `;` separated column value, applying the `unique` and `sorted`
/// options
pub fn join_contexts(contexts: Vec<String>, parameters: &ContextParameters) -> String {
    let mut contexts = if parameters.unique {
        contexts.into_iter().unique().collect_vec()
    } else {
        contexts
    };
    if parameters.sorted {
        contexts.sort();
    }
    contexts.join(";")
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::position::Site;

    const PROTEIN: &str = "MAGRSTSPRLLKAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAPEPTIDE";

    #[test]
    fn interior() {
        let parameters = ContextParameters::default();
        let window = extract_context("P1", PROTEIN, 20, &[], &parameters).unwrap();
        assert_eq!(window.len(), 31);
        assert_eq!(window, PROTEIN[4..35]);
    }

    #[test]
    fn padding() {
        let parameters = ContextParameters::with_half_window(3);
        assert_eq!(
            extract_context("P1", "MAGRSTSPRL", 3, &[], &parameters).unwrap(),
            "_MAGRST"
        );
        assert_eq!(
            extract_context("P1", "MAGRSTSPRL", 2, &[], &parameters).unwrap(),
            "__MAGRS"
        );
        assert_eq!(
            extract_context("P1", "MAGRSTSPRL", 10, &[], &parameters).unwrap(),
            "SPRL___"
        );
        assert_eq!(
            extract_context("P1", "MK", 1, &[], &parameters).unwrap(),
            "___MK__"
        );
    }

    #[test]
    fn asymmetric() {
        let parameters = ContextParameters {
            context_left: 1,
            context_right: 4,
            lowercase_site: true,
            ..ContextParameters::default()
        };
        assert_eq!(
            extract_context("P1", "MAGRSTSPRL", 6, &[], &parameters).unwrap(),
            "StSPRL"
        );
    }

    #[test]
    fn invalid() {
        let parameters = ContextParameters::with_half_window(3);
        let error = extract_context("P1", "MAGR1TSPRL", 3, &[], &parameters).unwrap_err();
        assert_eq!(error.get_kind(), &AnnotationErrorKind::MalformedSequence);
        // Outside of the window the sequence is not checked
        assert!(extract_context("P1", "MAGR1TSPRL", 9, &[], &parameters).is_ok());
        let error = extract_context("P1", "MAGRSTSPRL", 11, &[], &parameters).unwrap_err();
        assert_eq!(error.get_kind(), &AnnotationErrorKind::InvalidSitePosition);
        assert!(extract_context("P1", "MAGRSTSPRL", 0, &[], &parameters).is_err());
    }

    #[test]
    fn invalid_multibyte() {
        let parameters = ContextParameters::with_half_window(3);
        let error = extract_context("P1", "MAGR\u{FFFD}TSPRL", 3, &[], &parameters).unwrap_err();
        assert_eq!(error.get_kind(), &AnnotationErrorKind::MalformedSequence);
        assert!(error.to_string().contains("MAGR\u{FFFD}"));
        // A window starting halfway through a multibyte character
        let error = extract_context("P1", "M\u{FFFD}GRSTSPRL", 6, &[], &parameters).unwrap_err();
        assert_eq!(error.get_kind(), &AnnotationErrorKind::MalformedSequence);
        assert!(error.to_string().contains('\u{FFFD}'));
    }

    #[test]
    fn occurrence() {
        let site = |position: usize, residue: char| Site { residue, position };
        let resolution = SiteResolution::Found {
            protein: "P1".to_string(),
            start: 3,
            end: 9,
            sites: vec![
                SitePosition {
                    protein: "P1".to_string(),
                    candidates: vec![site(6, 'T')],
                },
                SitePosition {
                    protein: "P1".to_string(),
                    candidates: vec![site(5, 'S'), site(7, 'S')],
                },
            ],
        };
        let parameters = ContextParameters {
            retain_other_mods: true,
            ..ContextParameters::with_half_window(2)
        };
        let contexts = occurrence_contexts(&resolution, "MAGRSTSPRLLK", &parameters).unwrap();
        assert_eq!(contexts, vec!["RSTSP", "GRStS|StSPR"]);
    }

    #[test]
    fn joining() {
        let contexts = vec!["B".to_string(), "A".to_string(), "B".to_string()];
        assert_eq!(
            join_contexts(contexts.clone(), &ContextParameters::default()),
            "B;A;B"
        );
        let parameters = ContextParameters {
            unique: true,
            sorted: true,
            ..ContextParameters::default()
        };
        assert_eq!(join_contexts(contexts, &parameters), "A;B");
    }
}
