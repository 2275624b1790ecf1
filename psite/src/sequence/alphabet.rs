//! The amino acid alphabet shared by peptides, proteins, and sequence context windows.

use context_error::*;

use crate::error::{AnnotationError, AnnotationErrorKind};

/// The one letter codes of the 20 standard amino acids
pub const STANDARD_RESIDUES: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";
/// The ambiguity and non standard codes that are accepted in protein sequences
pub const AMBIGUITY_CODES: &[u8; 6] = b"BJOUXZ";
/// The residues that can carry a site marker, written in lower case when modified
pub const MODIFIABLE_RESIDUES: &[u8; 5] = b"CKSTY";
/// The symbol used for positions outside of the protein sequence
pub const PADDING: u8 = b'_';

const fn contains(set: &[u8], symbol: u8) -> bool {
    let mut index = 0;
    while index < set.len() {
        if set[index] == symbol {
            return true;
        }
        index += 1;
    }
    false
}

/// Check if this is an (upper case) amino acid one letter code
pub const fn is_residue(symbol: u8) -> bool {
    contains(STANDARD_RESIDUES, symbol) || contains(AMBIGUITY_CODES, symbol)
}

/// Check if this is a lower case modified residue (`c`, `k`, `s`, `t`, or `y`)
pub const fn is_modified_residue(symbol: u8) -> bool {
    symbol.is_ascii_lowercase() && contains(MODIFIABLE_RESIDUES, symbol.to_ascii_uppercase())
}

/// Check if this symbol is allowed in a sequence context window: any residue, a lower case
/// modified residue, or padding.
pub const fn is_context_symbol(symbol: u8) -> bool {
    symbol == PADDING || is_residue(symbol) || is_modified_residue(symbol)
}

/// Validate a full context window. The error points at the first offending character.
/// # Errors
/// If any character is not a valid context symbol.
pub fn validate_context(window: &str) -> Result<(), AnnotationError> {
    window
        .bytes()
        .position(|symbol| !is_context_symbol(symbol))
        .map_or(Ok(()), |index| {
            let length = window[index..].chars().next().map_or(1, char::len_utf8);
            Err(BoxedError::new(
                AnnotationErrorKind::MalformedSequence,
                "Invalid sequence context",
                "This character is not an amino acid, a modified amino acid, or padding",
                Context::line(None, window, index, length).to_owned(),
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residues() {
        for symbol in STANDARD_RESIDUES.iter().chain(AMBIGUITY_CODES) {
            assert!(is_residue(*symbol), "{}", *symbol as char);
        }
        assert!(is_residue(b'A'));
        assert!(!is_residue(b'a'));
        assert!(!is_residue(b'_'));
        assert!(!is_residue(b';'));
    }

    #[test]
    fn modified_residues() {
        for symbol in MODIFIABLE_RESIDUES {
            assert!(is_modified_residue(symbol.to_ascii_lowercase()));
            assert!(!is_modified_residue(*symbol));
        }
        assert!(!is_modified_residue(b'm'));
        assert!(!is_modified_residue(b'_'));
    }

    #[test]
    fn context_symbols() {
        assert!(validate_context("___MAsTyK").is_ok());
        assert!(validate_context("").is_ok());
        assert!(validate_context("AAA;AAA").is_err());
        assert!(validate_context("AAmAA").is_err());
        assert!(validate_context("AAé").is_err());
    }
}
