use std::path::Path;

/// Helper function to check extensions in filenames
pub(crate) fn check_extension(filename: impl AsRef<Path>, extension: impl AsRef<Path>) -> bool {
    filename
        .as_ref()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension.as_ref()))
}

/// Find the enclosed text by the given symbols, assumes a single open is already read just before the start, guarantees to only pick full characters
pub(crate) fn end_of_enclosure(text: &str, start: usize, open: u8, close: u8) -> Option<usize> {
    let mut state = 1;
    for (i, ch) in text.as_bytes()[start..].iter().enumerate() {
        // Check if this byte is a full character (is_char_boundary also works on index==len)
        if text.is_char_boundary(start + i) && text.is_char_boundary(start + i + 1) {
            if *ch == open {
                state += 1;
            } else if *ch == close {
                state -= 1;
                if state == 0 {
                    return Some(start + i);
                }
            }
        }
    }
    None
}

/// Render a value rounded to three decimals, as used in all semicolon separated score columns
pub(crate) fn round_to_string(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        // Prevent `-0` from showing up
        "0".to_string()
    } else {
        rounded.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosure() {
        assert_eq!(end_of_enclosure("S(Phospho (STY))T", 2, b'(', b')'), Some(15));
        assert_eq!(end_of_enclosure("S(ph", 2, b'(', b')'), None);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to_string(0.5154), "0.515");
        assert_eq!(round_to_string(-2.8476), "-2.848");
        assert_eq!(round_to_string(-0.0001), "0");
        assert_eq!(round_to_string(100.0), "100");
    }

    #[test]
    fn extensions() {
        assert!(check_extension("proteins.fasta.gz", "gz"));
        assert!(check_extension("PROTEINS.FASTA.GZ", "gz"));
        assert!(!check_extension("proteins.fasta", "gz"));
    }
}
