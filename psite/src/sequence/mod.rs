//! Handling protein sequences, peptides with inline modification markers, and the amino acid alphabet

pub mod alphabet;
mod modified_sequence;
mod sequence_index;

pub use modified_sequence::*;
pub use sequence_index::*;
