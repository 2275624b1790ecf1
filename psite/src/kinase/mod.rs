//! Scoring sequence context windows against kinase recognition motifs

mod distribution;
mod library;
mod motif_model;

pub use distribution::*;
pub use library::*;
pub use motif_model::*;
