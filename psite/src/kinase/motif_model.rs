use context_error::*;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AnnotationError, AnnotationErrorKind},
    sequence::alphabet::PADDING,
};

/// The residue axis of every motif model, the 20 standard residues followed by the
/// phosphorylated serine, threonine, and tyrosine
pub const RESIDUE_AXIS: &[u8; 23] = b"ACDEFGHIKLMNPQRSTVWYsty";

const NOT_ON_AXIS: u8 = u8::MAX;

/// Lookup table from ASCII symbol to column in the motif matrix
const LOOKUP: [u8; 128] = {
    let mut table = [NOT_ON_AXIS; 128];
    let mut index = 0;
    while index < RESIDUE_AXIS.len() {
        table[RESIDUE_AXIS[index] as usize] = index as u8;
        index += 1;
    }
    table
};

fn column(symbol: u8) -> Option<usize> {
    LOOKUP
        .get(symbol as usize)
        .filter(|c| **c != NOT_ON_AXIS)
        .map(|c| *c as usize)
}

/// The outcome of scoring a single window against a motif model
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotifScore {
    /// The log2 odds score
    Score(f64),
    /// The window is shorter than the model
    InsufficientContext,
    /// The window is empty or only consists of padding
    Empty,
}

impl MotifScore {
    /// Get the score, if there is one
    pub const fn score(self) -> Option<f64> {
        match self {
            Self::Score(score) => Some(score),
            Self::InsufficientContext | Self::Empty => None,
        }
    }
}

/// The position specific log2 odds matrix for a single kinase. Rows are the positions from
/// `-half_width` to `half_width`, columns follow [`RESIDUE_AXIS`]. Residues that are missing from
/// the odds table have odds 1, so log2 odds 0.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct KinaseMotifModel {
    kinase: String,
    half_width: usize,
    log_odds: Array2<f64>,
    /// The least favourable log2 odds per position
    minimum: Vec<f64>,
    /// The most favourable log2 odds per position
    maximum: Vec<f64>,
}

impl KinaseMotifModel {
    /// Create a model from raw (not logarithmic) odds ratios, given as (position, residue, odds).
    /// The model width is set by the position furthest away from the site.
    /// # Errors
    /// If an odds ratio is not strictly positive, or if a residue is not on the [`RESIDUE_AXIS`].
    pub fn from_odds(
        kinase: impl Into<String>,
        odds: impl IntoIterator<Item = (isize, u8, f64)>,
    ) -> Result<Self, AnnotationError> {
        let kinase = kinase.into();
        let odds: Vec<(isize, u8, f64)> = odds.into_iter().collect();
        let half_width = odds
            .iter()
            .map(|(position, _, _)| position.unsigned_abs())
            .max()
            .unwrap_or_default();
        let mut log_odds = Array2::zeros((2 * half_width + 1, RESIDUE_AXIS.len()));
        for (position, residue, ratio) in odds {
            let Some(column) = column(residue) else {
                return Err(BoxedError::new(
                    AnnotationErrorKind::Parse,
                    "Invalid motif residue",
                    format!(
                        "The residue '{}' for kinase '{kinase}' is not one of {}",
                        residue as char,
                        String::from_utf8_lossy(RESIDUE_AXIS)
                    ),
                    Context::none(),
                ));
            };
            if ratio <= 0.0 || !ratio.is_finite() {
                return Err(BoxedError::new(
                    AnnotationErrorKind::Parse,
                    "Invalid odds ratio",
                    format!(
                        "The odds ratio {ratio} for kinase '{kinase}' at position {position} residue '{}' is not a positive number",
                        residue as char
                    ),
                    Context::none(),
                ));
            }
            log_odds[[position.wrapping_add_unsigned(half_width) as usize, column]] = ratio.log2();
        }
        let minimum = log_odds
            .rows()
            .into_iter()
            .map(|row| row.iter().copied().fold(f64::INFINITY, f64::min))
            .collect();
        let maximum = log_odds
            .rows()
            .into_iter()
            .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect();
        Ok(Self {
            kinase,
            half_width,
            log_odds,
            minimum,
            maximum,
        })
    }

    /// The kinase name
    pub fn kinase(&self) -> &str {
        &self.kinase
    }

    /// The number of positions covered, always odd
    pub const fn width(&self) -> usize {
        2 * self.half_width + 1
    }

    /// The log2 odds for the given position relative to the site and residue, 0 for residues that
    /// are not on the residue axis or positions outside of the model
    pub fn log_odds(&self, position: isize, residue: u8) -> f64 {
        let row = position.wrapping_add_unsigned(self.half_width);
        if row < 0 || row as usize >= self.width() {
            return 0.0;
        }
        column(residue).map_or(0.0, |column| self.log_odds[[row as usize, column]])
    }

    /// The lowest possible score for this model
    pub fn min_score(&self) -> f64 {
        self.sum_excluding_site(&self.minimum)
    }

    /// The highest possible score for this model
    pub fn max_score(&self) -> f64 {
        self.sum_excluding_site(&self.maximum)
    }

    fn sum_excluding_site(&self, values: &[f64]) -> f64 {
        values
            .iter()
            .enumerate()
            .filter(|(row, _)| *row != self.half_width)
            .map(|(_, v)| *v)
            .sum()
    }

    /// Score a sequence context window. Windows longer than the model are cropped around their
    /// centre, shorter windows are not scored. The site itself does not contribute to the score,
    /// nor does padding.
    pub fn score(&self, window: &str) -> MotifScore {
        let window = window.as_bytes();
        if window.iter().all(|s| *s == PADDING) {
            return MotifScore::Empty;
        }
        if window.len() < self.width() {
            return MotifScore::InsufficientContext;
        }
        let excess = (window.len() - self.width()) / 2;
        MotifScore::Score(
            window[excess..excess + self.width()]
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != self.half_width)
                .filter_map(|(index, symbol)| {
                    column(*symbol).map(|column| self.log_odds[[index, column]])
                })
                .sum(),
        )
    }
}
