use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    path::Path,
};

use itertools::Itertools;
use log::{debug, trace, warn};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use context_error::*;

use crate::{
    csv::{CsvLine, parse_csv},
    error::{AnnotationError, AnnotationErrorKind},
    helper_functions::round_to_string,
    kinase::{KinaseMotifModel, MotifScore, ScoreDistribution},
    sequence::alphabet::validate_context,
};

const RANGE_TOLERANCE: f64 = 1e-6;

/// The value of a kinase match that is used for thresholding or sorting
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Metric {
    /// The log2 odds score
    Score,
    /// The percentile rank of the score
    Percentile,
    /// The score times the percentile
    #[default]
    Total,
}

/// The order of the kinase matches for a site
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum SortOrder {
    /// Descending by a metric
    Descending(Metric),
    /// Ascending by kinase name
    Kinase,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Descending(Metric::Total)
    }
}

/// The options for reporting kinase matches
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct KinaseLibraryParameters {
    /// The metric a match has to exceed the cutoff on to be reported
    pub threshold_metric: Metric,
    /// Only matches strictly above this value are reported
    pub cutoff: f64,
    /// The order of the reported matches
    pub sort_by: SortOrder,
    /// Only report this many matches per row
    pub top_n: Option<usize>,
}

impl Default for KinaseLibraryParameters {
    fn default() -> Self {
        Self {
            threshold_metric: Metric::Score,
            cutoff: 0.0,
            sort_by: SortOrder::default(),
            top_n: None,
        }
    }
}

/// A kinase that matches a sequence context
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct KinaseMatch {
    /// The kinase name
    pub kinase: String,
    /// The log2 odds score
    pub score: f64,
    /// The percentile rank of the score in the score distribution of this kinase
    pub percentile: f64,
    /// The score times the percentile
    pub total: f64,
}

impl KinaseMatch {
    /// Get the value for the given metric
    pub const fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Score => self.score,
            Metric::Percentile => self.percentile,
            Metric::Total => self.total,
        }
    }

    fn cmp_by(&self, other: &Self, order: SortOrder) -> Ordering {
        match order {
            SortOrder::Descending(metric) => OrderedFloat(other.metric(metric))
                .cmp(&OrderedFloat(self.metric(metric)))
                .then_with(|| self.kinase.cmp(&other.kinase)),
            SortOrder::Kinase => self.kinase.cmp(&other.kinase),
        }
    }
}

/// All kinase matches for a single row, as the four index aligned `;` separated columns
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct MotifAnnotation {
    /// Motif Kinases
    pub kinases: String,
    /// Motif Scores
    pub scores: String,
    /// Motif Percentiles
    pub percentiles: String,
    /// Motif Totals
    pub totals: String,
}

impl From<&[KinaseMatch]> for MotifAnnotation {
    fn from(matches: &[KinaseMatch]) -> Self {
        Self {
            kinases: matches.iter().map(|m| &m.kinase).join(";"),
            scores: matches.iter().map(|m| round_to_string(m.score)).join(";"),
            percentiles: matches
                .iter()
                .map(|m| round_to_string(m.percentile))
                .join(";"),
            totals: matches.iter().map(|m| round_to_string(m.total)).join(";"),
        }
    }
}

/// All kinase motif models with their score distributions. Only kinases with both a model and a
/// distribution are part of the library, they are kept sorted by name.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct KinaseLibrary {
    kinases: Vec<(KinaseMotifModel, ScoreDistribution)>,
}

impl KinaseLibrary {
    /// Combine motif models with their distributions, models without a distribution are skipped
    /// with a warning
    pub fn new(
        models: impl IntoIterator<Item = KinaseMotifModel>,
        mut distributions: HashMap<String, ScoreDistribution>,
    ) -> Self {
        let mut kinases = Vec::new();
        for model in models {
            match distributions.remove(model.kinase()) {
                Some(distribution) if !distribution.is_empty() => {
                    if let Some((low, high)) = distribution.range()
                        && (low < model.min_score() - RANGE_TOLERANCE
                            || high > model.max_score() + RANGE_TOLERANCE)
                    {
                        warn!(
                            "The score distribution of kinase '{}' ({low} to {high}) falls outside the scores its motif can reach ({} to {})",
                            model.kinase(),
                            model.min_score(),
                            model.max_score()
                        );
                    }
                    kinases.push((model, distribution));
                }
                _ => warn!(
                    "Kinase '{}' has no score distribution and will not be scored",
                    model.kinase()
                ),
            }
        }
        kinases.sort_by(|a, b| a.0.kinase().cmp(b.0.kinase()));
        Self { kinases }
    }

    /// Load the library from an odds ratio table (tab separated, columns `Kinase`, `Position`,
    /// `AA`, and `Odds Ratio`) and a score distribution table (tab separated, columns `Kinase`
    /// and `Score`).
    /// # Errors
    /// If any of the files could not be read or contains invalid data.
    pub fn load(
        motifs: impl AsRef<Path>,
        distributions: impl AsRef<Path>,
    ) -> Result<Self, AnnotationError> {
        let models = read_motif_models(parse_csv(motifs, b'\t', None)?)?;
        let distributions = read_distributions(parse_csv(distributions, b'\t', None)?)?;
        let library = Self::new(models, distributions);
        trace!("Loaded kinase library with {} kinases", library.len());
        Ok(library)
    }

    /// The number of kinases
    pub fn len(&self) -> usize {
        self.kinases.len()
    }

    /// Check if there are no kinases
    pub fn is_empty(&self) -> bool {
        self.kinases.is_empty()
    }

    /// Get the model and distribution for a kinase
    pub fn get(&self, kinase: &str) -> Option<(&KinaseMotifModel, &ScoreDistribution)> {
        self.kinases
            .binary_search_by(|(model, _)| model.kinase().cmp(kinase))
            .ok()
            .map(|index| (&self.kinases[index].0, &self.kinases[index].1))
    }

    /// Score a single window against all kinases and keep the matches above the threshold, in
    /// kinase order
    /// # Errors
    /// If the window contains a character that is not an amino acid, modified amino acid, or padding.
    pub fn score_window(
        &self,
        window: &str,
        parameters: &KinaseLibraryParameters,
    ) -> Result<Vec<KinaseMatch>, AnnotationError> {
        validate_context(window)?;
        let mut matches = Vec::new();
        for (model, distribution) in &self.kinases {
            match model.score(window) {
                MotifScore::Score(score) => {
                    let (percentile, total) = distribution.rank(score);
                    let found = KinaseMatch {
                        kinase: model.kinase().to_string(),
                        score,
                        percentile,
                        total,
                    };
                    if found.metric(parameters.threshold_metric) > parameters.cutoff {
                        matches.push(found);
                    }
                }
                MotifScore::InsufficientContext => {
                    debug!(
                        "Window '{window}' is too short for kinase '{}' which needs {} residues",
                        model.kinase(),
                        model.width()
                    );
                }
                MotifScore::Empty => return Ok(Vec::new()),
            }
        }
        Ok(matches)
    }

    /// Score all windows of a row. For every kinase the best match over all windows is kept, the
    /// matches are then sorted and the top N are reported.
    /// # Errors
    /// If any window contains a character that is not an amino acid, modified amino acid, or padding.
    pub fn score_windows<'a>(
        &self,
        windows: impl IntoIterator<Item = &'a str>,
        parameters: &KinaseLibraryParameters,
    ) -> Result<Vec<KinaseMatch>, AnnotationError> {
        let metric = match parameters.sort_by {
            SortOrder::Descending(metric) => metric,
            SortOrder::Kinase => Metric::Total,
        };
        let mut best: BTreeMap<String, KinaseMatch> = BTreeMap::new();
        for window in windows {
            for found in self.score_window(window, parameters)? {
                match best.get_mut(&found.kinase) {
                    Some(existing) if existing.metric(metric) >= found.metric(metric) => (),
                    Some(existing) => *existing = found,
                    None => {
                        best.insert(found.kinase.clone(), found);
                    }
                }
            }
        }
        let mut matches = best.into_values().collect_vec();
        matches.sort_by(|a, b| a.cmp_by(b, parameters.sort_by));
        if let Some(top_n) = parameters.top_n {
            matches.truncate(top_n);
        }
        Ok(matches)
    }

    /// Score the `;` separated sequence context column of a row, localization groups (`|`) are
    /// scored as separate windows. An empty column gives no matches.
    /// # Errors
    /// If any window contains a character that is not an amino acid, modified amino acid, or padding.
    pub fn score_contexts(
        &self,
        contexts: &str,
        parameters: &KinaseLibraryParameters,
    ) -> Result<MotifAnnotation, AnnotationError> {
        let windows = contexts
            .split([';', '|'])
            .map(str::trim)
            .filter(|w| !w.is_empty());
        self.score_windows(windows, parameters)
            .map(|matches| MotifAnnotation::from(matches.as_slice()))
    }
}

/// Read motif models from the lines of an odds ratio table
/// # Errors
/// If any line could not be read or contains invalid data.
pub fn read_motif_models(
    lines: impl Iterator<Item = Result<CsvLine, AnnotationError>>,
) -> Result<Vec<KinaseMotifModel>, AnnotationError> {
    let mut odds: BTreeMap<String, Vec<(isize, u8, f64)>> = BTreeMap::new();
    for line in lines {
        let line = line?;
        let kinase = line.index_column("kinase")?.to_string();
        let position = line.parse_column::<isize>("position")?;
        let residue = line.index_column("aa")?;
        let [residue] = residue.as_bytes() else {
            return Err(BoxedError::new(
                AnnotationErrorKind::Parse,
                "Invalid motif residue",
                "The residue should be a single one letter code",
                line.column_context(line.column_index("aa")?).to_owned(),
            ));
        };
        let ratio = line.parse_column::<f64>("odds ratio")?;
        odds.entry(kinase)
            .or_default()
            .push((position, *residue, ratio));
    }
    odds.into_iter()
        .map(|(kinase, odds)| KinaseMotifModel::from_odds(kinase, odds))
        .collect()
}

/// Read score distributions from the lines of a distribution table
/// # Errors
/// If any line could not be read or contains invalid data.
pub fn read_distributions(
    lines: impl Iterator<Item = Result<CsvLine, AnnotationError>>,
) -> Result<HashMap<String, ScoreDistribution>, AnnotationError> {
    let mut samples: HashMap<String, Vec<f64>> = HashMap::new();
    for line in lines {
        let line = line?;
        let kinase = line.index_column("kinase")?.to_string();
        let score = line.parse_column::<f64>("score")?;
        samples.entry(kinase).or_default().push(score);
    }
    Ok(samples
        .into_iter()
        .map(|(kinase, sample)| (kinase, ScoreDistribution::new(sample)))
        .collect())
}
