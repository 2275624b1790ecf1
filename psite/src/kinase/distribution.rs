use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// The empirical score distribution of a single kinase, a sorted reference sample of scores
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ScoreDistribution {
    sample: Vec<OrderedFloat<f64>>,
}

impl ScoreDistribution {
    /// Create a distribution from a reference sample, NaN values are dropped
    pub fn new(sample: impl IntoIterator<Item = f64>) -> Self {
        let mut sample: Vec<OrderedFloat<f64>> = sample
            .into_iter()
            .filter(|s| !s.is_nan())
            .map(OrderedFloat)
            .collect();
        sample.sort_unstable();
        Self { sample }
    }

    /// The number of values in the reference sample
    pub fn len(&self) -> usize {
        self.sample.len()
    }

    /// Check if the reference sample is empty
    pub fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }

    /// The lowest and highest score in the reference sample
    pub fn range(&self) -> Option<(f64, f64)> {
        self.sample.first().zip(self.sample.last()).map(|(a, b)| (a.0, b.0))
    }

    /// The percentile rank (0 to 100) of the given score. This is the share of the reference
    /// sample strictly below the score, except that anything at or above the sample maximum has
    /// rank 100. An empty distribution gives 0.
    pub fn percentile(&self, score: f64) -> f64 {
        let (Some(first), Some(last)) = (self.sample.first(), self.sample.last()) else {
            return 0.0;
        };
        let score = OrderedFloat(score);
        if score >= *last {
            return 100.0;
        }
        if score <= *first {
            return 0.0;
        }
        let below = self.sample.partition_point(|s| *s < score);
        below as f64 / self.sample.len() as f64 * 100.0
    }

    /// The percentile rank and the total (`score * percentile`)
    pub fn rank(&self, score: f64) -> (f64, f64) {
        let percentile = self.percentile(score);
        (percentile, score * percentile)
    }
}

impl FromIterator<f64> for ScoreDistribution {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        let distribution: ScoreDistribution = [3.0, 1.0, 2.0, 4.0, 5.0].into_iter().collect();
        assert_eq!(distribution.percentile(1.0), 0.0);
        assert_eq!(distribution.percentile(-10.0), 0.0);
        assert_eq!(distribution.percentile(5.0), 100.0);
        assert_eq!(distribution.percentile(50.0), 100.0);
        assert_eq!(distribution.percentile(3.0), 40.0);
        assert_eq!(distribution.percentile(3.5), 60.0);
        assert_eq!(distribution.percentile(4.5), 80.0);
        assert_eq!(distribution.range(), Some((1.0, 5.0)));
    }

    #[test]
    fn duplicates() {
        let distribution = ScoreDistribution::new([1.0, 1.0, 1.0, 5.0]);
        assert_eq!(distribution.percentile(1.0), 0.0);
        assert_eq!(distribution.percentile(3.0), 75.0);
        assert_eq!(distribution.percentile(5.0), 100.0);
    }

    #[test]
    fn single_value() {
        let distribution = ScoreDistribution::new([2.0]);
        assert_eq!(distribution.percentile(2.0), 100.0);
        assert_eq!(distribution.percentile(1.9), 0.0);
    }

    #[test]
    fn empty() {
        let distribution = ScoreDistribution::new([f64::NAN]);
        assert!(distribution.is_empty());
        assert_eq!(distribution.range(), None);
        assert_eq!(distribution.percentile(1.0), 0.0);
    }

    #[test]
    fn totals() {
        let distribution = ScoreDistribution::new([0.0, 1.0, 2.0]);
        let percentile = 2.0 / 3.0 * 100.0;
        assert_eq!(distribution.rank(1.5), (percentile, 1.5 * percentile));
        assert_eq!(distribution.rank(-1.0), (0.0, -0.0));
    }
}
