//! Histogram-based outlier score
//!
//! Treats the features as independent: each one gets an equal-width, density-normalised
//! histogram, and a row's score is the sum over features of `-ln(density + alpha)` of the bin it
//! falls into. Rows living in sparse bins of several features score highest.

use crate::config::Config;
use crate::detect::{Detector, Detectors};
use crate::error::Result;
use crate::matrix::{FeatureMatrix, Flags};
use crate::stats::univariate::{flag_top_fraction, Sample};

#[derive(Debug, Clone)]
pub struct Hbos {
    bins: usize,
    alpha: f64,
    contamination: f64,
}

impl Hbos {
    pub fn new(config: &Config) -> Hbos {
        Hbos {
            bins: config.hbos_bins,
            alpha: config.hbos_alpha,
            contamination: config.contamination,
        }
    }

    /// Outlier score of every row; higher is more anomalous
    pub fn scores(&self, features: &FeatureMatrix) -> Vec<f64> {
        let n = features.nrows();
        let mut scores = vec![0.0; n];
        if n == 0 {
            return scores;
        }

        for j in 0..features.ncols() {
            let column = features.column(j);
            let histogram = Histogram::new(Sample::new(&column), self.bins);

            for (score, &x) in scores.iter_mut().zip(&column) {
                *score -= (histogram.density(x) + self.alpha).ln();
            }
        }

        scores
    }
}

impl Detector for Hbos {
    fn name(&self) -> &'static str {
        Detectors::HISTOGRAM
    }

    fn detect(&self, features: &FeatureMatrix) -> Result<Flags> {
        let scores = self.scores(features);

        Ok(flag_top_fraction(&scores, self.contamination).into())
    }
}

/// Equal-width histogram normalised so that it integrates to 1
struct Histogram {
    low: f64,
    width: f64,
    densities: Vec<f64>,
}

impl Histogram {
    fn new(sample: &Sample, bins: usize) -> Histogram {
        let (mut low, mut high) = (sample.min(), sample.max());
        // A constant feature gets a unit-wide range centred on its value
        if low == high {
            low -= 0.5;
            high += 0.5;
        }

        let width = (high - low) / bins as f64;
        let mut counts = vec![0usize; bins];
        for &x in sample.iter() {
            counts[bin(x, low, width, bins)] += 1;
        }

        let total = sample.len() as f64 * width;
        Histogram {
            low,
            width,
            densities: counts.into_iter().map(|c| c as f64 / total).collect(),
        }
    }

    fn density(&self, x: f64) -> f64 {
        self.densities[bin(x, self.low, self.width, self.densities.len())]
    }
}

/// Bin holding `x`; the upper edge belongs to the last bin
fn bin(x: f64, low: f64, width: f64, bins: usize) -> usize {
    let i = ((x - low) / width).floor();
    if i <= 0.0 {
        0
    } else {
        (i as usize).min(bins - 1)
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn histogram_integrates_to_one() {
        let xs: Vec<f64> = (0..37).map(|i| f64::from(i).sqrt()).collect();
        let h = Histogram::new(Sample::new(&xs), 10);

        assert_relative_eq!(h.densities.iter().sum::<f64>() * h.width, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn edges_fall_into_the_outer_bins() {
        assert_eq!(bin(0.0, 0.0, 0.1, 10), 0);
        assert_eq!(bin(1.0, 0.0, 0.1, 10), 9);
        assert_eq!(bin(0.55, 0.0, 0.1, 10), 5);
    }

    #[test]
    fn sparse_rows_score_highest() {
        let mut xs: Vec<f64> = (0..60).map(|i| f64::from(i % 10) * 0.01).collect();
        let mut ys: Vec<f64> = (0..60).map(|i| f64::from(i % 6) * 0.01).collect();
        xs.push(5.0);
        ys.push(-5.0);

        let m = FeatureMatrix::from_columns(&[xs, ys]);
        let hbos = Hbos::new(&Config::default());
        let scores = hbos.scores(&m);
        let inlier_max = scores[..60].iter().cloned().fold(std::f64::MIN, f64::max);

        assert!(scores[60] > inlier_max);
        assert!(hbos.detect(&m).unwrap()[60]);
    }

    #[test]
    fn constant_features_flag_nothing() {
        let m = FeatureMatrix::from_columns(&[vec![4.0; 25]]);
        assert_eq!(Hbos::new(&Config::default()).detect(&m).unwrap().count(), 0);
    }
}
