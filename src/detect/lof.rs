//! Local outlier factor
//!
//! Compares the local density of each point with the densities of its `k` nearest neighbours:
//!
//! ``` ignore
//! reach_dist(a, b) = max(k_distance(b), dist(a, b))
//! lrd(a) = 1 / mean(reach_dist(a, b) for b in knn(a))
//! lof(a) = mean(lrd(b) for b in knn(a)) / lrd(a)
//! ```
//!
//! A factor around 1 means "as dense as the neighbourhood"; outliers sit in much sparser
//! regions than their neighbours and get factors well above 1.

use crate::config::Config;
use crate::detect::Detector;
use crate::error::{Error, Result};
use crate::matrix::{squared_distance, FeatureMatrix, Flags};
use crate::stats::univariate::flag_top_fraction;

// Keeps the density finite when more than `k` points are duplicates
const DENSITY_EPSILON: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct LocalOutlierFactor {
    n_neighbors: usize,
    contamination: f64,
}

impl LocalOutlierFactor {
    const NAME: &'static str = "local outlier factor";

    pub fn new(config: &Config) -> LocalOutlierFactor {
        LocalOutlierFactor {
            n_neighbors: config.lof_neighbors,
            contamination: config.contamination,
        }
    }

    /// Local outlier factor of every row
    pub fn factors(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        let n = features.nrows();
        if n < 2 {
            return Err(Error::InsufficientData {
                detector: LocalOutlierFactor::NAME,
                required: 2,
                got: n,
            });
        }

        let k = if self.n_neighbors >= n {
            warn!(
                "{} neighbours requested but only {} rows available; using {}",
                self.n_neighbors,
                n,
                n - 1
            );
            n - 1
        } else {
            self.n_neighbors
        };

        let neighborhoods: Vec<Vec<(usize, f64)>> = (0..n)
            .map(|i| nearest_neighbors(features, i, k))
            .collect();
        let k_distance: Vec<f64> = neighborhoods
            .iter()
            .map(|neighbors| neighbors[k - 1].1)
            .collect();

        let lrd: Vec<f64> = neighborhoods
            .iter()
            .map(|neighbors| {
                let reach = neighbors
                    .iter()
                    .map(|&(j, d)| k_distance[j].max(d))
                    .sum::<f64>()
                    / k as f64;
                1.0 / (reach + DENSITY_EPSILON)
            })
            .collect();

        Ok(neighborhoods
            .iter()
            .zip(&lrd)
            .map(|(neighbors, &own)| {
                let mean = neighbors.iter().map(|&(j, _)| lrd[j]).sum::<f64>() / k as f64;
                mean / own
            })
            .collect())
    }
}

impl Detector for LocalOutlierFactor {
    fn name(&self) -> &'static str {
        LocalOutlierFactor::NAME
    }

    fn detect(&self, features: &FeatureMatrix) -> Result<Flags> {
        let factors = self.factors(features)?;

        Ok(flag_top_fraction(&factors, self.contamination).into())
    }
}

/// The `k` rows closest to row `i` (excluding `i` itself), nearest first, with their distances
fn nearest_neighbors(features: &FeatureMatrix, i: usize, k: usize) -> Vec<(usize, f64)> {
    let row = features.row(i);
    let mut others: Vec<(usize, f64)> = (0..features.nrows())
        .filter(|&j| j != i)
        .map(|j| (j, squared_distance(row, features.row(j))))
        .collect();

    others.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    others.truncate(k);
    others.iter_mut().for_each(|(_, d)| *d = d.sqrt());
    others
}
