//! DBSCAN noise points
//!
//! Density-based clustering: a *core* point has at least `min_samples` points (itself included)
//! within `eps`; clusters grow from core points through their neighbourhoods. Points that end up
//! in no cluster are noise, and noise is what this detector flags.

use std::collections::VecDeque;

use crate::config::Config;
use crate::detect::Detector;
use crate::error::Result;
use crate::matrix::{squared_distance, FeatureMatrix, Flags};

#[derive(Debug, Clone)]
pub struct Dbscan {
    eps: f64,
    min_samples: usize,
}

impl Dbscan {
    pub fn new(config: &Config) -> Dbscan {
        Dbscan {
            eps: config.dbscan_eps,
            min_samples: config.dbscan_min_samples,
        }
    }

    /// Cluster label of every row, `None` for noise
    pub fn labels(&self, features: &FeatureMatrix) -> Vec<Option<usize>> {
        let n = features.nrows();
        let eps2 = self.eps * self.eps;

        let neighborhoods: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                let row = features.row(i);
                (0..n)
                    .filter(|&j| squared_distance(row, features.row(j)) <= eps2)
                    .collect()
            })
            .collect();
        let is_core: Vec<bool> = neighborhoods
            .iter()
            .map(|neighbors| neighbors.len() >= self.min_samples)
            .collect();

        let mut labels = vec![None; n];
        let mut next_label = 0;
        for seed in 0..n {
            if !is_core[seed] || labels[seed].is_some() {
                continue;
            }

            let label = next_label;
            next_label += 1;
            labels[seed] = Some(label);

            let mut queue: VecDeque<usize> = VecDeque::new();
            queue.push_back(seed);
            while let Some(i) = queue.pop_front() {
                for &j in &neighborhoods[i] {
                    if labels[j].is_some() {
                        continue;
                    }
                    labels[j] = Some(label);
                    // Border points join the cluster but don't extend it
                    if is_core[j] {
                        queue.push_back(j);
                    }
                }
            }
        }

        debug!("DBSCAN found {} clusters", next_label);
        labels
    }
}

impl Detector for Dbscan {
    fn name(&self) -> &'static str {
        "DBSCAN"
    }

    fn detect(&self, features: &FeatureMatrix) -> Result<Flags> {
        Ok(self
            .labels(features)
            .into_iter()
            .map(|label| label.is_none())
            .collect::<Vec<_>>()
            .into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn two_blobs_and_a_stray() -> FeatureMatrix {
        let mut xs = vec![];
        let mut ys = vec![];
        for &(cx, cy) in &[(0.0, 0.0), (10.0, 10.0)] {
            for k in 0..6 {
                xs.push(cx + 0.1 * f64::from(k));
                ys.push(cy);
            }
        }
        xs.push(5.0);
        ys.push(5.0);

        FeatureMatrix::from_columns(&[xs, ys])
    }

    #[test]
    fn finds_the_clusters() {
        let labels = Dbscan::new(&Config::default()).labels(&two_blobs_and_a_stray());

        assert!(labels[..6].iter().all(|&l| l == Some(0)));
        assert!(labels[6..12].iter().all(|&l| l == Some(1)));
        assert_eq!(labels[12], None);
    }

    #[test]
    fn flags_only_noise() {
        let flags = Dbscan::new(&Config::default())
            .detect(&two_blobs_and_a_stray())
            .unwrap();

        assert_eq!(flags.count(), 1);
        assert!(flags[12]);
    }

    #[test]
    fn border_points_are_not_noise() {
        // The last point has too few neighbours to be a core point itself
        let m = FeatureMatrix::from_columns(&[vec![0.0, 0.1, 0.2, -0.1, -0.2, 0.45]]);
        let labels = Dbscan::new(&Config::default()).labels(&m);

        assert_eq!(labels[5], Some(0));
    }

    #[test]
    fn sparse_data_is_all_noise() {
        let m = FeatureMatrix::from_columns(&[vec![0.0, 1.0, 2.0, 3.0]]);
        let flags = Dbscan::new(&Config::default()).detect(&m).unwrap();

        assert_eq!(flags.count(), 4);
    }
}
