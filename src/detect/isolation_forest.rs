//! Isolation forest
//!
//! Outliers are few and different, so random axis-aligned splits isolate them in fewer steps
//! than normal points. Each tree is grown on a random subsample (without replacement) until
//! every point is alone or the depth limit `ceil(log2(subsample))` is hit. A row's anomaly score
//! is
//!
//! ``` ignore
//! s(x) = 2 ^ (-E[h(x)] / c(subsample))
//! ```
//!
//! where `h(x)` is the depth at which `x` ends up (plus `c(size)` for leaves that still hold
//! several points) and `c(n)` is the average path length of an unsuccessful binary search tree
//! lookup among `n` points.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::config::Config;
use crate::detect::Detector;
use crate::error::Result;
use crate::matrix::{FeatureMatrix, Flags};
use crate::stats::rand_util::{sample_indices, seeded, uniform, Rng};
use crate::stats::univariate::flag_top_fraction;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: usize,
    contamination: f64,
    seed: u64,
}

impl IsolationForest {
    pub fn new(config: &Config) -> IsolationForest {
        IsolationForest {
            n_estimators: config.n_estimators,
            max_samples: config.max_samples,
            contamination: config.contamination,
            seed: config.seed,
        }
    }

    /// Anomaly score of every row, in `(0, 1]`; higher is more anomalous
    pub fn scores(&self, features: &FeatureMatrix) -> Vec<f64> {
        let n = features.nrows();
        let subsample = self.max_samples.min(n);
        if subsample < 2 {
            return vec![0.5; n];
        }

        let max_depth = (subsample as f64).log2().ceil() as usize;
        let grow = |t: usize| {
            let mut rng = seeded(self.seed, t as u64);
            let mut indices = sample_indices(&mut rng, n, subsample);
            Node::grow(features, &mut indices, 0, max_depth, &mut rng)
        };

        #[cfg(feature = "rayon")]
        let trees: Vec<Node> = (0..self.n_estimators).into_par_iter().map(grow).collect();
        #[cfg(not(feature = "rayon"))]
        let trees: Vec<Node> = (0..self.n_estimators).map(grow).collect();

        let normalizer = average_path_length(subsample);
        features
            .rows()
            .map(|row| {
                let mean_depth =
                    trees.iter().map(|t| t.path_length(row, 0)).sum::<f64>() / trees.len() as f64;
                2f64.powf(-mean_depth / normalizer)
            })
            .collect()
    }
}

impl Detector for IsolationForest {
    fn name(&self) -> &'static str {
        "isolation forest"
    }

    fn detect(&self, features: &FeatureMatrix) -> Result<Flags> {
        let scores = self.scores(features);

        Ok(flag_top_fraction(&scores, self.contamination).into())
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn grow(
        features: &FeatureMatrix,
        indices: &mut [usize],
        depth: usize,
        max_depth: usize,
        rng: &mut Rng,
    ) -> Node {
        if indices.len() <= 1 || depth >= max_depth {
            return Node::Leaf {
                size: indices.len(),
            };
        }

        // Try the features in random order; the first one that isn't constant on this node wins
        let candidates = sample_indices(rng, features.ncols(), features.ncols());
        let split = candidates.into_iter().find_map(|feature| {
            let (lo, hi) = indices.iter().fold(
                (std::f64::INFINITY, std::f64::NEG_INFINITY),
                |(lo, hi), &i| {
                    let x = features.get(i, feature);
                    (lo.min(x), hi.max(x))
                },
            );

            if lo < hi {
                Some((feature, lo, hi))
            } else {
                None
            }
        });

        let (feature, lo, hi) = match split {
            Some(split) => split,
            None => {
                return Node::Leaf {
                    size: indices.len(),
                }
            }
        };

        // `threshold` lies in `[lo, hi)` so both sides are non-empty
        let threshold = uniform(rng, lo, hi);
        let mut boundary = 0;
        for k in 0..indices.len() {
            if features.get(indices[k], feature) <= threshold {
                indices.swap(k, boundary);
                boundary += 1;
            }
        }

        let (left, right) = indices.split_at_mut(boundary);
        Node::Split {
            feature,
            threshold,
            left: Box::new(Node::grow(features, left, depth + 1, max_depth, rng)),
            right: Box::new(Node::grow(features, right, depth + 1, max_depth, rng)),
        }
    }

    fn path_length(&self, row: &[f64], depth: usize) -> f64 {
        match self {
            Node::Leaf { size } => depth as f64 + average_path_length(*size),
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.path_length(row, depth + 1)
                } else {
                    right.path_length(row, depth + 1)
                }
            }
        }
    }
}

/// Average path length of an unsuccessful search in a binary search tree of `n` points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    fn grid_with_outliers() -> FeatureMatrix {
        let mut xs = vec![];
        let mut ys = vec![];
        for i in 0..10 {
            for j in 0..10 {
                xs.push(f64::from(i) * 0.1);
                ys.push(f64::from(j) * 0.1);
            }
        }
        xs.push(25.0);
        ys.push(-30.0);
        xs.push(-40.0);
        ys.push(18.0);

        FeatureMatrix::from_columns(&[xs, ys])
    }

    #[test]
    fn average_path_length_reference_values() {
        assert_relative_eq!(average_path_length(1), 0.0);
        assert_relative_eq!(average_path_length(2), 1.0);
        assert_relative_eq!(average_path_length(256), 10.244_770_92, epsilon = 1e-6);
    }

    #[test]
    fn isolated_points_score_highest() {
        let m = grid_with_outliers();
        let scores = IsolationForest::new(&Config::default()).scores(&m);
        let inlier_max = scores[..100].iter().cloned().fold(0.0, f64::max);

        assert!(scores[100] > inlier_max);
        assert!(scores[101] > inlier_max);
        assert!(scores.iter().all(|&s| s > 0.0 && s <= 1.0));
    }

    #[test]
    fn flags_the_isolated_points() {
        let m = grid_with_outliers();
        let flags = IsolationForest::new(&Config::default()).detect(&m).unwrap();

        assert!(flags[100] && flags[101]);
        assert!(flags.count() <= 11);
    }

    #[test]
    fn same_seed_same_scores() {
        let m = grid_with_outliers();
        let forest = IsolationForest::new(&Config::default().n_estimators(10));

        assert_eq!(forest.scores(&m), forest.scores(&m));
    }

    #[test]
    fn constant_data_flags_nothing() {
        let m = FeatureMatrix::from_columns(&[vec![1.0; 50], vec![-2.0; 50]]);
        let flags = IsolationForest::new(&Config::default()).detect(&m).unwrap();

        assert_eq!(flags.count(), 0);
    }

    #[test]
    fn single_row() {
        let m = FeatureMatrix::from_columns(&[vec![3.0]]);
        let flags = IsolationForest::new(&Config::default()).detect(&m).unwrap();

        assert_eq!(&*flags, &[false]);
    }
}
