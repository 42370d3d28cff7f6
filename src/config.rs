//! Detector parameters.

/// Parameters shared by every detection request.
///
/// ```
/// use outlierscope::Config;
///
/// let config = Config::default().contamination(0.05).seed(7);
/// assert_eq!(config.contamination, 0.05);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Expected fraction of outlier rows, used by every detector that accepts one
    pub contamination: f64,
    /// Seed of the isolation forest's random number generator
    pub seed: u64,
    /// Number of isolation trees
    pub n_estimators: usize,
    /// Upper bound on the number of rows each isolation tree is grown from
    pub max_samples: usize,
    /// Neighbourhood size of the local outlier factor
    pub lof_neighbors: usize,
    /// Number of equal-width bins per feature of the histogram-based score
    pub hbos_bins: usize,
    /// Regulariser added to the histogram densities before taking logs
    pub hbos_alpha: f64,
    /// Neighbourhood radius of DBSCAN
    pub dbscan_eps: f64,
    /// Neighbours (the point included) a DBSCAN core point needs within `dbscan_eps`
    pub dbscan_min_samples: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            contamination: 0.1,
            seed: 42,
            n_estimators: 100,
            max_samples: 256,
            lof_neighbors: 20,
            hbos_bins: 10,
            hbos_alpha: 0.1,
            dbscan_eps: 0.5,
            dbscan_min_samples: 5,
        }
    }
}

impl Config {
    /// Changes the contamination fraction
    ///
    /// # Panics
    ///
    /// Panics if `fraction` is not in the `(0, 0.5]` range
    pub fn contamination(mut self, fraction: f64) -> Config {
        assert!(fraction > 0.0 && fraction <= 0.5);

        self.contamination = fraction;
        self
    }

    /// Changes the isolation forest seed
    pub fn seed(mut self, seed: u64) -> Config {
        self.seed = seed;
        self
    }

    /// Changes the number of isolation trees
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero
    pub fn n_estimators(mut self, n: usize) -> Config {
        assert!(n > 0);

        self.n_estimators = n;
        self
    }

    /// Changes the isolation tree subsample size
    ///
    /// # Panics
    ///
    /// Panics if `n < 2`
    pub fn max_samples(mut self, n: usize) -> Config {
        assert!(n >= 2);

        self.max_samples = n;
        self
    }

    /// Changes the local outlier factor neighbourhood size
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero
    pub fn lof_neighbors(mut self, k: usize) -> Config {
        assert!(k > 0);

        self.lof_neighbors = k;
        self
    }

    /// Changes the histogram resolution of the histogram-based score
    ///
    /// # Panics
    ///
    /// Panics if `bins` is zero
    pub fn hbos_bins(mut self, bins: usize) -> Config {
        assert!(bins > 0);

        self.hbos_bins = bins;
        self
    }

    /// Changes the DBSCAN neighbourhood radius and core-point threshold
    ///
    /// # Panics
    ///
    /// Panics if `eps` is not positive or `min_samples` is zero
    pub fn dbscan(mut self, eps: f64, min_samples: usize) -> Config {
        assert!(eps > 0.0);
        assert!(min_samples > 0);

        self.dbscan_eps = eps;
        self.dbscan_min_samples = min_samples;
        self
    }
}

#[cfg(test)]
mod test {
    use super::Config;

    #[test]
    fn reference_parameters() {
        let config = Config::default();

        assert_eq!(config.contamination, 0.1);
        assert_eq!(config.seed, 42);
        assert_eq!(config.lof_neighbors, 20);
        assert_eq!(config.dbscan_eps, 0.5);
        assert_eq!(config.dbscan_min_samples, 5);
    }

    #[test]
    #[should_panic]
    fn contamination_above_half_is_rejected() {
        let _ = Config::default().contamination(0.75);
    }
}
