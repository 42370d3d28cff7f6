use std::{mem, ops};

use crate::stats::univariate::Percentiles;

/// A collection of data points drawn from a population
///
/// Invariants:
///
/// - The sample contains at least 1 data point
/// - The sample contains no `NaN`s
#[repr(transparent)]
pub struct Sample([f64]);

impl Sample {
    /// Creates a new sample from an existing slice
    ///
    /// # Panics
    ///
    /// Panics if `slice` contains any `NaN` or if `slice` is empty
    #[allow(clippy::new_ret_no_self)]
    pub fn new(slice: &[f64]) -> &Sample {
        assert!(!slice.is_empty() && slice.iter().all(|x| !x.is_nan()));

        // SAFETY: `Sample` is a `repr(transparent)` wrapper around `[f64]`
        unsafe { mem::transmute(slice) }
    }

    /// Returns the biggest element in the sample
    ///
    /// - Time: `O(length)`
    pub fn max(&self) -> f64 {
        self.iter().cloned().fold(std::f64::NEG_INFINITY, f64::max)
    }

    /// Returns the arithmetic average of the sample
    ///
    /// - Time: `O(length)`
    pub fn mean(&self) -> f64 {
        let n = self.len();

        self.sum() / n as f64
    }

    /// Returns the smallest element in the sample
    ///
    /// - Time: `O(length)`
    pub fn min(&self) -> f64 {
        self.iter().cloned().fold(std::f64::INFINITY, f64::min)
    }

    /// Returns a "view" into the percentiles of the sample
    ///
    /// This "view" makes consecutive computations of percentiles much faster (`O(1)`)
    ///
    /// - Time: `O(N log N) where N = length`
    /// - Memory: `O(length)`
    pub fn percentiles(&self) -> Percentiles {
        let mut v = self.to_vec().into_boxed_slice();
        // NB `Sample` guarantees there are no `NaN`s
        v.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Percentiles::from_sorted(v)
    }

    /// Returns the population standard deviation of the sample
    ///
    /// The `mean` can be optionally passed along to speed up (2X) the computation
    ///
    /// - Time: `O(length)`
    pub fn std_dev(&self, mean: Option<f64>) -> f64 {
        self.var(mean).sqrt()
    }

    /// Returns the sum of all the elements of the sample
    ///
    /// - Time: `O(length)`
    pub fn sum(&self) -> f64 {
        crate::stats::sum(self)
    }

    /// Returns the population variance of the sample (the sum of squares is divided by `N`,
    /// not `N - 1`)
    ///
    /// The `mean` can be optionally passed along to speed up (2X) the computation
    ///
    /// - Time: `O(length)`
    pub fn var(&self, mean: Option<f64>) -> f64 {
        let mean = mean.unwrap_or_else(|| self.mean());

        let sum: f64 = self.iter().map(|&x| (x - mean).powi(2)).sum();

        sum / self.len() as f64
    }

    /// Returns the median of the sample
    ///
    /// - Time: `O(N log N) where N = length`
    pub fn median(&self) -> f64 {
        self.percentiles().median()
    }
}

impl ops::Deref for Sample {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use approx::{assert_relative_eq, relative_eq};
    use quickcheck::{quickcheck, TestResult};

    use crate::stats::test;
    use crate::stats::univariate::Sample;

    quickcheck! {
        fn mean_is_between_min_and_max(size: usize, start: usize) -> TestResult {
            if let Some(v) = test::vec(size, start) {
                let sample = Sample::new(&v[start..]);
                let mean = sample.mean();

                TestResult::from_bool(sample.min() <= mean && mean <= sample.max())
            } else {
                TestResult::discard()
            }
        }
    }

    quickcheck! {
        fn variance_is_shift_invariant(size: usize, start: usize) -> TestResult {
            if let Some(v) = test::vec(size, start) {
                let shifted: Vec<f64> = v.iter().map(|x| x + 100.0).collect();
                let a = Sample::new(&v[start..]).var(None);
                let b = Sample::new(&shifted[start..]).var(None);

                TestResult::from_bool(relative_eq!(a, b, max_relative = 1e-6, epsilon = 1e-9))
            } else {
                TestResult::discard()
            }
        }
    }

    #[test]
    fn population_variance() {
        let sample = Sample::new(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);

        assert_relative_eq!(sample.mean(), 5.0);
        assert_relative_eq!(sample.var(None), 4.0);
        assert_relative_eq!(sample.std_dev(Some(5.0)), 2.0);
    }

    #[test]
    fn median_of_even_and_odd_samples() {
        assert_relative_eq!(Sample::new(&[3.0, 1.0, 2.0]).median(), 2.0);
        assert_relative_eq!(Sample::new(&[4.0, 1.0, 3.0, 2.0]).median(), 2.5);
        assert_relative_eq!(Sample::new(&[7.0]).median(), 7.0);
    }

    #[test]
    fn percentiles_interpolate() {
        let p = Sample::new(&[10.0, 20.0, 30.0, 40.0, 50.0]).percentiles();

        assert_relative_eq!(p.at(0.0), 10.0);
        assert_relative_eq!(p.at(90.0), 46.0);
        assert_relative_eq!(p.at(100.0), 50.0);
    }

    #[test]
    #[should_panic]
    fn empty_sample_is_rejected() {
        Sample::new(&[]);
    }
}
