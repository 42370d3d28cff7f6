/// A "view" into the percentiles of a sample
pub struct Percentiles(Box<[f64]>);

impl Percentiles {
    /// `sorted` must be sorted in ascending order and not empty
    pub(crate) fn from_sorted(sorted: Box<[f64]>) -> Percentiles {
        debug_assert!(!sorted.is_empty());
        debug_assert!(sorted.windows(2).all(|w| w[0] <= w[1]));

        Percentiles(sorted)
    }

    /// Returns the percentile at `p`%, interpolating linearly between the closest ranks
    ///
    /// # Panics
    ///
    /// Panics if `p` is outside the closed `[0, 100]` range
    pub fn at(&self, p: f64) -> f64 {
        assert!((0.0..=100.0).contains(&p));

        let len = self.0.len() - 1;
        if p == 100.0 {
            return self.0[len];
        }

        let rank = (p / 100.0) * len as f64;
        let integer = rank.floor();
        let fraction = rank - integer;
        let n = integer as usize;
        let floor = self.0[n];

        match self.0.get(n + 1) {
            Some(&ceiling) if fraction > 0.0 => floor + (ceiling - floor) * fraction,
            _ => floor,
        }
    }

    /// Returns the 50th percentile
    pub fn median(&self) -> f64 {
        self.at(50.0)
    }
}
