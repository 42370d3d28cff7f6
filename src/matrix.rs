//! The numeric matrix the detectors consume, and the flags they produce.

use std::ops::Deref;

/// A dense, row-major `nrows × ncols` matrix of finite values
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Box<[f64]>,
    nrows: usize,
    ncols: usize,
}

impl FeatureMatrix {
    /// # Panics
    ///
    /// Panics if `data.len() != nrows * ncols` or if any value is not finite
    pub fn from_row_major(data: Vec<f64>, nrows: usize, ncols: usize) -> FeatureMatrix {
        assert_eq!(data.len(), nrows * ncols);
        assert!(data.iter().all(|x| x.is_finite()));

        FeatureMatrix {
            data: data.into_boxed_slice(),
            nrows,
            ncols,
        }
    }

    /// Builds a matrix from equally long columns
    ///
    /// # Panics
    ///
    /// Panics if the columns differ in length
    pub fn from_columns(columns: &[Vec<f64>]) -> FeatureMatrix {
        let ncols = columns.len();
        let nrows = columns.first().map_or(0, Vec::len);
        assert!(columns.iter().all(|c| c.len() == nrows));

        let mut data = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            data.extend(columns.iter().map(|c| c[i]));
        }

        FeatureMatrix::from_row_major(data, nrows, ncols)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.nrows).map(move |i| self.row(i))
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows().map(|row| row[j]).collect()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.ncols + j]
    }
}

/// Squared euclidean distance between two rows
pub(crate) fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// One outlier flag per row, `true` meaning "outlier"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flags(Box<[bool]>);

impl Flags {
    pub fn none(len: usize) -> Flags {
        Flags(vec![false; len].into_boxed_slice())
    }

    /// Number of rows flagged as outliers
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&flag| flag).count()
    }
}

impl From<Vec<bool>> for Flags {
    fn from(flags: Vec<bool>) -> Flags {
        Flags(flags.into_boxed_slice())
    }
}

impl Deref for Flags {
    type Target = [bool];

    fn deref(&self) -> &[bool] {
        &self.0
    }
}
