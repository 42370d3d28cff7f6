//! Statistics shared by the preprocessing, the detectors and the chart projection.
//!
//! Everything here works on `f64` and assumes finite input; callers are expected to have imputed
//! missing values beforehand.

#[cfg(test)]
pub(crate) mod test;

pub mod pca;
pub mod univariate;

pub(crate) mod rand_util;

fn sum(xs: &[f64]) -> f64 {
    xs.iter().sum()
}
