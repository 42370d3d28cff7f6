//! Principal component analysis
//!
//! The components are the eigenvectors of the sample covariance matrix, found with the cyclic
//! Jacobi method.

use crate::matrix::FeatureMatrix;

const MAX_SWEEPS: usize = 100;

/// A fitted linear projection onto the directions of maximal variance
#[derive(Debug, Clone)]
pub struct Pca {
    mean: Vec<f64>,
    // `ncomponents × nfeatures`, one unit-length component per row
    components: Vec<Vec<f64>>,
    explained_variance: Vec<f64>,
}

impl Pca {
    /// Fits `ncomponents` principal components to the rows of `matrix`
    ///
    /// Components are sorted by decreasing explained variance. Each component's sign is chosen
    /// so that its largest-magnitude loading is positive, which makes the projection
    /// deterministic.
    ///
    /// # Panics
    ///
    /// Panics if `matrix` has no rows or if `ncomponents` exceeds the number of features
    pub fn fit(matrix: &FeatureMatrix, ncomponents: usize) -> Pca {
        let (n, p) = (matrix.nrows(), matrix.ncols());
        assert!(n > 0);
        assert!(ncomponents <= p);

        let mean: Vec<f64> = (0..p)
            .map(|j| matrix.rows().map(|row| row[j]).sum::<f64>() / n as f64)
            .collect();

        let dof = if n > 1 { (n - 1) as f64 } else { 1.0 };
        let mut covariance = vec![vec![0.0; p]; p];
        for row in matrix.rows() {
            for i in 0..p {
                let di = row[i] - mean[i];
                for j in i..p {
                    covariance[i][j] += di * (row[j] - mean[j]);
                }
            }
        }
        for i in 0..p {
            for j in i..p {
                covariance[i][j] /= dof;
                covariance[j][i] = covariance[i][j];
            }
        }

        let (eigenvalues, eigenvectors) = jacobi_eigen(covariance);

        let mut order: Vec<usize> = (0..p).collect();
        order.sort_by(|&a, &b| {
            eigenvalues[b]
                .partial_cmp(&eigenvalues[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let components = order
            .iter()
            .take(ncomponents)
            .map(|&k| {
                let mut component: Vec<f64> = (0..p).map(|i| eigenvectors[i][k]).collect();
                let pivot = component
                    .iter()
                    .cloned()
                    .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
                if pivot < 0.0 {
                    component.iter_mut().for_each(|x| *x = -*x);
                }
                component
            })
            .collect();

        let explained_variance = order
            .iter()
            .take(ncomponents)
            .map(|&k| eigenvalues[k].max(0.0))
            .collect();

        Pca {
            mean,
            components,
            explained_variance,
        }
    }

    /// Projects every row of `matrix` onto the fitted components
    pub fn transform(&self, matrix: &FeatureMatrix) -> Vec<Vec<f64>> {
        matrix
            .rows()
            .map(|row| {
                self.components
                    .iter()
                    .map(|component| {
                        row.iter()
                            .zip(&self.mean)
                            .zip(component)
                            .map(|((x, m), c)| (x - m) * c)
                            .sum()
                    })
                    .collect()
            })
            .collect()
    }

    pub fn components(&self) -> &[Vec<f64>] {
        &self.components
    }

    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }
}

/// Eigen-decomposition of a symmetric matrix. Returns the eigenvalues and a matrix whose `k`th
/// column is the eigenvector of the `k`th eigenvalue.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for _ in 0..MAX_SWEEPS {
        let off_diagonal: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off_diagonal < 1e-22 {
            break;
        }

        for p in 0..n {
            for q in p + 1..n {
                if a[p][q].abs() < 1e-300 {
                    continue;
                }

                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[k][p], a[k][q]);
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    ((0..n).map(|i| a[i][i]).collect(), v)
}
