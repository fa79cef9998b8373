//! Principal-component projection for plotting clustering results.
//!
//! A [`Projection`] is fitted once on the sample table; the fitted axes can
//! then place anything living in the same feature space, such as K-Means
//! centroids, onto the same scatter plot via [`Projection::transform`].
//! The eigen-decomposition of the sample covariance matrix uses the Jacobi
//! solver from `u-numflow`.
//!
//! Component signs are arbitrary, as with any eigen-decomposition.
//!
//! # Example
//!
//! ```
//! use u_cluster::kmeans::{kmeans, KMeansConfig};
//! use u_cluster::projection::project_2d;
//!
//! let data = vec![
//!     vec![0.0, 0.0, 1.0], vec![0.4, 0.1, 1.0], vec![0.1, 0.5, 1.2],
//!     vec![6.0, 6.0, 0.0], vec![6.3, 5.8, 0.1], vec![5.9, 6.4, 0.2],
//! ];
//! let fit = project_2d(&data).unwrap();
//! assert_eq!(fit.scores.len(), 6);
//!
//! let km = kmeans(&data, &KMeansConfig::new(2)).unwrap();
//! let centroids_2d = fit.transform(&km.centroids).unwrap();
//! assert!(centroids_2d.iter().all(|c| c.len() == 2));
//! ```

use u_numflow::matrix::Matrix;

use crate::dataset::column_means;
use crate::error::{validate_table, ClusterError};

/// Number of axes to keep.
#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// Number of principal components to keep.
    pub n_components: usize,
}

impl ProjectionConfig {
    /// Keeps `n_components` components.
    pub fn new(n_components: usize) -> Self {
        Self { n_components }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Fitted principal axes and the coordinates of the fitted samples.
#[derive(Debug, Clone)]
pub struct Projection {
    /// n × n_components coordinates of the fitted samples.
    pub scores: Vec<Vec<f64>>,
    /// n_components × d; row `i` is the unit eigenvector of axis `i`.
    pub loadings: Vec<Vec<f64>>,
    /// Variance along each axis, descending.
    pub eigenvalues: Vec<f64>,
    /// Share of total variance per axis.
    pub explained_variance_ratio: Vec<f64>,
    /// Feature means subtracted before projecting.
    pub means: Vec<f64>,
}

impl Projection {
    /// Coordinates of one point on the fitted axes.
    fn place(&self, point: &[f64]) -> Vec<f64> {
        self.loadings
            .iter()
            .map(|axis| {
                point
                    .iter()
                    .zip(&self.means)
                    .zip(axis)
                    .map(|((&x, &m), &w)| (x - m) * w)
                    .sum::<f64>()
            })
            .collect()
    }

    /// Places `points` (for example cluster centroids) on the fitted axes.
    ///
    /// # Errors
    ///
    /// [`ClusterError::DimensionMismatch`] if a point does not have the
    /// fitted feature count.
    pub fn transform(&self, points: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ClusterError> {
        let d = self.means.len();
        if let Some(bad) = points.iter().find(|p| p.len() != d) {
            return Err(ClusterError::DimensionMismatch {
                expected: d,
                actual: bad.len(),
            });
        }
        Ok(points.iter().map(|p| self.place(p)).collect())
    }
}

fn solver_failed(operation: &str, err: impl std::fmt::Display) -> ClusterError {
    ClusterError::ComputationFailed {
        operation: operation.into(),
        detail: err.to_string(),
    }
}

/// Sample covariance (n − 1 divisor), row-major d × d.
fn covariance(data: &[Vec<f64>], means: &[f64]) -> Vec<f64> {
    let d = means.len();
    let mut cov = vec![0.0; d * d];
    let mut dev = vec![0.0; d];
    for point in data {
        for ((slot, &x), &m) in dev.iter_mut().zip(point).zip(means) {
            *slot = x - m;
        }
        for i in 0..d {
            for j in i..d {
                cov[i * d + j] += dev[i] * dev[j];
            }
        }
    }
    let denom = (data.len() - 1) as f64;
    for i in 0..d {
        for j in i..d {
            let v = cov[i * d + j] / denom;
            cov[i * d + j] = v;
            cov[j * d + i] = v;
        }
    }
    cov
}

/// Fits the leading principal axes of `data` and projects it onto them.
///
/// # Errors
///
/// - [`ClusterError::InsufficientData`] with fewer than two samples
/// - [`ClusterError::InvalidParameter`] if `n_components` is 0 or exceeds d
/// - [`ClusterError::ComputationFailed`] if the eigen solver fails
pub fn project(data: &[Vec<f64>], config: &ProjectionConfig) -> Result<Projection, ClusterError> {
    let d = validate_table(data, 2)?;
    let c = config.n_components;
    if c == 0 || c > d {
        return Err(ClusterError::InvalidParameter {
            name: "n_components".into(),
            message: format!("must be between 1 and {d} (number of features), got {c}"),
        });
    }

    let means = column_means(data, d);
    let cov = Matrix::new(d, d, covariance(data, &means))
        .map_err(|e| solver_failed("covariance matrix construction", e))?;
    let (all_eigenvalues, eigenvectors) = cov
        .eigen_symmetric()
        .map_err(|e| solver_failed("eigenvalue decomposition", e))?;

    let total: f64 = all_eigenvalues.iter().sum();
    let eigenvalues = all_eigenvalues[..c].to_vec();
    let explained_variance_ratio = eigenvalues
        .iter()
        .map(|&ev| if total > 0.0 { ev / total } else { 0.0 })
        .collect();
    let loadings = (0..c)
        .map(|axis| (0..d).map(|feat| eigenvectors.get(feat, axis)).collect())
        .collect();

    let mut fit = Projection {
        scores: Vec::new(),
        loadings,
        eigenvalues,
        explained_variance_ratio,
        means,
    };
    fit.scores = data.iter().map(|p| fit.place(p)).collect();
    Ok(fit)
}

/// Two-axis projection for scatter plots.
pub fn project_2d(data: &[Vec<f64>]) -> Result<Projection, ClusterError> {
    project(data, &ProjectionConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // Points on the line y = 2x, z = -x.
    fn make_diagonal() -> Vec<Vec<f64>> {
        (0..8)
            .map(|i| {
                let t = i as f64 - 3.5;
                vec![t, 2.0 * t, -t]
            })
            .collect()
    }

    fn make_plane() -> Vec<Vec<f64>> {
        vec![
            vec![2.0, 0.0, 1.0],
            vec![-2.0, 0.0, 1.0],
            vec![0.0, 1.0, 1.0],
            vec![0.0, -1.0, 1.0],
            vec![1.0, 0.5, 1.0],
            vec![-1.0, -0.5, 1.0],
        ]
    }

    // ── Fitting ──

    #[test]
    fn shapes() {
        let p = project_2d(&make_plane()).unwrap();
        assert_eq!(p.scores.len(), 6);
        assert!(p.scores.iter().all(|s| s.len() == 2));
        assert_eq!(p.loadings.len(), 2);
        assert_eq!(p.loadings[0].len(), 3);
        assert_eq!(p.means, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn collinear_data_has_one_axis() {
        let p = project(&make_diagonal(), &ProjectionConfig::new(1)).unwrap();
        assert_abs_diff_eq!(p.explained_variance_ratio[0], 1.0, epsilon = 1e-10);
        // Axis direction is (1, 2, -1) / sqrt(6), up to sign
        let axis = &p.loadings[0];
        let sign = axis[0].signum();
        let expected = [1.0, 2.0, -1.0].map(|v: f64| v / 6f64.sqrt());
        for (&got, &want) in axis.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(got * sign, want, epsilon = 1e-8);
        }
    }

    #[test]
    fn eigenvalues_descending_and_loadings_unit() {
        let p = project(&make_plane(), &ProjectionConfig::new(3)).unwrap();
        for w in p.eigenvalues.windows(2) {
            assert!(w[1] <= w[0] + 1e-10);
        }
        for loading in &p.loadings {
            let norm: f64 = loading.iter().map(|x| x * x).sum::<f64>().sqrt();
            assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn planar_data_fully_explained_by_two_axes() {
        let p = project_2d(&make_plane()).unwrap();
        let explained: f64 = p.explained_variance_ratio.iter().sum();
        assert_abs_diff_eq!(explained, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn scores_are_centered() {
        let p = project_2d(&make_plane()).unwrap();
        for axis in 0..2 {
            let mean: f64 = p.scores.iter().map(|s| s[axis]).sum::<f64>() / 6.0;
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-10);
        }
    }

    // ── Transform ──

    #[test]
    fn transform_matches_fitted_scores() {
        let data = make_plane();
        let p = project_2d(&data).unwrap();
        assert_eq!(p.transform(&data).unwrap(), p.scores);
        let origin = p.transform(&[p.means.clone()]).unwrap();
        assert_eq!(origin[0], vec![0.0, 0.0]);
    }

    #[test]
    fn transform_rejects_wrong_width() {
        let p = project_2d(&make_plane()).unwrap();
        assert!(matches!(
            p.transform(&[vec![1.0, 2.0]]),
            Err(ClusterError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn projection_errors() {
        assert!(matches!(
            project_2d(&[vec![1.0, 2.0]]),
            Err(ClusterError::InsufficientData { .. })
        ));
        assert!(matches!(
            project_2d(&[vec![1.0], vec![2.0]]),
            Err(ClusterError::InvalidParameter { .. })
        ));
        assert!(project(&make_plane(), &ProjectionConfig::new(0)).is_err());
    }
}
