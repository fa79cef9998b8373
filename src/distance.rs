//! Euclidean distance helpers shared by the clustering engines.
//!
//! [`DistanceMatrix`] stores the full symmetric n × n matrix row-major.
//! Each unordered pair is computed once and mirrored, so building it
//! costs O(n²·d).
//!
//! ```
//! use u_cluster::distance::{pairwise_distance, DistanceMatrix};
//!
//! let d = pairwise_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
//! assert_eq!(d, 5.0);
//!
//! let data = vec![vec![0.0], vec![1.0], vec![3.0]];
//! let dm = DistanceMatrix::new(&data).unwrap();
//! assert_eq!(dm.get(0, 2), 3.0);
//! assert_eq!(dm.get(2, 0), 3.0);
//! ```

use crate::error::{validate_table, ClusterError};

/// Euclidean distance between two points of equal dimensionality.
pub fn pairwise_distance(a: &[f64], b: &[f64]) -> Result<f64, ClusterError> {
    if a.len() != b.len() {
        return Err(ClusterError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(euclidean_dist(a, b))
}

#[inline]
pub(crate) fn euclidean_dist_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&ai, &bi)| {
            let diff = ai - bi;
            diff * diff
        })
        .sum()
}

#[inline]
pub(crate) fn euclidean_dist(a: &[f64], b: &[f64]) -> f64 {
    let sq = euclidean_dist_sq(a, b);
    if sq.is_finite() {
        sq.sqrt()
    } else {
        scaled_euclidean_dist(a, b)
    }
}

/// Euclidean distance for coordinates whose squared differences overflow.
/// Operands are halved so differences of finite values stay finite, and
/// the sum of squares is taken relative to the largest difference.
/// Infinite or NaN inputs still yield infinity or NaN.
fn scaled_euclidean_dist(a: &[f64], b: &[f64]) -> f64 {
    let half_diff = |(&ai, &bi): (&f64, &f64)| 0.5 * ai - 0.5 * bi;
    let scale = a
        .iter()
        .zip(b.iter())
        .map(half_diff)
        .fold(0.0f64, |acc, d| if d.is_nan() || d.abs() > acc { d.abs() } else { acc });
    if !scale.is_finite() || scale == 0.0 {
        return scale;
    }
    let rel_sq: f64 = a
        .iter()
        .zip(b.iter())
        .map(half_diff)
        .map(|d| {
            let r = d / scale;
            r * r
        })
        .sum();
    2.0 * scale * rel_sq.sqrt()
}

/// Symmetric pairwise Euclidean distance matrix with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Computes all pairwise distances of `data`.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::DimensionMismatch`] for a ragged table
    /// - [`ClusterError::NonFinite`] if a value is NaN or infinite
    pub fn new(data: &[Vec<f64>]) -> Result<Self, ClusterError> {
        validate_table(data, 0)?;
        Ok(Self::from_validated(data))
    }

    /// Builds the matrix for a table that has already been validated.
    pub(crate) fn from_validated(data: &[Vec<f64>]) -> Self {
        let n = data.len();
        let mut values = vec![0.0_f64; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = euclidean_dist(&data[i], &data[j]);
                values[i * n + j] = d;
                values[j * n + i] = d;
            }
        }
        Self { n, values }
    }

    /// Number of points (rows and columns).
    pub fn len(&self) -> usize {
        self.n
    }

    /// True when built from an empty table.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between points `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is `>= len()`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n && j < self.n, "index out of bounds");
        self.values[i * self.n + j]
    }

    /// Row `i`: distances from point `i` to every point.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }
}
