//! K-Means performance across a range of cluster counts.
//!
//! For every requested k the partition engine runs with the same base
//! settings and the result is scored against the reference labels. The
//! inertia column is the usual elbow curve; purity tends to rise with k
//! while the Adjusted Rand Index peaks near the true class count.
//!
//! ```
//! use u_cluster::kmeans::KMeansConfig;
//! use u_cluster::sweep::kmeans_sweep;
//!
//! let data = vec![
//!     vec![0.0, 0.0], vec![0.5, 0.5], vec![0.2, 0.3],
//!     vec![10.0, 10.0], vec![10.5, 10.5], vec![10.2, 10.3],
//! ];
//! let reference = [1, 1, 1, 2, 2, 2];
//! let points = kmeans_sweep(&data, &reference, 1..=3, &KMeansConfig::new(1)).unwrap();
//!
//! assert_eq!(points.len(), 3);
//! assert!(points[1].inertia < points[0].inertia);
//! assert_eq!(points[1].scores.rand_index, 1.0);
//! ```

use std::hash::Hash;

use log::info;

use crate::error::ClusterError;
use crate::kmeans::{kmeans, KMeansConfig};
use crate::metrics::{evaluate, ClusteringScores};

/// Outcome of one K-Means run in a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    /// Cluster count.
    pub k: usize,
    /// Within-cluster sum of squares.
    pub inertia: f64,
    /// Iterations used.
    pub iterations: usize,
    /// Whether the run converged before `max_iter`.
    pub converged: bool,
    /// Scores against the reference labels.
    pub scores: ClusteringScores,
}

/// Runs K-Means for each k in `ks`, in order, and evaluates each result.
///
/// `base` supplies `max_iter`, `tol`, `seed` and the empty-cluster
/// policy; its `k` is ignored.
///
/// # Errors
///
/// - [`ClusterError::ShapeMismatch`] if `reference` and `data` differ in length
/// - [`ClusterError::InvalidParameter`] if any k is outside `1..=n`
///   (checked before the first run)
pub fn kmeans_sweep<R, I>(
    data: &[Vec<f64>],
    reference: &[R],
    ks: I,
    base: &KMeansConfig,
) -> Result<Vec<SweepPoint>, ClusterError>
where
    R: Eq + Hash,
    I: IntoIterator<Item = usize>,
{
    let n = data.len();
    if reference.len() != n {
        return Err(ClusterError::ShapeMismatch {
            expected: n,
            actual: reference.len(),
        });
    }
    let ks: Vec<usize> = ks.into_iter().collect();
    if let Some(&bad) = ks.iter().find(|&&k| k == 0 || k > n) {
        return Err(ClusterError::InvalidParameter {
            name: "k".into(),
            message: format!("must be between 1 and {n} (number of data points), got {bad}"),
        });
    }

    let mut points = Vec::with_capacity(ks.len());
    for k in ks {
        let config = KMeansConfig { k, ..base.clone() };
        let result = kmeans(data, &config)?;
        let scores = evaluate(&result.labels, reference)?;
        info!(
            "sweep: k={k} inertia={:.4} purity={:.4} rand={:.4} ari={:.4}",
            result.inertia, scores.purity, scores.rand_index, scores.adjusted_rand_index
        );
        points.push(SweepPoint {
            k,
            inertia: result.inertia,
            iterations: result.iterations,
            converged: result.converged,
            scores,
        });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_three_clusters() -> (Vec<Vec<f64>>, Vec<i64>) {
        let data = vec![
            vec![0.0, 0.0],
            vec![0.5, 0.5],
            vec![0.2, 0.3],
            vec![10.0, 0.0],
            vec![10.5, 0.5],
            vec![10.2, 0.3],
            vec![5.0, 10.0],
            vec![5.5, 10.5],
            vec![5.2, 10.3],
        ];
        (data, vec![1, 1, 1, 2, 2, 2, 3, 3, 3])
    }

    #[test]
    fn sweep_runs_every_k_in_order() {
        let (data, reference) = make_three_clusters();
        let points = kmeans_sweep(&data, &reference, [4, 2, 9], &KMeansConfig::new(1)).unwrap();
        let ks: Vec<usize> = points.iter().map(|p| p.k).collect();
        assert_eq!(ks, vec![4, 2, 9]);
        assert_eq!(points[2].inertia, 0.0);
        assert_eq!(points[2].scores.purity, 1.0);
    }

    #[test]
    fn sweep_matches_direct_runs() {
        let (data, reference) = make_three_clusters();
        let base = KMeansConfig::new(1).seed(5);
        let points = kmeans_sweep(&data, &reference, 1..=4, &base).unwrap();
        for p in &points {
            let direct = kmeans(&data, &KMeansConfig { k: p.k, ..base.clone() }).unwrap();
            assert_eq!(p.inertia, direct.inertia);
            assert_eq!(p.iterations, direct.iterations);
            assert_eq!(p.scores, evaluate(&direct.labels, &reference).unwrap());
        }
    }

    #[test]
    fn single_cluster_scores() {
        let (data, reference) = make_three_clusters();
        let points = kmeans_sweep(&data, &reference, [1], &KMeansConfig::new(1)).unwrap();
        let s = points[0].scores;
        assert!((s.purity - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.adjusted_rand_index, 0.0);
    }

    #[test]
    fn sweep_errors() {
        let (data, reference) = make_three_clusters();
        assert!(matches!(
            kmeans_sweep(&data, &reference, [2, 10], &KMeansConfig::new(1)),
            Err(ClusterError::InvalidParameter { .. })
        ));
        assert!(matches!(
            kmeans_sweep(&data, &reference[..3], [2], &KMeansConfig::new(1)),
            Err(ClusterError::ShapeMismatch { .. })
        ));
        assert!(kmeans_sweep(&data, &reference, [0], &KMeansConfig::new(1)).is_err());
    }
}
