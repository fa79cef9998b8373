//! Partition clustering: Lloyd's K-Means with random-sample seeding.
//!
//! Initial centroids are `k` distinct rows drawn uniformly without
//! replacement from an explicitly passed random generator, so a run is
//! bit-for-bit reproducible for a fixed `(data, k, seed)`.
//!
//! Each iteration:
//!
//! 1. assigns every point to its nearest centroid (ties go to the lowest
//!    centroid index),
//! 2. moves each centroid to the mean of its points; a centroid with no
//!    points is handled by [`EmptyClusterPolicy`],
//! 3. stops once the largest centroid shift drops below `tol`.
//!
//! # Example
//!
//! ```
//! use u_cluster::kmeans::{kmeans, KMeansConfig};
//!
//! let data = vec![
//!     vec![0.0, 0.0], vec![0.5, 0.5], vec![0.2, 0.3],
//!     vec![10.0, 10.0], vec![10.5, 10.5], vec![10.2, 10.3],
//! ];
//! let result = kmeans(&data, &KMeansConfig::new(2)).unwrap();
//!
//! assert_eq!(result.labels.len(), 6);
//! assert!(result.converged);
//! assert_eq!(result.labels[0], result.labels[2]);
//! assert_ne!(result.labels[0], result.labels[3]);
//! ```

use log::{debug, warn};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::distance::{euclidean_dist, euclidean_dist_sq};
use crate::error::{validate_table, ClusterError};

// ── Configuration ─────────────────────────────────────────────────────

/// What to do with a centroid that received no points in an update step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyClusterPolicy {
    /// Leave the centroid where it was. It may stay orphaned for the rest
    /// of the run.
    #[default]
    Keep,
    /// Move the centroid onto a sample drawn uniformly from the data,
    /// using the same generator that seeded the run.
    Reseed,
}

/// Configuration for K-Means clustering.
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    /// Number of clusters.
    pub k: usize,
    /// Maximum iterations. Default: 100.
    pub max_iter: usize,
    /// Convergence tolerance on the largest centroid shift. Default: 1e-4.
    pub tol: f64,
    /// Seed for centroid initialization. Default: 42.
    pub seed: u64,
    /// Empty-cluster handling. Default: [`EmptyClusterPolicy::Keep`].
    pub empty_cluster: EmptyClusterPolicy,
}

impl KMeansConfig {
    /// Creates a config for `k` clusters with default parameters.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            tol: 1e-4,
            seed: 42,
            empty_cluster: EmptyClusterPolicy::Keep,
        }
    }

    /// Sets the maximum number of iterations.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance.
    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the empty-cluster policy.
    pub fn empty_cluster(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster = policy;
        self
    }
}

// ── Result ────────────────────────────────────────────────────────────

/// A centroid that had no assigned points during an update step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyClusterEvent {
    /// 1-based iteration in which the cluster was empty.
    pub iteration: usize,
    /// Centroid index.
    pub cluster: usize,
}

/// Result of K-Means clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Number of clusters.
    pub k: usize,
    /// Final centroids (k × d).
    pub centroids: Vec<Vec<f64>>,
    /// Centroid index for each point (0..k), from the last assignment step.
    pub labels: Vec<usize>,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// False when `max_iter` ran out before the shift fell below `tol`.
    pub converged: bool,
    /// Number of points per cluster.
    pub cluster_sizes: Vec<usize>,
    /// Every empty-cluster occurrence, in order.
    pub empty_cluster_events: Vec<EmptyClusterEvent>,
}

// ── K-Means algorithm ─────────────────────────────────────────────────

/// Runs K-Means with a generator seeded from `config.seed`.
///
/// # Errors
///
/// - [`ClusterError::InsufficientData`] if `data` is empty
/// - [`ClusterError::InvalidParameter`] if `k` is outside `1..=n`,
///   `max_iter` is zero or `tol` is negative or not finite
/// - [`ClusterError::DimensionMismatch`] / [`ClusterError::NonFinite`]
///   for a malformed table
pub fn kmeans(data: &[Vec<f64>], config: &KMeansConfig) -> Result<KMeansResult, ClusterError> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    kmeans_with_rng(data, config, &mut rng)
}

/// Runs K-Means drawing all randomness from `rng`. `config.seed` is ignored.
///
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use u_cluster::kmeans::{kmeans_with_rng, KMeansConfig};
///
/// let data = vec![vec![0.0], vec![0.2], vec![9.0], vec![9.4]];
/// let config = KMeansConfig::new(2);
/// let a = kmeans_with_rng(&data, &config, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
/// let b = kmeans_with_rng(&data, &config, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn kmeans_with_rng<R: Rng + ?Sized>(
    data: &[Vec<f64>],
    config: &KMeansConfig,
    rng: &mut R,
) -> Result<KMeansResult, ClusterError> {
    let d = validate_table(data, 1)?;
    validate_config(config, data.len())?;

    let n = data.len();
    let k = config.k;

    let mut centroids = init_centroids(data, k, rng);
    let mut labels = vec![0usize; n];
    let mut iterations = 0;
    let mut converged = false;
    let mut empty_cluster_events = Vec::new();

    for iter in 0..config.max_iter {
        iterations = iter + 1;

        assign_labels(data, &centroids, &mut labels);

        // Update step
        let mut new_centroids = vec![vec![0.0; d]; k];
        let mut counts = vec![0usize; k];
        for (point, &c) in data.iter().zip(labels.iter()) {
            counts[c] += 1;
            for (acc, &v) in new_centroids[c].iter_mut().zip(point.iter()) {
                *acc += v;
            }
        }

        for c in 0..k {
            if counts[c] > 0 {
                for val in &mut new_centroids[c] {
                    *val /= counts[c] as f64;
                }
                continue;
            }

            warn!("k-means: cluster {c} has no points assigned (iteration {iterations})");
            empty_cluster_events.push(EmptyClusterEvent {
                iteration: iterations,
                cluster: c,
            });
            new_centroids[c] = match config.empty_cluster {
                EmptyClusterPolicy::Keep => centroids[c].clone(),
                EmptyClusterPolicy::Reseed => data[rng.gen_range(0..n)].clone(),
            };
        }

        let max_shift = centroids
            .iter()
            .zip(new_centroids.iter())
            .map(|(old, new)| euclidean_dist(old, new))
            .fold(0.0f64, |acc, shift| if shift.is_nan() || shift > acc { shift } else { acc });

        centroids = new_centroids;

        // A NaN shift (centroid overflowed to infinity) never converges.
        if !max_shift.is_nan() && max_shift < config.tol {
            converged = true;
            break;
        }
    }

    if converged {
        debug!("k-means: converged at iteration {iterations}");
    } else {
        debug!("k-means: reached maximum iterations ({})", config.max_iter);
    }

    let inertia = inertia(data, &centroids, &labels);
    let mut cluster_sizes = vec![0usize; k];
    for &c in &labels {
        cluster_sizes[c] += 1;
    }

    Ok(KMeansResult {
        k,
        centroids,
        labels,
        inertia,
        iterations,
        converged,
        cluster_sizes,
        empty_cluster_events,
    })
}

/// Within-cluster sum of squares: for each cluster, the squared distances
/// of its points to its centroid, summed over clusters in index order.
///
/// Labels outside `0..centroids.len()` are ignored.
pub fn inertia(data: &[Vec<f64>], centroids: &[Vec<f64>], labels: &[usize]) -> f64 {
    let mut per_cluster = vec![0.0f64; centroids.len()];
    for (point, &c) in data.iter().zip(labels.iter()) {
        if let Some(centroid) = centroids.get(c) {
            per_cluster[c] += euclidean_dist_sq(point, centroid);
        }
    }
    per_cluster.iter().sum()
}

// ── Internals ─────────────────────────────────────────────────────────

fn validate_config(config: &KMeansConfig, n: usize) -> Result<(), ClusterError> {
    let k = config.k;
    if k == 0 || k > n {
        return Err(ClusterError::InvalidParameter {
            name: "k".into(),
            message: format!("must be between 1 and {n} (number of data points), got {k}"),
        });
    }
    if config.max_iter == 0 {
        return Err(ClusterError::InvalidParameter {
            name: "max_iter".into(),
            message: "must be at least 1".into(),
        });
    }
    if !config.tol.is_finite() || config.tol < 0.0 {
        return Err(ClusterError::InvalidParameter {
            name: "tol".into(),
            message: format!("must be a non-negative finite number, got {}", config.tol),
        });
    }
    Ok(())
}

/// Picks `k` distinct rows as the starting centroids.
fn init_centroids<R: Rng + ?Sized>(data: &[Vec<f64>], k: usize, rng: &mut R) -> Vec<Vec<f64>> {
    rand::seq::index::sample(rng, data.len(), k)
        .into_iter()
        .map(|i| data[i].clone())
        .collect()
}

/// Nearest-centroid assignment. Strict `<` keeps the lowest index on ties.
fn assign_labels(data: &[Vec<f64>], centroids: &[Vec<f64>], labels: &mut [usize]) {
    for (point, label) in data.iter().zip(labels.iter_mut()) {
        let mut min_dist = f64::INFINITY;
        let mut best_c = 0;
        for (c, centroid) in centroids.iter().enumerate() {
            let dist = euclidean_dist(point, centroid);
            if dist < min_dist {
                min_dist = dist;
                best_c = c;
            }
        }
        *label = best_c;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
