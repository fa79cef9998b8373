//! Agglomerative hierarchical clustering with single, complete or average
//! linkage.
//!
//! Starting from one singleton cluster per sample, the closest pair of
//! active clusters is merged until one cluster remains. Every merge is
//! recorded as a [`MergeRecord`] and the full partition after each merge
//! is kept in a [`ClusterHistory`], so any cluster count can be cut out
//! afterwards.
//!
//! Active clusters live in an arena addressed by stable ids; the active
//! list keeps them in canonical order (survivors in their previous order,
//! the newly merged cluster appended). Pairs are scanned in ascending
//! position order and the first pair at the minimum distance wins.
//!
//! Linkage distances between surviving clusters never change, so they are
//! computed once and cached. Each step only evaluates the new cluster
//! against the survivors, with the same operand order a full rescan would
//! use, which keeps the results bit-identical to the naive O(n³) scan.
//!
//! # Example
//!
//! ```
//! use u_cluster::hierarchical::{hierarchical, HierarchicalConfig, Linkage};
//!
//! let data = vec![
//!     vec![0.0, 0.0], vec![0.5, 0.5], vec![0.2, 0.3],
//!     vec![10.0, 10.0], vec![10.5, 10.5], vec![10.2, 10.3],
//! ];
//! let dendrogram = hierarchical(&data, &HierarchicalConfig::new(Linkage::Average)).unwrap();
//!
//! assert_eq!(dendrogram.merges().len(), 5);
//! assert_eq!(dendrogram.history().len(), 6);
//!
//! let labels = dendrogram.cut(2).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_eq!(labels[3], labels[4]);
//! assert_ne!(labels[0], labels[3]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::dendrogram::{self, ClusterHistory};
use crate::distance::DistanceMatrix;
use crate::error::{validate_table, ClusterError};

/// Merge steps between progress log lines.
const PROGRESS_EVERY: usize = 20;

// ── Linkage ───────────────────────────────────────────────────────────

/// Rule for the distance between two clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Linkage {
    /// Minimum distance between any pair of points across clusters.
    /// Tends to produce elongated "chaining" clusters.
    Single,
    /// Maximum distance between any pair of points across clusters.
    Complete,
    /// Mean of all cross-cluster pairwise distances (UPGMA).
    #[default]
    Average,
}

impl Linkage {
    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Complete => "complete",
            Self::Average => "average",
        }
    }

    /// Linkage distance between clusters `a` and `b`.
    ///
    /// The clusters must be disjoint sets of row indices into `dist`.
    /// Returns `f64::INFINITY` for single linkage and `0.0` otherwise when
    /// either cluster is empty.
    pub fn distance(self, a: &[usize], b: &[usize], dist: &DistanceMatrix) -> f64 {
        match self {
            Self::Single => {
                let mut min_dist = f64::INFINITY;
                for &i in a {
                    for &j in b {
                        let d = dist.get(i, j);
                        if d < min_dist {
                            min_dist = d;
                        }
                    }
                }
                min_dist
            }
            Self::Complete => {
                let mut max_dist = 0.0;
                for &i in a {
                    for &j in b {
                        let d = dist.get(i, j);
                        if d > max_dist {
                            max_dist = d;
                        }
                    }
                }
                max_dist
            }
            Self::Average => {
                let mut total = 0.0;
                for &i in a {
                    for &j in b {
                        total += dist.get(i, j);
                    }
                }
                let count = a.len() * b.len();
                if count == 0 {
                    0.0
                } else {
                    total / count as f64
                }
            }
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Linkage {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "complete" => Ok(Self::Complete),
            "average" => Ok(Self::Average),
            _ => Err(ClusterError::InvalidParameter {
                name: "linkage".into(),
                message: format!("unknown linkage '{s}', expected single, complete or average"),
            }),
        }
    }
}

// ── Configuration & result ────────────────────────────────────────────

/// Configuration for hierarchical agglomerative clustering.
#[derive(Debug, Clone, Default)]
pub struct HierarchicalConfig {
    /// Linkage criterion. Default: [`Linkage::Average`].
    pub linkage: Linkage,
}

impl HierarchicalConfig {
    /// Creates a config using `linkage`.
    pub fn new(linkage: Linkage) -> Self {
        Self { linkage }
    }

    /// Sets the linkage criterion.
    pub fn linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }
}

/// A single merge step in the dendrogram.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRecord {
    /// 0-based merge step.
    pub step: usize,
    /// Members of the earlier cluster in canonical order.
    pub left: Vec<usize>,
    /// Members of the later cluster.
    pub right: Vec<usize>,
    /// Linkage distance that selected this pair.
    pub distance: f64,
    /// `left` followed by `right`.
    pub merged: Vec<usize>,
}

impl MergeRecord {
    /// Size of the newly formed cluster.
    pub fn size(&self) -> usize {
        self.merged.len()
    }
}

/// Merge log and cluster history of one agglomerative run.
#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    linkage: Linkage,
    merges: Vec<MergeRecord>,
    history: ClusterHistory,
}

impl Dendrogram {
    /// Linkage used to build this dendrogram.
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Merge log, in merge order. Length = n − 1.
    pub fn merges(&self) -> &[MergeRecord] {
        &self.merges
    }

    /// Partitions before and after every merge. Length = n.
    pub fn history(&self) -> &ClusterHistory {
        &self.history
    }

    /// Number of clustered samples.
    pub fn n_samples(&self) -> usize {
        self.history.n_samples()
    }

    /// Flat assignment with exactly `n_clusters` clusters.
    ///
    /// See [`dendrogram::cut`].
    pub fn cut(&self, n_clusters: usize) -> Result<Vec<usize>, ClusterError> {
        dendrogram::cut(&self.history, n_clusters)
    }

    /// Flat assignment after every merge whose distance is at most
    /// `threshold`, stopping at the first merge above it.
    ///
    /// ```
    /// use u_cluster::hierarchical::{hierarchical, HierarchicalConfig, Linkage};
    ///
    /// let data = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0]];
    /// let dendrogram = hierarchical(&data, &HierarchicalConfig::new(Linkage::Single)).unwrap();
    /// let labels = dendrogram.cut_at_distance(2.0).unwrap();
    /// assert_eq!(labels, dendrogram.cut(2).unwrap());
    /// ```
    ///
    /// # Errors
    ///
    /// [`ClusterError::InvalidParameter`] if `threshold` is negative or not finite.
    pub fn cut_at_distance(&self, threshold: f64) -> Result<Vec<usize>, ClusterError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ClusterError::InvalidParameter {
                name: "threshold".into(),
                message: format!("must be a non-negative finite number, got {threshold}"),
            });
        }
        let applied = self
            .merges
            .iter()
            .take_while(|m| m.distance <= threshold)
            .count();
        let n = self.n_samples();
        Ok(self
            .history
            .snapshot(applied)
            .map(|s| dendrogram::assignment(s, n))
            .unwrap_or_default())
    }

    /// Splits into the merge log and the cluster history.
    pub fn into_parts(self) -> (Vec<MergeRecord>, ClusterHistory) {
        (self.merges, self.history)
    }
}

// ── Algorithm ─────────────────────────────────────────────────────────

/// Performs agglomerative clustering on `data`.
///
/// # Complexity
///
/// Time: O(n³) worst case for the pair scan, each linkage evaluated once
/// per cluster pair. Space: O(n²) for the distance matrix and history.
///
/// # Errors
///
/// - [`ClusterError::InsufficientData`] if `data` is empty
/// - [`ClusterError::DimensionMismatch`] / [`ClusterError::NonFinite`]
///   for a malformed table
pub fn hierarchical(
    data: &[Vec<f64>],
    config: &HierarchicalConfig,
) -> Result<Dendrogram, ClusterError> {
    validate_table(data, 1)?;
    debug!("hierarchical: computing distance matrix for {} points", data.len());
    let dist = DistanceMatrix::from_validated(data);
    hierarchical_from_matrix(&dist, config)
}

/// Performs agglomerative clustering on a precomputed distance matrix.
///
/// # Errors
///
/// [`ClusterError::InsufficientData`] if the matrix is empty.
pub fn hierarchical_from_matrix(
    dist: &DistanceMatrix,
    config: &HierarchicalConfig,
) -> Result<Dendrogram, ClusterError> {
    let n = dist.len();
    if n == 0 {
        return Err(ClusterError::InsufficientData {
            min_required: 1,
            actual: 0,
        });
    }
    let linkage = config.linkage;
    debug!("hierarchical: starting {linkage} linkage on {n} points");

    // Arena of clusters by stable id; `active` holds ids in canonical order.
    let mut arena: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    let mut active: Vec<usize> = (0..n).collect();
    // Linkage by (earlier id, later id) in canonical order.
    let mut cache: HashMap<(usize, usize), f64> = HashMap::new();
    for (pi, &a) in active.iter().enumerate() {
        for &b in &active[pi + 1..] {
            cache.insert((a, b), linkage.distance(&arena[a], &arena[b], dist));
        }
    }

    let mut merges = Vec::with_capacity(n - 1);
    let mut history = ClusterHistory::singletons(n);

    while active.len() > 1 {
        let step = merges.len();

        // Seeded from the first pair so that a step where every linkage is
        // +inf (distances beyond f64::MAX) still follows the tie rule.
        let mut best: Option<(f64, usize, usize)> = None;
        for pi in 0..active.len() {
            for pj in (pi + 1)..active.len() {
                let d = cache[&(active[pi], active[pj])];
                if best.is_none_or(|(best_d, _, _)| d < best_d) {
                    best = Some((d, pi, pj));
                }
            }
        }
        let Some((best_d, pi, pj)) = best else {
            break;
        };
        let left_id = active[pi];
        let right_id = active[pj];
        let mut merged = arena[left_id].clone();
        merged.extend_from_slice(&arena[right_id]);

        active.remove(pj);
        active.remove(pi);
        for &other in &active {
            cache.remove(&(other.min(left_id), other.max(left_id)));
            cache.remove(&(other.min(right_id), other.max(right_id)));
        }
        cache.remove(&(left_id, right_id));

        let merged_id = arena.len();
        for &other in &active {
            cache.insert(
                (other, merged_id),
                linkage.distance(&arena[other], &merged, dist),
            );
        }
        arena.push(merged.clone());
        active.push(merged_id);

        merges.push(MergeRecord {
            step,
            left: std::mem::take(&mut arena[left_id]),
            right: std::mem::take(&mut arena[right_id]),
            distance: best_d,
            merged,
        });
        history.push(active.iter().map(|&id| arena[id].clone()).collect());

        if (step + 1) % PROGRESS_EVERY == 0 {
            debug!(
                "hierarchical: step {}: {} clusters remaining",
                step + 1,
                active.len()
            );
        }
    }

    debug!("hierarchical: complete after {} merges", merges.len());

    Ok(Dendrogram {
        linkage,
        merges,
        history,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────
