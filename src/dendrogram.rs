//! Cluster history produced by agglomerative merging, and flat cuts of it.
//!
//! A [`ClusterHistory`] over n samples holds n snapshots: snapshot `p` is
//! the partition after `p` merges and contains exactly `n − p` clusters.
//! Cutting to `k` clusters therefore always selects snapshot `n − k`.
//!
//! ```
//! use u_cluster::hierarchical::{hierarchical, HierarchicalConfig, Linkage};
//!
//! let data = vec![vec![0.0], vec![1.0], vec![10.0], vec![11.0]];
//! let dendrogram = hierarchical(&data, &HierarchicalConfig::new(Linkage::Single)).unwrap();
//!
//! let labels = u_cluster::dendrogram::cut(dendrogram.history(), 2).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_eq!(labels[2], labels[3]);
//! assert_ne!(labels[0], labels[2]);
//! ```

use crate::error::ClusterError;

/// One partition of the sample indices: every index appears in exactly
/// one inner vector.
pub type Snapshot = Vec<Vec<usize>>;

/// Ordered partitions, one before any merge and one after each merge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusterHistory {
    snapshots: Vec<Snapshot>,
}

impl ClusterHistory {
    /// Starts a history at `n` singleton clusters.
    pub(crate) fn singletons(n: usize) -> Self {
        Self {
            snapshots: vec![(0..n).map(|i| vec![i]).collect()],
        }
    }

    pub(crate) fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    /// Number of snapshots (equals the number of samples).
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// True for the history of an empty table.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Number of samples partitioned by every snapshot.
    pub fn n_samples(&self) -> usize {
        self.snapshots.first().map_or(0, Vec::len)
    }

    /// Snapshot after `merges` merge steps.
    pub fn snapshot(&self, merges: usize) -> Option<&Snapshot> {
        self.snapshots.get(merges)
    }

    /// Iterates snapshots from all-singletons to a single cluster.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    /// Per-sample cluster ids for the snapshot with `n_clusters` clusters.
    pub fn cut(&self, n_clusters: usize) -> Result<Vec<usize>, ClusterError> {
        cut(self, n_clusters)
    }
}

/// Maps every sample to the position of its cluster within the snapshot
/// that has exactly `n_clusters` clusters.
///
/// Cluster ids are positions in that snapshot and carry no meaning across
/// different cuts or runs.
///
/// # Errors
///
/// [`ClusterError::OutOfRange`] if `n_clusters` is not in `1..=n`.
pub fn cut(history: &ClusterHistory, n_clusters: usize) -> Result<Vec<usize>, ClusterError> {
    let n = history.n_samples();
    if n_clusters < 1 || n_clusters > n {
        return Err(ClusterError::OutOfRange {
            name: "n_clusters".into(),
            value: n_clusters,
            min: 1,
            max: n,
        });
    }

    let snapshot = history
        .snapshot(n - n_clusters)
        .ok_or_else(|| ClusterError::OutOfRange {
            name: "n_clusters".into(),
            value: n_clusters,
            min: n + 1 - history.len(),
            max: n,
        })?;
    Ok(assignment(snapshot, n))
}

/// Flattens a snapshot into a length-`n` assignment vector.
pub(crate) fn assignment(snapshot: &Snapshot, n: usize) -> Vec<usize> {
    let mut labels = vec![0usize; n];
    for (cluster_id, members) in snapshot.iter().enumerate() {
        for &idx in members {
            labels[idx] = cluster_id;
        }
    }
    labels
}
