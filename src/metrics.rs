//! External validation of a clustering against reference labels.
//!
//! - **Purity**: fraction of samples carrying the majority reference label
//!   of their predicted cluster.
//! - **Rand Index**: fraction of sample pairs on which both partitions
//!   agree (together in both, or apart in both).
//! - **Adjusted Rand Index** (Hubert & Arabie, 1985): Rand Index corrected
//!   for chance agreement; 0 for independent partitions, 1 for identical
//!   ones.
//!
//! Pair statistics come from the contingency table, so no pair is ever
//! materialised: with `a` = pairs together in the prediction, `b` = pairs
//! together in the reference and `c` = pairs together in both, the
//! agreeing pairs are `c + (total − a − b + c)`.
//!
//! Cluster ids and labels only need to be comparable for equality; the two
//! vectors may use unrelated id schemes.
//!
//! # Example
//!
//! ```
//! use u_cluster::metrics::evaluate;
//!
//! let predicted = [0, 0, 1, 1, 2, 2];
//! let reference = [0, 0, 0, 1, 1, 1];
//! let scores = evaluate(&predicted, &reference).unwrap();
//!
//! assert!((scores.purity - 5.0 / 6.0).abs() < 1e-12);
//! assert!((scores.rand_index - 10.0 / 15.0).abs() < 1e-12);
//! assert!((scores.adjusted_rand_index - 0.8 / 3.3).abs() < 1e-12);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::error::ClusterError;

/// Purity, Rand Index and Adjusted Rand Index of one clustering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusteringScores {
    /// In `[1/n, 1]`; 0 for empty input.
    pub purity: f64,
    /// In `[0, 1]`.
    pub rand_index: f64,
    /// At most 1; around 0 for chance-level agreement.
    pub adjusted_rand_index: f64,
}

/// Aggregate pair counts between two partitions of the same samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairCounts {
    /// C(n, 2).
    pub total_pairs: u64,
    /// Pairs in the same predicted cluster.
    pub same_predicted: u64,
    /// Pairs sharing a reference label.
    pub same_reference: u64,
    /// Pairs together in both partitions.
    pub same_both: u64,
}

impl PairCounts {
    /// Counts pairs through the contingency table in O(n).
    ///
    /// # Errors
    ///
    /// [`ClusterError::ShapeMismatch`] if the vectors differ in length.
    pub fn from_labels<P, R>(predicted: &[P], reference: &[R]) -> Result<Self, ClusterError>
    where
        P: Eq + Hash,
        R: Eq + Hash,
    {
        check_lengths(predicted.len(), reference.len())?;

        let mut pred_sizes: HashMap<&P, u64> = HashMap::new();
        let mut ref_sizes: HashMap<&R, u64> = HashMap::new();
        let mut cells: HashMap<(&P, &R), u64> = HashMap::new();
        for (p, r) in predicted.iter().zip(reference.iter()) {
            *pred_sizes.entry(p).or_insert(0) += 1;
            *ref_sizes.entry(r).or_insert(0) += 1;
            *cells.entry((p, r)).or_insert(0) += 1;
        }

        Ok(Self {
            total_pairs: pairs(predicted.len() as u64),
            same_predicted: pred_sizes.values().map(|&s| pairs(s)).sum(),
            same_reference: ref_sizes.values().map(|&s| pairs(s)).sum(),
            same_both: cells.values().map(|&s| pairs(s)).sum(),
        })
    }

    /// Pairs on which both partitions agree.
    pub fn agreeing_pairs(&self) -> u64 {
        let apart_in_both =
            self.total_pairs + self.same_both - self.same_predicted - self.same_reference;
        self.same_both + apart_in_both
    }

    /// Rand Index. Defined as 1 when there are no pairs.
    pub fn rand_index(&self) -> f64 {
        if self.total_pairs == 0 {
            return 1.0;
        }
        self.agreeing_pairs() as f64 / self.total_pairs as f64
    }

    /// Adjusted Rand Index. Defined as 0 when its denominator is zero
    /// (e.g. both partitions put everything in one cluster).
    pub fn adjusted_rand_index(&self) -> f64 {
        if self.total_pairs == 0 {
            return 0.0;
        }
        let a = self.same_predicted as f64;
        let b = self.same_reference as f64;
        let c = self.same_both as f64;
        let expected = a * b / self.total_pairs as f64;
        let max_index = (a + b) / 2.0;
        let denom = max_index - expected;
        if denom == 0.0 {
            0.0
        } else {
            (c - expected) / denom
        }
    }
}

/// Computes purity, Rand Index and Adjusted Rand Index.
///
/// # Errors
///
/// [`ClusterError::ShapeMismatch`] if the vectors differ in length.
pub fn evaluate<P, R>(predicted: &[P], reference: &[R]) -> Result<ClusteringScores, ClusterError>
where
    P: Eq + Hash,
    R: Eq + Hash,
{
    let counts = PairCounts::from_labels(predicted, reference)?;
    Ok(ClusteringScores {
        purity: purity(predicted, reference)?,
        rand_index: counts.rand_index(),
        adjusted_rand_index: counts.adjusted_rand_index(),
    })
}

/// Sum over predicted clusters of the count of their most frequent
/// reference label, divided by n. Returns 0 for empty input.
pub fn purity<P, R>(predicted: &[P], reference: &[R]) -> Result<f64, ClusterError>
where
    P: Eq + Hash,
    R: Eq + Hash,
{
    check_lengths(predicted.len(), reference.len())?;
    let n = predicted.len();
    if n == 0 {
        return Ok(0.0);
    }

    let mut table: HashMap<&P, HashMap<&R, usize>> = HashMap::new();
    for (p, r) in predicted.iter().zip(reference.iter()) {
        *table.entry(p).or_default().entry(r).or_insert(0) += 1;
    }
    let majority_total: usize = table
        .values()
        .map(|labels| labels.values().copied().max().unwrap_or(0))
        .sum();

    Ok(majority_total as f64 / n as f64)
}

/// Rand Index of `predicted` against `reference`.
pub fn rand_index<P, R>(predicted: &[P], reference: &[R]) -> Result<f64, ClusterError>
where
    P: Eq + Hash,
    R: Eq + Hash,
{
    Ok(PairCounts::from_labels(predicted, reference)?.rand_index())
}

/// Adjusted Rand Index of `predicted` against `reference`.
pub fn adjusted_rand_index<P, R>(predicted: &[P], reference: &[R]) -> Result<f64, ClusterError>
where
    P: Eq + Hash,
    R: Eq + Hash,
{
    Ok(PairCounts::from_labels(predicted, reference)?.adjusted_rand_index())
}

// ── Cluster composition ───────────────────────────────────────────────

/// Reference-label breakdown of one predicted cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterComposition<P, R> {
    /// Predicted cluster id.
    pub cluster: P,
    /// Number of members.
    pub size: usize,
    /// Count per reference label, labels ascending.
    pub label_counts: Vec<(R, usize)>,
    /// Most frequent label; the smallest one on ties.
    pub majority_label: R,
}

impl<P, R> ClusterComposition<P, R> {
    /// Share of members carrying the majority label.
    pub fn majority_fraction(&self) -> f64 {
        let top = self.label_counts.iter().map(|&(_, c)| c).max().unwrap_or(0);
        if self.size == 0 {
            0.0
        } else {
            top as f64 / self.size as f64
        }
    }
}

/// Per-cluster reference-label distribution, clusters ascending.
///
/// ```
/// use u_cluster::metrics::cluster_composition;
///
/// let comp = cluster_composition(&[1, 0, 0, 1], &[2, 1, 1, 1]).unwrap();
/// assert_eq!(comp[0].cluster, 0);
/// assert_eq!(comp[0].label_counts, vec![(1, 2)]);
/// assert_eq!(comp[1].label_counts, vec![(1, 1), (2, 1)]);
/// assert_eq!(comp[1].majority_label, 1);
/// ```
pub fn cluster_composition<P, R>(
    predicted: &[P],
    reference: &[R],
) -> Result<Vec<ClusterComposition<P, R>>, ClusterError>
where
    P: Ord + Clone,
    R: Ord + Clone,
{
    check_lengths(predicted.len(), reference.len())?;

    let mut table: BTreeMap<&P, BTreeMap<&R, usize>> = BTreeMap::new();
    for (p, r) in predicted.iter().zip(reference.iter()) {
        *table.entry(p).or_default().entry(r).or_insert(0) += 1;
    }

    Ok(table
        .into_iter()
        .filter_map(|(cluster, labels)| {
            let mut majority: Option<(&R, usize)> = None;
            for (&label, &count) in &labels {
                if majority.is_none_or(|(_, best)| count > best) {
                    majority = Some((label, count));
                }
            }
            let (majority_label, _) = majority?;
            Some(ClusterComposition {
                cluster: cluster.clone(),
                size: labels.values().sum(),
                label_counts: labels.iter().map(|(&l, &c)| (l.clone(), c)).collect(),
                majority_label: majority_label.clone(),
            })
        })
        .collect())
}

// ── Internals ─────────────────────────────────────────────────────────

#[inline]
fn pairs(size: u64) -> u64 {
    size * size.saturating_sub(1) / 2
}

fn check_lengths(predicted: usize, reference: usize) -> Result<(), ClusterError> {
    if predicted != reference {
        return Err(ClusterError::ShapeMismatch {
            expected: predicted,
            actual: reference,
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────
