//! # u-cluster
//!
//! K-Means and agglomerative hierarchical clustering with external
//! evaluation, plus C FFI bindings.
//!
//! Samples are rows of `f64` features (`&[Vec<f64>]`). Both engines are
//! deterministic: K-Means draws its initial centroids from a seeded
//! ChaCha RNG, and the hierarchical engine breaks distance ties by a
//! fixed scan order.
//!
//! ## Modules
//!
//! - [`distance`] — Euclidean distance and the pairwise distance matrix
//! - [`kmeans`] — Lloyd's K-Means with random-sample initialization
//! - [`hierarchical`] — Agglomerative clustering (single, complete, average linkage)
//! - [`dendrogram`] — Cluster history and flat cuts
//! - [`metrics`] — Purity, Rand Index, Adjusted Rand Index, per-cluster composition
//! - [`dataset`] — Seeds-format loader and z-score standardization
//! - [`projection`] — PCA projection to two dimensions for plotting
//! - [`sweep`] — K-Means scores across a range of k
//! - [`ffi`] — C FFI bindings (auto-generated C header via cbindgen)
//! - [`error`] — Error types
//!
//! ## Quick Start
//!
//! ```
//! use u_cluster::hierarchical::{hierarchical, HierarchicalConfig, Linkage};
//! use u_cluster::kmeans::{kmeans, KMeansConfig};
//! use u_cluster::metrics::evaluate;
//!
//! let data = vec![
//!     vec![1.0, 1.0], vec![1.2, 0.8], vec![0.9, 1.1],
//!     vec![8.0, 8.0], vec![8.1, 7.9], vec![7.9, 8.2],
//! ];
//! let reference = [1, 1, 1, 2, 2, 2];
//!
//! let km = kmeans(&data, &KMeansConfig::new(2)).unwrap();
//! let scores = evaluate(&km.labels, &reference).unwrap();
//! assert_eq!(scores.adjusted_rand_index, 1.0);
//!
//! let tree = hierarchical(&data, &HierarchicalConfig::new(Linkage::Average)).unwrap();
//! let labels = tree.cut(2).unwrap();
//! assert_eq!(evaluate(&labels, &reference).unwrap().purity, 1.0);
//! ```

pub mod dataset;
pub mod dendrogram;
pub mod distance;
pub mod error;
pub mod ffi;
pub mod hierarchical;
pub mod kmeans;
pub mod metrics;
pub mod projection;
pub mod sweep;
