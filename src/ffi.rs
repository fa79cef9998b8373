//! C FFI bindings for u-cluster.
//!
//! Exposes K-Means, hierarchical clustering and label evaluation through a
//! C-compatible interface.
//!
//! - **`#[repr(C)]`** result structs filled through out-pointers
//! - **Integer error codes**: 0 = success, negative = error
//! - **Thread-local error message**: `cluster_last_error()`
//! - **`catch_unwind`** around every entry point
//!
//! Arrays returned inside result structs are owned by the caller and must
//! be released with `cluster_free_labels` / `cluster_free_f64_array`.
//!
//! # Safety
//!
//! Null pointer arguments return error code -1.

use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::panic;
use std::ptr;
use std::slice;

use crate::error::ClusterError;
use crate::hierarchical::{hierarchical, HierarchicalConfig, Linkage};
use crate::kmeans::{kmeans, KMeansConfig};
use crate::metrics::evaluate;

// ── Error handling ────────────────────────────────────────────────────

/// Error codes returned by FFI functions.
pub const CLUSTER_OK: i32 = 0;
pub const CLUSTER_ERR_NULL_PTR: i32 = -1;
pub const CLUSTER_ERR_INVALID_INPUT: i32 = -2;
pub const CLUSTER_ERR_COMPUTATION_FAILED: i32 = -4;
pub const CLUSTER_ERR_PANIC: i32 = -99;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = CString::new(msg).ok();
    });
}

fn error_code(err: &ClusterError) -> i32 {
    match err {
        ClusterError::ComputationFailed { .. } | ClusterError::Io(_) => {
            CLUSTER_ERR_COMPUTATION_FAILED
        }
        _ => CLUSTER_ERR_INVALID_INPUT,
    }
}

fn fail(context: &str, err: &ClusterError) -> i32 {
    set_last_error(&format!("{context}: {err}"));
    error_code(err)
}

/// Returns the last error message, or null if no error.
/// The returned string is valid until the next FFI call on this thread.
///
/// # Safety
/// The caller must not free the returned pointer.
#[no_mangle]
pub extern "C" fn cluster_last_error() -> *const c_char {
    LAST_ERROR.with(|cell| {
        let borrow = cell.borrow();
        match borrow.as_ref() {
            Some(cstr) => cstr.as_ptr(),
            None => ptr::null(),
        }
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn cluster_clear_error() {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = None;
    });
}

// ── Buffers ───────────────────────────────────────────────────────────

/// Copies `n_rows * n_cols` row-major values into a sample table.
///
/// # Safety
/// `data` must be non-null and point to at least `n_rows * n_cols` values.
unsafe fn read_rows(data: *const f64, n_rows: u32, n_cols: u32) -> Result<Vec<Vec<f64>>, i32> {
    let n = n_rows as usize;
    let d = n_cols as usize;
    let Some(len) = n.checked_mul(d) else {
        set_last_error("n_rows * n_cols overflows");
        return Err(CLUSTER_ERR_INVALID_INPUT);
    };
    let raw = unsafe { slice::from_raw_parts(data, len) };
    if d == 0 {
        return Ok(vec![Vec::new(); n]);
    }
    Ok(raw.chunks_exact(d).map(<[f64]>::to_vec).collect())
}

/// Hands a vector to the caller as a pointer/length pair.
fn into_raw<T>(values: Vec<T>) -> (*mut T, u32) {
    let len = values.len() as u32;
    let ptr = Box::into_raw(values.into_boxed_slice()) as *mut T;
    (ptr, len)
}

// ── K-Means FFI ──────────────────────────────────────────────────────

/// C-compatible K-Means result.
#[repr(C)]
pub struct CKMeansResult {
    /// Number of clusters.
    pub k: u32,
    /// Within-cluster sum of squares.
    pub inertia: f64,
    /// Number of iterations.
    pub iterations: u32,
    /// 1 if the centroids converged before the iteration limit.
    pub converged: i32,
    /// Cluster labels (length = n_rows). Caller must free with `cluster_free_labels`.
    pub labels: *mut u32,
    /// Number of labels.
    pub n_labels: u32,
}

/// Runs K-Means on row-major data with the default iteration limit and
/// tolerance.
///
/// # Safety
/// - `data` must point to `n_rows * n_cols` contiguous f64 values (row-major).
/// - `out` must point to a valid `CKMeansResult`.
/// - The caller must free `out.labels` with `cluster_free_labels`.
#[no_mangle]
pub unsafe extern "C" fn cluster_kmeans(
    data: *const f64,
    n_rows: u32,
    n_cols: u32,
    k: u32,
    seed: u64,
    out: *mut CKMeansResult,
) -> i32 {
    let result = panic::catch_unwind(|| {
        if data.is_null() || out.is_null() {
            set_last_error("null pointer");
            return CLUSTER_ERR_NULL_PTR;
        }

        let points = match unsafe { read_rows(data, n_rows, n_cols) } {
            Ok(p) => p,
            Err(code) => return code,
        };

        let config = KMeansConfig::new(k as usize).seed(seed);
        let km = match kmeans(&points, &config) {
            Ok(r) => r,
            Err(e) => return fail("kmeans error", &e),
        };

        let (labels_ptr, labels_len) =
            into_raw(km.labels.iter().map(|&l| l as u32).collect::<Vec<u32>>());

        unsafe {
            (*out) = CKMeansResult {
                k: km.k as u32,
                inertia: km.inertia,
                iterations: km.iterations as u32,
                converged: i32::from(km.converged),
                labels: labels_ptr,
                n_labels: labels_len,
            };
        }

        CLUSTER_OK
    });

    match result {
        Ok(code) => code,
        Err(_) => {
            set_last_error("panic in cluster_kmeans");
            CLUSTER_ERR_PANIC
        }
    }
}

/// Frees a labels array allocated by `cluster_kmeans` or `cluster_hierarchical`.
///
/// # Safety
/// `labels` must have been allocated by a u-cluster FFI function, or be null.
#[no_mangle]
pub unsafe extern "C" fn cluster_free_labels(labels: *mut u32, count: u32) {
    if !labels.is_null() {
        let _ = unsafe { Vec::from_raw_parts(labels, count as usize, count as usize) };
    }
}

/// Frees an f64 array allocated by a u-cluster FFI function.
///
/// # Safety
/// `ptr` must have been allocated by a u-cluster FFI function, or be null.
#[no_mangle]
pub unsafe extern "C" fn cluster_free_f64_array(ptr: *mut f64, count: u32) {
    if !ptr.is_null() {
        let _ = unsafe { Vec::from_raw_parts(ptr, count as usize, count as usize) };
    }
}

// ── Hierarchical Clustering FFI ──────────────────────────────────────

/// C-compatible hierarchical clustering result.
#[repr(C)]
pub struct CHierarchicalResult {
    /// Number of flat clusters (0 if no cut was requested).
    pub n_clusters: u32,
    /// Flat cluster labels (length = n_rows), null if no cut was requested.
    /// Caller must free with `cluster_free_labels`.
    pub labels: *mut u32,
    /// Number of labels.
    pub n_labels: u32,
    /// Number of merges in the dendrogram (n_rows - 1).
    pub n_merges: u32,
    /// Merge distances in merge order (length = n_merges).
    /// Caller must free with `cluster_free_f64_array`.
    pub merge_distances: *mut f64,
}

/// Runs agglomerative clustering on row-major data.
///
/// # Parameters
///
/// - `linkage`: 0 = Single, 1 = Complete, 2 = Average.
/// - `n_clusters`: Desired number of flat clusters (0 = no cut).
///
/// # Safety
/// - `data` must point to `n_rows * n_cols` contiguous f64 values.
/// - `out` must point to a valid `CHierarchicalResult`.
/// - Caller must free output arrays with the matching free functions.
#[no_mangle]
pub unsafe extern "C" fn cluster_hierarchical(
    data: *const f64,
    n_rows: u32,
    n_cols: u32,
    linkage: u32,
    n_clusters: u32,
    out: *mut CHierarchicalResult,
) -> i32 {
    let result = panic::catch_unwind(|| {
        if data.is_null() || out.is_null() {
            set_last_error("null pointer");
            return CLUSTER_ERR_NULL_PTR;
        }

        let linkage = match linkage {
            0 => Linkage::Single,
            1 => Linkage::Complete,
            2 => Linkage::Average,
            other => {
                set_last_error(&format!("unknown linkage code {other}"));
                return CLUSTER_ERR_INVALID_INPUT;
            }
        };

        let points = match unsafe { read_rows(data, n_rows, n_cols) } {
            Ok(p) => p,
            Err(code) => return code,
        };

        let dendrogram = match hierarchical(&points, &HierarchicalConfig::new(linkage)) {
            Ok(d) => d,
            Err(e) => return fail("hierarchical error", &e),
        };

        let (labels_ptr, labels_len) = if n_clusters > 0 {
            match dendrogram.cut(n_clusters as usize) {
                Ok(labels) => into_raw(labels.iter().map(|&l| l as u32).collect::<Vec<u32>>()),
                Err(e) => return fail("cut error", &e),
            }
        } else {
            (ptr::null_mut(), 0)
        };

        let (dist_ptr, n_merges) =
            into_raw(dendrogram.merges().iter().map(|m| m.distance).collect::<Vec<f64>>());

        unsafe {
            (*out) = CHierarchicalResult {
                n_clusters,
                labels: labels_ptr,
                n_labels: labels_len,
                n_merges,
                merge_distances: dist_ptr,
            };
        }

        CLUSTER_OK
    });

    match result {
        Ok(code) => code,
        Err(_) => {
            set_last_error("panic in cluster_hierarchical");
            CLUSTER_ERR_PANIC
        }
    }
}

// ── Evaluation FFI ───────────────────────────────────────────────────

/// C-compatible clustering scores.
#[repr(C)]
pub struct CEvaluation {
    /// Fraction of samples in their cluster's majority class.
    pub purity: f64,
    /// Fraction of sample pairs on which both labelings agree.
    pub rand_index: f64,
    /// Chance-corrected Rand Index.
    pub adjusted_rand_index: f64,
}

/// Scores predicted cluster labels against reference labels.
///
/// # Safety
/// - `predicted` and `reference` must each point to `n` values.
/// - `out` must point to a valid `CEvaluation`.
#[no_mangle]
pub unsafe extern "C" fn cluster_evaluate(
    predicted: *const u32,
    reference: *const i64,
    n: u32,
    out: *mut CEvaluation,
) -> i32 {
    let result = panic::catch_unwind(|| {
        if predicted.is_null() || reference.is_null() || out.is_null() {
            set_last_error("null pointer");
            return CLUSTER_ERR_NULL_PTR;
        }

        let predicted = unsafe { slice::from_raw_parts(predicted, n as usize) };
        let reference = unsafe { slice::from_raw_parts(reference, n as usize) };

        let scores = match evaluate(predicted, reference) {
            Ok(s) => s,
            Err(e) => return fail("evaluation error", &e),
        };

        unsafe {
            (*out) = CEvaluation {
                purity: scores.purity,
                rand_index: scores.rand_index,
                adjusted_rand_index: scores.adjusted_rand_index,
            };
        }

        CLUSTER_OK
    });

    match result {
        Ok(code) => code,
        Err(_) => {
            set_last_error("panic in cluster_evaluate");
            CLUSTER_ERR_PANIC
        }
    }
}

// ── Version ──────────────────────────────────────────────────────────

/// Returns the version string of u-cluster.
///
/// # Safety
/// The returned string is a static string literal. Do not free it.
#[no_mangle]
pub extern "C" fn cluster_version() -> *const c_char {
    c"0.1.0".as_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    fn empty_kmeans_result() -> CKMeansResult {
        CKMeansResult {
            k: 0,
            inertia: 0.0,
            iterations: 0,
            converged: 0,
            labels: ptr::null_mut(),
            n_labels: 0,
        }
    }

    fn empty_hierarchical_result() -> CHierarchicalResult {
        CHierarchicalResult {
            n_clusters: 0,
            labels: ptr::null_mut(),
            n_labels: 0,
            n_merges: 0,
            merge_distances: ptr::null_mut(),
        }
    }

    #[test]
    fn ffi_version() {
        let v = cluster_version();
        let s = unsafe { CStr::from_ptr(v) }.to_str().unwrap();
        assert_eq!(s, "0.1.0");
    }

    #[test]
    fn ffi_error_lifecycle() {
        cluster_clear_error();
        assert!(cluster_last_error().is_null());

        set_last_error("test error");
        let msg = unsafe { CStr::from_ptr(cluster_last_error()) }
            .to_str()
            .unwrap();
        assert_eq!(msg, "test error");

        cluster_clear_error();
        assert!(cluster_last_error().is_null());
    }

    // ── K-Means ──

    #[test]
    fn ffi_kmeans_basic() {
        // 4 points, 2D, 2 clusters
        let data: Vec<f64> = vec![0.0, 0.0, 0.5, 0.5, 10.0, 10.0, 10.5, 10.5];
        let mut result = empty_kmeans_result();

        let rc = unsafe { cluster_kmeans(data.as_ptr(), 4, 2, 2, 42, &mut result) };
        assert_eq!(rc, CLUSTER_OK);
        assert_eq!(result.k, 2);
        assert_eq!(result.n_labels, 4);
        assert_eq!(result.converged, 1);

        let labels = unsafe { slice::from_raw_parts(result.labels, result.n_labels as usize) };
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
        assert!((result.inertia - 0.5).abs() < 1e-12);

        unsafe { cluster_free_labels(result.labels, result.n_labels) };
    }

    #[test]
    fn ffi_kmeans_invalid_k() {
        let data: Vec<f64> = vec![0.0, 1.0, 2.0];
        let mut result = empty_kmeans_result();
        let rc = unsafe { cluster_kmeans(data.as_ptr(), 3, 1, 5, 42, &mut result) };
        assert_eq!(rc, CLUSTER_ERR_INVALID_INPUT);
        assert!(!cluster_last_error().is_null());
        assert!(result.labels.is_null());
    }

    #[test]
    fn ffi_kmeans_null_ptr() {
        let mut result = empty_kmeans_result();
        let rc = unsafe { cluster_kmeans(ptr::null(), 4, 2, 2, 42, &mut result) };
        assert_eq!(rc, CLUSTER_ERR_NULL_PTR);

        let data = [0.0; 4];
        let rc = unsafe { cluster_kmeans(data.as_ptr(), 2, 2, 1, 42, ptr::null_mut()) };
        assert_eq!(rc, CLUSTER_ERR_NULL_PTR);
    }

    // ── Hierarchical ──

    #[test]
    fn ffi_hierarchical_with_cut() {
        let data: Vec<f64> = vec![0.0, 1.0, 10.0, 11.0];
        let mut result = empty_hierarchical_result();

        let rc = unsafe { cluster_hierarchical(data.as_ptr(), 4, 1, 0, 2, &mut result) };
        assert_eq!(rc, CLUSTER_OK);
        assert_eq!(result.n_clusters, 2);
        assert_eq!(result.n_merges, 3);

        let labels = unsafe { slice::from_raw_parts(result.labels, result.n_labels as usize) };
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);

        let distances =
            unsafe { slice::from_raw_parts(result.merge_distances, result.n_merges as usize) };
        assert_eq!(distances, &[1.0, 1.0, 9.0]);

        unsafe {
            cluster_free_labels(result.labels, result.n_labels);
            cluster_free_f64_array(result.merge_distances, result.n_merges);
        }
    }

    #[test]
    fn ffi_hierarchical_without_cut() {
        let data: Vec<f64> = vec![0.0, 1.0, 10.0, 11.0];
        let mut result = empty_hierarchical_result();

        let rc = unsafe { cluster_hierarchical(data.as_ptr(), 4, 1, 1, 0, &mut result) };
        assert_eq!(rc, CLUSTER_OK);
        assert!(result.labels.is_null());
        assert_eq!(result.n_labels, 0);

        let distances =
            unsafe { slice::from_raw_parts(result.merge_distances, result.n_merges as usize) };
        assert_eq!(distances[2], 11.0);

        unsafe { cluster_free_f64_array(result.merge_distances, result.n_merges) };
    }

    #[test]
    fn ffi_hierarchical_errors() {
        let data: Vec<f64> = vec![0.0, 1.0, 10.0];
        let mut result = empty_hierarchical_result();

        let rc = unsafe { cluster_hierarchical(data.as_ptr(), 3, 1, 7, 2, &mut result) };
        assert_eq!(rc, CLUSTER_ERR_INVALID_INPUT);

        let rc = unsafe { cluster_hierarchical(data.as_ptr(), 3, 1, 2, 4, &mut result) };
        assert_eq!(rc, CLUSTER_ERR_INVALID_INPUT);

        let rc = unsafe { cluster_hierarchical(ptr::null(), 3, 1, 2, 2, &mut result) };
        assert_eq!(rc, CLUSTER_ERR_NULL_PTR);
    }

    // ── Evaluation ──

    #[test]
    fn ffi_evaluate() {
        let predicted: Vec<u32> = vec![0, 0, 1, 1, 2, 2];
        let reference: Vec<i64> = vec![0, 0, 0, 1, 1, 1];
        let mut out = CEvaluation {
            purity: 0.0,
            rand_index: 0.0,
            adjusted_rand_index: 0.0,
        };

        let rc = unsafe { cluster_evaluate(predicted.as_ptr(), reference.as_ptr(), 6, &mut out) };
        assert_eq!(rc, CLUSTER_OK);
        assert!((out.purity - 5.0 / 6.0).abs() < 1e-12);
        assert!((out.rand_index - 10.0 / 15.0).abs() < 1e-12);
        assert!((out.adjusted_rand_index - 0.24242424242424243).abs() < 1e-12);
    }

    #[test]
    fn ffi_evaluate_null_ptr() {
        let reference: Vec<i64> = vec![0, 1];
        let mut out = CEvaluation {
            purity: 0.0,
            rand_index: 0.0,
            adjusted_rand_index: 0.0,
        };
        let rc = unsafe { cluster_evaluate(ptr::null(), reference.as_ptr(), 2, &mut out) };
        assert_eq!(rc, CLUSTER_ERR_NULL_PTR);
    }

    #[test]
    fn ffi_free_null_is_noop() {
        unsafe {
            cluster_free_labels(ptr::null_mut(), 0);
            cluster_free_f64_array(ptr::null_mut(), 0);
        }
    }
}
