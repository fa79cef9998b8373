//! Error types for u-cluster.

use thiserror::Error;

/// All errors produced by u-cluster operations.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// A configuration value is outside its valid domain.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },
    /// A requested count lies outside the range the data can realise.
    #[error("{name} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: usize,
        min: usize,
        max: usize,
    },
    /// Two vectors that must describe the same samples differ in length.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    /// A point does not have the dimensionality of the rest of the table.
    #[error("dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Not enough samples for the requested operation.
    #[error("need at least {min_required} samples, got {actual}")]
    InsufficientData { min_required: usize, actual: usize },
    /// A sample contains NaN or an infinite value.
    #[error("row {row} contains a non-finite value")]
    NonFinite { row: usize },
    /// Dataset text could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    /// A numerical routine failed.
    #[error("{operation} failed: {detail}")]
    ComputationFailed { operation: String, detail: String },
    /// I/O error while reading a dataset.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Checks that `data` is a non-empty, rectangular table of finite values
/// and returns its dimensionality.
pub(crate) fn validate_table(data: &[Vec<f64>], min_rows: usize) -> Result<usize, ClusterError> {
    if data.len() < min_rows {
        return Err(ClusterError::InsufficientData {
            min_required: min_rows,
            actual: data.len(),
        });
    }
    let d = data.first().map_or(0, Vec::len);
    for (i, point) in data.iter().enumerate() {
        if point.len() != d {
            return Err(ClusterError::DimensionMismatch {
                expected: d,
                actual: point.len(),
            });
        }
        if point.iter().any(|v| !v.is_finite()) {
            return Err(ClusterError::NonFinite { row: i });
        }
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = ClusterError::OutOfRange {
            name: "n_clusters".into(),
            value: 7,
            min: 1,
            max: 5,
        };
        assert_eq!(e.to_string(), "n_clusters = 7 is out of range [1, 5]");

        let e = ClusterError::ShapeMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(e.to_string(), "shape mismatch: expected 3 elements, got 2");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "seeds.txt");
        let e: ClusterError = io.into();
        assert!(matches!(e, ClusterError::Io(_)));
    }

    #[test]
    fn validate_table_rejects_ragged_and_nan() {
        assert!(matches!(
            validate_table(&[], 1),
            Err(ClusterError::InsufficientData { .. })
        ));
        assert!(matches!(
            validate_table(&[vec![1.0, 2.0], vec![3.0]], 1),
            Err(ClusterError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            validate_table(&[vec![1.0], vec![f64::NAN]], 1),
            Err(ClusterError::NonFinite { row: 1 })
        ));
        assert_eq!(validate_table(&[vec![1.0, 2.0]], 1).unwrap(), 2);
    }
}
