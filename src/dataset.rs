//! Seeds-style labelled dataset loading and feature standardization.
//!
//! The input is plain text, one sample per line: `n_features` numeric
//! fields followed by an integer class label, separated by tabs. Runs of
//! delimiters collapse (empty fields are dropped) and lines with too few
//! fields are skipped, which tolerates the ragged tab alignment of the
//! UCI Seeds file.
//!
//! # Example
//!
//! ```
//! use u_cluster::dataset::{standardize, SeedsReader};
//!
//! let text = "1.0\t2.0\t1\n3.0\t\t6.0\t2\n\n";
//! let ds = SeedsReader::new().n_features(2).parse_str(text).unwrap();
//! assert_eq!(ds.n_samples(), 2);
//! assert_eq!(ds.labels, vec![1, 2]);
//!
//! let z = standardize(&ds.features).unwrap();
//! assert_eq!(z.data[0], vec![-1.0, -1.0]);
//! assert_eq!(z.data[1], vec![1.0, 1.0]);
//! ```

use std::path::Path;

use log::debug;

use crate::error::{validate_table, ClusterError};

/// Feature columns in the UCI Seeds dataset.
pub const SEEDS_FEATURES: usize = 7;

/// Standard deviation below which a feature is treated as constant.
const MIN_STD: f64 = 1e-12;

/// Reader configuration for labelled delimited text.
#[derive(Debug, Clone)]
pub struct SeedsReader {
    delimiter: char,
    n_features: usize,
}

impl Default for SeedsReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedsReader {
    /// Tab-delimited, seven features, trailing label.
    pub fn new() -> Self {
        Self {
            delimiter: '\t',
            n_features: SEEDS_FEATURES,
        }
    }

    /// Sets the field delimiter (default: tab).
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the number of leading feature columns (default: 7).
    pub fn n_features(mut self, n_features: usize) -> Self {
        self.n_features = n_features;
        self
    }

    /// Parses dataset text.
    ///
    /// # Errors
    ///
    /// - [`ClusterError::InvalidParameter`] if `n_features` is zero
    /// - [`ClusterError::Parse`] for a non-numeric feature or non-integer
    ///   label (line numbers are 1-based)
    pub fn parse_str(&self, input: &str) -> Result<Dataset, ClusterError> {
        if self.n_features == 0 {
            return Err(ClusterError::InvalidParameter {
                name: "n_features".into(),
                message: "must be at least 1".into(),
            });
        }

        let mut features = Vec::new();
        let mut labels = Vec::new();
        let mut skipped = 0usize;

        for (line_idx, line) in input.lines().enumerate() {
            let fields: Vec<&str> = line
                .trim()
                .split(self.delimiter)
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .collect();
            if fields.len() <= self.n_features {
                if !fields.is_empty() {
                    skipped += 1;
                }
                continue;
            }

            let line_no = line_idx + 1;
            let row = fields[..self.n_features]
                .iter()
                .map(|f| parse_feature(f, line_no))
                .collect::<Result<Vec<f64>, _>>()?;
            let label_field = fields[self.n_features];
            let label = label_field
                .parse::<i64>()
                .map_err(|e| ClusterError::Parse {
                    line: line_no,
                    message: format!("invalid label '{label_field}': {e}"),
                })?;

            features.push(row);
            labels.push(label);
        }

        if skipped > 0 {
            debug!("dataset: skipped {skipped} short lines");
        }

        Ok(Dataset { features, labels })
    }

    /// Reads and parses a dataset file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Dataset, ClusterError> {
        let text = std::fs::read_to_string(path)?;
        self.parse_str(&text)
    }
}

fn parse_feature(field: &str, line: usize) -> Result<f64, ClusterError> {
    match field.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(ClusterError::Parse {
            line,
            message: format!("non-finite feature '{field}'"),
        }),
        Err(e) => Err(ClusterError::Parse {
            line,
            message: format!("invalid feature '{field}': {e}"),
        }),
    }
}

/// A labelled sample table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    /// One row of features per sample.
    pub features: Vec<Vec<f64>>,
    /// Reference class per sample.
    pub labels: Vec<i64>,
}

impl Dataset {
    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    /// Feature columns (0 for an empty dataset).
    pub fn n_features(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    /// Distinct reference labels, ascending.
    pub fn distinct_labels(&self) -> Vec<i64> {
        let mut labels = self.labels.clone();
        labels.sort_unstable();
        labels.dedup();
        labels
    }
}

// ── Standardization ───────────────────────────────────────────────────

/// Z-scored table with the statistics used to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardized {
    /// Standardized rows.
    pub data: Vec<Vec<f64>>,
    /// Per-feature means.
    pub means: Vec<f64>,
    /// Per-feature population standard deviations; 1.0 for constant features.
    pub stds: Vec<f64>,
}

/// Per-feature mean of a validated, non-empty table with `d` columns.
pub(crate) fn column_means(data: &[Vec<f64>], d: usize) -> Vec<f64> {
    let mut sums = vec![0.0; d];
    for point in data {
        for (s, &v) in sums.iter_mut().zip(point.iter()) {
            *s += v;
        }
    }
    let n = data.len() as f64;
    sums.into_iter().map(|s| s / n).collect()
}

/// Centres every feature to zero mean and scales it to unit population
/// variance. Constant features are only centred.
///
/// # Errors
///
/// [`ClusterError::InsufficientData`] for an empty table, plus the usual
/// table shape errors.
pub fn standardize(data: &[Vec<f64>]) -> Result<Standardized, ClusterError> {
    let d = validate_table(data, 1)?;
    let n = data.len() as f64;
    let means = column_means(data, d);

    let mut vars = vec![0.0; d];
    for point in data {
        for ((var, &v), &m) in vars.iter_mut().zip(point.iter()).zip(means.iter()) {
            let diff = v - m;
            *var += diff * diff;
        }
    }
    let stds: Vec<f64> = vars
        .iter()
        .map(|&v| {
            let s = (v / n).sqrt();
            if s < MIN_STD {
                1.0
            } else {
                s
            }
        })
        .collect();

    let scaled = data
        .iter()
        .map(|point| {
            point
                .iter()
                .zip(means.iter().zip(stds.iter()))
                .map(|(&v, (&m, &s))| (v - m) / s)
                .collect()
        })
        .collect();

    Ok(Standardized {
        data: scaled,
        means,
        stds,
    })
}
