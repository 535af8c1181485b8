//! Error types for field construction and sampling.
//!
//! Errors fall into three groups (see [`ErrorKind`]):
//!
//! - **Configuration**: bad sigma terms, bad shapes, missing variables,
//!   incompatible grids. Raised while building fields; a run should abort.
//! - **Query**: a single `at` call could not be answered (point outside the
//!   grid, time outside the axis). A driving loop may skip or flag the batch.
//! - **Data quality**: noisy source data (ice concentration outside [0, 1])
//!   rejected under a strict policy.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FieldError>;

/// Broad classification of a [`FieldError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Setup-time fault. Not retried.
    Configuration,
    /// Fault of one query; the rest of the run can continue.
    Query,
    /// Source data outside its physical range.
    DataQuality,
}

/// Error type for environmental field operations.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Depth dimension matches neither the w- nor the rho-level count.
    #[error("Shape mismatch: depth dimension {n_depth} fits neither {n_w} w-levels nor {n_rho} rho-levels")]
    ShapeMismatch {
        n_depth: usize,
        n_w: usize,
        n_rho: usize,
    },

    /// Sigma equation terms are inconsistent.
    #[error("Invalid sigma terms: {0}")]
    InvalidSigmaTerms(String),

    /// Configured layer position does not exist in the depth dimension.
    #[error("Layer position {position} outside depth dimension of {n_depth} levels")]
    InvalidLayer { position: isize, n_depth: usize },

    /// Query point has no containing cell and extrapolation is disabled.
    #[error("Point {index} at ({x:.5}, {y:.5}) is outside the grid")]
    PointOutsideGrid { index: usize, x: f64, y: f64 },

    /// Query time is not covered by the time axis and extrapolation is disabled.
    #[error("Time {time} outside time axis [{start}, {end}]")]
    TimeOutOfRange {
        time: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Requested units cannot be converted from the native units.
    #[error("Incompatible units: cannot convert '{from}' to '{to}'")]
    IncompatibleUnits { from: String, to: String },

    /// Ice concentration sample outside [0, 1].
    #[error("Invalid ice concentration {value} at point {index}")]
    InvalidConcentration { index: usize, value: f64 },

    /// Vector field built with more than three components.
    #[error("Too many vector components: {0} (at most {1})")]
    TooManyComponents(usize, usize),

    /// Vector field built with fewer than two components.
    #[error("Too few vector components: {0} (at least 2)")]
    TooFewComponents(usize),

    /// Required dataset variable is absent.
    #[error("Missing variable: {0}")]
    MissingVariable(String),

    /// Two fields that must share a grid or time domain do not.
    #[error("Incompatible grids: {0}")]
    IncompatibleGrids(String),

    /// Time axis is not strictly increasing or cannot be decoded.
    #[error("Invalid time axis: {0}")]
    InvalidTimeAxis(String),

    /// Raw data length does not match the declared shape.
    #[error("Data length mismatch: expected {expected}, got {actual}")]
    DataLength { expected: usize, actual: usize },

    /// Data array cannot be placed on the grid (node/center/edge).
    #[error("Cannot infer grid location for {0} values")]
    UnknownLocation(usize),

    /// Registry lookup failed.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error with line number.
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// NetCDF library error.
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),
}

impl FieldError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PointOutsideGrid { .. } | Self::TimeOutOfRange { .. } => ErrorKind::Query,
            Self::InvalidConcentration { .. } => ErrorKind::DataQuality,
            _ => ErrorKind::Configuration,
        }
    }

    /// Whether a driving loop should abort the whole run.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// Create an incompatible units error.
    pub fn incompatible_units(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::IncompatibleUnits {
            from: from.into(),
            to: to.into(),
        }
    }
}
