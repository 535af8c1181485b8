//! Field value storage in canonical `[time][depth][space]` order.

use crate::error::{FieldError, Result};

/// Role of one array dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Time,
    Depth,
    /// Horizontal dimension. Several may appear (`y`, `x`); they are
    /// flattened in their stored order.
    Space,
}

/// Extents of a field array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataShape {
    /// Number of time steps, `None` for time-invariant data.
    pub n_time: Option<usize>,
    /// Number of layers, `None` for 2-D data.
    pub n_depth: Option<usize>,
    /// Number of horizontal values per layer.
    pub n_space: usize,
}

impl DataShape {
    /// 2-D, time-invariant.
    pub const fn surface(n_space: usize) -> Self {
        Self {
            n_time: None,
            n_depth: None,
            n_space,
        }
    }

    /// Set the time extent.
    pub const fn with_time(mut self, n_time: usize) -> Self {
        self.n_time = Some(n_time);
        self
    }

    /// Set the depth extent.
    pub const fn with_depth(mut self, n_depth: usize) -> Self {
        self.n_depth = Some(n_depth);
        self
    }

    /// Total number of values.
    pub fn len(&self) -> usize {
        self.n_time.unwrap_or(1) * self.n_depth.unwrap_or(1) * self.n_space
    }

    /// Whether the shape holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flat field values plus their shape.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldData {
    values: Vec<f64>,
    shape: DataShape,
}

impl FieldData {
    /// Wrap values already in canonical order.
    ///
    /// # Errors
    ///
    /// `DataLength` if `values.len()` disagrees with `shape`.
    pub fn new(values: Vec<f64>, shape: DataShape) -> Result<Self> {
        if values.len() != shape.len() {
            return Err(FieldError::DataLength {
                expected: shape.len(),
                actual: values.len(),
            });
        }
        Ok(Self { values, shape })
    }

    /// Reorder an array with arbitrary dimension order into canonical order.
    ///
    /// `dims` lists each stored dimension (slowest varying first) with its
    /// role and length. At most one time and one depth dimension may appear.
    pub fn from_axes(values: Vec<f64>, dims: &[(Axis, usize)]) -> Result<Self> {
        let expected: usize = dims.iter().map(|&(_, n)| n).product();
        if values.len() != expected {
            return Err(FieldError::DataLength {
                expected,
                actual: values.len(),
            });
        }
        let extent = |axis: Axis| -> Result<Option<usize>> {
            let mut found = dims.iter().filter(|(a, _)| *a == axis);
            let first = found.next().map(|&(_, n)| n);
            if found.next().is_some() {
                return Err(FieldError::IncompatibleGrids(format!(
                    "more than one {:?} dimension",
                    axis
                )));
            }
            Ok(first)
        };
        let shape = DataShape {
            n_time: extent(Axis::Time)?,
            n_depth: extent(Axis::Depth)?,
            n_space: dims
                .iter()
                .filter(|(a, _)| *a == Axis::Space)
                .map(|&(_, n)| n)
                .product(),
        };

        let rank = |axis: Axis| match axis {
            Axis::Time => 0,
            Axis::Depth => 1,
            Axis::Space => 2,
        };
        let canonical = dims.windows(2).all(|w| rank(w[0].0) <= rank(w[1].0));
        if canonical {
            return Ok(Self { values, shape });
        }

        let n_depth = shape.n_depth.unwrap_or(1);
        let n_space = shape.n_space;
        let mut out = vec![0.0; values.len()];
        let mut coords = vec![0usize; dims.len()];
        for &v in &values {
            let (mut t, mut k, mut s) = (0, 0, 0);
            for (&(axis, n), &c) in dims.iter().zip(&coords) {
                match axis {
                    Axis::Time => t = c,
                    Axis::Depth => k = c,
                    Axis::Space => s = s * n + c,
                }
            }
            out[(t * n_depth + k) * n_space + s] = v;
            // Advance the odometer, last dimension fastest
            for (c, &(_, n)) in coords.iter_mut().zip(dims).rev() {
                *c += 1;
                if *c < n {
                    break;
                }
                *c = 0;
            }
        }
        Ok(Self { values: out, shape })
    }

    /// Array shape.
    #[inline]
    pub fn shape(&self) -> DataShape {
        self.shape
    }

    /// All values in canonical order.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Horizontal slice at time step `t` and layer `k`.
    #[inline]
    pub fn slice(&self, t: usize, k: usize) -> &[f64] {
        let n_depth = self.shape.n_depth.unwrap_or(1);
        let start = (t * n_depth + k) * self.shape.n_space;
        &self.values[start..start + self.shape.n_space]
    }
}
