//! Rectilinear lon/lat grid with possibly non-uniform spacing.

use smallvec::smallvec;

use super::{DataLocation, Grid, Stencil};
use crate::error::{FieldError, Result};
use crate::types::NodeIndex;

/// Grid defined by two strictly increasing 1D coordinate axes.
///
/// Nodes are numbered row-major: `node = j * nx + i` where `i` runs along
/// `x` (longitude). Cells are numbered the same way over `(nx-1) * (ny-1)`.
///
/// # Example
///
/// ```
/// use envfield::grid::{DataLocation, Grid, RectilinearGrid};
///
/// let grid = RectilinearGrid::uniform(0.0, 1.0, 3, 0.0, 1.0, 3).unwrap();
/// assert_eq!(grid.n_nodes(), 9);
/// assert_eq!(grid.n_cells(), 4);
///
/// let stencil = grid.locate_point(0.25, 0.25, DataLocation::Node, false).unwrap();
/// let total: f64 = stencil.iter().map(|(_, w)| w).sum();
/// assert!((total - 1.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RectilinearGrid {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl RectilinearGrid {
    /// Create a grid from coordinate axes.
    ///
    /// # Errors
    ///
    /// `IncompatibleGrids` if an axis has fewer than two entries or is not
    /// strictly increasing.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        for (name, axis) in [("x", &x), ("y", &y)] {
            if axis.len() < 2 {
                return Err(FieldError::IncompatibleGrids(format!(
                    "{} axis needs at least 2 coordinates, got {}",
                    name,
                    axis.len()
                )));
            }
            if axis.windows(2).any(|w| !(w[1] > w[0])) {
                return Err(FieldError::IncompatibleGrids(format!(
                    "{} axis is not strictly increasing",
                    name
                )));
            }
        }
        Ok(Self { x, y })
    }

    /// Uniformly spaced grid over `[x0, x1] × [y0, y1]` with `nx × ny` nodes.
    pub fn uniform(x0: f64, x1: f64, nx: usize, y0: f64, y1: f64, ny: usize) -> Result<Self> {
        let axis = |a: f64, b: f64, n: usize| -> Vec<f64> {
            let step = (b - a) / (n.max(2) - 1) as f64;
            (0..n).map(|k| a + k as f64 * step).collect()
        };
        Self::new(axis(x0, x1, nx), axis(y0, y1, ny))
    }

    /// x coordinates.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// y coordinates.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Grid dimensions `(nx, ny)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.x.len(), self.y.len())
    }

    /// Node index of `(i, j)`.
    #[inline]
    pub fn node(&self, i: usize, j: usize) -> NodeIndex {
        NodeIndex::new(j * self.x.len() + i)
    }

    /// Cell index of `(i, j)`.
    #[inline]
    pub fn cell(&self, i: usize, j: usize) -> NodeIndex {
        NodeIndex::new(j * (self.x.len() - 1) + i)
    }
}

/// Interval index and fraction of `value` on a strictly increasing axis.
fn find_interval(coords: &[f64], value: f64, extrapolate: bool) -> Option<(usize, f64)> {
    let n = coords.len();
    let (lo, hi) = (coords[0], coords[n - 1]);
    if !(lo..=hi).contains(&value) {
        if !extrapolate || value.is_nan() {
            return None;
        }
        return Some(if value < lo { (0, 0.0) } else { (n - 2, 1.0) });
    }
    let i = coords.partition_point(|&c| c <= value).clamp(1, n - 1) - 1;
    let f = (value - coords[i]) / (coords[i + 1] - coords[i]);
    Some((i, f))
}

impl Grid for RectilinearGrid {
    fn n_nodes(&self) -> usize {
        self.x.len() * self.y.len()
    }

    fn n_cells(&self) -> usize {
        (self.x.len() - 1) * (self.y.len() - 1)
    }

    fn axes(&self) -> Option<(&[f64], &[f64])> {
        Some((&self.x, &self.y))
    }

    fn locate_point(
        &self,
        x: f64,
        y: f64,
        location: DataLocation,
        extrapolate: bool,
    ) -> Option<Stencil> {
        let (i, fx) = find_interval(&self.x, x, extrapolate)?;
        let (j, fy) = find_interval(&self.y, y, extrapolate)?;
        match location {
            DataLocation::Node => Some(smallvec![
                (self.node(i, j), (1.0 - fx) * (1.0 - fy)),
                (self.node(i + 1, j), fx * (1.0 - fy)),
                (self.node(i, j + 1), (1.0 - fx) * fy),
                (self.node(i + 1, j + 1), fx * fy),
            ]),
            DataLocation::Center => Some(smallvec![(self.cell(i, j), 1.0)]),
            DataLocation::Edge => None,
        }
    }
}
