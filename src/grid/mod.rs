//! Horizontal grid topology seam.
//!
//! The sampler never inspects grid geometry directly. It asks a [`Grid`]
//! to turn query points into [`Stencil`]s: lists of data-column indices and
//! interpolation weights that sum to one. Any grid (rectilinear,
//! curvilinear, unstructured) can plug in by implementing the trait.
//!
//! [`RectilinearGrid`] is the built-in implementation: monotone but possibly
//! non-uniform longitude/latitude axes, bilinear weights for node data and
//! cell lookup for cell-centred data.

mod rectilinear;

use std::fmt::Debug;

use smallvec::SmallVec;

use crate::error::{FieldError, Result};
use crate::types::{NodeIndex, Point3};

pub use rectilinear::RectilinearGrid;

/// Where a data array lives on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataLocation {
    /// One value per grid node.
    Node,
    /// One value per cell.
    Center,
    /// One value per cell edge.
    Edge,
}

/// Data columns and weights for one point. Weights sum to one.
pub type Stencil = SmallVec<[(NodeIndex, f64); 4]>;

/// Apply a stencil to one horizontal slice of data.
///
/// Missing values (NaN, e.g. decoded `_FillValue` on land) are dropped and
/// the remaining weights renormalised. All-missing gives NaN.
#[inline]
pub fn apply_stencil(stencil: &Stencil, slice: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut weight = 0.0;
    let mut missing = false;
    for &(node, w) in stencil {
        let v = slice[node.get()];
        if v.is_finite() {
            sum += w * v;
            weight += w;
        } else {
            missing = true;
        }
    }
    if !missing {
        sum
    } else if weight > 0.0 {
        sum / weight
    } else {
        f64::NAN
    }
}

/// Relative tolerance for comparing grid coordinates.
const COORD_TOL: f64 = 1e-6;

fn same_axis(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(p, q)| (p - q).abs() <= COORD_TOL * p.abs().max(q.abs()).max(1.0))
}

/// Horizontal grid used to locate query points.
pub trait Grid: Send + Sync + Debug {
    /// Number of grid nodes.
    fn n_nodes(&self) -> usize;

    /// Number of grid cells.
    fn n_cells(&self) -> usize;

    /// Number of cell edges, if the grid defines them.
    fn n_edges(&self) -> Option<usize> {
        None
    }

    /// Stencil for one point, or `None` if the point is outside the grid
    /// and `extrapolate` is false. With `extrapolate`, points outside map to
    /// the nearest valid cell.
    fn locate_point(
        &self,
        x: f64,
        y: f64,
        location: DataLocation,
        extrapolate: bool,
    ) -> Option<Stencil>;

    /// Locate a batch of points.
    ///
    /// # Errors
    ///
    /// `PointOutsideGrid` for the first point with no containing cell.
    fn locate(
        &self,
        points: &[Point3],
        location: DataLocation,
        extrapolate: bool,
    ) -> Result<Vec<Stencil>> {
        points
            .iter()
            .enumerate()
            .map(|(index, p)| {
                self.locate_point(p[0], p[1], location, extrapolate)
                    .ok_or(FieldError::PointOutsideGrid {
                        index,
                        x: p[0],
                        y: p[1],
                    })
            })
            .collect()
    }

    /// Decide where an array of `n_values` horizontal values lives.
    fn infer_location(&self, n_values: usize) -> Result<DataLocation> {
        if n_values == self.n_nodes() {
            Ok(DataLocation::Node)
        } else if n_values == self.n_cells() {
            Ok(DataLocation::Center)
        } else if self.n_edges() == Some(n_values) {
            Ok(DataLocation::Edge)
        } else {
            Err(FieldError::UnknownLocation(n_values))
        }
    }

    /// Coordinate axes `(x, y)`, for grids defined by two 1D axes.
    fn axes(&self) -> Option<(&[f64], &[f64])> {
        None
    }

    /// Whether data defined on `other` can be sampled alongside this grid.
    ///
    /// Grids that expose [`Grid::axes`] must also agree on their coordinates.
    fn is_compatible(&self, other: &dyn Grid) -> bool {
        if self.n_nodes() != other.n_nodes() || self.n_cells() != other.n_cells() {
            return false;
        }
        match (self.axes(), other.axes()) {
            (Some((ax, ay)), Some((bx, by))) => same_axis(ax, bx) && same_axis(ay, by),
            _ => true,
        }
    }
}
