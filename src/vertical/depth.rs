//! Depth axes and per-point vertical weights.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::sigma::{SigmaDepth, SigmaTerms};
use crate::error::{FieldError, Result};
use crate::field::{GriddedField, SampleOptions};
use crate::types::{LevelIndex, Point3};

/// How one point reads a field's depth dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayerWeight {
    /// At or above the free surface: use the surface layer.
    Surface,
    /// Outside the span of the levels: use this level unblended.
    Clamped(LevelIndex),
    /// `value = alpha * v[upper] + (1 - alpha) * v[lower]`, where `upper`
    /// is the shallower level.
    Between {
        upper: LevelIndex,
        lower: LevelIndex,
        alpha: f64,
    },
}

impl LayerWeight {
    /// Index reported for points that are not underwater.
    pub const SURFACE_INDEX: i64 = -1;
    /// Alpha reported for points that are not underwater.
    pub const SURFACE_ALPHA: f64 = -1.0;
    /// Alpha reported for points clamped to the top or bottom level.
    pub const CLAMPED_ALPHA: f64 = -2.0;

    /// Level index in the flat-array convention: the level the point was
    /// assigned to, `-1` at the surface.
    pub fn raw_index(&self) -> i64 {
        match *self {
            Self::Surface => Self::SURFACE_INDEX,
            Self::Clamped(level) => level.get() as i64,
            Self::Between { lower, .. } => lower.get() as i64,
        }
    }

    /// Alpha in the flat-array convention: `-1` at the surface, `-2` when
    /// clamped, otherwise the weight of the shallower level.
    pub fn raw_alpha(&self) -> f64 {
        match *self {
            Self::Surface => Self::SURFACE_ALPHA,
            Self::Clamped(_) => Self::CLAMPED_ALPHA,
            Self::Between { alpha, .. } => alpha,
        }
    }

    /// Blend per-level values. `value(k)` gives the value at level `k`.
    #[inline]
    pub fn combine(&self, surface: LevelIndex, value: impl Fn(usize) -> f64) -> f64 {
        match *self {
            Self::Surface => value(surface.get()),
            Self::Clamped(level) => value(level.get()),
            Self::Between {
                upper,
                lower,
                alpha,
            } => alpha * value(upper.get()) + (1.0 - alpha) * value(lower.get()),
        }
    }
}

/// Split weights into flat `(indices, alphas)` arrays.
pub fn to_raw(weights: &[LayerWeight]) -> (Vec<i64>, Vec<f64>) {
    weights
        .iter()
        .map(|w| (w.raw_index(), w.raw_alpha()))
        .unzip()
}

/// Data with a depth dimension that carries no vertical coordinate.
/// Every point reads the surface layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatDepth {
    /// Signed position of the surface layer; negative counts from the end.
    pub surface_index: isize,
}

impl Default for FlatDepth {
    fn default() -> Self {
        Self { surface_index: -1 }
    }
}

/// Vertical coordinate of a gridded field.
#[derive(Clone, Debug)]
pub enum DepthAxis {
    Flat(FlatDepth),
    Sigma(SigmaDepth),
}

impl Default for DepthAxis {
    fn default() -> Self {
        Self::Flat(FlatDepth::default())
    }
}

impl DepthAxis {
    /// Flat axis reading the last layer.
    pub fn flat() -> Self {
        Self::default()
    }

    /// Flat axis reading the layer at `surface_index`.
    pub fn flat_at(surface_index: isize) -> Self {
        Self::Flat(FlatDepth { surface_index })
    }

    /// Sigma axis over `bathymetry`.
    pub fn sigma(bathymetry: Arc<GriddedField>, terms: SigmaTerms) -> Self {
        Self::Sigma(SigmaDepth::new(bathymetry, terms))
    }

    /// Layer read by points at the surface, for a depth dimension of
    /// length `n_depth`.
    pub fn surface_level(&self, n_depth: usize) -> Result<LevelIndex> {
        match self {
            Self::Flat(flat) => LevelIndex::resolve(flat.surface_index, n_depth).ok_or(
                FieldError::InvalidLayer {
                    position: flat.surface_index,
                    n_depth,
                },
            ),
            Self::Sigma(sigma) => {
                let terms = sigma.terms();
                Ok(terms.surface_level(terms.family(n_depth)?))
            }
        }
    }

    /// Layer nearest the sea floor.
    pub fn bottom_level(&self, n_depth: usize) -> Result<LevelIndex> {
        match self {
            Self::Flat(_) => self.surface_level(n_depth),
            Self::Sigma(sigma) => {
                let terms = sigma.terms();
                Ok(terms.bottom_level(terms.family(n_depth)?))
            }
        }
    }

    /// Vertical weights for each point.
    ///
    /// `None` means every point reads the surface layer: always for flat
    /// axes, and for sigma axes when no point has `z > 0`.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if `n_depth` fits neither sigma level family.
    pub fn interpolation_alphas(
        &self,
        points: &[Point3],
        n_depth: usize,
        time: DateTime<Utc>,
        opts: &SampleOptions,
    ) -> Result<Option<Vec<LayerWeight>>> {
        match self {
            Self::Flat(_) => Ok(None),
            Self::Sigma(sigma) => sigma.weights(points, n_depth, time, opts),
        }
    }

    /// Drop cached bathymetry samples.
    pub fn invalidate_cache(&self) {
        if let Self::Sigma(sigma) = self {
            sigma.bathymetry().invalidate_cache();
        }
    }
}
