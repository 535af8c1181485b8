//! ROMS-style terrain-following (sigma) coordinates.
//!
//! The depth of level `k` in a column of bathymetry `h` is
//!
//! ```text
//! depth(k) = -(hc * (s[k] - Cs[k]) + Cs[k] * h)
//! ```
//!
//! with `s` in [-1, 0] and `Cs` the stretching curve. Depths are positive
//! down, so `s = 0` sits at the surface and `s = -1` at the bottom.
//! Terms exist for two level families: w-levels (layer interfaces) and
//! rho-levels (layer centres). A data array selects the family by the
//! length of its depth dimension.
//!
//! # Example
//!
//! ```
//! use envfield::vertical::{LevelFamily, SigmaTerms};
//!
//! let terms = SigmaTerms::new(
//!     vec![0.0, -0.5, -1.0],
//!     vec![0.0, -0.4, -1.0],
//!     vec![-0.25, -0.75],
//!     vec![-0.2, -0.7],
//!     5.0,
//! )
//! .unwrap();
//!
//! assert_eq!(terms.family(3).unwrap(), LevelFamily::W);
//! assert!((terms.layer_depth(LevelFamily::W, 1, 10.0) - 4.5).abs() < 1e-12);
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::depth::LayerWeight;
use super::stretching::{Stretching, UniformStretching};
use crate::error::{FieldError, Result};
use crate::field::{GriddedField, SampleOptions};
use crate::io::Dataset;
use crate::types::{LevelIndex, Point3};

// ============================================================================
// Sigma terms
// ============================================================================

/// Which set of sigma terms a data array uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelFamily {
    /// Layer interfaces (`s_w`, `Cs_w`).
    W,
    /// Layer centres (`s_rho`, `Cs_r`).
    Rho,
}

/// Sigma equation terms: `s`/`Cs` for both level families plus `hc`.
#[derive(Clone, Debug, PartialEq)]
pub struct SigmaTerms {
    s_w: Vec<f64>,
    cs_w: Vec<f64>,
    s_rho: Vec<f64>,
    cs_r: Vec<f64>,
    hc: f64,
}

impl SigmaTerms {
    /// Build and validate sigma terms.
    ///
    /// Rho terms may be empty for datasets that only carry w-levels.
    ///
    /// # Errors
    ///
    /// `InvalidSigmaTerms` if paired arrays differ in length, no w-levels
    /// are given or `hc` is negative or not finite.
    pub fn new(
        s_w: Vec<f64>,
        cs_w: Vec<f64>,
        s_rho: Vec<f64>,
        cs_r: Vec<f64>,
        hc: f64,
    ) -> Result<Self> {
        if s_w.is_empty() {
            return Err(FieldError::InvalidSigmaTerms("no w-levels".into()));
        }
        if s_w.len() != cs_w.len() {
            return Err(FieldError::InvalidSigmaTerms(format!(
                "s_w has {} levels but Cs_w has {}",
                s_w.len(),
                cs_w.len()
            )));
        }
        if s_rho.len() != cs_r.len() {
            return Err(FieldError::InvalidSigmaTerms(format!(
                "s_rho has {} levels but Cs_r has {}",
                s_rho.len(),
                cs_r.len()
            )));
        }
        if !hc.is_finite() || hc < 0.0 {
            return Err(FieldError::InvalidSigmaTerms(format!(
                "critical depth hc = {}",
                hc
            )));
        }
        Ok(Self {
            s_w,
            cs_w,
            s_rho,
            cs_r,
            hc,
        })
    }

    /// Synthetic terms for `n_layers` layers: uniform `s`, `Cs` from the
    /// given stretching. Levels are stored bottom first, as ROMS does.
    pub fn from_stretching(n_layers: usize, hc: f64, stretching: &dyn Stretching) -> Result<Self> {
        let (s_rho, s_w) = UniformStretching.compute_sigma(n_layers);
        let (cs_r, cs_w) = stretching.compute_sigma(n_layers);
        tracing::debug!(
            stretching = stretching.name(),
            n_layers,
            hc,
            "generated sigma terms"
        );
        Self::new(s_w, cs_w, s_rho, cs_r, hc)
    }

    /// Read `s_w`, `Cs_w`, `hc` and (if present) `s_rho`, `Cs_r`.
    pub fn from_dataset(ds: &dyn Dataset) -> Result<Self> {
        let s_w = ds.variable("s_w")?.values;
        let cs_w = ds.variable("Cs_w")?.values;
        let hc = ds
            .variable("hc")?
            .values
            .first()
            .copied()
            .ok_or_else(|| FieldError::InvalidSigmaTerms("hc is empty".into()))?;
        let (s_rho, cs_r) = if ds.has_variable("s_rho") && ds.has_variable("Cs_r") {
            (ds.variable("s_rho")?.values, ds.variable("Cs_r")?.values)
        } else {
            (Vec::new(), Vec::new())
        };
        Self::new(s_w, cs_w, s_rho, cs_r, hc)
    }

    /// Number of w-levels.
    #[inline]
    pub fn num_w_levels(&self) -> usize {
        self.s_w.len()
    }

    /// Number of rho-levels.
    #[inline]
    pub fn num_rho_levels(&self) -> usize {
        self.s_rho.len()
    }

    /// Critical depth (m).
    #[inline]
    pub fn hc(&self) -> f64 {
        self.hc
    }

    /// Level family matching a depth dimension of length `n_depth`.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if `n_depth` equals neither level count.
    pub fn family(&self, n_depth: usize) -> Result<LevelFamily> {
        if n_depth == self.num_w_levels() {
            Ok(LevelFamily::W)
        } else if n_depth == self.num_rho_levels() {
            Ok(LevelFamily::Rho)
        } else {
            Err(FieldError::ShapeMismatch {
                n_depth,
                n_w: self.num_w_levels(),
                n_rho: self.num_rho_levels(),
            })
        }
    }

    fn terms(&self, family: LevelFamily) -> (&[f64], &[f64]) {
        match family {
            LevelFamily::W => (&self.s_w, &self.cs_w),
            LevelFamily::Rho => (&self.s_rho, &self.cs_r),
        }
    }

    /// Depth (m, positive down) of one level in a column of depth `h`.
    #[inline]
    pub fn layer_depth(&self, family: LevelFamily, level: usize, h: f64) -> f64 {
        let (s, cs) = self.terms(family);
        -(self.hc * (s[level] - cs[level]) + cs[level] * h)
    }

    /// Level closest to the free surface (largest `s`).
    pub fn surface_level(&self, family: LevelFamily) -> LevelIndex {
        let (s, _) = self.terms(family);
        let top = (0..s.len())
            .max_by(|&a, &b| s[a].total_cmp(&s[b]))
            .unwrap_or(0);
        LevelIndex::new(top)
    }

    /// Level closest to the bottom (smallest `s`).
    pub fn bottom_level(&self, family: LevelFamily) -> LevelIndex {
        let (s, _) = self.terms(family);
        let bottom = (0..s.len())
            .min_by(|&a, &b| s[a].total_cmp(&s[b]))
            .unwrap_or(0);
        LevelIndex::new(bottom)
    }

    /// Vertical weight of a point at depth `z` in a column of depth `h`.
    ///
    /// Levels are walked from the surface down; the point is assigned to
    /// the first level deeper than `z` and blended with the level above it.
    /// Points shallower than the top level or deeper than the bottom level
    /// clamp to that level.
    pub fn bracket(&self, family: LevelFamily, h: f64, z: f64) -> LayerWeight {
        let (s, _) = self.terms(family);
        let n = s.len();
        let surface_first = n > 1 && s[0] > s[n - 1];
        let level_at = |rank: usize| if surface_first { rank } else { n - 1 - rank };
        let depth_at = |rank: usize| self.layer_depth(family, level_at(rank), h);

        let mut above = 0;
        let mut d_above = depth_at(0);
        if z <= d_above {
            return LayerWeight::Clamped(LevelIndex::new(level_at(0)));
        }
        for rank in 1..n {
            let d = depth_at(rank);
            if d > z {
                let span = d_above - d;
                if span.abs() < f64::EPSILON {
                    return LayerWeight::Clamped(LevelIndex::new(level_at(above)));
                }
                return LayerWeight::Between {
                    upper: LevelIndex::new(level_at(above)),
                    lower: LevelIndex::new(level_at(rank)),
                    alpha: (z - d) / span,
                };
            }
            above = rank;
            d_above = d;
        }
        LayerWeight::Clamped(LevelIndex::new(level_at(n - 1)))
    }
}

// ============================================================================
// Sigma depth resolver
// ============================================================================

/// Sigma-coordinate depth axis: terms plus the bathymetry they stretch over.
#[derive(Clone, Debug)]
pub struct SigmaDepth {
    bathymetry: Arc<GriddedField>,
    terms: SigmaTerms,
}

impl SigmaDepth {
    /// Create a sigma depth axis.
    pub fn new(bathymetry: Arc<GriddedField>, terms: SigmaTerms) -> Self {
        Self { bathymetry, terms }
    }

    /// Bathymetry field (positive-down depth of the sea floor).
    pub fn bathymetry(&self) -> &Arc<GriddedField> {
        &self.bathymetry
    }

    /// Sigma terms.
    pub fn terms(&self) -> &SigmaTerms {
        &self.terms
    }

    /// Per-point layer weights, or `None` when no point is underwater.
    ///
    /// A surface-only batch returns `None` before `n_depth` is checked.
    /// Bathymetry is sampled at `time` with the caller's extrapolation
    /// setting and query hash, so fields sharing a bathymetry reuse one
    /// bathymetry sample per batch.
    pub fn weights(
        &self,
        points: &[Point3],
        n_depth: usize,
        time: DateTime<Utc>,
        opts: &SampleOptions,
    ) -> Result<Option<Vec<LayerWeight>>> {
        if !points.iter().any(|p| p[2] > 0.0) {
            return Ok(None);
        }
        let family = self.terms.family(n_depth)?;

        let bathy_opts = SampleOptions::new()
            .with_extrapolate(opts.extrapolate)
            .with_memoize(opts.memoize)
            .with_hash_opt(opts.hash);
        let h = self.bathymetry.at(points, time, &bathy_opts)?;

        let weights = points
            .iter()
            .zip(&h)
            .map(|(p, &h)| {
                if p[2] > 0.0 {
                    self.terms.bracket(family, h, p[2])
                } else {
                    LayerWeight::Surface
                }
            })
            .collect();
        Ok(Some(weights))
    }
}
