//! Scalar fields on a horizontal grid.
//!
//! A [`GriddedField`] samples in three stages per point:
//!
//! 1. horizontal: the grid's stencil applied to each needed time/layer slice
//! 2. time: linear blend between the two bracketing time steps
//! 3. vertical: the point's [`LayerWeight`] over the blended layers
//!
//! Unit conversion is applied last; results are cached in native units.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::{DateTime, Utc};
//! use envfield::field::{GriddedField, SampleOptions};
//! use envfield::grid::RectilinearGrid;
//!
//! let grid = Arc::new(RectilinearGrid::uniform(0.0, 2.0, 3, 0.0, 1.0, 2).unwrap());
//! let temp = GriddedField::surface("temp", "C", grid, vec![10.0, 11.0, 12.0, 10.0, 11.0, 12.0])
//!     .unwrap();
//!
//! let t = DateTime::<Utc>::UNIX_EPOCH;
//! let v = temp.at(&[[0.5, 0.5, 0.0]], t, &SampleOptions::new()).unwrap();
//! assert!((v[0] - 10.5).abs() < 1e-12);
//!
//! let k = temp.at(&[[0.5, 0.5, 0.0]], t, &SampleOptions::new().with_units("K")).unwrap();
//! assert!((k[0] - 283.65).abs() < 1e-9);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::cache::{CacheStats, ResultCache};
use super::data::{DataShape, FieldData};
use super::SampleOptions;
use crate::error::{FieldError, Result};
use crate::grid::{apply_stencil, DataLocation, Grid, Stencil};
use crate::time::{TimeAxis, TimeBracket};
use crate::types::{LevelIndex, Point3};
use crate::vertical::{DepthAxis, LayerWeight};

/// A scalar variable on a horizontal grid.
#[derive(Debug)]
pub struct GriddedField {
    name: String,
    units: String,
    grid: Arc<dyn Grid>,
    time: TimeAxis,
    data: FieldData,
    location: DataLocation,
    depth: DepthAxis,
    cache: ResultCache<Vec<f64>>,
    evaluations: AtomicUsize,
}

impl GriddedField {
    /// Create a gridded field.
    ///
    /// # Errors
    ///
    /// - `UnknownLocation` if the horizontal extent fits no grid location
    /// - `InvalidTimeAxis` if the time extent disagrees with `time`
    /// - `ShapeMismatch`/`InvalidLayer` if the depth extent does not fit `depth`
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        grid: Arc<dyn Grid>,
        time: TimeAxis,
        data: FieldData,
        depth: DepthAxis,
    ) -> Result<Self> {
        let name = name.into();
        let shape = data.shape();
        let location = grid.infer_location(shape.n_space)?;

        let time = match shape.n_time {
            Some(1) if time.is_empty() => TimeAxis::constant(),
            Some(n) if n != time.len() => {
                return Err(FieldError::InvalidTimeAxis(format!(
                    "{}: {} time steps in data but {} on the axis",
                    name,
                    n,
                    time.len()
                )));
            }
            Some(_) => time,
            None => TimeAxis::constant(),
        };

        if let Some(n_depth) = shape.n_depth {
            depth.surface_level(n_depth)?;
        }

        tracing::debug!(
            field = %name,
            ?location,
            n_time = time.len(),
            n_depth = ?shape.n_depth,
            n_space = shape.n_space,
            "created gridded field"
        );

        Ok(Self {
            name,
            units: units.into(),
            grid,
            time,
            data,
            location,
            depth,
            cache: ResultCache::new(),
            evaluations: AtomicUsize::new(0),
        })
    }

    /// A 2-D, time-invariant field (bathymetry, grid angle).
    pub fn surface(
        name: impl Into<String>,
        units: impl Into<String>,
        grid: Arc<dyn Grid>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let shape = DataShape::surface(values.len());
        let data = FieldData::new(values, shape)?;
        Self::new(name, units, grid, TimeAxis::empty(), data, DepthAxis::flat())
    }

    /// A 2-D field with one horizontal slice per entry of `time`.
    pub fn series(
        name: impl Into<String>,
        units: impl Into<String>,
        grid: Arc<dyn Grid>,
        time: TimeAxis,
        values: Vec<f64>,
    ) -> Result<Self> {
        let n_time = time.len().max(1);
        let n_space = values.len() / n_time;
        let data = FieldData::new(values, DataShape::surface(n_space).with_time(n_time))?;
        Self::new(name, units, grid, time, data, DepthAxis::flat())
    }

    /// Replace the native units label. Values are not converted.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native units.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Horizontal grid.
    pub fn grid(&self) -> &Arc<dyn Grid> {
        &self.grid
    }

    /// Time axis (constant for time-invariant data).
    pub fn time_axis(&self) -> &TimeAxis {
        &self.time
    }

    /// Vertical coordinate.
    pub fn depth_axis(&self) -> &DepthAxis {
        &self.depth
    }

    /// Raw values.
    pub fn data(&self) -> &FieldData {
        &self.data
    }

    /// Where values live on the grid.
    pub fn location(&self) -> DataLocation {
        self.location
    }

    /// Number of interpolations actually performed (cache misses).
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Cache hit/miss counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop memoised results, including those of the bathymetry this
    /// field's depth axis reads.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
        self.depth.invalidate_cache();
    }

    /// Sample the field at `points` and `time`.
    ///
    /// # Errors
    ///
    /// - `IncompatibleUnits` if `opts.units` cannot be reached
    /// - `PointOutsideGrid` / `TimeOutOfRange` without extrapolation
    /// - `ShapeMismatch` if the depth dimension fits no sigma level family
    pub fn at(&self, points: &[Point3], time: DateTime<Utc>, opts: &SampleOptions) -> Result<Vec<f64>> {
        let conversion = opts.conversion_from(&self.units)?;
        let key = opts.key(points, time);

        if opts.memoize {
            if let Some(mut hit) = self.cache.get(&key, points) {
                conversion.apply_slice(&mut hit);
                return Ok(hit);
            }
        }

        let inner = opts.native().with_hash(key.hash);
        let mut values = self.interpolate(points, time, &inner)?;
        if opts.memoize {
            self.cache.put(key, points, values.clone());
        }
        conversion.apply_slice(&mut values);
        Ok(values)
    }

    fn interpolate(&self, points: &[Point3], time: DateTime<Utc>, opts: &SampleOptions) -> Result<Vec<f64>> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let plan = self.plan(points, time, opts)?;

        #[cfg(feature = "parallel")]
        let values = self.sample_parallel(&plan);
        #[cfg(not(feature = "parallel"))]
        let values = self.sample_serial(&plan);

        tracing::trace!(field = %self.name, n_points = points.len(), "interpolated");
        Ok(values)
    }

    fn plan(&self, points: &[Point3], time: DateTime<Utc>, opts: &SampleOptions) -> Result<SamplePlan> {
        let shape = self.data.shape();
        let stencils = self.grid.locate(points, self.location, opts.extrapolate)?;
        let bracket = match shape.n_time {
            Some(_) => self.time.bracket(time, opts.extrapolate)?,
            None => TimeBracket::exact(0),
        };
        let (weights, surface) = match shape.n_depth {
            Some(n) => (
                self.depth.interpolation_alphas(points, n, time, opts)?,
                self.depth.surface_level(n)?,
            ),
            None => (None, LevelIndex::ZERO),
        };
        Ok(SamplePlan {
            stencils,
            bracket,
            weights,
            surface,
        })
    }

    fn sample_serial(&self, plan: &SamplePlan) -> Vec<f64> {
        (0..plan.stencils.len()).map(|i| self.sample_point(plan, i)).collect()
    }

    #[cfg(feature = "parallel")]
    fn sample_parallel(&self, plan: &SamplePlan) -> Vec<f64> {
        (0..plan.stencils.len())
            .into_par_iter()
            .map(|i| self.sample_point(plan, i))
            .collect()
    }

    #[inline]
    fn sample_point(&self, plan: &SamplePlan, i: usize) -> f64 {
        let stencil = &plan.stencils[i];
        let bracket = plan.bracket;
        let layer = |k: usize| {
            let v0 = apply_stencil(stencil, self.data.slice(bracket.lower, k));
            if bracket.needs_blend() {
                let v1 = apply_stencil(stencil, self.data.slice(bracket.upper, k));
                (1.0 - bracket.alpha) * v0 + bracket.alpha * v1
            } else {
                v0
            }
        };
        let weight = plan
            .weights
            .as_ref()
            .map_or(LayerWeight::Surface, |w| w[i]);
        weight.combine(plan.surface, layer)
    }
}

/// Everything one batch needs, resolved before the per-point loop.
struct SamplePlan {
    stencils: Vec<Stencil>,
    bracket: TimeBracket,
    weights: Option<Vec<LayerWeight>>,
    surface: LevelIndex,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::RectilinearGrid;
    use crate::vertical::SigmaTerms;
    use chrono::{Duration, TimeZone};

    const TOL: f64 = 1e-10;

    fn grid() -> Arc<dyn Grid> {
        Arc::new(RectilinearGrid::uniform(0.0, 2.0, 3, 0.0, 1.0, 2).unwrap())
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    /// f(x, y) = x + 2y at the nodes of the 3x2 grid.
    fn linear_values() -> Vec<f64> {
        let mut v = Vec::new();
        for j in 0..2 {
            for i in 0..3 {
                v.push(i as f64 + 2.0 * j as f64);
            }
        }
        v
    }

    fn sigma_field(levels: &[f64]) -> GriddedField {
        let bathy = Arc::new(GriddedField::surface("h", "m", grid(), vec![10.0; 6]).unwrap());
        let terms = SigmaTerms::new(
            vec![0.0, -0.5, -1.0],
            vec![0.0, -0.4, -1.0],
            vec![-0.25, -0.75],
            vec![-0.2, -0.7],
            5.0,
        )
        .unwrap();
        let mut values = Vec::new();
        for &v in levels {
            values.extend(std::iter::repeat(v).take(6));
        }
        let data = FieldData::new(values, DataShape::surface(6).with_depth(levels.len())).unwrap();
        GriddedField::new(
            "temp",
            "C",
            grid(),
            TimeAxis::empty(),
            data,
            DepthAxis::sigma(bathy, terms),
        )
        .unwrap()
    }

    #[test]
    fn test_bilinear_is_exact_for_linear_data() {
        let f = GriddedField::surface("f", "m", grid(), linear_values()).unwrap();
        let pts = [[0.3, 0.7, 0.0], [1.9, 0.1, 0.0], [1.0, 1.0, 0.0]];
        let v = f.at(&pts, t0(), &SampleOptions::new()).unwrap();
        for (p, val) in pts.iter().zip(&v) {
            let expected = p[0] + 2.0 * p[1];
            assert!((val - expected).abs() < TOL, "at {:?}: {} vs {}", p, val, expected);
        }
    }

    #[test]
    fn test_time_blend() {
        let axis = TimeAxis::new(vec![t0(), t0() + Duration::hours(2)]).unwrap();
        let mut values = vec![0.0; 6];
        values.extend(vec![10.0; 6]);
        let f = GriddedField::series("f", "m", grid(), axis, values).unwrap();

        let v = f.at(&[[1.0, 0.5, 0.0]], t0() + Duration::minutes(30), &SampleOptions::new()).unwrap();
        assert!((v[0] - 2.5).abs() < TOL);
    }

    #[test]
    fn test_time_out_of_range() {
        let axis = TimeAxis::new(vec![t0(), t0() + Duration::hours(1)]).unwrap();
        let mut values = vec![1.0; 6];
        values.extend(vec![3.0; 6]);
        let f = GriddedField::series("f", "m", grid(), axis, values).unwrap();
        let late = t0() + Duration::hours(5);

        let err = f.at(&[[1.0, 0.5, 0.0]], late, &SampleOptions::new()).unwrap_err();
        assert!(matches!(err, FieldError::TimeOutOfRange { .. }));

        let v = f
            .at(&[[1.0, 0.5, 0.0]], late, &SampleOptions::new().with_extrapolate(true))
            .unwrap();
        assert!((v[0] - 3.0).abs() < TOL);
    }

    #[test]
    fn test_time_extent_must_match_axis() {
        let axis = TimeAxis::new(vec![t0(), t0() + Duration::hours(1)]).unwrap();
        let data = FieldData::new(vec![0.0; 18], DataShape::surface(6).with_time(3)).unwrap();
        let err = GriddedField::new("f", "m", grid(), axis, data, DepthAxis::flat()).unwrap_err();
        assert!(matches!(err, FieldError::InvalidTimeAxis(_)));
    }

    #[test]
    fn test_sigma_vertical_blend() {
        let f = sigma_field(&[1.0, 2.0, 3.0]);
        let pts = [[1.0, 0.5, 3.0], [1.0, 0.5, 0.0], [1.0, 0.5, 12.0]];
        let v = f.at(&pts, t0(), &SampleOptions::new()).unwrap();
        let expected = 1.0 / 3.0 * 1.0 + 2.0 / 3.0 * 2.0;
        assert!((v[0] - expected).abs() < TOL, "got {}", v[0]);
        assert!((v[1] - 1.0).abs() < TOL, "surface point reads surface level");
        assert!((v[2] - 3.0).abs() < TOL, "below bottom clamps to bottom level");
    }

    #[test]
    fn test_depth_dimension_must_fit_sigma_terms() {
        let bathy = Arc::new(GriddedField::surface("h", "m", grid(), vec![10.0; 6]).unwrap());
        let terms = SigmaTerms::new(vec![0.0, -1.0], vec![0.0, -1.0], vec![-0.5], vec![-0.5], 5.0).unwrap();
        let data = FieldData::new(vec![0.0; 42], DataShape::surface(6).with_depth(7)).unwrap();
        let err = GriddedField::new(
            "temp",
            "C",
            grid(),
            TimeAxis::empty(),
            data,
            DepthAxis::sigma(bathy, terms),
        )
        .unwrap_err();
        assert!(matches!(err, FieldError::ShapeMismatch { n_depth: 7, .. }));
    }

    #[test]
    fn test_memoization() {
        let f = GriddedField::surface("f", "m", grid(), linear_values()).unwrap();
        let pts = [[0.5, 0.5, 0.0]];
        let opts = SampleOptions::new();

        let a = f.at(&pts, t0(), &opts).unwrap();
        let b = f.at(&pts, t0(), &opts).unwrap();
        assert_eq!(a, b);
        assert_eq!(f.evaluations(), 1);

        f.invalidate_cache();
        f.at(&pts, t0(), &opts).unwrap();
        assert_eq!(f.evaluations(), 2);

        let no_memo = opts.clone().with_memoize(false);
        f.at(&pts, t0(), &no_memo).unwrap();
        f.at(&pts, t0(), &no_memo).unwrap();
        assert_eq!(f.evaluations(), 4);
    }

    #[test]
    fn test_cached_result_converts_each_call() {
        let f = GriddedField::surface("u", "m/s", grid(), vec![1.0; 6]).unwrap();
        let pts = [[0.5, 0.5, 0.0]];
        let native = f.at(&pts, t0(), &SampleOptions::new()).unwrap();
        let cms = f.at(&pts, t0(), &SampleOptions::new().with_units("cm/s")).unwrap();
        assert!((native[0] - 1.0).abs() < TOL);
        assert!((cms[0] - 100.0).abs() < TOL);
        assert_eq!(f.evaluations(), 1);
    }

    #[test]
    fn test_incompatible_units_fail_before_sampling() {
        let f = GriddedField::surface("u", "m/s", grid(), vec![1.0; 6]).unwrap();
        let err = f
            .at(&[[0.5, 0.5, 0.0]], t0(), &SampleOptions::new().with_units("K"))
            .unwrap_err();
        assert!(matches!(err, FieldError::IncompatibleUnits { .. }));
        assert_eq!(f.evaluations(), 0);
    }

    #[test]
    fn test_point_outside_grid() {
        let f = GriddedField::surface("f", "m", grid(), linear_values()).unwrap();
        let pts = [[0.5, 0.5, 0.0], [7.0, 0.5, 0.0]];
        let err = f.at(&pts, t0(), &SampleOptions::new()).unwrap_err();
        assert!(matches!(err, FieldError::PointOutsideGrid { index: 1, .. }));

        let v = f
            .at(&pts, t0(), &SampleOptions::new().with_extrapolate(true))
            .unwrap();
        assert!((v[1] - 3.0).abs() < TOL);
    }

    #[test]
    fn test_cell_centred_data() {
        let f = GriddedField::surface("c", "m", grid(), vec![5.0, 7.0]).unwrap();
        assert_eq!(f.location(), DataLocation::Center);
        let v = f.at(&[[1.5, 0.5, 0.0]], t0(), &SampleOptions::new()).unwrap();
        assert!((v[0] - 7.0).abs() < TOL);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_serial() {
        let f = sigma_field(&[1.0, 2.0, 3.0]);
        let pts: Vec<Point3> = (0..200)
            .map(|i| {
                let s = i as f64 / 200.0;
                [2.0 * s, 1.0 - s, 12.0 * s]
            })
            .collect();
        let plan = f.plan(&pts, t0(), &SampleOptions::new()).unwrap();
        let serial = f.sample_serial(&plan);
        let parallel = f.sample_parallel(&plan);
        assert_eq!(serial, parallel);
    }
}
