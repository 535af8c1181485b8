//! Vector (velocity) fields.
//!
//! A [`GriddedVector`] stacks two or three scalar [`Component`]s. Two-component
//! fields get a synthesised constant-zero vertical component, so every sample
//! is a full `[u, v, w]`. If the grid is rotated, an angle field turns the
//! grid-relative `u`/`v` into east/north.
//!
//! The [`VectorKind`] adds the physical rules of each forcing:
//!
//! - [`VectorKind::Current`]: no vertical motion at the surface (`w = 0` at `z == 0`)
//! - [`VectorKind::Wind`]: no wind below the surface (zero for `z > 0`)

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::cache::ResultCache;
use super::rotation::rotate_all;
use super::series::{ScalarTimeSeries, VelocityTimeSeries};
use super::{GriddedField, SampleOptions};
use crate::error::{FieldError, Result};
use crate::grid::Grid;
use crate::time::TimeAxis;
use crate::types::{Point3, Vector3};
use crate::units::{self, Dimension};

/// Physical role of a vector field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VectorKind {
    Current,
    Wind,
    IceVelocity,
    Generic,
}

/// One scalar component of a vector field.
#[derive(Clone, Debug)]
pub enum Component {
    Gridded(Arc<GriddedField>),
    Series(ScalarTimeSeries),
}

impl Component {
    /// Constant zero, used for the missing vertical component.
    pub fn zero(units: impl Into<String>) -> Self {
        Self::Series(ScalarTimeSeries::constant("constant w", units, 0.0))
    }

    /// Component name.
    pub fn name(&self) -> &str {
        match self {
            Self::Gridded(f) => f.name(),
            Self::Series(s) => s.name(),
        }
    }

    /// Native units.
    pub fn units(&self) -> &str {
        match self {
            Self::Gridded(f) => f.units(),
            Self::Series(s) => s.units(),
        }
    }

    /// Grid of a gridded component.
    pub fn grid(&self) -> Option<&Arc<dyn Grid>> {
        match self {
            Self::Gridded(f) => Some(f.grid()),
            Self::Series(_) => None,
        }
    }

    /// Time axis.
    pub fn time_axis(&self) -> &TimeAxis {
        match self {
            Self::Gridded(f) => f.time_axis(),
            Self::Series(s) => s.time_axis(),
        }
    }

    /// Sample the component.
    pub fn at(&self, points: &[Point3], time: DateTime<Utc>, opts: &SampleOptions) -> Result<Vec<f64>> {
        match self {
            Self::Gridded(f) => f.at(points, time, opts),
            Self::Series(s) => s.at(points, time, opts),
        }
    }

    /// Drop memoised results.
    pub fn invalidate_cache(&self) {
        if let Self::Gridded(f) = self {
            f.invalidate_cache();
        }
    }
}

impl From<Arc<GriddedField>> for Component {
    fn from(field: Arc<GriddedField>) -> Self {
        Self::Gridded(field)
    }
}

impl From<GriddedField> for Component {
    fn from(field: GriddedField) -> Self {
        Self::Gridded(Arc::new(field))
    }
}

impl From<ScalarTimeSeries> for Component {
    fn from(series: ScalarTimeSeries) -> Self {
        Self::Series(series)
    }
}

// ============================================================================
// Gridded vectors
// ============================================================================

/// Vector field built from scalar components.
#[derive(Debug)]
pub struct GriddedVector {
    name: String,
    units: String,
    kind: VectorKind,
    components: [Component; 3],
    n_components: usize,
    angle: Option<Arc<GriddedField>>,
    cache: ResultCache<Vec<Vector3>>,
    evaluations: AtomicUsize,
}

impl GriddedVector {
    /// Stack two or three components. The first component's units become
    /// the field's units.
    ///
    /// # Errors
    ///
    /// - `TooManyComponents` / `TooFewComponents` outside 2..=3 components
    /// - `IncompatibleUnits` if a component cannot convert to the field units
    /// - `IncompatibleGrids` if gridded components disagree on grid or time
    pub fn new(name: impl Into<String>, kind: VectorKind, components: Vec<Component>) -> Result<Self> {
        let n = components.len();
        if n > 3 {
            return Err(FieldError::TooManyComponents(n, 3));
        }
        if n < 2 {
            return Err(FieldError::TooFewComponents(n));
        }
        let name = name.into();
        let units = components[0].units().to_string();

        for c in &components[1..] {
            if !units::is_convertible(c.units(), &units) {
                return Err(FieldError::incompatible_units(c.units(), &units));
            }
        }
        check_shared_domain(&name, &components)?;

        let mut it = components.into_iter();
        let (u, v) = match (it.next(), it.next()) {
            (Some(u), Some(v)) => (u, v),
            _ => return Err(FieldError::TooFewComponents(n)),
        };
        let w = it.next().unwrap_or_else(|| Component::zero(units.clone()));

        tracing::debug!(field = %name, ?kind, n_components = n, %units, "created vector field");
        Ok(Self {
            name,
            units,
            kind,
            components: [u, v, w],
            n_components: n,
            angle: None,
            cache: ResultCache::new(),
            evaluations: AtomicUsize::new(0),
        })
    }

    /// Rotate samples by a per-location grid angle (radians east of the
    /// grid x-axis).
    pub fn with_angle(mut self, angle: Arc<GriddedField>) -> Result<Self> {
        if let Some(grid) = self.grid() {
            if !grid.is_compatible(angle.grid().as_ref()) {
                return Err(FieldError::IncompatibleGrids(format!(
                    "angle field '{}' is not on the grid of '{}'",
                    angle.name(),
                    self.name
                )));
            }
        }
        self.angle = Some(angle);
        Ok(self)
    }

    /// Name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native units.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Physical role.
    pub fn kind(&self) -> VectorKind {
        self.kind
    }

    /// Number of components supplied (2 or 3).
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Components `[u, v, w]`.
    pub fn components(&self) -> &[Component; 3] {
        &self.components
    }

    /// Rotation angle field, if any.
    pub fn angle(&self) -> Option<&Arc<GriddedField>> {
        self.angle.as_ref()
    }

    /// Grid of the first gridded component.
    pub fn grid(&self) -> Option<&Arc<dyn Grid>> {
        self.components.iter().find_map(Component::grid)
    }

    /// Time axis of the first component.
    pub fn time_axis(&self) -> &TimeAxis {
        self.components[0].time_axis()
    }

    /// Number of vector evaluations (cache misses).
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Drop memoised results here and in every component.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
        for c in &self.components {
            c.invalidate_cache();
        }
        if let Some(angle) = &self.angle {
            angle.invalidate_cache();
        }
    }

    /// Sample `[u, v, w]` at each point.
    pub fn at(&self, points: &[Point3], time: DateTime<Utc>, opts: &SampleOptions) -> Result<Vec<Vector3>> {
        let conversion = opts.conversion_from(&self.units)?;
        let key = opts.key(points, time);

        if opts.memoize {
            if let Some(mut hit) = self.cache.get(&key, points) {
                conversion.apply_vectors(&mut hit);
                return Ok(hit);
            }
        }

        let mut values = self.evaluate(points, time, &opts.native().with_hash(key.hash))?;
        if opts.memoize {
            self.cache.put(key, points, values.clone());
        }
        conversion.apply_vectors(&mut values);
        Ok(values)
    }

    fn evaluate(&self, points: &[Point3], time: DateTime<Utc>, opts: &SampleOptions) -> Result<Vec<Vector3>> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        let component_opts = opts.clone().with_units(self.units.clone());
        let [u, v, w] = [0, 1, 2].map(|i| self.components[i].at(points, time, &component_opts));
        let (u, v, w) = (u?, v?, w?);
        let mut values: Vec<Vector3> = (0..points.len()).map(|i| [u[i], v[i], w[i]]).collect();

        apply_kind_rules(self.kind, points, &mut values);

        if let Some(angle) = &self.angle {
            let angle_opts = if units::dimension_of(angle.units()) == Some(Dimension::Angle) {
                opts.clone().with_units("radians")
            } else {
                opts.clone()
            };
            let angles = angle.at(points, time, &angle_opts)?;
            rotate_all(&mut values, &angles);
        }
        Ok(values)
    }
}

/// Zero vertical velocity at the surface; no wind underwater.
fn apply_kind_rules(kind: VectorKind, points: &[Point3], values: &mut [Vector3]) {
    match kind {
        VectorKind::Current => {
            for (value, p) in values.iter_mut().zip(points) {
                if p[2] == 0.0 {
                    value[2] = 0.0;
                }
            }
        }
        VectorKind::Wind => {
            for (value, p) in values.iter_mut().zip(points) {
                if p[2] > 0.0 {
                    *value = [0.0; 3];
                }
            }
        }
        VectorKind::IceVelocity | VectorKind::Generic => {}
    }
}

fn check_shared_domain(name: &str, components: &[Component]) -> Result<()> {
    let mut gridded = components.iter().filter_map(|c| match c {
        Component::Gridded(f) => Some(f),
        Component::Series(_) => None,
    });
    let Some(first) = gridded.next() else {
        return Ok(());
    };
    for other in gridded {
        if !first.grid().is_compatible(other.grid().as_ref()) {
            return Err(FieldError::IncompatibleGrids(format!(
                "{}: components '{}' and '{}' are on different grids",
                name,
                first.name(),
                other.name()
            )));
        }
        if !first.time_axis().overlaps(other.time_axis()) {
            return Err(FieldError::IncompatibleGrids(format!(
                "{}: components '{}' and '{}' share no time range",
                name,
                first.name(),
                other.name()
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Vector field
// ============================================================================

/// Any velocity source.
#[derive(Debug)]
pub enum VectorField {
    Gridded(GriddedVector),
    Series(VelocityTimeSeries),
}

impl VectorField {
    /// Build a gridded vector field from components.
    pub fn from_components(
        name: impl Into<String>,
        kind: VectorKind,
        components: Vec<Component>,
    ) -> Result<Self> {
        GriddedVector::new(name, kind, components).map(Self::Gridded)
    }

    /// Name.
    pub fn name(&self) -> &str {
        match self {
            Self::Gridded(g) => g.name(),
            Self::Series(s) => s.name(),
        }
    }

    /// Native units.
    pub fn units(&self) -> &str {
        match self {
            Self::Gridded(g) => g.units(),
            Self::Series(s) => s.units(),
        }
    }

    /// Horizontal grid, `None` for spatially uniform series.
    pub fn grid(&self) -> Option<&Arc<dyn Grid>> {
        match self {
            Self::Gridded(g) => g.grid(),
            Self::Series(_) => None,
        }
    }

    /// Time axis.
    pub fn time_axis(&self) -> &TimeAxis {
        match self {
            Self::Gridded(g) => g.time_axis(),
            Self::Series(s) => s.time_axis(),
        }
    }

    /// Sample `[u, v, w]` at each point.
    pub fn at(&self, points: &[Point3], time: DateTime<Utc>, opts: &SampleOptions) -> Result<Vec<Vector3>> {
        match self {
            Self::Gridded(g) => g.at(points, time, opts),
            Self::Series(s) => s.at(points, time, opts),
        }
    }

    /// Number of gridded evaluations (cache misses); always 0 for series.
    pub fn evaluations(&self) -> usize {
        match self {
            Self::Gridded(g) => g.evaluations(),
            Self::Series(_) => 0,
        }
    }

    /// Drop memoised results.
    pub fn invalidate_cache(&self) {
        if let Self::Gridded(g) = self {
            g.invalidate_cache();
        }
    }
}

impl From<GriddedVector> for VectorField {
    fn from(g: GriddedVector) -> Self {
        Self::Gridded(g)
    }
}

impl From<VelocityTimeSeries> for VectorField {
    fn from(s: VelocityTimeSeries) -> Self {
        Self::Series(s)
    }
}
