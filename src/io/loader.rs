//! Building fields from a [`Dataset`].
//!
//! [`FieldLoader`] reads the shared pieces once (horizontal grid, time axis,
//! sigma depth axis) and then constructs fields by [`EnvKind`], resolving
//! variable names through [`VariableAliases`].
//!
//! ```
//! use envfield::io::{EnvKind, FieldLoader, MemoryDataset, RawVariable};
//!
//! let ds = MemoryDataset::new()
//!     .with_variable(RawVariable::new("lon", vec![("lon", 3)], vec![0.0, 1.0, 2.0]))
//!     .with_variable(RawVariable::new("lat", vec![("lat", 2)], vec![50.0, 51.0]))
//!     .with_variable(
//!         RawVariable::new("temp", vec![("lat", 2), ("lon", 3)], vec![280.0; 6]).with_units("K"),
//!     );
//!
//! let loader = FieldLoader::new(&ds).unwrap();
//! let temp = loader.scalar(EnvKind::Temperature).unwrap();
//! assert_eq!(temp.units(), "K");
//! ```

use std::sync::Arc;

use super::aliases::{EnvKind, VariableAliases};
use super::dataset::Dataset;
use crate::environment::Environment;
use crate::error::{FieldError, Result};
use crate::field::{
    Component, GriddedField, GriddedVector, IceAwareField, VectorField, VectorKind,
};
use crate::grid::{Grid, RectilinearGrid};
use crate::time::TimeAxis;
use crate::vertical::{DepthAxis, SigmaTerms};

const TIME_NAMES: [&str; 3] = ["time", "ocean_time", "Time"];

const COORD_NAMES: [(&str, &str); 4] = [
    ("lon", "lat"),
    ("longitude", "latitude"),
    ("lon_rho", "lat_rho"),
    ("x", "y"),
];

/// Read the dataset time coordinate. Datasets without one are
/// time-invariant (empty axis).
pub fn read_time_axis(ds: &dyn Dataset) -> Result<TimeAxis> {
    for name in TIME_NAMES {
        if ds.has_variable(name) {
            let var = ds.variable(name)?;
            let units = var.units.as_deref().ok_or_else(|| {
                FieldError::InvalidTimeAxis(format!("time variable '{}' has no units", name))
            })?;
            return TimeAxis::from_cf(&var.values, units);
        }
    }
    Ok(TimeAxis::empty())
}

/// Read 1-D (or rectilinear 2-D) longitude/latitude coordinates.
pub fn read_grid(ds: &dyn Dataset) -> Result<RectilinearGrid> {
    for (x_name, y_name) in COORD_NAMES {
        if !(ds.has_variable(x_name) && ds.has_variable(y_name)) {
            continue;
        }
        let x = ds.variable(x_name)?;
        let y = ds.variable(y_name)?;
        x.check_len()?;
        y.check_len()?;
        let (xs, ys) = match (x.dims.len(), y.dims.len()) {
            (1, 1) => (x.values, y.values),
            (2, 2) => rectilinear_axes(&x.values, &y.values, x.dims[0].len, x.dims[1].len)?,
            _ => {
                return Err(FieldError::IncompatibleGrids(format!(
                    "coordinates '{}'/'{}' are neither 1-D nor 2-D",
                    x_name, y_name
                )))
            }
        };
        return RectilinearGrid::new(xs, ys);
    }
    Err(FieldError::MissingVariable("lon/lat coordinates".into()))
}

/// Extract axes from 2-D `[ny][nx]` coordinates that are rectilinear.
fn rectilinear_axes(x: &[f64], y: &[f64], ny: usize, nx: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    const COORD_TOL: f64 = 1e-9;
    let expected = nx * ny;
    for values in [x, y] {
        if values.len() != expected || expected == 0 {
            return Err(FieldError::DataLength {
                expected,
                actual: values.len(),
            });
        }
    }
    let xs: Vec<f64> = x[..nx].to_vec();
    let ys: Vec<f64> = (0..ny).map(|j| y[j * nx]).collect();
    for j in 0..ny {
        for i in 0..nx {
            let k = j * nx + i;
            if (x[k] - xs[i]).abs() > COORD_TOL || (y[k] - ys[j]).abs() > COORD_TOL {
                return Err(FieldError::IncompatibleGrids(
                    "curvilinear coordinates need a custom Grid implementation".into(),
                ));
            }
        }
    }
    Ok((xs, ys))
}

impl GriddedField {
    /// Load variable `name` onto `grid`.
    ///
    /// Units default to `""` when the variable has none. `time` is used
    /// only if the variable has a time dimension.
    pub fn from_dataset(
        ds: &dyn Dataset,
        name: &str,
        grid: Arc<dyn Grid>,
        time: &TimeAxis,
        depth: DepthAxis,
    ) -> Result<Self> {
        let var = ds.variable(name)?;
        let units = var.units.clone().unwrap_or_default();
        let data = var.into_field_data()?;
        let time = if data.shape().n_time.is_some() {
            time.clone()
        } else {
            TimeAxis::empty()
        };
        Self::new(name, units, grid, time, data, depth)
    }
}

impl VectorField {
    /// Load a gridded vector field of the given kind with default aliases.
    pub fn from_dataset(ds: &dyn Dataset, kind: VectorKind) -> Result<Self> {
        FieldLoader::new(ds)?.vector(kind).map(Self::Gridded)
    }
}

/// Builds fields from one dataset.
pub struct FieldLoader<'a> {
    ds: &'a dyn Dataset,
    aliases: VariableAliases,
    grid: Arc<dyn Grid>,
    time: TimeAxis,
    depth: DepthAxis,
}

impl<'a> FieldLoader<'a> {
    /// Read grid and time from `ds` and detect a sigma depth axis.
    pub fn new(ds: &'a dyn Dataset) -> Result<Self> {
        let grid: Arc<dyn Grid> = Arc::new(read_grid(ds)?);
        let time = read_time_axis(ds)?;
        Self {
            ds,
            aliases: VariableAliases::default(),
            grid,
            time,
            depth: DepthAxis::flat(),
        }
        .detect_depth()
    }

    /// Use custom variable aliases (depth detection is re-run).
    pub fn with_aliases(mut self, aliases: VariableAliases) -> Result<Self> {
        self.aliases = aliases;
        self.detect_depth()
    }

    /// Use a custom grid, e.g. a curvilinear [`Grid`] implementation.
    pub fn with_grid(mut self, grid: Arc<dyn Grid>) -> Self {
        self.grid = grid;
        self
    }

    /// Override the depth axis.
    pub fn with_depth(mut self, depth: DepthAxis) -> Self {
        self.depth = depth;
        self
    }

    /// Sigma axis when the dataset has sigma terms and a bathymetry,
    /// flat otherwise.
    fn detect_depth(mut self) -> Result<Self> {
        if !self.ds.has_variable("s_w") {
            self.depth = DepthAxis::flat();
            return Ok(self);
        }
        let terms = SigmaTerms::from_dataset(self.ds)?;
        let bathymetry = Arc::new(self.bathymetry()?);
        tracing::info!(
            n_w = terms.num_w_levels(),
            n_rho = terms.num_rho_levels(),
            hc = terms.hc(),
            "loaded sigma terms"
        );
        self.depth = DepthAxis::sigma(bathymetry, terms);
        Ok(self)
    }

    /// Shared horizontal grid.
    pub fn grid(&self) -> &Arc<dyn Grid> {
        &self.grid
    }

    /// Shared time axis.
    pub fn time_axis(&self) -> &TimeAxis {
        &self.time
    }

    /// Depth axis applied to 3-D variables.
    pub fn depth_axis(&self) -> &DepthAxis {
        &self.depth
    }

    /// Whether a variable for `kind` exists.
    pub fn has(&self, kind: EnvKind) -> bool {
        self.aliases.find(self.ds, kind).is_some()
    }

    /// Load a scalar field.
    pub fn scalar(&self, kind: EnvKind) -> Result<GriddedField> {
        let name = self.aliases.require(self.ds, kind)?;
        let field = GriddedField::from_dataset(
            self.ds,
            &name,
            Arc::clone(&self.grid),
            &self.time,
            self.depth.clone(),
        )?;
        if field.units().is_empty() {
            return Ok(self.with_default_units(field, kind));
        }
        Ok(field)
    }

    fn with_default_units(&self, field: GriddedField, kind: EnvKind) -> GriddedField {
        tracing::debug!(field = field.name(), units = kind.default_units(), "assuming default units");
        field.with_units(kind.default_units())
    }

    /// Load the sea-floor depth (always 2-D).
    pub fn bathymetry(&self) -> Result<GriddedField> {
        let name = self.aliases.require(self.ds, EnvKind::Bathymetry)?;
        let field = GriddedField::from_dataset(
            self.ds,
            &name,
            Arc::clone(&self.grid),
            &self.time,
            DepthAxis::flat(),
        )?;
        if field.units().is_empty() {
            return Ok(self.with_default_units(field, EnvKind::Bathymetry));
        }
        Ok(field)
    }

    /// Load a vector field: `u`, `v`, optional `w` (currents only) and the
    /// grid angle if the dataset has one.
    pub fn vector(&self, kind: VectorKind) -> Result<GriddedVector> {
        let (u, v, w, name) = match kind {
            VectorKind::Current | VectorKind::Generic => (
                EnvKind::CurrentU,
                EnvKind::CurrentV,
                Some(EnvKind::CurrentW),
                "current",
            ),
            VectorKind::Wind => (EnvKind::WindU, EnvKind::WindV, None, "wind"),
            VectorKind::IceVelocity => (
                EnvKind::IceVelocityU,
                EnvKind::IceVelocityV,
                None,
                "ice_velocity",
            ),
        };
        let mut components: Vec<Component> = vec![self.scalar(u)?.into(), self.scalar(v)?.into()];
        if let Some(w) = w.filter(|&w| self.has(w)) {
            components.push(self.scalar(w)?.into());
        }
        let field = GriddedVector::new(name, kind, components)?;

        match self.aliases.find(self.ds, EnvKind::GridAngle) {
            Some(angle_name) => {
                let angle = GriddedField::from_dataset(
                    self.ds,
                    &angle_name,
                    Arc::clone(&self.grid),
                    &self.time,
                    DepthAxis::flat(),
                )?;
                let angle = if angle.units().is_empty() {
                    self.with_default_units(angle, EnvKind::GridAngle)
                } else {
                    angle
                };
                field.with_angle(Arc::new(angle))
            }
            None => Ok(field),
        }
    }

    /// Load every recognised quantity into a registry.
    ///
    /// Ids: `current`, `wind`, `ice_velocity`, `ice_concentration`,
    /// `water_temperature`, `salinity`, `sediment`, `bathymetry`, and
    /// `ice_aware_current` / `ice_aware_wind` when ice concentration is
    /// present alongside them.
    pub fn environment(&self) -> Result<Environment> {
        let mut env = Environment::new();

        let gridded = |kind| -> Result<Arc<VectorField>> {
            Ok(Arc::new(VectorField::Gridded(self.vector(kind)?)))
        };
        let current = if self.has(EnvKind::CurrentU) && self.has(EnvKind::CurrentV) {
            Some(gridded(VectorKind::Current)?)
        } else {
            None
        };
        let wind = if self.has(EnvKind::WindU) && self.has(EnvKind::WindV) {
            Some(gridded(VectorKind::Wind)?)
        } else {
            None
        };
        let ice_velocity = if self.has(EnvKind::IceVelocityU) && self.has(EnvKind::IceVelocityV) {
            Some(gridded(VectorKind::IceVelocity)?)
        } else {
            None
        };
        let concentration = if self.has(EnvKind::IceConcentration) {
            Some(Arc::new(self.scalar(EnvKind::IceConcentration)?))
        } else {
            None
        };

        if let (Some(c), Some(conc), Some(ice)) = (&current, &concentration, &ice_velocity) {
            let aware = IceAwareField::current(Arc::clone(c), Arc::clone(conc), Arc::clone(ice))?;
            env.insert("ice_aware_current", aware);
        }
        if let (Some(w), Some(conc)) = (&wind, &concentration) {
            env.insert("ice_aware_wind", IceAwareField::wind(Arc::clone(w), Arc::clone(conc))?);
        }
        if let Some(c) = current {
            env.insert("current", c);
        }
        if let Some(w) = wind {
            env.insert("wind", w);
        }
        if let Some(ice) = ice_velocity {
            env.insert("ice_velocity", ice);
        }
        if let Some(conc) = concentration {
            env.insert("ice_concentration", conc);
        }

        for (id, kind) in [
            ("water_temperature", EnvKind::Temperature),
            ("salinity", EnvKind::Salinity),
            ("sediment", EnvKind::Sediment),
        ] {
            if self.has(kind) {
                env.insert(id, self.scalar(kind)?);
            }
        }
        match &self.depth {
            DepthAxis::Sigma(sigma) => {
                env.insert("bathymetry", Arc::clone(sigma.bathymetry()));
            }
            DepthAxis::Flat(_) if self.has(EnvKind::Bathymetry) => {
                env.insert("bathymetry", self.bathymetry()?);
            }
            DepthAxis::Flat(_) => {}
        }

        tracing::info!(n_fields = env.len(), "loaded environment");
        Ok(env)
    }
}
