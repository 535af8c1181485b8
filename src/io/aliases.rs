//! Variable name lookup for environmental quantities.
//!
//! Model output names the same quantity in many ways (`u`, `water_u`,
//! `curr_ucmp`, ...). Each [`EnvKind`] carries a default list of known
//! names and CF standard names. [`VariableAliases`] looks for an exact name
//! first, then for a variable whose `standard_name` matches. Defaults can
//! be overridden per kind.
//!
//! ```
//! use envfield::io::{EnvKind, MemoryDataset, RawVariable, VariableAliases};
//!
//! let ds = MemoryDataset::new().with_variable(RawVariable::new("water_u", vec![("x", 1)], vec![0.0]));
//! let aliases = VariableAliases::default();
//! assert_eq!(aliases.find(&ds, EnvKind::CurrentU).as_deref(), Some("water_u"));
//! assert!(aliases.find(&ds, EnvKind::WindU).is_none());
//! ```

use rustc_hash::FxHashMap;

use super::dataset::Dataset;
use crate::error::{FieldError, Result};

/// Environmental quantity a variable can represent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvKind {
    CurrentU,
    CurrentV,
    CurrentW,
    WindU,
    WindV,
    IceVelocityU,
    IceVelocityV,
    IceConcentration,
    Temperature,
    Salinity,
    Sediment,
    Bathymetry,
    GridAngle,
}

impl EnvKind {
    /// Built-in variable names, in lookup order.
    pub fn default_names(self) -> &'static [&'static str] {
        match self {
            Self::CurrentU => &["u", "U", "water_u", "curr_ucmp"],
            Self::CurrentV => &["v", "V", "water_v", "curr_vcmp"],
            Self::CurrentW => &["w", "W"],
            Self::WindU => &["air_u", "Air_U", "air_ucmp", "wind_u"],
            Self::WindV => &["air_v", "Air_V", "air_vcmp", "wind_v"],
            Self::IceVelocityU => &["ice_u"],
            Self::IceVelocityV => &["ice_v"],
            Self::IceConcentration => &["ice_fraction", "aice"],
            Self::Temperature => &["water_t", "temp"],
            Self::Salinity => &["salt"],
            Self::Sediment => &["sand_06"],
            Self::Bathymetry => &["h"],
            Self::GridAngle => &["angle"],
        }
    }

    /// Built-in CF standard names.
    pub fn default_standard_names(self) -> &'static [&'static str] {
        match self {
            Self::CurrentU => &["eastward_sea_water_velocity"],
            Self::CurrentV => &["northward_sea_water_velocity"],
            Self::CurrentW => &["upward_sea_water_velocity"],
            Self::WindU => &["eastward_wind"],
            Self::WindV => &["northward_wind"],
            Self::IceVelocityU => &["eastward_sea_ice_velocity"],
            Self::IceVelocityV => &["northward_sea_ice_velocity"],
            Self::IceConcentration => &["sea_ice_area_fraction"],
            Self::Temperature => &["sea_water_temperature", "sea_surface_temperature"],
            Self::Salinity => &["sea_water_salinity", "sea_surface_salinity"],
            Self::Sediment => &[],
            Self::Bathymetry => &["depth", "sea_floor_depth_below_sea_surface"],
            Self::GridAngle => &[],
        }
    }

    /// Units assumed when the variable carries none.
    pub fn default_units(self) -> &'static str {
        match self {
            Self::CurrentU | Self::CurrentV | Self::CurrentW => "m/s",
            Self::WindU | Self::WindV => "m/s",
            Self::IceVelocityU | Self::IceVelocityV => "m/s",
            Self::IceConcentration => "1",
            Self::Temperature => "K",
            Self::Salinity => "ppt",
            Self::Sediment => "kg/m^3",
            Self::Bathymetry => "m",
            Self::GridAngle => "radians",
        }
    }
}

/// Per-kind name lists with overridable defaults.
#[derive(Clone, Debug, Default)]
pub struct VariableAliases {
    names: FxHashMap<EnvKind, Vec<String>>,
    standard_names: FxHashMap<EnvKind, Vec<String>>,
}

impl VariableAliases {
    /// Replace the variable names tried for `kind`.
    pub fn with_names<S: Into<String>>(mut self, kind: EnvKind, names: impl IntoIterator<Item = S>) -> Self {
        self.names
            .insert(kind, names.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the CF standard names tried for `kind`.
    pub fn with_standard_names<S: Into<String>>(
        mut self,
        kind: EnvKind,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.standard_names
            .insert(kind, names.into_iter().map(Into::into).collect());
        self
    }

    /// Variable names tried for `kind`.
    pub fn names(&self, kind: EnvKind) -> Vec<String> {
        match self.names.get(&kind) {
            Some(names) => names.clone(),
            None => kind.default_names().iter().map(|s| s.to_string()).collect(),
        }
    }

    /// CF standard names tried for `kind`.
    pub fn standard_names(&self, kind: EnvKind) -> Vec<String> {
        match self.standard_names.get(&kind) {
            Some(names) => names.clone(),
            None => kind
                .default_standard_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Name of the dataset variable holding `kind`, if any.
    pub fn find(&self, ds: &dyn Dataset, kind: EnvKind) -> Option<String> {
        if let Some(name) = self.names(kind).into_iter().find(|n| ds.has_variable(n)) {
            return Some(name);
        }
        let wanted = self.standard_names(kind);
        if wanted.is_empty() {
            return None;
        }
        ds.variable_names().into_iter().find(|name| {
            ds.standard_name(name)
                .is_some_and(|sn| wanted.iter().any(|w| *w == sn))
        })
    }

    /// Like [`find`](Self::find), failing with `MissingVariable`.
    pub fn require(&self, ds: &dyn Dataset, kind: EnvKind) -> Result<String> {
        self.find(ds, kind).ok_or_else(|| {
            FieldError::MissingVariable(format!("{:?} (tried {})", kind, self.names(kind).join(", ")))
        })
    }
}
