//! NetCDF-backed [`Dataset`].
//!
//! Reads model output (ROMS, HYCOM, CICE, ERA5, ...) with packed-data
//! handling:
//!
//! - `_FillValue` / `missing_value` entries become NaN
//! - `scale_factor` / `add_offset` are applied to the remaining values
//! - magnitudes above 1e30 (undeclared fill) become NaN
//!
//! # Example
//!
//! ```rust,ignore
//! use envfield::io::{FieldLoader, NetcdfDataset};
//!
//! let ds = NetcdfDataset::open("roms_his.nc")?;
//! let env = FieldLoader::new(&ds)?.environment()?;
//! ```

use std::path::Path;

use super::dataset::{Dataset, Dimension, RawVariable};
use crate::error::{FieldError, Result};

/// Values this large are treated as fill even without a declared `_FillValue`.
const FILL_THRESHOLD: f64 = 1e30;

/// An open NetCDF file.
pub struct NetcdfDataset {
    file: netcdf::File,
}

impl std::fmt::Debug for NetcdfDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetcdfDataset")
            .field("variables", &self.variable_names())
            .finish()
    }
}

impl NetcdfDataset {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = netcdf::open(path)?;
        tracing::info!(path = %path.display(), "opened NetCDF dataset");
        Ok(Self { file })
    }

    /// Numeric attribute as f64.
    fn attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
        var.attribute_value(name)
            .and_then(|r| r.ok())
            .and_then(|v| match v {
                netcdf::AttributeValue::Double(d) => Some(d),
                netcdf::AttributeValue::Float(f) => Some(f as f64),
                netcdf::AttributeValue::Short(s) => Some(s as f64),
                netcdf::AttributeValue::Int(i) => Some(i as f64),
                netcdf::AttributeValue::Schar(b) => Some(b as f64),
                _ => None,
            })
    }

    /// String attribute.
    fn attr_str(var: &netcdf::Variable, name: &str) -> Option<String> {
        var.attribute_value(name)
            .and_then(|r| r.ok())
            .and_then(|v| match v {
                netcdf::AttributeValue::Str(s) => Some(s),
                _ => None,
            })
    }
}

/// Decode packed values in place.
fn unpack(values: &mut [f64], fill: Option<f64>, scale: f64, offset: f64) {
    for v in values.iter_mut() {
        let missing = !v.is_finite() || v.abs() > FILL_THRESHOLD || fill.is_some_and(|f| *v == f);
        *v = if missing { f64::NAN } else { *v * scale + offset };
    }
}

impl Dataset for NetcdfDataset {
    fn variable_names(&self) -> Vec<String> {
        self.file.variables().map(|v| v.name()).collect()
    }

    fn has_variable(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    fn standard_name(&self, name: &str) -> Option<String> {
        let var = self.file.variable(name)?;
        Self::attr_str(&var, "standard_name")
    }

    fn variable(&self, name: &str) -> Result<RawVariable> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| FieldError::MissingVariable(name.to_string()))?;

        let scale = Self::attr_f64(&var, "scale_factor").unwrap_or(1.0);
        let offset = Self::attr_f64(&var, "add_offset").unwrap_or(0.0);
        let fill = Self::attr_f64(&var, "_FillValue").or_else(|| Self::attr_f64(&var, "missing_value"));

        let mut values: Vec<f64> = var.get_values::<f64, _>(..)?;
        unpack(&mut values, fill, scale, offset);

        let dims = var
            .dimensions()
            .iter()
            .map(|d| Dimension {
                name: d.name(),
                len: d.len(),
            })
            .collect();

        tracing::debug!(variable = name, n_values = values.len(), "read NetCDF variable");
        Ok(RawVariable {
            name: name.to_string(),
            dims,
            values,
            units: Self::attr_str(&var, "units"),
            standard_name: Self::attr_str(&var, "standard_name"),
        })
    }
}
