//! Dataset abstraction over gridded model output.
//!
//! A [`Dataset`] hands out named [`RawVariable`]s: flat values plus their
//! named dimensions and CF metadata. Dimension names decide each axis role
//! ([`classify_dimension`]), so arrays stored as `[time, s_rho, eta, xi]`,
//! `[depth, time, node]` or `[y, x]` all land in the sampler's canonical
//! layout.
//!
//! [`MemoryDataset`] is an in-memory implementation for tests and
//! programmatic setups; `NetcdfDataset` (feature `netcdf`) reads files.

use crate::error::{FieldError, Result};
use crate::field::{Axis, FieldData};

/// Role of a dimension, by name.
pub fn classify_dimension(name: &str) -> Axis {
    match name.to_ascii_lowercase().as_str() {
        "time" | "ocean_time" | "t" | "mt" => Axis::Time,
        "s_rho" | "s_w" | "depth" | "z" | "level" | "lev" | "layer" | "sigma" | "siglay"
        | "siglev" | "deptht" => Axis::Depth,
        _ => Axis::Space,
    }
}

/// A named dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
}

/// One variable as stored: flat values, slowest dimension first.
#[derive(Clone, Debug, PartialEq)]
pub struct RawVariable {
    pub name: String,
    pub dims: Vec<Dimension>,
    pub values: Vec<f64>,
    pub units: Option<String>,
    pub standard_name: Option<String>,
}

impl RawVariable {
    /// Create a variable. Missing values should already be NaN.
    pub fn new<S: Into<String>>(name: impl Into<String>, dims: Vec<(S, usize)>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            dims: dims
                .into_iter()
                .map(|(name, len)| Dimension {
                    name: name.into(),
                    len,
                })
                .collect(),
            values,
            units: None,
            standard_name: None,
        }
    }

    /// A 0-D variable holding one value.
    pub fn scalar(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, Vec::<(String, usize)>::new(), vec![value])
    }

    /// Set the `units` attribute.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Set the CF `standard_name` attribute.
    pub fn with_standard_name(mut self, standard_name: impl Into<String>) -> Self {
        self.standard_name = Some(standard_name.into());
        self
    }

    /// Dimension roles and lengths.
    pub fn axes(&self) -> Vec<(Axis, usize)> {
        self.dims
            .iter()
            .map(|d| (classify_dimension(&d.name), d.len))
            .collect()
    }

    /// Number of values the dimensions describe.
    pub fn expected_len(&self) -> usize {
        self.dims.iter().map(|d| d.len).product()
    }

    /// Check that the values fill the declared dimensions.
    ///
    /// # Errors
    ///
    /// `DataLength` on a mismatch.
    pub fn check_len(&self) -> Result<()> {
        let expected = self.expected_len();
        if self.values.len() != expected {
            return Err(FieldError::DataLength {
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    /// Values in canonical `[time][depth][space]` order.
    pub fn into_field_data(self) -> Result<FieldData> {
        let axes = self.axes();
        FieldData::from_axes(self.values, &axes)
    }
}

/// Source of named variables.
pub trait Dataset {
    /// All variable names, in storage order.
    fn variable_names(&self) -> Vec<String>;

    /// Read a variable.
    ///
    /// # Errors
    ///
    /// `MissingVariable` if absent.
    fn variable(&self, name: &str) -> Result<RawVariable>;

    /// Whether a variable exists.
    fn has_variable(&self, name: &str) -> bool {
        self.variable_names().iter().any(|n| n == name)
    }

    /// CF `standard_name` of a variable.
    fn standard_name(&self, name: &str) -> Option<String> {
        self.variable(name).ok().and_then(|v| v.standard_name)
    }
}

/// Variables held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryDataset {
    variables: Vec<RawVariable>,
}

impl MemoryDataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable.
    pub fn insert(&mut self, variable: RawVariable) {
        match self.variables.iter_mut().find(|v| v.name == variable.name) {
            Some(slot) => *slot = variable,
            None => self.variables.push(variable),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_variable(mut self, variable: RawVariable) -> Self {
        self.insert(variable);
        self
    }
}

impl Dataset for MemoryDataset {
    fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    fn variable(&self, name: &str) -> Result<RawVariable> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .cloned()
            .ok_or_else(|| FieldError::MissingVariable(name.to_string()))
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v.name == name)
    }
}
