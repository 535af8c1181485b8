//! Named registry of environmental fields.
//!
//! Movers and weathering code look fields up by id (`"current"`, `"wind"`,
//! `"water_temperature"`, ...) and sample them for a batch of points. The
//! driving loop calls [`Environment::begin_step`] at every model step so no
//! cached result outlives the step it was computed for.
//!
//! ```
//! use chrono::Utc;
//! use envfield::environment::Environment;
//! use envfield::field::{ScalarTimeSeries, VelocityTimeSeries};
//!
//! let mut env = Environment::new();
//! env.insert("wind", VelocityTimeSeries::constant("wind", 10.0, 0.0, "m/s"));
//! env.insert("water_temperature", ScalarTimeSeries::water_temperature(285.0));
//!
//! let points = [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0]];
//! let wind = env.sample("wind", &points, Utc::now()).unwrap();
//! assert_eq!(wind.len(), 2);
//! assert_eq!(env.sample_units("water_temperature").unwrap(), "K");
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;

use crate::error::{FieldError, Result};
use crate::field::{
    query_hash, GriddedField, IceAwareField, SampleOptions, ScalarTimeSeries, VectorField,
    VelocityTimeSeries,
};
use crate::types::{Point3, Vector3};

/// Any field the registry can hold.
#[derive(Debug)]
pub enum EnvField {
    Scalar(Arc<GriddedField>),
    Series(ScalarTimeSeries),
    Vector(Arc<VectorField>),
    IceAware(IceAwareField),
}

impl EnvField {
    /// Native units.
    pub fn units(&self) -> &str {
        match self {
            Self::Scalar(f) => f.units(),
            Self::Series(s) => s.units(),
            Self::Vector(v) => v.units(),
            Self::IceAware(f) => f.units(),
        }
    }

    /// Number of components per sample.
    pub fn n_components(&self) -> usize {
        match self {
            Self::Scalar(_) | Self::Series(_) => 1,
            Self::Vector(_) | Self::IceAware(_) => 3,
        }
    }

    /// Sample at `points`.
    pub fn at(&self, points: &[Point3], time: DateTime<Utc>, opts: &SampleOptions) -> Result<Samples> {
        Ok(match self {
            Self::Scalar(f) => Samples::Scalar(f.at(points, time, opts)?),
            Self::Series(s) => Samples::Scalar(s.at(points, time, opts)?),
            Self::Vector(v) => Samples::Vector(v.at(points, time, opts)?),
            Self::IceAware(f) => Samples::Vector(f.at(points, time, opts)?),
        })
    }

    /// Drop memoised results.
    pub fn invalidate_cache(&self) {
        match self {
            Self::Scalar(f) => f.invalidate_cache(),
            Self::Series(_) => {}
            Self::Vector(v) => v.invalidate_cache(),
            Self::IceAware(f) => f.invalidate_cache(),
        }
    }
}

impl From<GriddedField> for EnvField {
    fn from(field: GriddedField) -> Self {
        Self::Scalar(Arc::new(field))
    }
}

impl From<Arc<GriddedField>> for EnvField {
    fn from(field: Arc<GriddedField>) -> Self {
        Self::Scalar(field)
    }
}

impl From<ScalarTimeSeries> for EnvField {
    fn from(series: ScalarTimeSeries) -> Self {
        Self::Series(series)
    }
}

impl From<VectorField> for EnvField {
    fn from(field: VectorField) -> Self {
        Self::Vector(Arc::new(field))
    }
}

impl From<Arc<VectorField>> for EnvField {
    fn from(field: Arc<VectorField>) -> Self {
        Self::Vector(field)
    }
}

impl From<VelocityTimeSeries> for EnvField {
    fn from(series: VelocityTimeSeries) -> Self {
        VectorField::from(series).into()
    }
}

impl From<IceAwareField> for EnvField {
    fn from(field: IceAwareField) -> Self {
        Self::IceAware(field)
    }
}

/// Result of sampling one field: `N` values or `N` vectors.
#[derive(Clone, Debug, PartialEq)]
pub enum Samples {
    Scalar(Vec<f64>),
    Vector(Vec<Vector3>),
}

impl Samples {
    /// Number of points.
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(v) => v.len(),
            Self::Vector(v) => v.len(),
        }
    }

    /// Whether no points were sampled.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scalar values, if this is a scalar result.
    pub fn as_scalar(&self) -> Option<&[f64]> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Vector(_) => None,
        }
    }

    /// Vectors, if this is a vector result.
    pub fn as_vector(&self) -> Option<&[Vector3]> {
        match self {
            Self::Vector(v) => Some(v),
            Self::Scalar(_) => None,
        }
    }

    /// Row-major `N x C` values.
    pub fn into_rows(self) -> Vec<Vec<f64>> {
        match self {
            Self::Scalar(v) => v.into_iter().map(|x| vec![x]).collect(),
            Self::Vector(v) => v.into_iter().map(|x| x.to_vec()).collect(),
        }
    }
}

/// Fields keyed by id.
#[derive(Debug, Default)]
pub struct Environment {
    fields: FxHashMap<String, EnvField>,
}

impl Environment {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field, replacing any previous one with the same id.
    pub fn insert(&mut self, id: impl Into<String>, field: impl Into<EnvField>) {
        let id = id.into();
        if self.fields.insert(id.clone(), field.into()).is_some() {
            tracing::debug!(%id, "replaced field");
        }
    }

    /// Remove a field.
    pub fn remove(&mut self, id: &str) -> Option<EnvField> {
        self.fields.remove(id)
    }

    /// Look up a field.
    pub fn get(&self, id: &str) -> Result<&EnvField> {
        self.fields
            .get(id)
            .ok_or_else(|| FieldError::UnknownField(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fields.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Sample a field in its native units.
    pub fn sample(&self, id: &str, points: &[Point3], time: DateTime<Utc>) -> Result<Samples> {
        self.sample_with(id, points, time, &SampleOptions::new())
    }

    /// Sample a field with explicit options.
    pub fn sample_with(
        &self,
        id: &str,
        points: &[Point3],
        time: DateTime<Utc>,
        opts: &SampleOptions,
    ) -> Result<Samples> {
        self.get(id)?.at(points, time, opts)
    }

    /// Sample several fields at the same points, hashing the batch once.
    pub fn sample_many(
        &self,
        ids: &[&str],
        points: &[Point3],
        time: DateTime<Utc>,
        opts: &SampleOptions,
    ) -> Result<Vec<Samples>> {
        let opts = opts.clone().with_hash(query_hash(points, time));
        ids.iter()
            .map(|id| self.sample_with(id, points, time, &opts))
            .collect()
    }

    /// Native units of a field.
    pub fn sample_units(&self, id: &str) -> Result<&str> {
        Ok(self.get(id)?.units())
    }

    /// Start a new model step: every memoised result is dropped.
    pub fn begin_step(&self) {
        for field in self.fields.values() {
            field.invalidate_cache();
        }
        tracing::debug!(n_fields = self.fields.len(), "invalidated field caches");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::RectilinearGrid;
    use chrono::TimeZone;

    const TOL: f64 = 1e-10;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn temperature() -> GriddedField {
        let grid = RectilinearGrid::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        GriddedField::surface("temp", "C", Arc::new(grid), vec![10.0, 20.0, 10.0, 20.0]).unwrap()
    }

    #[test]
    fn test_unknown_field() {
        let env = Environment::new();
        assert!(matches!(
            env.sample("current", &[[0.0, 0.0, 0.0]], t0()),
            Err(FieldError::UnknownField(_))
        ));
        assert!(env.sample_units("current").is_err());
    }

    #[test]
    fn test_sample_scalar_and_units() {
        let mut env = Environment::new();
        env.insert("water_temperature", temperature());
        assert_eq!(env.sample_units("water_temperature").unwrap(), "C");

        let s = env.sample("water_temperature", &[[0.5, 0.5, 0.0]], t0()).unwrap();
        assert!((s.as_scalar().unwrap()[0] - 15.0).abs() < TOL);

        let k = env
            .sample_with(
                "water_temperature",
                &[[0.5, 0.5, 0.0]],
                t0(),
                &SampleOptions::new().with_units("K"),
            )
            .unwrap();
        assert!((k.as_scalar().unwrap()[0] - 288.15).abs() < 1e-9);
    }

    #[test]
    fn test_begin_step_invalidates() {
        let field = Arc::new(temperature());
        let mut env = Environment::new();
        env.insert("temp", Arc::clone(&field));

        let pts = [[0.25, 0.5, 0.0]];
        env.sample("temp", &pts, t0()).unwrap();
        env.sample("temp", &pts, t0()).unwrap();
        assert_eq!(field.evaluations(), 1);

        env.begin_step();
        env.sample("temp", &pts, t0()).unwrap();
        assert_eq!(field.evaluations(), 2);
    }

    #[test]
    fn test_sample_many_rows() {
        let mut env = Environment::new();
        env.insert("temp", temperature());
        env.insert("wind", VelocityTimeSeries::constant("wind", 5.0, 270.0, "m/s"));

        let pts = [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0]];
        let out = env.sample_many(&["temp", "wind"], &pts, t0(), &SampleOptions::new()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 2);

        let rows = out[1].clone().into_rows();
        assert_eq!(rows[0].len(), 3);
        assert!((rows[0][0] - 5.0).abs() < 1e-9);
        assert_eq!(env.ids(), vec!["temp", "wind"]);
    }
}
