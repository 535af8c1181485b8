//! Environmental fields and their sampling.
//!
//! - [`GriddedField`]: a scalar on a horizontal [`Grid`](crate::grid::Grid),
//!   optionally with time and depth dimensions
//! - [`ScalarTimeSeries`]: a spatially uniform scalar
//! - [`VectorField`]: velocities, either gridded components or a spatially
//!   uniform [`VelocityTimeSeries`]
//! - [`IceAwareField`]: a vector field blended with sea-ice motion
//!
//! Every field answers `at(points, time, &SampleOptions)` with one value
//! per point. Results are memoised per field ([`ResultCache`]) so repeated
//! queries within one model step are free.

mod cache;
mod data;
mod gridded;
mod ice;
mod rotation;
mod series;
mod vector;

pub use cache::{query_hash, CacheStats, QueryKey, ResultCache};
pub use data::{Axis, DataShape, FieldData};
pub use gridded::GriddedField;
pub use ice::{
    blend_current, blend_factor, blend_wind, ConcentrationPolicy, IceAwareField, IceBlend,
    IceBlendConfig, ICE_BLEND_START, ICE_FULL_COVER,
};
pub use rotation::{rotate, rotate_all};
pub use series::{
    direction_to_uv, uv_to_direction, ScalarTimeSeries, SpeedDirection, VelocityTimeSeries,
};
pub use vector::{Component, GriddedVector, VectorField, VectorKind};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::Point3;
use crate::units::UnitConversion;

/// Per-query options.
///
/// ```
/// use envfield::field::SampleOptions;
///
/// let opts = SampleOptions::new().with_units("knots").with_extrapolate(true);
/// assert_eq!(opts.units.as_deref(), Some("knots"));
/// assert!(opts.memoize);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SampleOptions {
    /// Output units; `None` returns native units.
    pub units: Option<String>,
    /// Clamp out-of-range points and times instead of failing.
    pub extrapolate: bool,
    /// Read and write the per-field result cache.
    pub memoize: bool,
    /// Precomputed [`query_hash`] of the points and time.
    pub hash: Option<u64>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            units: None,
            extrapolate: false,
            memoize: true,
            hash: None,
        }
    }
}

impl SampleOptions {
    /// Default options: native units, no extrapolation, memoised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request output in `units`.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Enable or disable extrapolation.
    pub fn with_extrapolate(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    /// Enable or disable memoisation.
    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Supply a precomputed query hash.
    pub fn with_hash(mut self, hash: u64) -> Self {
        self.hash = Some(hash);
        self
    }

    /// Supply an optional precomputed query hash.
    pub fn with_hash_opt(mut self, hash: Option<u64>) -> Self {
        self.hash = hash;
        self
    }

    /// Same options in native units.
    pub fn native(&self) -> Self {
        Self {
            units: None,
            ..self.clone()
        }
    }

    /// Conversion from a field's native units to the requested ones.
    pub fn conversion_from(&self, native: &str) -> Result<UnitConversion> {
        match &self.units {
            Some(target) => UnitConversion::new(native, target),
            None => Ok(UnitConversion::IDENTITY),
        }
    }

    /// Cache key for a query, hashing the points unless a hash was supplied.
    pub fn key(&self, points: &[Point3], time: DateTime<Utc>) -> QueryKey {
        QueryKey {
            hash: self.hash.unwrap_or_else(|| query_hash(points, time)),
            time,
            extrapolate: self.extrapolate,
        }
    }
}
