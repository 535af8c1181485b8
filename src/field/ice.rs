//! Ice-aware blending of currents and winds.
//!
//! Drifting oil under sea ice moves with the ice, and ice shelters the
//! surface from wind. Given the local ice concentration `c`:
//!
//! | concentration   | current                           | wind            |
//! |-----------------|-----------------------------------|-----------------|
//! | `c < 0.2`       | water current                     | wind            |
//! | `0.2 <= c < 0.8`| `water + (ice - water) * f`       | `wind * (1 - f)`|
//! | `c >= 0.8`      | ice velocity                      | zero            |
//!
//! with `f = (c - 0.2) / 0.6` rising from 0 to 1 across the band.
//!
//! ```
//! use envfield::field::{blend_current, blend_wind};
//! use envfield::types::Concentration;
//!
//! let half = [Concentration::clamped(0.5)];
//! let mut current = [[1.0, 0.0, 0.0]];
//! blend_current(&mut current, &[[0.0, 1.0, 0.0]], &half);
//! assert!((current[0][0] - 0.5).abs() < 1e-9);
//! assert!((current[0][1] - 0.5).abs() < 1e-9);
//!
//! let mut wind = [[10.0, 0.0, 0.0]];
//! blend_wind(&mut wind, &half);
//! assert!((wind[0][0] - 5.0).abs() < 1e-9);
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::cache::{CacheStats, ResultCache};
use super::{GriddedField, SampleOptions, VectorField};
use crate::error::{FieldError, Result};
use crate::types::{Concentration, Point3, Vector3};
use crate::units::{self, Dimension};

/// Concentration where blending starts.
pub const ICE_BLEND_START: f64 = 0.2;

/// Concentration treated as full ice cover.
pub const ICE_FULL_COVER: f64 = 0.8;

/// Ice weight for a concentration: 0 in open water, 1 under full cover.
#[inline]
pub fn blend_factor(c: Concentration) -> f64 {
    let c = c.fraction();
    if c < ICE_BLEND_START {
        0.0
    } else if c >= ICE_FULL_COVER {
        1.0
    } else {
        (c - ICE_BLEND_START) / (ICE_FULL_COVER - ICE_BLEND_START)
    }
}

/// Blend water currents toward ice velocity in place.
pub fn blend_current(water: &mut [Vector3], ice: &[Vector3], concentration: &[Concentration]) {
    for ((w, i), &c) in water.iter_mut().zip(ice).zip(concentration) {
        let f = blend_factor(c);
        if f >= 1.0 {
            *w = *i;
        } else if f > 0.0 {
            for (a, b) in w.iter_mut().zip(i) {
                *a += (b - *a) * f;
            }
        }
    }
}

/// Damp winds under ice in place.
pub fn blend_wind(wind: &mut [Vector3], concentration: &[Concentration]) {
    for (w, &c) in wind.iter_mut().zip(concentration) {
        let f = blend_factor(c);
        if f >= 1.0 {
            *w = [0.0; 3];
        } else if f > 0.0 {
            for x in w.iter_mut() {
                *x *= 1.0 - f;
            }
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// What to do with concentrations outside [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConcentrationPolicy {
    /// Clamp into [0, 1] and log a warning.
    #[default]
    Clamp,
    /// Fail the query with `InvalidConcentration`.
    Reject,
}

/// Ice blending configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IceBlendConfig {
    pub policy: ConcentrationPolicy,
}

impl IceBlendConfig {
    /// Set the out-of-range policy.
    pub fn with_policy(mut self, policy: ConcentrationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Validate raw concentrations. Missing values (NaN) count as open water.
fn sanitize(raw: &[f64], policy: ConcentrationPolicy) -> Result<Vec<Concentration>> {
    let mut clamped = 0usize;
    let mut missing = 0usize;
    let mut out = Vec::with_capacity(raw.len());
    for (index, &value) in raw.iter().enumerate() {
        let c = match Concentration::new(value) {
            Some(c) => c,
            None if value.is_nan() => {
                missing += 1;
                Concentration::ZERO
            }
            None => match policy {
                ConcentrationPolicy::Reject => {
                    return Err(FieldError::InvalidConcentration { index, value });
                }
                ConcentrationPolicy::Clamp => {
                    clamped += 1;
                    Concentration::clamped(value)
                }
            },
        };
        out.push(c);
    }
    if clamped > 0 {
        tracing::warn!(clamped, "ice concentration outside [0, 1] clamped");
    }
    if missing > 0 {
        tracing::warn!(missing, "missing ice concentration treated as open water");
    }
    Ok(out)
}

// ============================================================================
// Ice-aware field
// ============================================================================

/// Which forcing is being blended.
#[derive(Clone, Debug)]
pub enum IceBlend {
    /// Blend toward this ice drift velocity.
    Current { ice_velocity: Arc<VectorField> },
    /// Damp toward zero.
    Wind,
}

/// A vector field that accounts for sea-ice cover.
#[derive(Debug)]
pub struct IceAwareField {
    base: Arc<VectorField>,
    concentration: Arc<GriddedField>,
    blend: IceBlend,
    config: IceBlendConfig,
    cache: ResultCache<Vec<Vector3>>,
}

impl IceAwareField {
    /// Ice-aware current.
    ///
    /// # Errors
    ///
    /// `IncompatibleGrids` if the concentration or ice velocity live on a
    /// different grid or share no time range with the current.
    pub fn current(
        base: Arc<VectorField>,
        concentration: Arc<GriddedField>,
        ice_velocity: Arc<VectorField>,
    ) -> Result<Self> {
        check_compatible(&base, &concentration)?;
        if let (Some(a), Some(b)) = (base.grid(), ice_velocity.grid()) {
            if !a.is_compatible(b.as_ref()) {
                return Err(FieldError::IncompatibleGrids(format!(
                    "ice velocity '{}' is not on the grid of '{}'",
                    ice_velocity.name(),
                    base.name()
                )));
            }
        }
        if !base.time_axis().overlaps(ice_velocity.time_axis()) {
            return Err(FieldError::IncompatibleGrids(format!(
                "ice velocity '{}' shares no time range with '{}'",
                ice_velocity.name(),
                base.name()
            )));
        }
        Ok(Self {
            base,
            concentration,
            blend: IceBlend::Current { ice_velocity },
            config: IceBlendConfig::default(),
            cache: ResultCache::new(),
        })
    }

    /// Ice-aware wind.
    pub fn wind(base: Arc<VectorField>, concentration: Arc<GriddedField>) -> Result<Self> {
        check_compatible(&base, &concentration)?;
        Ok(Self {
            base,
            concentration,
            blend: IceBlend::Wind,
            config: IceBlendConfig::default(),
            cache: ResultCache::new(),
        })
    }

    /// Replace the blending configuration.
    pub fn with_config(mut self, config: IceBlendConfig) -> Self {
        self.config = config;
        self.cache.invalidate();
        self
    }

    /// Underlying current or wind.
    pub fn base(&self) -> &Arc<VectorField> {
        &self.base
    }

    /// Ice concentration field.
    pub fn concentration(&self) -> &Arc<GriddedField> {
        &self.concentration
    }

    /// Blending mode.
    pub fn blend(&self) -> &IceBlend {
        &self.blend
    }

    /// Name of the underlying field.
    pub fn name(&self) -> &str {
        self.base.name()
    }

    /// Native units of the underlying field.
    pub fn units(&self) -> &str {
        self.base.units()
    }

    /// Hit/miss counters of the blended-result cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop memoised results of every field involved.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
        self.base.invalidate_cache();
        self.concentration.invalidate_cache();
        if let IceBlend::Current { ice_velocity } = &self.blend {
            ice_velocity.invalidate_cache();
        }
    }

    /// Sample the blended vector at each point.
    ///
    /// Ice velocity is only sampled when some point has at least
    /// [`ICE_BLEND_START`] cover. The blended result is cached in native units.
    pub fn at(&self, points: &[Point3], time: DateTime<Utc>, opts: &SampleOptions) -> Result<Vec<Vector3>> {
        let conversion = opts.conversion_from(self.base.units())?;
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
        let conc_opts = if units::dimension_of(self.concentration.units()) == Some(Dimension::Fraction) {
            opts.clone().with_units("1")
        } else {
            opts.clone()
        };
        let raw = self.concentration.at(points, time, &conc_opts)?;
        let concentration = sanitize(&raw, self.config.policy)?;

        let mut values = self.base.at(points, time, opts)?;
        if concentration.iter().all(|&c| blend_factor(c) == 0.0) {
            return Ok(values);
        }

        match &self.blend {
            IceBlend::Current { ice_velocity } => {
                let ice_opts = opts.clone().with_units(self.base.units().to_string());
                let ice = ice_velocity.at(points, time, &ice_opts)?;
                blend_current(&mut values, &ice, &concentration);
            }
            IceBlend::Wind => blend_wind(&mut values, &concentration),
        }
        Ok(values)
    }
}

fn check_compatible(base: &VectorField, concentration: &GriddedField) -> Result<()> {
    if let Some(grid) = base.grid() {
        if !grid.is_compatible(concentration.grid().as_ref()) {
            return Err(FieldError::IncompatibleGrids(format!(
                "ice concentration '{}' is not on the grid of '{}'",
                concentration.name(),
                base.name()
            )));
        }
    }
    if !base.time_axis().overlaps(concentration.time_axis()) {
        return Err(FieldError::IncompatibleGrids(format!(
            "ice concentration '{}' shares no time range with '{}'",
            concentration.name(),
            base.name()
        )));
    }
    Ok(())
}
