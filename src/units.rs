//! Unit conversion for sampled field values.
//!
//! Every known unit maps to an SI base unit through an affine transform
//! `si = value * scale + offset`. Converting between two units of the same
//! physical dimension composes the forward and inverse transforms into a
//! single [`UnitConversion`] that is applied to whole result arrays.
//!
//! Unit strings are matched case-insensitively after trimming, with common
//! spellings accepted (`"m/s"`, `"m s-1"`, `"meters per second"`, ...).
//! Identical strings always convert with the identity, even when unknown.
//!
//! ```
//! use envfield::units;
//!
//! let kts = units::convert(1.0, "m/s", "knots").unwrap();
//! assert!((kts - 1.943_844).abs() < 1e-5);
//!
//! let c = units::convert(273.15, "K", "C").unwrap();
//! assert!(c.abs() < 1e-12);
//!
//! assert!(units::convert(1.0, "m/s", "K").is_err());
//! ```

use crate::error::{FieldError, Result};

/// Physical dimension of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Speed,
    Temperature,
    Length,
    Angle,
    Fraction,
    Salinity,
    Density,
}

#[derive(Clone, Copy, Debug)]
struct UnitDef {
    dimension: Dimension,
    scale: f64,
    offset: f64,
}

const fn linear(dimension: Dimension, scale: f64) -> UnitDef {
    UnitDef {
        dimension,
        scale,
        offset: 0.0,
    }
}

fn lookup(unit: &str) -> Option<UnitDef> {
    use Dimension::*;
    let key = unit.trim().to_ascii_lowercase();
    let def = match key.as_str() {
        "m/s" | "m s-1" | "m s**-1" | "meter per second" | "meters per second" | "mps" => {
            linear(Speed, 1.0)
        }
        "cm/s" | "cm s-1" | "centimeters per second" => linear(Speed, 0.01),
        "km/h" | "kph" | "km h-1" | "kilometers per hour" => linear(Speed, 1000.0 / 3600.0),
        "knot" | "knots" | "kts" | "kt" => linear(Speed, 1852.0 / 3600.0),
        "mph" | "miles per hour" => linear(Speed, 0.447_04),
        "ft/s" | "feet per second" => linear(Speed, 0.3048),

        "k" | "kelvin" => linear(Temperature, 1.0),
        "c" | "degc" | "deg_c" | "celsius" | "degree_celsius" => UnitDef {
            dimension: Temperature,
            scale: 1.0,
            offset: 273.15,
        },
        "f" | "degf" | "deg_f" | "fahrenheit" => UnitDef {
            dimension: Temperature,
            scale: 5.0 / 9.0,
            offset: 273.15 - 32.0 * 5.0 / 9.0,
        },

        "m" | "meter" | "meters" | "metre" | "metres" => linear(Length, 1.0),
        "cm" | "centimeters" => linear(Length, 0.01),
        "km" | "kilometers" => linear(Length, 1000.0),
        "ft" | "feet" => linear(Length, 0.3048),
        "fathom" | "fathoms" => linear(Length, 1.8288),

        "radians" | "radian" | "rad" => linear(Angle, 1.0),
        "degrees" | "degree" | "deg" => linear(Angle, std::f64::consts::PI / 180.0),

        "1" | "fraction" | "unitless" | "" => linear(Fraction, 1.0),
        "%" | "percent" => linear(Fraction, 0.01),

        "psu" | "ppt" | "0.001" | "1e-3" => linear(Salinity, 1.0),

        "kg/m^3" | "kg/m3" | "kg m-3" => linear(Density, 1.0),
        "g/cm^3" | "g/cm3" => linear(Density, 1000.0),

        _ => return None,
    };
    Some(def)
}

/// Physical dimension of a unit string, if known.
pub fn dimension_of(unit: &str) -> Option<Dimension> {
    lookup(unit).map(|d| d.dimension)
}

/// Affine conversion between two compatible units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitConversion {
    scale: f64,
    offset: f64,
}

impl UnitConversion {
    /// The identity conversion.
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: 0.0,
    };

    /// Build the conversion `from -> to`.
    ///
    /// # Errors
    ///
    /// `IncompatibleUnits` if either unit is unknown or the dimensions differ.
    pub fn new(from: &str, to: &str) -> Result<Self> {
        if from.trim() == to.trim() {
            return Ok(Self::IDENTITY);
        }
        let (a, b) = match (lookup(from), lookup(to)) {
            (Some(a), Some(b)) if a.dimension == b.dimension => (a, b),
            _ => return Err(FieldError::incompatible_units(from, to)),
        };
        // si = v * a.scale + a.offset ; out = (si - b.offset) / b.scale
        Ok(Self {
            scale: a.scale / b.scale,
            offset: (a.offset - b.offset) / b.scale,
        })
    }

    /// Whether this conversion leaves values unchanged.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.offset == 0.0
    }

    /// Convert one value.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    /// Convert a slice in place.
    pub fn apply_slice(&self, values: &mut [f64]) {
        if self.is_identity() {
            return;
        }
        for v in values.iter_mut() {
            *v = self.apply(*v);
        }
    }

    /// Convert vector components in place. Offsets are ignored: vector
    /// quantities (velocities) never carry an affine offset.
    pub fn apply_vectors(&self, values: &mut [[f64; 3]]) {
        if self.is_identity() {
            return;
        }
        for v in values.iter_mut() {
            for c in v.iter_mut() {
                *c *= self.scale;
            }
        }
    }
}

/// Convert a single value between units.
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64> {
    Ok(UnitConversion::new(from, to)?.apply(value))
}

/// Whether `from` can be converted to `to`.
pub fn is_convertible(from: &str, to: &str) -> bool {
    UnitConversion::new(from, to).is_ok()
}
