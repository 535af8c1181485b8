//! Spatially uniform time series.
//!
//! Used for point-source forcing (a wind station, a constant current) and
//! for constant water properties. Every query point gets the same value.
//!
//! Directions follow the meteorological convention: degrees clockwise from
//! north of where the flow comes *from*. A 10 m/s wind from 0° blows south:
//!
//! ```
//! use envfield::field::direction_to_uv;
//!
//! let (u, v) = direction_to_uv(10.0, 0.0);
//! assert!(u.abs() < 1e-12);
//! assert!((v + 10.0).abs() < 1e-12);
//! ```

use chrono::{DateTime, Utc};

use super::SampleOptions;
use crate::error::{FieldError, Result};
use crate::time::TimeAxis;
use crate::types::{Point3, Vector3};

/// Speed and from-direction (degrees) to `(u, v)`.
#[inline]
pub fn direction_to_uv(speed: f64, direction: f64) -> (f64, f64) {
    let theta = (-direction - 90.0).to_radians();
    (speed * theta.cos(), speed * theta.sin())
}

/// `(u, v)` to speed and from-direction in [0, 360).
#[inline]
pub fn uv_to_direction(u: f64, v: f64) -> (f64, f64) {
    let direction = -(v.atan2(u).to_degrees() + 90.0);
    (u.hypot(v), direction.rem_euclid(360.0))
}

/// Blend `values` at a time bracket.
fn value_at(time: &TimeAxis, values: &[f64], at: DateTime<Utc>, extrapolate: bool) -> Result<f64> {
    let b = time.bracket(at, extrapolate)?;
    Ok((1.0 - b.alpha) * values[b.lower] + b.alpha * values[b.upper])
}

fn check_length(time: &TimeAxis, n: usize) -> Result<()> {
    let expected = time.len().max(1);
    if n != expected {
        return Err(FieldError::DataLength {
            expected,
            actual: n,
        });
    }
    Ok(())
}

// ============================================================================
// Scalar series
// ============================================================================

/// A scalar that varies in time only.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarTimeSeries {
    name: String,
    units: String,
    time: TimeAxis,
    values: Vec<f64>,
}

impl ScalarTimeSeries {
    /// Create a series. An empty time axis with one value is constant.
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        time: TimeAxis,
        values: Vec<f64>,
    ) -> Result<Self> {
        check_length(&time, values.len())?;
        let time = if time.is_empty() {
            TimeAxis::constant()
        } else {
            time
        };
        Ok(Self {
            name: name.into(),
            units: units.into(),
            time,
            values,
        })
    }

    /// A value that never changes.
    pub fn constant(name: impl Into<String>, units: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
            time: TimeAxis::constant(),
            values: vec![value],
        }
    }

    /// Constant water temperature (K).
    pub fn water_temperature(kelvin: f64) -> Self {
        Self::constant("water_temperature", "K", kelvin)
    }

    /// Constant salinity (ppt).
    pub fn salinity(ppt: f64) -> Self {
        Self::constant("salinity", "ppt", ppt)
    }

    /// Name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native units.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Time axis.
    pub fn time_axis(&self) -> &TimeAxis {
        &self.time
    }

    /// Value at `time` in native units.
    pub fn value_at(&self, time: DateTime<Utc>, extrapolate: bool) -> Result<f64> {
        value_at(&self.time, &self.values, time, extrapolate)
    }

    /// The series value repeated for each point.
    pub fn at(&self, points: &[Point3], time: DateTime<Utc>, opts: &SampleOptions) -> Result<Vec<f64>> {
        let conversion = opts.conversion_from(&self.units)?;
        let value = conversion.apply(self.value_at(time, opts.extrapolate)?);
        Ok(vec![value; points.len()])
    }
}

// ============================================================================
// Velocity series
// ============================================================================

/// One `(time, speed, direction)` record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedDirection {
    pub time: DateTime<Utc>,
    pub speed: f64,
    /// Degrees clockwise from north, direction the flow comes from.
    pub direction: f64,
}

/// A two-component velocity that varies in time only.
#[derive(Clone, Debug, PartialEq)]
pub struct VelocityTimeSeries {
    name: String,
    units: String,
    time: TimeAxis,
    u: Vec<f64>,
    v: Vec<f64>,
}

impl VelocityTimeSeries {
    /// Create from component arrays.
    ///
    /// # Errors
    ///
    /// `TooManyComponents` for more than two components, `TooFewComponents`
    /// for fewer, `DataLength` if a component disagrees with `time`.
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        time: TimeAxis,
        components: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let n = components.len();
        if n > 2 {
            return Err(FieldError::TooManyComponents(n, 2));
        }
        let mut it = components.into_iter();
        let (u, v) = match (it.next(), it.next()) {
            (Some(u), Some(v)) => (u, v),
            _ => return Err(FieldError::TooFewComponents(n)),
        };
        check_length(&time, u.len())?;
        check_length(&time, v.len())?;
        let time = if time.is_empty() {
            TimeAxis::constant()
        } else {
            time
        };
        Ok(Self {
            name: name.into(),
            units: units.into(),
            time,
            u,
            v,
        })
    }

    /// A constant velocity given as speed and from-direction (degrees).
    pub fn constant(name: impl Into<String>, speed: f64, direction: f64, units: impl Into<String>) -> Self {
        let (u, v) = direction_to_uv(speed, direction);
        Self {
            name: name.into(),
            units: units.into(),
            time: TimeAxis::constant(),
            u: vec![u],
            v: vec![v],
        }
    }

    /// Build from speed/direction records.
    pub fn from_speed_direction(
        name: impl Into<String>,
        units: impl Into<String>,
        records: &[SpeedDirection],
    ) -> Result<Self> {
        let time = TimeAxis::new(records.iter().map(|r| r.time).collect())?;
        let (u, v) = records
            .iter()
            .map(|r| direction_to_uv(r.speed, r.direction))
            .unzip();
        Self::new(name, units, time, vec![u, v])
    }

    /// Name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native units.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Time axis.
    pub fn time_axis(&self) -> &TimeAxis {
        &self.time
    }

    /// Records as `(time, speed, direction)`. Constant series report the
    /// epoch as their time.
    pub fn to_speed_direction(&self) -> Vec<SpeedDirection> {
        self.time
            .times()
            .iter()
            .zip(self.u.iter().zip(&self.v))
            .map(|(&time, (&u, &v))| {
                let (speed, direction) = uv_to_direction(u, v);
                SpeedDirection {
                    time,
                    speed,
                    direction,
                }
            })
            .collect()
    }

    /// `(u, v)` at `time` in native units.
    pub fn value_at(&self, time: DateTime<Utc>, extrapolate: bool) -> Result<(f64, f64)> {
        Ok((
            value_at(&self.time, &self.u, time, extrapolate)?,
            value_at(&self.time, &self.v, time, extrapolate)?,
        ))
    }

    /// The series velocity repeated for each point, `w = 0`.
    pub fn at(&self, points: &[Point3], time: DateTime<Utc>, opts: &SampleOptions) -> Result<Vec<Vector3>> {
        let conversion = opts.conversion_from(&self.units)?;
        let (u, v) = self.value_at(time, opts.extrapolate)?;
        let mut value = [[u, v, 0.0]];
        conversion.apply_vectors(&mut value);
        Ok(vec![value[0]; points.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const TOL: f64 = 1e-10;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_direction_conventions() {
        // From the west: blows east.
        let (u, v) = direction_to_uv(5.0, 270.0);
        assert!((u - 5.0).abs() < TOL);
        assert!(v.abs() < TOL);

        let (speed, dir) = uv_to_direction(u, v);
        assert!((speed - 5.0).abs() < TOL);
        assert!((dir - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_velocity() {
        let wind = VelocityTimeSeries::constant("wind", 10.0, 45.0, "m/s");
        let far_future = t0() + Duration::days(1000);
        let v = wind.at(&[[0.0; 3], [5.0, 5.0, 1.0]], far_future, &SampleOptions::new()).unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v[0], v[1]);
        let expected = -10.0 / 2f64.sqrt();
        assert!((v[0][0] - expected).abs() < TOL);
        assert!((v[0][1] - expected).abs() < TOL);
        assert_eq!(v[0][2], 0.0);
    }

    #[test]
    fn test_rejects_third_component() {
        let err = VelocityTimeSeries::new(
            "w",
            "m/s",
            TimeAxis::empty(),
            vec![vec![1.0], vec![2.0], vec![3.0]],
        )
        .unwrap_err();
        assert!(matches!(err, FieldError::TooManyComponents(3, 2)));
    }

    #[test]
    fn test_records_round_trip_and_interpolate() {
        let records = [
            SpeedDirection {
                time: t0(),
                speed: 4.0,
                direction: 90.0,
            },
            SpeedDirection {
                time: t0() + Duration::hours(2),
                speed: 8.0,
                direction: 90.0,
            },
        ];
        let ts = VelocityTimeSeries::from_speed_direction("wind", "knots", &records).unwrap();
        let back = ts.to_speed_direction();
        for (a, b) in records.iter().zip(&back) {
            assert_eq!(a.time, b.time);
            assert!((a.speed - b.speed).abs() < 1e-9);
            assert!((a.direction - b.direction).abs() < 1e-9);
        }

        let (u, _) = ts.value_at(t0() + Duration::hours(1), false).unwrap();
        assert!((u + 6.0).abs() < 1e-9, "from the east blows west: u = {}", u);
    }

    #[test]
    fn test_velocity_units() {
        let ts = VelocityTimeSeries::constant("c", 1.0, 180.0, "m/s");
        let v = ts.at(&[[0.0; 3]], t0(), &SampleOptions::new().with_units("cm/s")).unwrap();
        assert!((v[0][1] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_scalar_constants() {
        let temp = ScalarTimeSeries::water_temperature(283.15);
        let c = temp.at(&[[0.0; 3]; 3], t0(), &SampleOptions::new().with_units("C")).unwrap();
        assert_eq!(c.len(), 3);
        assert!((c[0] - 10.0).abs() < 1e-9);

        let salt = ScalarTimeSeries::salinity(35.0);
        assert_eq!(salt.units(), "ppt");
        assert_eq!(salt.value_at(t0(), false).unwrap(), 35.0);
    }

    #[test]
    fn test_scalar_series_length_check() {
        let axis = TimeAxis::new(vec![t0(), t0() + Duration::hours(1)]).unwrap();
        assert!(ScalarTimeSeries::new("s", "ppt", axis, vec![1.0]).is_err());
    }
}
