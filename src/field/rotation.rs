//! Grid-relative to east/north rotation of horizontal vectors.
//!
//! Curvilinear ocean models store `u`/`v` along the grid axes. Given the
//! angle θ (radians) between the grid x-axis and east:
//!
//! ```text
//! u' = u cos θ - v sin θ
//! v' = u sin θ + v cos θ
//! ```
//!
//! The vertical component is untouched.

use crate::types::Vector3;

/// Rotate one vector by `angle` radians.
#[inline]
pub fn rotate(value: &mut Vector3, angle: f64) {
    let (sin, cos) = angle.sin_cos();
    let [u, v, _] = *value;
    value[0] = u * cos - v * sin;
    value[1] = u * sin + v * cos;
}

/// Rotate each vector by its own angle.
pub fn rotate_all(values: &mut [Vector3], angles: &[f64]) {
    for (value, &angle) in values.iter_mut().zip(angles) {
        rotate(value, angle);
    }
}
