//! Physical quantity newtypes.

use std::fmt;

// =============================================================================
// Depth (positive downward)
// =============================================================================

/// Depth below the free surface in metres, positive downward.
///
/// Used both for bathymetric depth (`h`) and for the computed depth of a
/// sigma layer in one water column.
///
/// ```
/// use envfield::types::Depth;
///
/// let h = Depth::new(200.0);
/// assert_eq!(h.meters(), 200.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Depth(f64);

impl Depth {
    /// Create a new depth value.
    #[inline]
    pub const fn new(meters: f64) -> Self {
        Self(meters)
    }

    /// The free surface.
    pub const SURFACE: Self = Self(0.0);

    /// Get the depth in metres.
    #[inline]
    pub fn meters(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}m", self.0)
    }
}

impl From<Depth> for f64 {
    #[inline]
    fn from(d: Depth) -> f64 {
        d.0
    }
}

// =============================================================================
// Concentration (ice area fraction)
// =============================================================================

/// Sea-ice area fraction in [0, 1].
///
/// Construction either validates ([`Concentration::new`]) or clamps
/// ([`Concentration::clamped`]); a `Concentration` never holds a value
/// outside the unit interval.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct Concentration(f64);

impl Concentration {
    /// Open water.
    pub const ZERO: Self = Self(0.0);

    /// Full ice cover.
    pub const FULL: Self = Self(1.0);

    /// Validated constructor. `None` for values outside [0, 1] or NaN.
    #[inline]
    pub fn new(fraction: f64) -> Option<Self> {
        (0.0..=1.0).contains(&fraction).then_some(Self(fraction))
    }

    /// Clamp into [0, 1]. NaN maps to open water.
    #[inline]
    pub fn clamped(fraction: f64) -> Self {
        if fraction.is_nan() {
            Self::ZERO
        } else {
            Self(fraction.clamp(0.0, 1.0))
        }
    }

    /// Raw fraction.
    #[inline]
    pub fn fraction(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Concentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}
