//! Strongly-typed domain types for safer APIs.
//!
//! Newtypes keep physically different quantities apart even though they
//! share the same `f64`/`usize` representation:
//!
//! - `LevelIndex(3)` (a vertical layer) vs `NodeIndex(3)` (a data column)
//! - `Depth(10.0)` (positive-down metres) vs a raw elevation
//! - `Concentration(0.5)` (ice fraction, always in [0, 1])
//!
//! # Example
//!
//! ```
//! use envfield::types::{Concentration, Depth, LevelIndex};
//!
//! let level = LevelIndex::new(2);
//! let h = Depth::new(35.0);
//! let c = Concentration::clamped(1.2);
//! assert_eq!(level.get(), 2);
//! assert_eq!(h.meters(), 35.0);
//! assert_eq!(c.fraction(), 1.0);
//! ```

mod indices;
mod physical;

pub use indices::{LevelIndex, NodeIndex};
pub use physical::{Concentration, Depth};

/// A query point: `[x, y, z]` with `z > 0` below the free surface.
pub type Point3 = [f64; 3];

/// A sampled vector: `[u, v, w]`. Two-component fields report `w = 0`.
pub type Vector3 = [f64; 3];
