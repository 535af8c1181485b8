//! # envfield
//!
//! Environmental field sampling for Lagrangian particle transport.
//!
//! Given a batch of 3-D query points (`[x, y, z]`, `z` positive down) and a
//! UTC time, fields return one value or vector per point by interpolating
//! across:
//!
//! - a horizontal grid (bilinear on nodes, nearest on cells)
//! - a discrete time axis (linear between bracketing steps)
//! - a vertical axis: a single flat layer or terrain-following sigma levels
//!
//! On top of plain sampling the crate provides:
//! - Grid-rotation correction of vector components
//! - Sea-ice blending of currents and winds
//! - Per-field memoisation of the last query
//! - Spatially uniform time series (station winds, constant temperature)
//! - Dataset loading by variable alias, optionally from NetCDF
//! - A named [`Environment`] registry invalidated once per model step
//!
//! ## Features
//!
//! - `parallel`: per-point interpolation on a rayon thread pool
//! - `netcdf`: [`io::NetcdfDataset`](crate::io) for reading model output
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::Utc;
//! use envfield::{GriddedField, RectilinearGrid, SampleOptions};
//!
//! let grid = Arc::new(RectilinearGrid::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap());
//! let temp = GriddedField::surface("temp", "C", grid, vec![10.0, 20.0, 10.0, 20.0]).unwrap();
//!
//! let out = temp
//!     .at(&[[0.5, 0.5, 0.0]], Utc::now(), &SampleOptions::new().with_units("K"))
//!     .unwrap();
//! assert!((out[0] - 288.15).abs() < 1e-9);
//! ```

pub mod environment;
pub mod error;
pub mod field;
pub mod grid;
pub mod io;
pub mod time;
pub mod types;
pub mod units;
pub mod vertical;

// Re-export main types for convenience
pub use environment::{EnvField, Environment, Samples};
pub use error::{ErrorKind, FieldError, Result};
pub use field::{
    ConcentrationPolicy, GriddedField, GriddedVector, IceAwareField, IceBlendConfig,
    SampleOptions, ScalarTimeSeries, VectorField, VectorKind, VelocityTimeSeries,
};
pub use grid::{DataLocation, Grid, RectilinearGrid};
pub use io::{Dataset, EnvKind, FieldLoader, MemoryDataset, RawVariable, VariableAliases};
pub use time::TimeAxis;
pub use types::{Concentration, Depth, LevelIndex, NodeIndex, Point3, Vector3};
pub use vertical::{DepthAxis, LayerWeight, SigmaTerms};
