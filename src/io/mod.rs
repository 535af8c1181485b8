//! Reading environmental data into fields.
//!
//! This module provides:
//! - **Datasets**: the [`Dataset`] trait over named variables with CF
//!   metadata, an in-memory [`MemoryDataset`], and `NetcdfDataset`
//!   (requires the `netcdf` feature)
//! - **Aliases**: per-quantity variable name lookup ([`VariableAliases`])
//! - **Loading**: grid, time axis, sigma terms and fields from a dataset
//!   ([`FieldLoader`])
//! - **Station records**: velocity time series files (wind or current)
//!
//! # File Formats
//!
//! ## Velocity Time Series Files
//!
//! ```text
//! # name: Station 46001
//! # units: knots
//! # columns: time speed direction(deg from)
//! 2024-03-01T00:00:00Z 10.0 270.0
//! 2024-03-01T06:00:00Z 12.5 280.0
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use envfield::io::{read_velocity_file, FieldLoader, NetcdfDataset};
//!
//! let ds = NetcdfDataset::open("roms_his.nc")?;
//! let mut env = FieldLoader::new(&ds)?.environment()?;
//! env.insert("wind", read_velocity_file(Path::new("buoy.txt"))?);
//! ```

mod aliases;
mod dataset;
mod loader;
#[cfg(feature = "netcdf")]
mod netcdf_io;
mod timeseries_reader;

pub use aliases::{EnvKind, VariableAliases};
pub use dataset::{classify_dimension, Dataset, Dimension, MemoryDataset, RawVariable};
pub use loader::{read_grid, read_time_axis, FieldLoader};
#[cfg(feature = "netcdf")]
pub use netcdf_io::NetcdfDataset;
pub use timeseries_reader::{parse_velocity_timeseries, read_velocity_file, write_velocity_file};
