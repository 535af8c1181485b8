//! Vertical coordinates.
//!
//! A gridded field with a depth dimension carries a [`DepthAxis`] that tells
//! the sampler, per query point, which layers to read and how to blend
//! them ([`LayerWeight`]).
//!
//! - [`DepthAxis::Flat`]: no vertical coordinate, every point reads one
//!   configured surface layer.
//! - [`DepthAxis::Sigma`]: terrain-following levels over a bathymetry field
//!   ([`SigmaTerms`], [`SigmaDepth`]).
//!
//! Synthetic sigma terms can be generated from a [`Stretching`] curve.

mod depth;
mod sigma;
mod stretching;

pub use depth::{to_raw, DepthAxis, FlatDepth, LayerWeight};
pub use sigma::{LevelFamily, SigmaDepth, SigmaTerms};
pub use stretching::{SongHaidvogelStretching, Stretching, UniformStretching};
