//! Time coordinates.

mod axis;

pub use axis::{seconds_between, TimeAxis, TimeBracket};
