//! Coordinate conversions for the two Korean upstreams.
//!
//! The central-belt transverse-Mercator grid (`tm`) and the local-search
//! integer encoding (`tm128`) are unrelated and deliberately kept apart.

mod tm;
mod tm128;

pub use tm::{planar_to_wgs84, wgs84_to_planar};
pub use tm128::tm128_to_wgs84;
