//! Risk math: unit conversions and the StandardAir decompression-time model.

pub mod standard_air;
pub mod units;

pub use standard_air::{standard_air_tdt, StandardAirModel, TdtChart, TdtCurve, TdtPoint};
pub use units::{equivalent_air_depth, logit, meters_to_feet, pressure_root_time};
