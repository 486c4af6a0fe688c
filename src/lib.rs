//! Gradient factor recommendations for Bühlmann ZHL-16C.
//!
//! The StandardAir model gives a total decompression time for an accepted
//! probability of DCS. The GF searches then find the gradient factor at which
//! a ZHL-16C simulation produces that time, and the adjustments layer helium,
//! surface interval and personal preference on top.

pub mod config;
pub mod dive;
pub mod error;
pub mod gf;
pub mod recommend;
pub mod risk;
pub mod simulator;

#[cfg(test)]
mod test_helpers;

pub use config::{RangePolicy, Settings};
pub use dive::{DiveParameters, GasMix, RiskTarget};
pub use error::{Error, Result, SearchKind};
pub use gf::GradientFactor;
pub use recommend::{recommend, RecommendationReport, RecommendationRequest};
pub use risk::{standard_air_tdt, StandardAirModel};
pub use simulator::{BuhlmannSimulator, DivePlan, SimulationResult, Simulator, SimulatorError};
