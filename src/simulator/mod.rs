//! Decompression simulator boundary.
//!
//! The recommendation engine never computes a schedule itself. It hands a
//! [`DivePlan`] to a [`Simulator`] and reads back the time/depth profile and
//! per-stage ceilings. [`BuhlmannSimulator`] is the bundled ZHL-16C backend;
//! any `Fn(&DivePlan) -> Result<SimulationResult, SimulatorError>` works too.

mod buhlmann;
mod plan;

use serde::Serialize;
use thiserror::Error;

use crate::gf::GradientFactor;

pub use buhlmann::BuhlmannSimulator;
pub use plan::{DivePlan, GfSetting, RepeatDive, RepetitiveSchedule, Tank, Tanks};

/// Why a simulator could not produce a schedule for a plan.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulatorError {
    /// The plan is well formed but has no valid schedule.
    #[error("infeasible plan: {reason}")]
    Infeasible { reason: String },

    /// The schedule ran past the simulator's runtime bound.
    #[error("runtime {runtime_min:.0} min exceeds limit of {limit_min:.0} min")]
    RuntimeLimit { runtime_min: f64, limit_min: f64 },

    /// The plan itself is malformed.
    #[error("invalid plan: {reason}")]
    InvalidPlan { reason: String },

    /// The simulator returned no profile samples.
    #[error("simulator returned an empty profile")]
    EmptyProfile,
}

/// One point of the simulated time/depth profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileSample {
    /// Elapsed time since leaving the surface, in minutes
    pub time_min: f64,
    pub depth_m: f64,
}

/// Output of one simulation. Read-only once returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationResult {
    /// Time-ordered profile samples
    pub samples: Vec<ProfileSample>,
    /// Ceiling depths per stage; positive means a stop is required
    pub stage_ceilings: Vec<Vec<f64>>,
}

impl SimulationResult {
    /// Elapsed time of the final sample.
    pub fn runtime_min(&self) -> Option<f64> {
        self.samples.last().map(|s| s.time_min)
    }

    /// Runtime minus bottom time: the time spent getting back to the surface.
    pub fn total_deco_time_min(&self, bottom_time_min: f64) -> Result<f64, SimulatorError> {
        self.runtime_min()
            .map(|runtime| runtime - bottom_time_min)
            .ok_or(SimulatorError::EmptyProfile)
    }

    /// Deepest ceiling over every stage, `None` when no ceilings were reported.
    pub fn max_ceiling(&self) -> Option<f64> {
        self.stage_ceilings
            .iter()
            .flatten()
            .copied()
            .reduce(f64::max)
    }
}

/// Capability to turn a dive plan into a decompression schedule.
///
/// Implementations must not carry state between calls: every plan is simulated
/// from surface equilibrium.
pub trait Simulator {
    fn simulate(&self, plan: &DivePlan) -> Result<SimulationResult, SimulatorError>;

    /// Highest gradient factor the backend simulates as given. Higher values
    /// are run at this limit. `None` means no limit.
    fn max_gradient_factor(&self) -> Option<GradientFactor> {
        None
    }
}

impl<F> Simulator for F
where
    F: Fn(&DivePlan) -> Result<SimulationResult, SimulatorError>,
{
    fn simulate(&self, plan: &DivePlan) -> Result<SimulationResult, SimulatorError> {
        self(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dive::GasMix;

    fn sample(time_min: f64, depth_m: f64) -> ProfileSample {
        ProfileSample { time_min, depth_m }
    }

    #[test]
    fn test_total_deco_time() {
        let result = SimulationResult {
            samples: vec![sample(0.0, 0.0), sample(30.0, 30.0), sample(42.5, 0.0)],
            stage_ceilings: vec![],
        };
        assert_eq!(result.runtime_min(), Some(42.5));
        assert_eq!(result.total_deco_time_min(30.0), Ok(12.5));
    }

    #[test]
    fn test_empty_profile() {
        let result = SimulationResult::default();
        assert_eq!(
            result.total_deco_time_min(30.0),
            Err(SimulatorError::EmptyProfile)
        );
        assert_eq!(result.max_ceiling(), None);
    }

    #[test]
    fn test_max_ceiling_across_stages() {
        let result = SimulationResult {
            samples: vec![],
            stage_ceilings: vec![vec![0.0, -2.0], vec![], vec![1.5, 4.2, 0.0]],
        };
        assert_eq!(result.max_ceiling(), Some(4.2));
    }

    #[test]
    fn test_closure_is_a_simulator() {
        let stub = |_: &DivePlan| -> Result<SimulationResult, SimulatorError> {
            Err(SimulatorError::Infeasible {
                reason: "stub".to_string(),
            })
        };
        let plan = DivePlan::single(30.0, 20.0, GfSetting::symmetric(80), GasMix::AIR);
        assert!(matches!(
            stub.simulate(&plan),
            Err(SimulatorError::Infeasible { .. })
        ));
        assert_eq!(stub.max_gradient_factor(), None);
    }
}
