//! Stub simulators with controlled behaviour for search tests.

use std::sync::Mutex;

use crate::dive::GasMix;
use crate::gf::GradientFactor;
use crate::simulator::{DivePlan, ProfileSample, SimulationResult, Simulator, SimulatorError};

type StubFn = Box<dyn Fn(&DivePlan) -> Result<SimulationResult, SimulatorError> + Send + Sync>;

fn infeasible() -> SimulatorError {
    SimulatorError::Infeasible {
        reason: "stub".to_string(),
    }
}

/// Profile whose runtime is bottom time plus `tdt`.
fn tdt_result(plan: &DivePlan, tdt: f64) -> SimulationResult {
    SimulationResult {
        samples: vec![
            ProfileSample {
                time_min: 0.0,
                depth_m: 0.0,
            },
            ProfileSample {
                time_min: plan.bottom_time_min,
                depth_m: plan.bottom_depth_m,
            },
            ProfileSample {
                time_min: plan.bottom_time_min + tdt,
                depth_m: 0.0,
            },
        ],
        stage_ceilings: vec![],
    }
}

/// GF of the last dive in the plan.
fn last_dive_gf(plan: &DivePlan) -> GradientFactor {
    plan.dives().last().map_or(plan.gf.high, |d| d.gf.high)
}

fn ceiling_result(ceiling: f64) -> SimulationResult {
    SimulationResult {
        samples: vec![ProfileSample {
            time_min: 0.0,
            depth_m: 0.0,
        }],
        stage_ceilings: vec![vec![0.0], vec![ceiling]],
    }
}

/// TDT as a function of GF; `None` makes the candidate infeasible.
pub fn tdt_simulator<F>(tdt: F) -> impl Fn(&DivePlan) -> Result<SimulationResult, SimulatorError>
where
    F: Fn(GradientFactor) -> Option<f64>,
{
    move |plan: &DivePlan| match tdt(plan.gf.high) {
        Some(tdt) => Ok(tdt_result(plan, tdt)),
        None => Err(infeasible()),
    }
}

/// Max ceiling as a function of the last dive's GF; `None` is infeasible.
pub fn ceiling_simulator<F>(
    ceiling: F,
) -> impl Fn(&DivePlan) -> Result<SimulationResult, SimulatorError>
where
    F: Fn(GradientFactor) -> Option<f64>,
{
    move |plan: &DivePlan| match ceiling(last_dive_gf(plan)) {
        Some(c) => Ok(ceiling_result(c)),
        None => Err(infeasible()),
    }
}

/// Stub that also remembers every plan it was given.
pub struct RecordingSimulator {
    respond: StubFn,
    plans: Mutex<Vec<DivePlan>>,
}

impl RecordingSimulator {
    /// TDT as a function of GF.
    pub fn new<F>(tdt: F) -> Self
    where
        F: Fn(GradientFactor) -> Option<f64> + Send + Sync + 'static,
    {
        Self::with_gas(move |gf, _| tdt(gf))
    }

    /// TDT as a function of GF and bottom gas.
    pub fn with_gas<F>(tdt: F) -> Self
    where
        F: Fn(GradientFactor, GasMix) -> Option<f64> + Send + Sync + 'static,
    {
        Self::from_fn(Box::new(move |plan: &DivePlan| {
            match tdt(plan.gf.high, plan.tanks.bottom.gas) {
                Some(tdt) => Ok(tdt_result(plan, tdt)),
                None => Err(infeasible()),
            }
        }))
    }

    /// Max ceiling as a function of the last dive's GF.
    pub fn with_ceiling<F>(ceiling: F) -> Self
    where
        F: Fn(GradientFactor) -> Option<f64> + Send + Sync + 'static,
    {
        Self::from_fn(Box::new(move |plan: &DivePlan| match ceiling(last_dive_gf(plan)) {
            Some(c) => Ok(ceiling_result(c)),
            None => Err(infeasible()),
        }))
    }

    fn from_fn(respond: StubFn) -> Self {
        Self {
            respond,
            plans: Mutex::new(Vec::new()),
        }
    }

    pub fn plans(&self) -> Vec<DivePlan> {
        self.plans.lock().unwrap().clone()
    }
}

impl Simulator for RecordingSimulator {
    fn simulate(&self, plan: &DivePlan) -> Result<SimulationResult, SimulatorError> {
        self.plans.lock().unwrap().push(plan.clone());
        (self.respond)(plan)
    }
}
