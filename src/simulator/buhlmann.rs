//! Bühlmann ZHL-16C simulator backed by the `dive-deco` crate.
//!
//! Each call builds fresh models, steps them through descent, bottom phase and
//! the stop schedule `dive-deco` proposes, and records the ceiling after every
//! step. Travel between stops uses the plan's own ascent rates.
//!
//! Tissue loading does not depend on gradient factors, so a repetitive dive
//! with a different GF is simulated by replaying the earlier steps into a new
//! model configured with that dive's GF.

use dive_deco::{BuehlmannConfig, BuehlmannModel, Deco, DecoModel, DecoStageType, Gas};

use super::plan::{DivePlan, GfSetting};
use super::{ProfileSample, SimulationResult, Simulator, SimulatorError};
use crate::config::Settings;
use crate::dive::GasMix;
use crate::gf::GradientFactor;

/// Highest gradient factor `dive-deco` accepts.
const MODEL_GF_MAX: u8 = 100;

/// Partial pressure limit used to pick a breathable deco gas.
const MAX_PPO2: f64 = 1.6;

/// Constant-depth exposure recorded into a model.
#[derive(Debug, Clone, Copy)]
struct Step {
    depth_m: f64,
    seconds: usize,
    gas: GasMix,
}

/// Everything stepped so far, plus the clock and the samples produced.
#[derive(Debug, Default)]
struct DiveLog {
    steps: Vec<Step>,
    elapsed_sec: usize,
    samples: Vec<ProfileSample>,
}

impl DiveLog {
    fn sample_at(&mut self, depth_m: f64) {
        self.samples.push(ProfileSample {
            time_min: self.elapsed_sec as f64 / 60.0,
            depth_m,
        });
    }
}

/// ZHL-16C backend.
#[derive(Debug, Clone)]
pub struct BuhlmannSimulator {
    max_runtime_min: f64,
}

impl Default for BuhlmannSimulator {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl BuhlmannSimulator {
    pub fn new(max_runtime_min: f64) -> Self {
        Self { max_runtime_min }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.max_runtime_min)
    }

    /// Fail once a runtime of `runtime_sec` passes the configured bound.
    fn check_runtime(&self, runtime_sec: f64) -> Result<(), SimulatorError> {
        let runtime_min = runtime_sec / 60.0;
        if runtime_min > self.max_runtime_min {
            return Err(SimulatorError::RuntimeLimit {
                runtime_min,
                limit_min: self.max_runtime_min,
            });
        }
        Ok(())
    }

    /// Simulate one dive starting from the tissue state left in `log`.
    /// Returns the ceilings seen after each step of this dive.
    fn run_dive(
        &self,
        plan: &DivePlan,
        log: &mut DiveLog,
        bottom_time_min: f64,
        gf: GfSetting,
    ) -> Result<Vec<f64>, SimulatorError> {
        let mut model = model_with_history(gf, &log.steps);
        let mut ceilings = Vec::new();
        let depth = plan.bottom_depth_m;
        let bottom_gas = plan.tanks.bottom.gas;

        // Descent counts toward bottom time.
        let descent_sec = minutes_to_sec(depth / plan.rates.descent);
        let bottom_sec = minutes_to_sec(bottom_time_min).saturating_sub(descent_sec);

        log.sample_at(0.0);
        record(&mut model, log, &mut ceilings, depth / 2.0, descent_sec, bottom_gas);
        log.sample_at(depth);
        record(&mut model, log, &mut ceilings, depth, bottom_sec, bottom_gas);
        log.sample_at(depth);
        self.check_runtime(log.elapsed_sec as f64)?;

        let gases: Vec<Gas> = plan
            .tanks
            .enabled_gases()
            .iter()
            .map(to_model_gas)
            .collect();
        let Deco { deco_stages, tts } = model.deco(gases);
        // dive-deco ascends faster than the plan's rates, so its TTS is a
        // lower bound on the replay below.
        self.check_runtime(log.elapsed_sec as f64 + tts as f64)?;
        let stops: Vec<(f64, usize)> = deco_stages
            .iter()
            .filter(|stage| matches!(stage.stage_type, DecoStageType::DecoStop))
            .filter(|stage| stage.duration > 0)
            .map(|stage| (stage.start_depth, stage.duration))
            .collect();

        let mut current = depth;
        for (index, &(stop_depth, stop_sec)) in stops.iter().enumerate() {
            let rate = if index == 0 {
                plan.rates.ascent_to_deco
            } else {
                plan.rates.ascent_at_deco
            };
            let gas = travel_gas(plan, current);
            travel(&mut model, log, &mut ceilings, current, stop_depth, rate, gas);
            let gas = stop_gas(plan, stop_depth);
            record(&mut model, log, &mut ceilings, stop_depth, stop_sec, gas);
            log.sample_at(stop_depth);
            current = stop_depth;
        }

        if stops.is_empty() && current > plan.last_stop_depth_m {
            let gas = travel_gas(plan, current);
            travel(
                &mut model,
                log,
                &mut ceilings,
                current,
                plan.last_stop_depth_m,
                plan.rates.ascent_to_deco,
                gas,
            );
            current = plan.last_stop_depth_m;
        }
        let gas = travel_gas(plan, current);
        travel(
            &mut model,
            log,
            &mut ceilings,
            current,
            0.0,
            plan.rates.ascent_to_surface,
            gas,
        );

        if let Some(bad) = ceilings.iter().find(|c| !c.is_finite()) {
            return Err(SimulatorError::Infeasible {
                reason: format!("non-finite ceiling {bad}"),
            });
        }
        Ok(ceilings)
    }
}

impl Simulator for BuhlmannSimulator {
    fn simulate(&self, plan: &DivePlan) -> Result<SimulationResult, SimulatorError> {
        plan.validate()?;

        let mut log = DiveLog::default();
        let mut stage_ceilings = Vec::with_capacity(plan.dive_count());
        let surface_interval_sec = plan
            .repetitive
            .as_ref()
            .map_or(0, |s| minutes_to_sec(s.surface_interval_hours * 60.0));

        for (index, dive) in plan.dives().into_iter().enumerate() {
            if index > 0 {
                log.steps.push(Step {
                    depth_m: 0.0,
                    seconds: surface_interval_sec,
                    gas: GasMix::AIR,
                });
                log.elapsed_sec += surface_interval_sec;
            }
            let ceilings = self.run_dive(plan, &mut log, dive.bottom_time_min, dive.gf)?;
            stage_ceilings.push(ceilings);

            self.check_runtime(log.elapsed_sec as f64)?;
        }

        tracing::trace!(
            gf = %plan.gf,
            dives = plan.dive_count(),
            runtime_min = log.elapsed_sec as f64 / 60.0,
            "simulated plan"
        );

        Ok(SimulationResult {
            samples: log.samples,
            stage_ceilings,
        })
    }

    fn max_gradient_factor(&self) -> Option<GradientFactor> {
        Some(GradientFactor::from(MODEL_GF_MAX))
    }
}

/// A fresh model with the given gradient factors, loaded with `history`.
fn model_with_history(gf: GfSetting, history: &[Step]) -> BuehlmannModel {
    let config = BuehlmannConfig::new().gradient_factors(model_gf(gf.low), model_gf(gf.high));
    let mut model = BuehlmannModel::new(config);
    for step in history {
        model.step(&step.depth_m, &step.seconds, &to_model_gas(&step.gas));
    }
    model
}

/// `dive-deco` only takes percentages up to 100; larger check-dive values are
/// capped.
fn model_gf(gf: i32) -> u8 {
    if gf > i32::from(MODEL_GF_MAX) {
        tracing::debug!(gf, cap = MODEL_GF_MAX, "capping gradient factor for ZHL-16C model");
    }
    gf.clamp(1, i32::from(MODEL_GF_MAX)) as u8
}

fn record(
    model: &mut BuehlmannModel,
    log: &mut DiveLog,
    ceilings: &mut Vec<f64>,
    depth_m: f64,
    seconds: usize,
    gas: GasMix,
) {
    if seconds == 0 {
        return;
    }
    model.step(&depth_m, &seconds, &to_model_gas(&gas));
    log.steps.push(Step {
        depth_m,
        seconds,
        gas,
    });
    log.elapsed_sec += seconds;
    ceilings.push(model.ceiling());
}

/// Linear travel, recorded as time at the mean depth.
fn travel(
    model: &mut BuehlmannModel,
    log: &mut DiveLog,
    ceilings: &mut Vec<f64>,
    from_m: f64,
    to_m: f64,
    rate_m_per_min: f64,
    gas: GasMix,
) {
    let seconds = minutes_to_sec((from_m - to_m).abs() / rate_m_per_min);
    record(model, log, ceilings, (from_m + to_m) / 2.0, seconds, gas);
    log.sample_at(to_m);
}

/// Richest enabled gas breathable at `depth_m`, falling back to bottom gas.
fn stop_gas(plan: &DivePlan, depth_m: f64) -> GasMix {
    let ambient_bar = depth_m / 10.0 + 1.0;
    plan.tanks
        .enabled_gases()
        .into_iter()
        .filter(|gas| gas.o2_fraction() * ambient_bar <= MAX_PPO2)
        .fold(plan.tanks.bottom.gas, |best, gas| {
            if gas.o2 > best.o2 {
                gas
            } else {
                best
            }
        })
}

/// Gas breathed while leaving `depth_m`.
fn travel_gas(plan: &DivePlan, depth_m: f64) -> GasMix {
    stop_gas(plan, depth_m)
}

fn to_model_gas(gas: &GasMix) -> Gas {
    Gas::new(gas.o2_fraction(), gas.he_fraction())
}

fn minutes_to_sec(minutes: f64) -> usize {
    (minutes * 60.0).round().max(0.0) as usize
}
